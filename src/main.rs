use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use imagearchive::{
    catalog::{self, db::CatalogDb},
    config::Config,
    db,
    directory::{Directory, DirectoryRole},
};

#[derive(Debug, Clone, Parser)]
pub struct StartArgs {
    #[arg(short, long, default_value = "config.json")]
    pub config_path: String,

    #[arg(short, long, default_value = "INFO")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Catalog the ingest directory's files under a new document and copy
    /// them into the data tree
    Ingest {
        #[arg(long)]
        author_id: i32,

        #[arg(long)]
        start_date: NaiveDate,

        #[arg(long)]
        end_date: NaiveDate,
    },

    /// Bundle the data tree into a timestamped archive in the output
    /// directory
    Archive,

    /// Delete finished archives from the output directory
    Prune,

    /// Empty one of the managed directories
    Clear {
        #[arg(value_enum)]
        target: ClearTarget,
    },

    /// Register an author
    AddAuthor {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        organization: String,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ClearTarget {
    Ingest,
    Output,
    Data,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let StartArgs {
        config_path,
        log_level: level,
        command,
    } = StartArgs::parse();

    tracing_subscriber::fmt().with_max_level(level).init();

    let config = Config::read(&config_path).expect("invalid config file");

    let pool = db::create_pool(&config.database.url()).await;

    db::migrate(&pool).await;

    let catalog = CatalogDb::new(pool);

    let ingest_dir =
        Directory::create(&config.ingest_dir, DirectoryRole::Ingest).expect("invalid ingest dir");
    let output_dir =
        Directory::create(&config.output_dir, DirectoryRole::Output).expect("invalid output dir");
    let data_dir =
        Directory::create(&config.data_dir, DirectoryRole::Data).expect("invalid data dir");

    match command {
        Command::Ingest {
            author_id,
            start_date,
            end_date,
        } => {
            catalog
                .get_author(author_id)
                .await
                .expect("error while looking up author")
                .unwrap_or_else(|| panic!("no author with id {author_id}"));

            let document = catalog
                .insert_document(author_id, start_date, end_date)
                .await
                .expect("error while creating document");

            let images = catalog::ingest(&catalog, &ingest_dir, &data_dir, document.id)
                .await
                .expect("error during ingest");

            info!(
                "Ingested {} images into document {}",
                images.len(),
                document.id
            );
        }
        Command::Archive => {
            let archive = data_dir
                .create_archive(Some(&output_dir))
                .expect("error while archiving");

            info!("Archive created at {}", archive.display());
        }
        Command::Prune => {
            output_dir
                .remove_archives()
                .expect("error while pruning archives");
        }
        Command::Clear { target } => {
            let dir = match target {
                ClearTarget::Ingest => &ingest_dir,
                ClearTarget::Output => &output_dir,
                ClearTarget::Data => &data_dir,
            };

            info!("Clearing {:?} directory {dir}", dir.role());

            dir.empty_all().expect("error while clearing directory");
        }
        Command::AddAuthor {
            name,
            email,
            organization,
        } => {
            let author = catalog
                .insert_author(&name, &email, &organization)
                .await
                .expect("error while registering author");

            info!("Registered author {} ({})", author.name, author.id);
        }
    }
}
