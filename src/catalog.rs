use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::db::CatalogDb;
use crate::catalog::models::Image;
use crate::directory::Directory;
use crate::error::ArchiveError;

pub mod db;
pub mod models;

/// Build the metadata record for one image file on disk. The identity is a
/// fresh v4 UUID, the media type is guessed from the file extension.
pub fn image_from_file(document_id: i32, path: impl AsRef<Path>) -> Result<Image, ArchiveError> {
    let path = path.as_ref();

    let meta = fs::metadata(path)?;

    let modified = DateTime::<Utc>::from(meta.modified()?);

    // Not every filesystem tracks creation time
    let created = meta
        .created()
        .map(DateTime::<Utc>::from)
        .unwrap_or(modified);

    let file_original_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ArchiveError::InvalidArgument(format!("{}: not a valid file name", path.display()))
        })?
        .to_string();

    let file_media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(Image {
        id: Uuid::new_v4(),
        file_size: meta.len() as i64,
        file_media_type,
        file_creation_datetime: created,
        file_modification_datetime: modified,
        file_original_name,
        document_id,
    })
}

/// Record every file under the ingest directory against `document_id`, copy
/// the tree into the data directory, then clear the ingest directory.
/// Returns the recorded images.
pub async fn ingest(
    db: &CatalogDb,
    ingest_dir: &Directory,
    data_dir: &Directory,
    document_id: i32,
) -> Result<Vec<Image>, ArchiveError> {
    let mut files = vec![];
    collect_files(ingest_dir.path(), &mut files)?;

    info!("Ingesting {} files from {ingest_dir}", files.len());

    let mut images = Vec::with_capacity(files.len());

    for file in files {
        let image = image_from_file(document_id, &file)?;
        debug!("Recording {} as {}", image.file_original_name, image.id);
        images.push(db.insert_image(&image).await?);
    }

    data_dir.fetch_all_from(ingest_dir)?;
    ingest_dir.empty_all()?;

    Ok(images)
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<(), ArchiveError> {
    for entry in fs::read_dir(path)? {
        let entry = entry?;

        if entry.path().is_dir() {
            collect_files(&entry.path(), files)?;
        } else {
            files.push(entry.path());
        }
    }

    Ok(())
}
