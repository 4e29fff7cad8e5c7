use crate::error::ArchiveError;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where newly scanned images land before they are catalogued.
    pub ingest_dir: String,

    /// Where finished archives are written.
    pub output_dir: String,

    /// The canonical image tree that gets archived.
    pub data_dir: String,

    pub database: DatabaseConfig,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let config = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&config)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(alias = "pass")]
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    /// Connection URL for the configured database. A `DATABASE_URL`
    /// environment variable takes precedence when set.
    pub fn url(&self) -> String {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            return url;
        }

        let DatabaseConfig {
            host,
            port,
            user,
            password,
            database,
        } = self;

        format!("postgres://{user}:{password}@{host}:{port}/{database}")
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn config_parses() {
        let input = r#"{
            "ingest_dir": "/tmp/images/ingest",
            "output_dir": "/tmp/images/output",
            "data_dir": "/tmp/images/data",
            "database": {
                "host": "localhost",
                "port": 5432,
                "user": "archivist",
                "pass": "hunter2",
                "database": "images"
            }
        }"#;

        let config: Config = serde_json::from_str(input).unwrap();

        assert_eq!(config.ingest_dir, "/tmp/images/ingest");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.database, "images");
    }
}
