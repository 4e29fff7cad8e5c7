use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A person or organization producing documents. The (name, organization)
/// pair is unique across the table.
#[derive(Debug, Clone, FromRow)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub organization: String,
}

/// An ordered collection of images produced within a date range.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: i32,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    /// When the document entered the archive.
    pub accession_datetime: DateTime<Utc>,

    pub license: String,

    /// The author this document belongs to.
    pub author_id: i32,
}

/// File-level metadata for one archived image.
#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: Uuid,

    /// Number of bytes.
    pub file_size: i64,

    /// e.g. 'image/tiff'
    pub file_media_type: String,

    pub file_creation_datetime: DateTime<Utc>,

    pub file_modification_datetime: DateTime<Utc>,

    /// File name at ingest time.
    pub file_original_name: String,

    /// The document this image belongs to.
    pub document_id: i32,
}
