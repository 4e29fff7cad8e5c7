use super::models::{Author, Document, Image};
use crate::error::ArchiveError;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CatalogDb {
    pool: PgPool,
}

impl CatalogDb {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_author(
        &self,
        name: &str,
        email: &str,
        organization: &str,
    ) -> Result<Author, ArchiveError> {
        sqlx::query_as(
            "INSERT INTO authors(name, email, organization) VALUES($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(organization)
        .fetch_one(&self.pool)
        .await
        .map_err(ArchiveError::from)
    }

    pub async fn get_author(&self, id: i32) -> Result<Option<Author>, ArchiveError> {
        sqlx::query_as("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    pub async fn get_author_by_name_and_organization(
        &self,
        name: &str,
        organization: &str,
    ) -> Result<Option<Author>, ArchiveError> {
        sqlx::query_as("SELECT * FROM authors WHERE name = $1 AND organization = $2")
            .bind(name)
            .bind(organization)
            .fetch_optional(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>, ArchiveError> {
        sqlx::query_as("SELECT * FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    pub async fn update_author(&self, author: &Author) -> Result<Author, ArchiveError> {
        sqlx::query_as(
            "UPDATE authors SET name = $1, email = $2, organization = $3
             WHERE id = $4 RETURNING *",
        )
        .bind(&author.name)
        .bind(&author.email)
        .bind(&author.organization)
        .bind(author.id)
        .fetch_one(&self.pool)
        .await
        .map_err(ArchiveError::from)
    }

    pub async fn remove_author(&self, id: i32) -> Result<(), ArchiveError> {
        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Accession timestamp and license fall back to the table defaults.
    pub async fn insert_document(
        &self,
        author_id: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Document, ArchiveError> {
        sqlx::query_as(
            "INSERT INTO documents(start_date, end_date, author_id) VALUES($1, $2, $3) RETURNING *",
        )
        .bind(start_date)
        .bind(end_date)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(ArchiveError::from)
    }

    pub async fn get_document(&self, id: i32) -> Result<Option<Document>, ArchiveError> {
        sqlx::query_as("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    /// An author's documents, ordered by start date.
    pub async fn list_documents(&self, author_id: i32) -> Result<Vec<Document>, ArchiveError> {
        sqlx::query_as("SELECT * FROM documents WHERE author_id = $1 ORDER BY start_date")
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    pub async fn update_document_license(
        &self,
        id: i32,
        license: &str,
    ) -> Result<Document, ArchiveError> {
        sqlx::query_as("UPDATE documents SET license = $1 WHERE id = $2 RETURNING *")
            .bind(license)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    pub async fn remove_document(&self, id: i32) -> Result<(), ArchiveError> {
        sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_image(&self, image: &Image) -> Result<Image, ArchiveError> {
        sqlx::query_as(
            "INSERT INTO images(id, file_size, file_media_type, file_creation_datetime,
             file_modification_datetime, file_original_name, document_id)
             VALUES($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(image.id)
        .bind(image.file_size)
        .bind(&image.file_media_type)
        .bind(image.file_creation_datetime)
        .bind(image.file_modification_datetime)
        .bind(&image.file_original_name)
        .bind(image.document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(ArchiveError::from)
    }

    pub async fn get_image(&self, id: Uuid) -> Result<Option<Image>, ArchiveError> {
        sqlx::query_as("SELECT * FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    /// A document's images, ordered by identity.
    pub async fn list_images(&self, document_id: i32) -> Result<Vec<Image>, ArchiveError> {
        sqlx::query_as("SELECT * FROM images WHERE document_id = $1 ORDER BY id")
            .bind(document_id)
            .fetch_all(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    /// Metadata correction only, the rest of an image row never changes.
    pub async fn update_image_original_name(
        &self,
        id: Uuid,
        file_original_name: &str,
    ) -> Result<Image, ArchiveError> {
        sqlx::query_as("UPDATE images SET file_original_name = $1 WHERE id = $2 RETURNING *")
            .bind(file_original_name)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(ArchiveError::from)
    }

    pub async fn remove_image(&self, id: Uuid) -> Result<(), ArchiveError> {
        sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    async fn connect() -> CatalogDb {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let pool = crate::db::create_pool(&url).await;
        crate::db::migrate(&pool).await;
        CatalogDb::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires a running postgres"]
    async fn duplicate_author_violates_uniqueness() {
        let db = connect().await;
        let name = format!("Ansel {}", Uuid::new_v4());

        db.insert_author(&name, "ansel@example.com", "f64 Group")
            .await
            .unwrap();

        let duplicate = db
            .insert_author(&name, "other@example.com", "f64 Group")
            .await;

        assert!(matches!(duplicate, Err(ArchiveError::Database(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres"]
    async fn documents_come_back_ordered_by_start_date() {
        let db = connect().await;
        let name = format!("Dorothea {}", Uuid::new_v4());

        let author = db
            .insert_author(&name, "dot@example.com", "FSA")
            .await
            .unwrap();

        let later = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();

        db.insert_document(author.id, later, later).await.unwrap();
        db.insert_document(author.id, earlier, earlier).await.unwrap();

        let documents = db.list_documents(author.id).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].start_date, earlier);
        assert_eq!(documents[1].start_date, later);

        let document = &documents[0];
        assert_eq!(document.license, "CC-0 Public Domain");
    }
}
