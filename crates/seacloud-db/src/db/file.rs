//! File repository: the slice of the `files` table the thumbnail worker touches.

use seacloud_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for the `files` table.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Point a file record at its generated thumbnail.
    ///
    /// Returns whether a row was updated. A missing row is not an error: the
    /// file may have been deleted while its thumbnail was being generated.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %file_id))]
    pub async fn update_thumbnail(&self, file_id: Uuid, thumbnail: &str) -> Result<bool, AppError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE files
            SET thumbnail = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(thumbnail)
        .bind(file_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            tracing::warn!(file_id = %file_id, "No file record to attach thumbnail to");
        }

        Ok(rows_affected > 0)
    }
}
