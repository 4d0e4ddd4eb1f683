use async_trait::async_trait;
use collegium_core::AppError;
use collegium_models::PendingImageDeletion;

use crate::store::PgStore;

/// Outbox of remote image deletions that failed and must be retried.
#[async_trait]
pub trait PendingImageDeletionRepository: Send + Sync {
    /// Records a failed deletion. Re-enqueueing keeps the attempt count.
    async fn enqueue(&self, public_id: &str, error: &str) -> Result<(), AppError>;
    /// Entries least recently attempted first.
    async fn list_due(&self, limit: i64) -> Result<Vec<PendingImageDeletion>, AppError>;
    async fn remove(&self, public_id: &str) -> Result<(), AppError>;
    async fn record_failure(&self, public_id: &str, error: &str) -> Result<(), AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

#[async_trait]
impl PendingImageDeletionRepository for PgStore {
    async fn enqueue(&self, public_id: &str, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO pending_image_deletions (public_id, last_error)
            VALUES ($1, $2)
            ON CONFLICT (public_id)
            DO UPDATE SET last_error = EXCLUDED.last_error, updated_at = NOW()
            "#,
        )
        .bind(public_id)
        .bind(error)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn list_due(&self, limit: i64) -> Result<Vec<PendingImageDeletion>, AppError> {
        let rows = sqlx::query_as::<_, PendingImageDeletion>(
            "SELECT * FROM pending_image_deletions ORDER BY updated_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn remove(&self, public_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM pending_image_deletions WHERE public_id = $1")
            .bind(public_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn record_failure(&self, public_id: &str, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE pending_image_deletions
            SET attempts = attempts + 1, last_error = $2, updated_at = NOW()
            WHERE public_id = $1
            "#,
        )
        .bind(public_id)
        .bind(error)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pending_image_deletions")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    #[async_trait]
    impl PendingImageDeletionRepository for MemoryStore {
        async fn enqueue(&self, public_id: &str, error: &str) -> Result<(), AppError> {
            let mut tables = self.lock();
            let now = Utc::now();
            match tables
                .pending_image_deletions
                .iter_mut()
                .find(|p| p.public_id == public_id)
            {
                Some(entry) => {
                    entry.last_error = Some(error.to_string());
                    entry.updated_at = now;
                }
                None => tables.pending_image_deletions.push(PendingImageDeletion {
                    public_id: public_id.to_string(),
                    attempts: 0,
                    last_error: Some(error.to_string()),
                    created_at: now,
                    updated_at: now,
                }),
            }
            Ok(())
        }

        async fn list_due(&self, limit: i64) -> Result<Vec<PendingImageDeletion>, AppError> {
            let mut rows = self.lock().pending_image_deletions.clone();
            rows.sort_by_key(|p| p.updated_at);
            rows.truncate(limit.max(0) as usize);
            Ok(rows)
        }

        async fn remove(&self, public_id: &str) -> Result<(), AppError> {
            self.lock()
                .pending_image_deletions
                .retain(|p| p.public_id != public_id);
            Ok(())
        }

        async fn record_failure(&self, public_id: &str, error: &str) -> Result<(), AppError> {
            if let Some(entry) = self
                .lock()
                .pending_image_deletions
                .iter_mut()
                .find(|p| p.public_id == public_id)
            {
                entry.attempts += 1;
                entry.last_error = Some(error.to_string());
                entry.updated_at = Utc::now();
            }
            Ok(())
        }

        async fn count(&self) -> Result<i64, AppError> {
            Ok(self.lock().pending_image_deletions.len() as i64)
        }
    }
}
