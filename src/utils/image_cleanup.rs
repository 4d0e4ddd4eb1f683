//! Best-effort deletion of remote images, with a retry outbox.
//!
//! Removing an entity must not fail because the image host is down. Failed
//! deletions are logged, counted and written to `pending_image_deletions`;
//! a background task retries them until they succeed.

use std::sync::Arc;
use std::time::Duration;

use collegium_core::{AppError, ImageStorage};
use collegium_observability::{track_image_deletion, track_pending_image_deletions};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::modules::uploads::repository::PendingImageDeletionRepository;

#[derive(Clone)]
pub struct ImageCleanup {
    storage: Arc<dyn ImageStorage>,
    pending: Arc<dyn PendingImageDeletionRepository>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl ImageCleanup {
    pub fn new(
        storage: Arc<dyn ImageStorage>,
        pending: Arc<dyn PendingImageDeletionRepository>,
    ) -> Self {
        Self { storage, pending }
    }

    /// Deletes every image. Never fails: each failure is queued for retry.
    #[instrument(skip_all)]
    pub async fn delete_all<I, S>(&self, public_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for public_id in public_ids {
            let public_id = public_id.as_ref();
            if public_id.is_empty() {
                continue;
            }
            match self.storage.delete(public_id).await {
                Ok(()) => {
                    debug!(public_id, "remote image deleted");
                    track_image_deletion("deleted");
                }
                Err(e) => {
                    warn!(public_id, error = %e, "failed to delete remote image, queued for retry");
                    track_image_deletion("failed");
                    if let Err(err) = self.pending.enqueue(public_id, &e.to_string()).await {
                        error!(public_id, error = %err.message(), "failed to queue image deletion");
                    }
                }
            }
        }
    }

    pub async fn delete_one(&self, public_id: &str) {
        self.delete_all([public_id]).await;
    }

    /// Retries up to `batch` queued deletions.
    #[instrument(skip(self))]
    pub async fn reconcile_once(&self, batch: i64) -> Result<ReconcileReport, AppError> {
        let due = self.pending.list_due(batch).await?;
        let mut report = ReconcileReport {
            attempted: due.len(),
            ..ReconcileReport::default()
        };

        for entry in due {
            match self.storage.delete(&entry.public_id).await {
                Ok(()) => {
                    self.pending.remove(&entry.public_id).await?;
                    track_image_deletion("reconciled");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(
                        public_id = %entry.public_id,
                        attempts = entry.attempts + 1,
                        error = %e,
                        "retry of remote image deletion failed"
                    );
                    self.pending
                        .record_failure(&entry.public_id, &e.to_string())
                        .await?;
                    report.failed += 1;
                }
            }
        }

        let remaining = self.pending.count().await?;
        track_pending_image_deletions(remaining.max(0) as usize);
        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                deleted = report.deleted,
                failed = report.failed,
                remaining,
                "image deletion reconciliation finished"
            );
        }
        Ok(report)
    }

    /// Runs [`reconcile_once`](Self::reconcile_once) every `interval`.
    pub fn spawn_reconciler(self, interval: Duration, batch: i64) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.reconcile_once(batch).await {
                    error!(error = %e.message(), "image deletion reconciliation failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use collegium_core::image_storage::MemoryImageStorage;

    fn cleanup() -> (ImageCleanup, MemoryImageStorage, MemoryStore) {
        let storage = MemoryImageStorage::new();
        let store = MemoryStore::new();
        let cleanup = ImageCleanup::new(Arc::new(storage.clone()), Arc::new(store.clone()));
        (cleanup, storage, store)
    }

    #[tokio::test]
    async fn test_delete_all_attempts_every_image() {
        let (cleanup, storage, store) = cleanup();
        cleanup.delete_all(["a/1", "", "a/2"]).await;

        assert_eq!(storage.delete_attempts(), vec!["a/1", "a/2"]);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_deletes_are_queued_not_raised() {
        let (cleanup, storage, store) = cleanup();
        storage.set_fail_deletes(true);

        cleanup.delete_all(vec!["a/1".to_string(), "a/2".to_string()]).await;

        assert_eq!(storage.delete_attempts().len(), 2);
        let pending = store.list_due(10).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|p| p.attempts == 0));
        assert_eq!(pending[0].last_error.as_deref(), Some("Image provider error: simulated outage"));
    }

    #[tokio::test]
    async fn test_reconcile_retries_until_success() {
        let (cleanup, storage, store) = cleanup();
        storage.set_fail_deletes(true);
        cleanup.delete_one("events/x").await;

        let report = cleanup.reconcile_once(10).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(store.list_due(10).await.unwrap()[0].attempts, 1);

        storage.set_fail_deletes(false);
        let report = cleanup.reconcile_once(10).await.unwrap();
        assert_eq!(
            report,
            ReconcileReport {
                attempted: 1,
                deleted: 1,
                failed: 0
            }
        );
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
