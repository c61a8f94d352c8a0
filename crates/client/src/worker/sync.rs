//! Background sync: replaying contact form submissions queued while offline.

use folio_core::{Error, Request};
use serde::Serialize;
use serde_json::Value;

use super::Worker;

/// Replays the pending contact form submissions.
pub const CONTACT_SYNC_TAG: &str = "contact-form-sync";
/// Accepted and logged; nothing is queued under it.
pub const MESSAGES_SYNC_TAG: &str = "sync-messages";

/// Result of one sync event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Submissions accepted by the endpoint and removed from the queue.
    pub delivered: usize,
    /// Submissions that failed and stay queued.
    pub failed: usize,
    /// Queue length after the sync.
    pub remaining: usize,
}

impl Worker {
    /// Queue a form submission for the next contact sync.
    ///
    /// # Errors
    ///
    /// Returns the cache error if the submission cannot be stored.
    pub async fn queue_submission(&self, payload: &Value) -> Result<i64, Error> {
        let id = self.manager.db().enqueue_submission(payload).await?;
        tracing::debug!(id, "queued submission");
        Ok(id)
    }

    /// Handle a background sync event.
    ///
    /// Only [`CONTACT_SYNC_TAG`] does any work: every pending submission is
    /// POSTed to the sync endpoint, straight to the network. 2xx responses
    /// remove the submission; anything else bumps its attempt count.
    ///
    /// # Errors
    ///
    /// Returns the cache error if the queue cannot be read. Delivery
    /// failures are counted in the outcome instead.
    pub async fn handle_sync(&self, tag: &str) -> Result<SyncOutcome, Error> {
        match tag {
            CONTACT_SYNC_TAG => self.sync_contact_forms().await,
            MESSAGES_SYNC_TAG => {
                tracing::info!(tag, "background sync triggered");
                Ok(SyncOutcome::default())
            }
            _ => {
                tracing::debug!(tag, "ignoring unknown sync tag");
                Ok(SyncOutcome::default())
            }
        }
    }

    async fn sync_contact_forms(&self) -> Result<SyncOutcome, Error> {
        let db = self.manager.db();
        let pending = db.pending_submissions().await?;
        let mut outcome = SyncOutcome::default();

        for submission in &pending {
            let body = serde_json::to_vec(&submission.payload)?;
            let request = Request::post_json(self.sync_endpoint.clone(), body);

            match self.network.fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    db.remove_submission(submission.id).await?;
                    outcome.delivered += 1;
                }
                Ok(response) => {
                    tracing::warn!(id = submission.id, status = response.status, "submission rejected");
                    db.record_submission_attempt(submission.id).await?;
                    outcome.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(id = submission.id, "failed to sync submission: {e}");
                    db.record_submission_attempt(submission.id).await?;
                    outcome.failed += 1;
                }
            }
        }

        outcome.remaining = pending.len() - outcome.delivered;
        tracing::info!(delivered = outcome.delivered, failed = outcome.failed, "contact sync done");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{active_worker, url};
    use super::*;
    use folio_core::Response;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_and_removes_delivered() {
        let (worker, network) = active_worker().await;
        network.route(&url("/api/contact"), Response::with_status(201, "Created", ""));
        worker.queue_submission(&json!({"name": "Ada", "message": "hi"})).await.unwrap();
        worker.queue_submission(&json!({"name": "Grace", "message": "hello"})).await.unwrap();

        let outcome = worker.handle_sync(CONTACT_SYNC_TAG).await.unwrap();
        assert_eq!(outcome, SyncOutcome { delivered: 2, failed: 0, remaining: 0 });
        assert!(worker.manager().db().pending_submissions().await.unwrap().is_empty());

        let posts: Vec<Request> = network.requests().into_iter().filter(|r| r.method == "POST").collect();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url.as_str(), url("/api/contact"));
        let first: serde_json::Value = serde_json::from_slice(posts[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(first["name"], "Ada");
    }

    #[tokio::test]
    async fn test_offline_keeps_queue_and_counts_attempts() {
        let (worker, network) = active_worker().await;
        worker.queue_submission(&json!({"name": "Ada"})).await.unwrap();
        network.set_offline(true);

        let outcome = worker.handle_sync(CONTACT_SYNC_TAG).await.unwrap();
        assert_eq!(outcome, SyncOutcome { delivered: 0, failed: 1, remaining: 1 });

        let pending = worker.manager().db().pending_submissions().await.unwrap();
        assert_eq!(pending[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_error_status_keeps_submission() {
        let (worker, network) = active_worker().await;
        network.route(&url("/api/contact"), Response::with_status(500, "Internal Server Error", ""));
        worker.queue_submission(&json!({"name": "Ada"})).await.unwrap();

        let outcome = worker.handle_sync(CONTACT_SYNC_TAG).await.unwrap();
        assert_eq!(outcome.remaining, 1);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn test_redirect_status_keeps_submission() {
        let (worker, network) = active_worker().await;
        network.route(&url("/api/contact"), Response::with_status(303, "See Other", ""));
        worker.queue_submission(&json!({"name": "Ada"})).await.unwrap();

        let outcome = worker.handle_sync(CONTACT_SYNC_TAG).await.unwrap();
        assert_eq!(outcome, SyncOutcome { delivered: 0, failed: 1, remaining: 1 });
    }

    #[tokio::test]
    async fn test_other_tags_do_nothing() {
        let (worker, network) = active_worker().await;
        worker.queue_submission(&json!({"name": "Ada"})).await.unwrap();
        let before = network.total_hits();

        assert_eq!(worker.handle_sync(MESSAGES_SYNC_TAG).await.unwrap(), SyncOutcome::default());
        assert_eq!(worker.handle_sync("unknown-tag").await.unwrap(), SyncOutcome::default());
        assert_eq!(network.total_hits(), before);
        assert_eq!(worker.manager().db().pending_submissions().await.unwrap().len(), 1);
    }
}
