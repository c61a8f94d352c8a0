//! Form submissions queued for background sync.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use crate::Error;

/// A queued form payload, oldest first when listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PendingSubmission {
    pub id: i64,
    pub payload: serde_json::Value,
    pub queued_at: String,
    pub attempts: u32,
}

impl CacheDb {
    /// Queue a submission and return its id.
    pub async fn enqueue_submission(&self, payload: &serde_json::Value) -> Result<i64, Error> {
        let payload_json = serde_json::to_string(payload)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO pending_submissions (payload_json, queued_at) VALUES (?1, ?2)",
                    params![payload_json, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn pending_submissions(&self) -> Result<Vec<PendingSubmission>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(i64, String, String, u32)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, payload_json, queued_at, attempts FROM pending_submissions ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(id, payload_json, queued_at, attempts)| {
                Ok(PendingSubmission { id, payload: serde_json::from_str(&payload_json)?, queued_at, attempts })
            })
            .collect()
    }

    /// Drop a submission once it has been delivered.
    pub async fn remove_submission(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM pending_submissions WHERE id = ?1", params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Count a failed delivery attempt.
    pub async fn record_submission_attempt(&self, id: i64) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE pending_submissions SET attempts = attempts + 1 WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
