//! Messages, push and background sync.

use anyhow::{Result, bail};
use folio_client::Worker;
use serde_json::{Value, json};

/// Read a message argument: JSON when it parses, otherwise a bare string.
fn message_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn message(worker: &Worker, raw: &str) -> Result<Value> {
    let message = worker.post_message(&message_value(raw)).await?;
    Ok(json!({ "accepted": message.as_str(), "state": worker.state().await }))
}

pub fn push(worker: &Worker, data: Option<&str>) -> Result<Value> {
    let notification = worker.handle_push(data.map(str::as_bytes));
    Ok(serde_json::to_value(notification)?)
}

pub async fn sync(worker: &Worker, tag: &str) -> Result<Value> {
    let outcome = worker.handle_sync(tag).await?;
    Ok(serde_json::to_value(outcome)?)
}

pub async fn queue(worker: &Worker, raw: &str) -> Result<Value> {
    let payload: Value = serde_json::from_str(raw)?;
    if !payload.is_object() {
        bail!("submission must be a JSON object");
    }

    let id = worker.queue_submission(&payload).await?;
    let pending = worker.manager().db().pending_submissions().await?.len();
    Ok(json!({ "queued": id, "pending": pending }))
}
