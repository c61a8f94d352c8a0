//! Control messages posted by the page.

use std::fmt;

use folio_core::Error;
use serde_json::Value;

use super::Worker;

/// A recognised control message. On the wire it is a bare JSON string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate a waiting worker now.
    SkipWaiting,
    /// Delete every named cache.
    ClearCache,
}

impl ControlMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMessage::SkipWaiting => "skipWaiting",
            ControlMessage::ClearCache => "clearCache",
        }
    }

    /// Parse a posted message. Anything other than the two bare strings,
    /// including `{"type": "SKIP_WAITING"}`, is rejected.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownMessage` for any other value.
    pub fn parse(value: &Value) -> Result<Self, Error> {
        match value.as_str() {
            Some("skipWaiting") => Ok(ControlMessage::SkipWaiting),
            Some("clearCache") => Ok(ControlMessage::ClearCache),
            _ => Err(Error::UnknownMessage(value.to_string())),
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Worker {
    /// Parse and handle a posted message.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownMessage` for unrecognised messages and the
    /// cache error if clearing the caches fails.
    pub async fn post_message(&self, value: &Value) -> Result<ControlMessage, Error> {
        let message = ControlMessage::parse(value).inspect_err(|e| tracing::warn!("ignoring message: {e}"))?;
        self.handle_message(message).await?;
        Ok(message)
    }

    /// Handle a control message.
    ///
    /// # Errors
    ///
    /// Returns the cache error if `clearCache` cannot list or delete caches.
    pub async fn handle_message(&self, message: ControlMessage) -> Result<(), Error> {
        tracing::info!(%message, "control message");
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting().await;
            }
            ControlMessage::ClearCache => {
                let deleted = self.clear_all_caches().await?;
                tracing::info!(deleted, "cleared caches");
            }
        }
        Ok(())
    }

    /// Delete every named cache, current ones included. Returns how many
    /// were deleted.
    ///
    /// # Errors
    ///
    /// Returns the cache error from listing or deleting.
    pub async fn clear_all_caches(&self) -> Result<usize, Error> {
        let db = self.manager.db();
        let mut deleted = 0;
        for name in db.cache_names().await? {
            if db.delete_cache(&name).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
