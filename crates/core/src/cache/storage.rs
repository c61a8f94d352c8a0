//! Named caches and their entries.
//!
//! [`CacheDb`] plays the role of the global cache storage (open, has,
//! delete, list, cross-cache match); [`NamedCache`] is the handle returned by
//! opening one cache by name.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row};

use super::connection::CacheDb;
use crate::request::Request;
use crate::response::{Response, ResponseSource, ResponseType};
use crate::Error;

const ENTRY_COLUMNS: &str = "e.status, e.status_text, e.headers_json, e.body, e.response_type, e.response_url";

/// Key listing entry, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedRequest {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
}

/// Response columns as read from the entries table, before header decoding.
struct StoredRow {
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    response_type: String,
    response_url: Option<String>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            status: row.get(0)?,
            status_text: row.get(1)?,
            headers_json: row.get(2)?,
            body: row.get(3)?,
            response_type: row.get(4)?,
            response_url: row.get(5)?,
        })
    }

    fn into_response(self) -> Result<Response, Error> {
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;
        Ok(Response {
            url: self.response_url,
            status: self.status,
            status_text: self.status_text,
            headers,
            body: self.body,
            response_type: ResponseType::parse(&self.response_type),
            source: ResponseSource::Cache,
        })
    }
}

/// Entry columns ready to be written.
pub(super) struct NewEntry {
    key: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    response_type: &'static str,
    response_url: Option<String>,
}

impl NewEntry {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("cannot cache {} {}", request.method, request.url)));
        }
        Ok(Self {
            key: request.key(),
            method: request.method.clone(),
            url: request.url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.clone(),
            response_type: response.response_type.as_str(),
            response_url: response.url.clone(),
        })
    }
}

impl NewEntry {
    /// Validate a whole batch before anything is written.
    pub(super) fn batch<'a>(pairs: impl IntoIterator<Item = (&'a Request, &'a Response)>) -> Result<Vec<Self>, Error> {
        pairs.into_iter().map(|(request, response)| Self::new(request, response)).collect()
    }
}

/// Write `entries` into cache `name`, each replacing any entry with the same
/// key and taking the newest position.
pub(super) fn write_entries(
    tx: &rusqlite::Transaction<'_>, name: &str, entries: &[NewEntry], stored_at: &str,
) -> rusqlite::Result<()> {
    for entry in entries {
        tx.execute(
            "DELETE FROM entries WHERE cache_name = ?1 AND request_key = ?2",
            params![name, entry.key],
        )?;
        tx.execute(
            "INSERT INTO entries (
                cache_name, request_key, method, url, status, status_text,
                headers_json, body, response_type, response_url, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                name,
                entry.key,
                entry.method,
                entry.url,
                entry.status,
                entry.status_text,
                entry.headers_json,
                entry.body,
                entry.response_type,
                entry.response_url,
                stored_at,
            ],
        )?;
    }
    Ok(())
}

fn first_row(result: rusqlite::Result<StoredRow>) -> Result<Option<StoredRow>, Error> {
    match result {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl CacheDb {
    /// Open a named cache, creating it if it does not exist yet.
    pub async fn open_cache(&self, name: &str) -> Result<NamedCache, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(NamedCache { db: self.clone(), name: name.to_string() })
    }

    /// Open a cache only if it already exists.
    pub async fn find_cache(&self, name: &str) -> Result<Option<NamedCache>, Error> {
        let found = self.has_cache(name).await?;
        Ok(found.then(|| NamedCache { db: self.clone(), name: name.to_string() }))
    }

    /// Whether a cache with this name exists.
    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every cache, oldest first.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache and all of its entries.
    ///
    /// Returns false if no cache had this name.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Find a stored response for `request` in any cache.
    ///
    /// Caches are searched in creation order and the first hit wins.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request.key();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries e
                     JOIN caches c ON c.name = e.cache_name
                     WHERE e.request_key = ?1
                     ORDER BY c.id ASC LIMIT 1"
                );
                first_row(conn.query_row(&sql, params![key], StoredRow::from_row))
            })
            .await
            .map_err(Error::from)?;

        row.map(StoredRow::into_response).transpose()
    }
}

/// Handle to one named cache.
#[derive(Clone, Debug)]
pub struct NamedCache {
    db: CacheDb,
    name: String,
}

impl NamedCache {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cache storage this cache lives in.
    pub fn storage(&self) -> &CacheDb {
        &self.db
    }

    /// Look up the stored response for `request` in this cache only.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let name = self.name.clone();
        let key = request.key();
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.cache_name = ?1 AND e.request_key = ?2");
                first_row(conn.query_row(&sql, params![name, key], StoredRow::from_row))
            })
            .await
            .map_err(Error::from)?;

        row.map(StoredRow::into_response).transpose()
    }

    /// Store `response` under `request`.
    ///
    /// An existing entry for the same key is replaced and the new entry
    /// takes the newest insertion position. Only GET requests can be stored.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_all([(request, response)]).await.map(|_| ())
    }

    /// Store every pair in one transaction: either all entries land, in
    /// iteration order, or none do.
    pub async fn put_all<'a>(
        &self, pairs: impl IntoIterator<Item = (&'a Request, &'a Response)>,
    ) -> Result<usize, Error> {
        let entries = NewEntry::batch(pairs)?;
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.unchecked_transaction()?;
                write_entries(&tx, &name, &entries, &now)?;
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for `request`. Returns false if there was none.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let name = self.name.clone();
        let key = request.key();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE cache_name = ?1 AND request_key = ?2",
                    params![name, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Stored requests in insertion order, oldest first.
    pub async fn keys(&self) -> Result<Vec<CachedRequest>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<CachedRequest>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, stored_at FROM entries
                     WHERE cache_name = ?1 ORDER BY seq ASC",
                )?;
                let keys = stmt
                    .query_map(params![name], |row| {
                        Ok(CachedRequest {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            stored_at: row.get(3)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn len(&self) -> Result<usize, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE cache_name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the oldest entries until at most `max_entries` remain.
    ///
    /// Strict FIFO by insertion order; lookups never refresh an entry's
    /// position. Returns the number of deleted entries.
    pub async fn trim(&self, max_entries: usize) -> Result<u64, Error> {
        let name = self.name.clone();
        let max = max_entries as i64;
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE cache_name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE seq IN (
                        SELECT seq FROM entries WHERE cache_name = ?1 ORDER BY seq ASC LIMIT ?2
                    )",
                    params![name, to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
