//! `folio caches`: inspect cache storage without changing it.

use anyhow::{Result, bail};
use folio_client::Worker;
use serde_json::{Value, json};

pub async fn run(worker: &Worker, cache: Option<&str>) -> Result<Value> {
    let db = worker.manager().db();

    let Some(name) = cache else {
        let mut caches = Vec::new();
        for name in db.cache_names().await? {
            let entries = db.open_cache(&name).await?.len().await?;
            caches.push(json!({ "name": name, "entries": entries }));
        }
        return Ok(Value::Array(caches));
    };

    let Some(found) = db.find_cache(name).await? else {
        bail!("no cache named {name}");
    };
    let keys = found.keys().await?;
    Ok(json!({ "cache": name, "entries": keys }))
}
