//! Schema migrations for the cache store.
//!
//! `_migrations` records every applied version. Each pending migration runs
//! in its own transaction together with its bookkeeping row.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// A numbered schema change.
struct Migration {
    version: i64,
    sql: &'static str,
}

/// In ascending version order.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, sql: include_str!("../../migrations/001_cache_storage.sql") },
    Migration { version: 2, sql: include_str!("../../migrations/002_pending_submissions.sql") },
    Migration { version: 3, sql: include_str!("../../migrations/003_registrations.sql") },
];

/// Apply every migration newer than the recorded schema version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose SQL failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )?;

        let applied: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("version {}: {e}", migration.version)))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![migration.version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version = migration.version, "applied cache store migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn versions(conn: &Connection) -> Vec<i64> {
        conn.call(|conn| {
            let mut stmt = conn.prepare("SELECT version FROM _migrations ORDER BY version")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<Vec<i64>, _>>()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_creates_store_tables() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        for table in ["caches", "entries", "pending_submissions", "registrations"] {
            let exists: bool = conn
                .call(move |conn| {
                    conn.query_row(
                        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                        params![table],
                        |row| row.get(0),
                    )
                })
                .await
                .unwrap();

            assert!(exists, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_rerun_applies_nothing() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(versions(&conn).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_upgrades_from_first_version() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| {
            conn.execute_batch(MIGRATIONS[0].sql)?;
            conn.execute_batch(
                "CREATE TABLE _migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL);
                 INSERT INTO _migrations VALUES (1, '2026-01-01T00:00:00Z');",
            )
        })
        .await
        .unwrap();

        run(&conn).await.unwrap();
        assert_eq!(versions(&conn).await, vec![1, 2, 3]);
    }
}
