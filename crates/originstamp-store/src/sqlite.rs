//! SQLite implementation of the ledger traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use originstamp_core::{ContentDigest, FingerprintRecord, Settings};

use crate::error::{Result, StoreError};
use crate::migration::{self, LEDGER_TABLE};
use crate::traits::{InsertResult, Ledger, LedgerAdmin, LedgerStatus, SettingsStore};

const API_KEY: &str = "api_key";
const NOTIFY_EMAIL: &str = "notify_email";

/// SQLite-based ledger.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened ledger");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn row_count(conn: &Connection) -> Result<u64> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))?;
    u64::try_from(count)
        .map_err(|_| StoreError::InvalidData(format!("row count {}", count)))
}

// Helper to convert a row to a FingerprintRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FingerprintRecord> {
    let digest_hex: String = row.get("digest")?;
    let digest = ContentDigest::from_hex(&digest_hex).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(FingerprintRecord {
        digest,
        title: row.get("title")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn insert(&self, record: &FingerprintRecord) -> Result<InsertResult> {
        let record = record.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "INSERT INTO fingerprints (digest, title, body, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(digest) DO NOTHING",
                params![
                    record.digest.to_hex(),
                    record.title,
                    record.body,
                    record.created_at,
                ],
            )?;
            tx.commit()?;

            if changed == 0 {
                tracing::debug!(digest = %record.digest, "digest already recorded");
                Ok(InsertResult::AlreadyExists)
            } else {
                Ok(InsertResult::Inserted)
            }
        })
        .await
    }

    async fn get(&self, digest: &ContentDigest) -> Result<Option<FingerprintRecord>> {
        let digest = *digest;

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT digest, title, body, created_at FROM fingerprints WHERE digest = ?1",
                params![digest.to_hex()],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn contains(&self, digest: &ContentDigest) -> Result<bool> {
        let digest = *digest;

        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM fingerprints WHERE digest = ?1",
                    params![digest.to_hex()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.blocking(|conn| row_count(conn)).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<FingerprintRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT digest, title, body, created_at FROM fingerprints
                 ORDER BY created_at DESC, digest ASC LIMIT ?1",
            )?;
            let records = stmt
                .query_map(params![limit], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }
}

#[async_trait]
impl SettingsStore for SqliteLedger {
    async fn load_settings(&self) -> Result<Settings> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut api_key = None;
            let mut notify_email = None;
            for (key, value) in rows {
                match key.as_str() {
                    API_KEY => api_key = Some(value),
                    NOTIFY_EMAIL => notify_email = Some(value),
                    other => tracing::debug!(key = other, "ignoring unknown setting"),
                }
            }
            Ok(Settings::new(api_key, notify_email))
        })
        .await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let settings = settings.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM settings", [])?;
            for (key, value) in [
                (API_KEY, settings.api_key()),
                (NOTIFY_EMAIL, settings.notify_email()),
            ] {
                if let Some(value) = value {
                    tx.execute(
                        "INSERT INTO settings (key, value) VALUES (?1, ?2)",
                        params![key, value],
                    )?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl LedgerAdmin for SqliteLedger {
    async fn status(&self) -> Result<LedgerStatus> {
        self.blocking(|conn| {
            let ledger_exists = table_exists(conn, LEDGER_TABLE)?;
            let records = if ledger_exists {
                row_count(conn)?
            } else {
                0
            };
            let schema_version = if table_exists(conn, "schema_migrations")? {
                migration::current_version(conn)?
            } else {
                0
            };

            Ok(LedgerStatus {
                table: LEDGER_TABLE,
                table_exists: ledger_exists,
                records,
                schema_version,
            })
        })
        .await
    }

    async fn teardown(&self) -> Result<()> {
        self.blocking(|conn| {
            conn.execute_batch(
                "DROP TABLE IF EXISTS fingerprints;
                 DROP TABLE IF EXISTS settings;
                 DROP TABLE IF EXISTS schema_migrations;",
            )?;
            tracing::warn!("ledger tables dropped");
            Ok(())
        })
        .await
    }
}
