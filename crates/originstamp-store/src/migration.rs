//! Ledger schema, kept as an ordered list of SQL steps.
//!
//! Step `n` (1-based) takes the schema from version `n - 1` to `n`. Applied
//! versions are tracked in `schema_migrations`; pending steps run in a single
//! transaction.

use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "fingerprints";

/// Schema steps in application order.
const STEPS: &[&str] = &[
    // v1: ledger plus settings
    r#"
    CREATE TABLE fingerprints (
        digest TEXT PRIMARY KEY NOT NULL CHECK (length(digest) = 64),
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX idx_fingerprints_created ON fingerprints(created_at);

    CREATE TABLE settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );
    "#,
];

/// Schema version after every step has run.
pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

/// Bring `conn` up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )?;

    let applied = current_version(conn)?;
    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database is at schema version {}, newer than supported {}",
            applied, CURRENT_VERSION
        )));
    }

    let pending = &STEPS[applied as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in (applied + 1..).zip(pending) {
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, crate::now_millis()],
        )?;
        tracing::debug!(version, "applied ledger migration");
    }
    tx.commit()?;

    Ok(())
}

/// Highest applied version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    #[test]
    fn test_fresh_database_gets_every_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables = table_names(&conn);
        for expected in [LEDGER_TABLE, "settings", "schema_migrations"] {
            assert!(tables.iter().any(|t| t == expected), "{expected} missing");
        }
        assert_eq!(current_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_rerun_is_a_no_op() {
        let mut conn = Connection::open_in_memory().unwrap();
        for _ in 0..3 {
            migrate(&mut conn).unwrap();
        }
        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, 0)",
            params![CURRENT_VERSION + 1],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }

    #[test]
    fn test_digest_length_is_checked() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let err = conn.execute("INSERT INTO fingerprints VALUES ('short', '', '', 0)", []);
        assert!(err.is_err());
    }
}
