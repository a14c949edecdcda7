//! # OriginStamp Store
//!
//! Storage abstraction for the fingerprint ledger. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait for ledger operations
//! - [`LedgerExt`] - Strict `insert_unique` / `fetch` variants
//! - [`SettingsStore`] - Persistence for the credential and email settings
//! - [`LedgerAdmin`] - Status report and teardown
//! - [`SqliteLedger`] - SQLite-based persistent storage
//! - [`MemoryLedger`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use originstamp_core::{fingerprint, FingerprintRecord};
//! use originstamp_store::{InsertResult, Ledger, SqliteLedger};
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("originstamp.db").unwrap();
//!
//!     let fp = fingerprint("Title", "<p>Body</p>");
//!     let record = FingerprintRecord::from_fingerprint(&fp, 0);
//!     assert_eq!(ledger.insert(&record).await.unwrap(), InsertResult::Inserted);
//!     assert_eq!(ledger.insert(&record).await.unwrap(), InsertResult::AlreadyExists);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Content-addressed**: the digest is the primary key
//! - **Idempotent inserts**: inserting an existing digest returns `AlreadyExists`
//! - **Append-only**: no update or delete path short of [`LedgerAdmin::teardown`]

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use traits::{InsertResult, Ledger, LedgerAdmin, LedgerExt, LedgerStatus, SettingsStore};

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
