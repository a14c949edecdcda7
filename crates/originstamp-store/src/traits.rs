//! Ledger traits: the abstract interface for fingerprint persistence.
//!
//! This keeps the stamping workflow storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use serde::Serialize;

use originstamp_core::{ContentDigest, FingerprintRecord, Settings};

use crate::error::{Result, StoreError};

/// Result of inserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Record was inserted.
    Inserted,
    /// A record with this digest already exists (idempotent - not an error).
    AlreadyExists,
}

/// Async interface for the content-addressed ledger.
///
/// # Design Notes
///
/// - **Insert-if-absent**: inserting an existing digest returns `AlreadyExists`
///   and leaves the stored row untouched.
/// - **No updates, no deletes**: a record lives until the whole store is torn
///   down.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Insert a record unless its digest is already present.
    async fn insert(&self, record: &FingerprintRecord) -> Result<InsertResult>;

    /// Get a record by digest.
    async fn get(&self, digest: &ContentDigest) -> Result<Option<FingerprintRecord>>;

    /// Check whether a digest is recorded.
    async fn contains(&self, digest: &ContentDigest) -> Result<bool>;

    /// Number of stored records.
    async fn count(&self) -> Result<u64>;

    /// Most recent records, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<FingerprintRecord>>;
}

/// Persistence for [`Settings`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the stored settings; unset fields are `None`.
    async fn load_settings(&self) -> Result<Settings>;

    /// Replace the stored settings.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;
}

/// Snapshot of the ledger's schema and size, as shown on the status surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStatus {
    pub table: &'static str,
    pub table_exists: bool,
    pub records: u64,
    pub schema_version: u32,
}

/// Maintenance operations outside the normal insert/read path.
#[async_trait]
pub trait LedgerAdmin: Send + Sync {
    /// Report whether the ledger table exists and how much it holds.
    async fn status(&self) -> Result<LedgerStatus>;

    /// Drop everything. The ledger is unusable afterwards until reopened.
    async fn teardown(&self) -> Result<()>;
}

/// Strict variants of the ledger operations.
pub trait LedgerExt: Ledger {
    /// Insert a record, failing with `DuplicateKey` if the digest exists.
    fn insert_unique(
        &self,
        record: &FingerprintRecord,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Get a record, failing with `NotFound` if the digest is unknown.
    fn fetch(
        &self,
        digest: &ContentDigest,
    ) -> impl std::future::Future<Output = Result<FingerprintRecord>> + Send;
}

impl<L: Ledger + ?Sized> LedgerExt for L {
    async fn insert_unique(&self, record: &FingerprintRecord) -> Result<()> {
        match self.insert(record).await? {
            InsertResult::Inserted => Ok(()),
            InsertResult::AlreadyExists => Err(StoreError::DuplicateKey(record.digest)),
        }
    }

    async fn fetch(&self, digest: &ContentDigest) -> Result<FingerprintRecord> {
        self.get(digest)
            .await?
            .ok_or(StoreError::NotFound(*digest))
    }
}
