//! In-memory implementation of the ledger traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use originstamp_core::{ContentDigest, FingerprintRecord, Settings};

use crate::error::{Result, StoreError};
use crate::migration::{CURRENT_VERSION, LEDGER_TABLE};
use crate::traits::{InsertResult, Ledger, LedgerAdmin, LedgerStatus, SettingsStore};

/// In-memory ledger.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryLedger {
    records: RwLock<HashMap<ContentDigest, FingerprintRecord>>,
    settings: RwLock<Settings>,
}

impl MemoryLedger {
    /// Create a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::InvalidData(format!("lock poisoned: {}", e))
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn insert(&self, record: &FingerprintRecord) -> Result<InsertResult> {
        let mut records = self.records.write().map_err(poisoned)?;

        if records.contains_key(&record.digest) {
            return Ok(InsertResult::AlreadyExists);
        }
        records.insert(record.digest, record.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get(&self, digest: &ContentDigest) -> Result<Option<FingerprintRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(digest).cloned())
    }

    async fn contains(&self, digest: &ContentDigest) -> Result<bool> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.contains_key(digest))
    }

    async fn count(&self) -> Result<u64> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.len() as u64)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<FingerprintRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.digest.cmp(&b.digest))
        });
        all.truncate(limit);
        Ok(all)
    }
}

#[async_trait]
impl SettingsStore for MemoryLedger {
    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.settings.read().map_err(poisoned)?.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        *self.settings.write().map_err(poisoned)? =
            Settings::new(settings.api_key.clone(), settings.notify_email.clone());
        Ok(())
    }
}

#[async_trait]
impl LedgerAdmin for MemoryLedger {
    async fn status(&self) -> Result<LedgerStatus> {
        Ok(LedgerStatus {
            table: LEDGER_TABLE,
            table_exists: true,
            records: self.count().await?,
            schema_version: CURRENT_VERSION,
        })
    }

    async fn teardown(&self) -> Result<()> {
        self.records.write().map_err(poisoned)?.clear();
        *self.settings.write().map_err(poisoned)? = Settings::default();
        Ok(())
    }
}
