//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an in-memory ledger, a recording
//! timestamp service and a recording mailer, wired the same way the binary
//! wires the real ones.

use std::sync::Arc;

use originstamp::{GatewayConfig, RetrievalGateway, Services, Stamper};
use originstamp_client::{MemoryMailer, MemoryTimestampApi, SubmissionClient};
use originstamp_core::{RemoteSubmissionEntry, Settings, SubmitStatus};
use originstamp_store::MemoryLedger;

/// Address used by [`TestFixture::configured`].
pub const AUTHOR_EMAIL: &str = "author@example.org";
/// API key used by [`TestFixture::configured`].
pub const API_KEY: &str = "test-api-key";

/// In-memory collaborators plus the settings to wire them with.
pub struct TestFixture {
    pub settings: Settings,
    pub ledger: Arc<MemoryLedger>,
    pub api: Arc<MemoryTimestampApi>,
    pub mailer: Arc<MemoryMailer>,
}

impl TestFixture {
    /// A fixture with the given settings and an empty remote history.
    pub fn new(settings: Settings) -> Self {
        Self::with_history(settings, Vec::new())
    }

    /// Credential and notification address both set.
    pub fn configured() -> Self {
        Self::new(Settings::new(
            Some(API_KEY.to_string()),
            Some(AUTHOR_EMAIL.to_string()),
        ))
    }

    /// Nothing configured: every outbound step is skipped.
    pub fn unconfigured() -> Self {
        Self::new(Settings::default())
    }

    /// A fixture whose timestamp service serves `history`.
    pub fn with_history(settings: Settings, history: Vec<RemoteSubmissionEntry>) -> Self {
        Self {
            settings,
            ledger: Arc::new(MemoryLedger::new()),
            api: Arc::new(MemoryTimestampApi::with_history(history)),
            mailer: Arc::new(MemoryMailer::new()),
        }
    }

    pub fn client(&self) -> SubmissionClient<MemoryTimestampApi, MemoryMailer> {
        SubmissionClient::new(
            self.settings.clone(),
            Arc::clone(&self.api),
            Arc::clone(&self.mailer),
        )
    }

    pub fn stamper(&self) -> Stamper<MemoryLedger, MemoryTimestampApi, MemoryMailer> {
        Stamper::new(Arc::clone(&self.ledger), self.client())
    }

    pub fn gateway(&self) -> RetrievalGateway<MemoryLedger, MemoryTimestampApi> {
        RetrievalGateway::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.api),
            self.settings.clone(),
            GatewayConfig::default(),
        )
    }

    pub fn services(&self) -> Services<MemoryLedger, MemoryTimestampApi, MemoryMailer> {
        Services::build(
            self.settings.clone(),
            Arc::clone(&self.ledger),
            Arc::clone(&self.api),
            Arc::clone(&self.mailer),
            GatewayConfig::default(),
        )
    }
}

/// `count` synthetic history entries. Every third one is confirmed.
pub fn remote_history(count: u64) -> Vec<RemoteSubmissionEntry> {
    (0..count)
        .map(|i| RemoteSubmissionEntry {
            hash_string: format!("{:064x}", i + 1),
            date_created: 1_500_000_000_000 + (i as i64) * 60_000,
            submit_status: SubmitStatus {
                multi_seed: if i % 3 == 0 { SubmitStatus::CONFIRMED } else { 0 },
            },
            email: None,
        })
        .collect()
}
