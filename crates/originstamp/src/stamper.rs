//! The save workflow: edit event → fingerprint → ledger → submission.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use originstamp_client::{Mailer, SubmissionClient, SubmissionReport, TimestampApi};
use originstamp_core::{fingerprint, ContentDigest, EditEvent, FingerprintRecord};
use originstamp_store::{now_millis, InsertResult, Ledger};

/// What happened in the local ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LedgerOutcome {
    Inserted,
    /// The same content was stamped before; the first record is kept.
    AlreadyExists,
    Failed { error: String },
}

/// Outcome of [`Stamper::on_save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveReport {
    /// Revision and autosave events are not stamped.
    SkippedRevision { content_id: String },
    Stamped {
        content_id: String,
        digest: ContentDigest,
        ledger: LedgerOutcome,
        submission: SubmissionReport,
    },
}

impl SaveReport {
    /// The digest, unless the event was skipped.
    pub fn digest(&self) -> Option<ContentDigest> {
        match self {
            SaveReport::SkippedRevision { .. } => None,
            SaveReport::Stamped { digest, .. } => Some(*digest),
        }
    }
}

/// Runs the stamping workflow for every save.
pub struct Stamper<L, A, M> {
    ledger: Arc<L>,
    client: SubmissionClient<A, M>,
}

impl<L, A, M> Stamper<L, A, M>
where
    L: Ledger,
    A: TimestampApi,
    M: Mailer,
{
    pub fn new(ledger: Arc<L>, client: SubmissionClient<A, M>) -> Self {
        Self { ledger, client }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn client(&self) -> &SubmissionClient<A, M> {
        &self.client
    }

    /// Handle one save. Never fails: a ledger error is reported and the
    /// submission still goes out.
    pub async fn on_save(&self, event: &EditEvent) -> SaveReport {
        if event.revision {
            debug!(content_id = %event.content_id, "Skipping revision");
            return SaveReport::SkippedRevision {
                content_id: event.content_id.clone(),
            };
        }

        let fp = fingerprint(&event.title, &event.body);
        let record = FingerprintRecord::from_fingerprint(&fp, now_millis());

        let ledger = match self.ledger.insert(&record).await {
            Ok(InsertResult::Inserted) => {
                info!(content_id = %event.content_id, digest = %fp.digest, "Content fingerprinted");
                LedgerOutcome::Inserted
            }
            Ok(InsertResult::AlreadyExists) => {
                debug!(digest = %fp.digest, "Content already in ledger");
                LedgerOutcome::AlreadyExists
            }
            Err(e) => {
                warn!(digest = %fp.digest, error = %e, "Ledger insert failed");
                LedgerOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let submission = self.client.submit(&fp).await;

        SaveReport::Stamped {
            content_id: event.content_id.clone(),
            digest: fp.digest,
            ledger,
            submission,
        }
    }
}
