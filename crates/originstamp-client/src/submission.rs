//! Best-effort submission of a fingerprint: remote timestamp plus email.
//!
//! The remote POST and the confirmation email are independent. Both are
//! attempted concurrently; neither waits for nor depends on the other, and
//! neither failure aborts the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use originstamp_core::{ContentDigest, Fingerprint, Settings};

use crate::api::{RemoteAck, SubmitRequest, TimestampApi};
use crate::error::ClientError;
use crate::mail::{confirmation_email, failure_email, Mailer};

/// What happened to the remote submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoteOutcome {
    /// No credential configured; nothing was sent.
    Skipped,
    /// The service accepted the digest.
    Acknowledged(RemoteAck),
    /// The call failed. Not retried.
    Failed { error: String },
}

/// What happened to the confirmation email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EmailOutcome {
    Sent,
    /// No address configured.
    Skipped,
    Failed { error: String },
}

/// Outcome of [`SubmissionClient::submit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub digest: ContentDigest,
    pub remote: RemoteOutcome,
    pub email: EmailOutcome,
}

/// Sends fingerprints to the timestamping service and mails confirmations.
pub struct SubmissionClient<A, M> {
    settings: Settings,
    api: Arc<A>,
    mailer: Arc<M>,
}

impl<A: TimestampApi, M: Mailer> SubmissionClient<A, M> {
    pub fn new(settings: Settings, api: Arc<A>, mailer: Arc<M>) -> Self {
        Self {
            settings,
            api,
            mailer,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Submit `fingerprint`. Never fails; every outcome is in the report.
    pub async fn submit(&self, fingerprint: &Fingerprint) -> SubmissionReport {
        let (remote, email) = tokio::join!(self.post(fingerprint), self.confirm(fingerprint));
        SubmissionReport {
            digest: fingerprint.digest,
            remote,
            email,
        }
    }

    async fn post(&self, fingerprint: &Fingerprint) -> RemoteOutcome {
        let digest = fingerprint.digest;
        let Some(api_key) = self.settings.api_key() else {
            debug!(digest = %digest, "No API key configured, skipping submission");
            return RemoteOutcome::Skipped;
        };

        let request = SubmitRequest {
            hash_string: digest.to_hex(),
            email: self.settings.notify_email().unwrap_or_default().to_string(),
        };

        match self.api.submit(api_key, &request).await {
            Ok(ack) => {
                info!(digest = %digest, status = ack.status, "Digest submitted");
                RemoteOutcome::Acknowledged(ack)
            }
            Err(e) => {
                warn!(digest = %digest, error = %e, "Submission failed");
                self.report_failure(&e).await;
                RemoteOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn report_failure(&self, error: &ClientError) {
        let Some(to) = self.settings.notify_email() else {
            return;
        };
        if let Err(e) = self.mailer.send(&failure_email(to, error)).await {
            warn!(error = %e, "Could not send failure notice");
        }
    }

    async fn confirm(&self, fingerprint: &Fingerprint) -> EmailOutcome {
        let Some(to) = self.settings.notify_email() else {
            return EmailOutcome::Skipped;
        };

        match self.mailer.send(&confirmation_email(to, fingerprint)).await {
            Ok(()) => EmailOutcome::Sent,
            Err(e) => {
                warn!(digest = %fingerprint.digest, error = %e, "Confirmation email failed");
                EmailOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryTimestampApi;
    use crate::mail::memory::MemoryMailer;
    use crate::mail::FAILURE_SUBJECT;
    use originstamp_core::fingerprint;

    fn client(
        settings: Settings,
    ) -> (
        SubmissionClient<MemoryTimestampApi, MemoryMailer>,
        Arc<MemoryTimestampApi>,
        Arc<MemoryMailer>,
    ) {
        let api = Arc::new(MemoryTimestampApi::new());
        let mailer = Arc::new(MemoryMailer::new());
        (
            SubmissionClient::new(settings, api.clone(), mailer.clone()),
            api,
            mailer,
        )
    }

    #[tokio::test]
    async fn test_fully_configured_submit() {
        let (client, api, mailer) = client(Settings::new(
            Some("key".into()),
            Some("author@example.org".into()),
        ));
        let fp = fingerprint("Title", "Body");
        let report = client.submit(&fp).await;

        assert!(matches!(report.remote, RemoteOutcome::Acknowledged(_)));
        assert_eq!(report.email, EmailOutcome::Sent);

        let submissions = api.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].0, "key");
        assert_eq!(submissions[0].1.hash_string, fp.digest.to_hex());
        assert_eq!(submissions[0].1.email, "author@example.org");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, format!("OriginStamp {}", fp.digest));
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_calls() {
        let (client, api, mailer) = client(Settings::new(None, Some("a@example.org".into())));
        let report = client.submit(&fingerprint("Title", "Body")).await;

        assert_eq!(report.remote, RemoteOutcome::Skipped);
        assert_eq!(report.email, EmailOutcome::Sent);
        assert_eq!(api.call_count(), 0);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_email_sends_nothing() {
        let (client, api, mailer) = client(Settings::new(Some("key".into()), Some("  ".into())));
        let report = client.submit(&fingerprint("Title", "Body")).await;

        assert_eq!(report.email, EmailOutcome::Skipped);
        assert_eq!(api.submissions()[0].1.email, "");
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_sends_diagnostic() {
        let (client, api, mailer) = client(Settings::new(
            Some("key".into()),
            Some("author@example.org".into()),
        ));
        api.fail_submissions("connection refused");

        let report = client.submit(&fingerprint("Title", "Body")).await;
        assert!(matches!(report.remote, RemoteOutcome::Failed { .. }));
        assert_eq!(report.email, EmailOutcome::Sent);

        let subjects: Vec<String> = mailer.sent().into_iter().map(|e| e.subject).collect();
        assert_eq!(subjects.len(), 2);
        assert!(subjects.iter().any(|s| s == FAILURE_SUBJECT));
        assert_eq!(api.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_affect_remote() {
        let (client, _api, mailer) = client(Settings::new(
            Some("key".into()),
            Some("author@example.org".into()),
        ));
        mailer.fail_sends();

        let report = client.submit(&fingerprint("Title", "Body")).await;
        assert!(matches!(report.remote, RemoteOutcome::Acknowledged(_)));
        assert!(matches!(report.email, EmailOutcome::Failed { .. }));
    }

    #[test]
    fn test_report_serializes_tagged() {
        let report = SubmissionReport {
            digest: fingerprint("", "").digest,
            remote: RemoteOutcome::Skipped,
            email: EmailOutcome::Failed {
                error: "x".into(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["remote"]["outcome"], "skipped");
        assert_eq!(json["email"]["outcome"], "failed");
        assert_eq!(json["email"]["error"], "x");
    }
}
