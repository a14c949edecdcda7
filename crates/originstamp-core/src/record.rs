//! Records exchanged between the ledger, the workflow and the remote service.

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::types::ContentDigest;

/// A locally stored fingerprint. Inserted once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Content address and primary key.
    pub digest: ContentDigest,
    /// Normalized title.
    pub title: String,
    /// Normalized body.
    pub body: String,
    /// When the record was first inserted (Unix ms).
    pub created_at: i64,
}

impl FingerprintRecord {
    /// Build a record from a fingerprint, stamped with `created_at`.
    pub fn from_fingerprint(fingerprint: &Fingerprint, created_at: i64) -> Self {
        Self {
            digest: fingerprint.digest,
            title: fingerprint.title.clone(),
            body: fingerprint.body.clone(),
            created_at,
        }
    }

    /// The hashed payload: `title || body`.
    pub fn payload(&self) -> String {
        format!("{}{}", self.title, self.body)
    }
}

/// A save notification from the host content system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditEvent {
    /// Host identifier of the content item (post id, path, ...).
    pub content_id: String,
    /// Raw title, possibly containing markup.
    pub title: String,
    /// Raw body, possibly containing markup.
    pub body: String,
    /// Autosave/revision events are not stamped.
    #[serde(default)]
    pub revision: bool,
}

impl EditEvent {
    /// A regular (non-revision) save.
    pub fn new(
        content_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            title: title.into(),
            body: body.into(),
            revision: false,
        }
    }
}

/// Seed status reported by the timestamping service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitStatus {
    /// `3` once the hash is anchored.
    #[serde(default)]
    pub multi_seed: i32,
}

impl SubmitStatus {
    /// Value of `multi_seed` for an anchored hash.
    pub const CONFIRMED: i32 = 3;

    pub fn is_confirmed(&self) -> bool {
        self.multi_seed == Self::CONFIRMED
    }
}

/// One row of the remote submission history. Owned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubmissionEntry {
    pub hash_string: String,
    /// Epoch milliseconds.
    pub date_created: i64,
    #[serde(default)]
    pub submit_status: SubmitStatus,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;

    #[test]
    fn test_record_payload_matches_fingerprint() {
        let fp = fingerprint("Hello  World", "<p>Line1\n\nLine2</p>");
        let record = FingerprintRecord::from_fingerprint(&fp, 1_000);
        assert_eq!(record.payload(), fp.payload());
        assert_eq!(record.digest, fp.digest);
        assert_eq!(record.created_at, 1_000);
    }

    #[test]
    fn test_remote_entry_decodes_service_json() {
        let json = r#"{
            "hash_string": "abc",
            "date_created": 1500000000000,
            "submit_status": {"multi_seed": 3},
            "comment": "ignored"
        }"#;
        let entry: RemoteSubmissionEntry = serde_json::from_str(json).unwrap();
        assert!(entry.submit_status.is_confirmed());
        assert_eq!(entry.email, None);

        let pending: RemoteSubmissionEntry =
            serde_json::from_str(r#"{"hash_string":"abc","date_created":0}"#).unwrap();
        assert!(!pending.submit_status.is_confirmed());
    }

    #[test]
    fn test_edit_event_revision_defaults_false() {
        let event: EditEvent =
            serde_json::from_str(r#"{"content_id":"7","title":"t","body":"b"}"#).unwrap();
        assert!(!event.revision);
    }
}
