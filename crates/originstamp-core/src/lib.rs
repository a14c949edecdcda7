//! # OriginStamp Core
//!
//! Pure primitives for OriginStamp: content normalization, SHA-256
//! fingerprints and the records that flow through the stamping workflow.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ContentDigest`] - Content-addressed identifier (SHA-256)
//! - [`Fingerprint`] - Normalized title/body plus their digest
//! - [`FingerprintRecord`] - What the local ledger stores
//! - [`RemoteSubmissionEntry`] - One row of the service's submission history
//! - [`Settings`] - API credential and notification address
//!
//! ## Fingerprinting
//!
//! ```rust
//! use originstamp_core::fingerprint;
//!
//! let fp = fingerprint("Hello  World", "<p>Line1\n\nLine2</p>");
//! assert_eq!(fp.payload(), "Hello WorldLine1 Line2");
//! ```

pub mod error;
pub mod fingerprint;
pub mod record;
pub mod settings;
pub mod types;

pub use error::{CoreError, Result};
pub use fingerprint::{
    digest_payload, fingerprint, fingerprint_bytes, normalize, verify_payload, Fingerprint,
};
pub use record::{EditEvent, FingerprintRecord, RemoteSubmissionEntry, SubmitStatus};
pub use settings::Settings;
pub use types::ContentDigest;
