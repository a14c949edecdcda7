//! # OriginStamp Client
//!
//! Outbound side of the stamping workflow: submits digests to the
//! timestamping service and mails the author a copy of the hashed text.
//!
//! ## Key Types
//!
//! - [`TimestampApi`] - The seam to the remote service
//! - [`HttpTimestampApi`] - reqwest implementation
//! - [`Mailer`] - Outbound mail; [`SpoolMailer`] writes to a pickup directory
//! - [`SubmissionClient`] - Runs the remote call and the email concurrently
//!
//! ## Failure model
//!
//! Submission is best-effort. [`SubmissionClient::submit`] never returns an
//! error: a missing credential or address skips the step, a remote failure
//! is logged and reported by email, and the outcome of each step is recorded
//! in the [`SubmissionReport`].

pub mod api;
pub mod error;
pub mod http;
pub mod mail;
pub mod submission;

pub use api::memory::MemoryTimestampApi;
pub use api::{RemoteAck, SubmitRequest, TableRequest, TableResponse, TimestampApi};
pub use error::{ClientError, Result};
pub use http::{HttpConfig, HttpTimestampApi, DEFAULT_ENDPOINT};
pub use mail::memory::MemoryMailer;
pub use mail::{confirmation_email, failure_email, Attachment, Email, Mailer, SpoolMailer};
pub use submission::{EmailOutcome, RemoteOutcome, SubmissionClient, SubmissionReport};
