//! # OriginStamp
//!
//! Content fingerprinting service. Every save of a piece of authored content
//! is normalized, hashed with SHA-256, recorded in a local ledger, submitted to
//! the OriginStamp timestamping service, and mailed back to the author.
//!
//! ## Overview
//!
//! - [`Stamper`] - edit event → fingerprint → ledger → submission
//! - [`RetrievalGateway`] - stored text by digest, paged remote history
//! - [`server`] - the HTTP surface (axum)
//! - [`config`] - deployment configuration and settings resolution
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use originstamp::Stamper;
//! use originstamp::client::{HttpConfig, HttpTimestampApi, SpoolMailer, SubmissionClient};
//! use originstamp::core::{EditEvent, Settings};
//! use originstamp::store::SqliteLedger;
//!
//! async fn example() {
//!     let ledger = Arc::new(SqliteLedger::open("originstamp.db").unwrap());
//!     let api = Arc::new(HttpTimestampApi::new(HttpConfig::default()).unwrap());
//!     let mailer = Arc::new(SpoolMailer::new("spool", "originstamp@localhost"));
//!     let settings = Settings::new(Some("api-key".into()), Some("me@example.org".into()));
//!
//!     let stamper = Stamper::new(ledger, SubmissionClient::new(settings, api, mailer));
//!     let report = stamper
//!         .on_save(&EditEvent::new("42", "Hello  World", "<p>Line1\n\nLine2</p>"))
//!         .await;
//!     println!("{:?}", report.digest());
//! }
//! ```
//!
//! ## Failure model
//!
//! A save never fails. Ledger, remote and mail problems are logged and
//! reported in the [`SaveReport`]; a missing credential or address simply
//! skips the corresponding step.

pub mod config;
pub mod error;
pub mod gateway;
pub mod server;
pub mod services;
pub mod stamper;

// Re-export component crates
pub use originstamp_client as client;
pub use originstamp_core as core;
pub use originstamp_store as store;

pub use config::{load_config, resolve_settings, AppConfig};
pub use error::{AppError, GatewayError};
pub use gateway::{
    GatewayConfig, HistoryRow, PageWindow, RemotePage, RetrievalGateway, SubmissionState,
};
pub use server::{build_router, serve, AppState};
pub use services::Services;
pub use stamper::{LedgerOutcome, SaveReport, Stamper};
