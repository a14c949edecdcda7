//! # OriginStamp Testkit
//!
//! Testing utilities for OriginStamp.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known inputs with expected payloads and digests
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: In-memory collaborators wired into a stamper and gateway
//!
//! ## Golden Vectors
//!
//! ```rust
//! use originstamp_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     assert_eq!(vector.fingerprint().digest.to_hex(), vector.digest);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use originstamp_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::configured();
//! let stamper = fixture.stamper();
//! # let _ = stamper;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{remote_history, TestFixture};
pub use vectors::{all_vectors, GoldenVector};
