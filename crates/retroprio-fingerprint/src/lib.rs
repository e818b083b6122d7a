//! retroprio-fingerprint — Molecular fingerprints for template relevance scoring.
//!
//! Fingerprinting itself is delegated to an external cheminformatics capability,
//! expressed as the [`Fingerprinter`] trait. This crate adds the policy around it:
//! every structure maps to a vector of exactly the configured length, and empty
//! or unparsable structures map to the all-zero vector.
//!
//! # Example
//! ```rust
//! use retroprio_fingerprint::{FingerprintAdapter, FingerprintParams, FingerprintTable};
//!
//! # fn main() -> retroprio_fingerprint::Result<()> {
//! let table = FingerprintTable::new(FingerprintParams::default())
//!     .with("CCO", &[1, 80, 1024])?;
//! let adapter = FingerprintAdapter::new(table, FingerprintParams::default());
//!
//! assert_eq!(adapter.to_fingerprint(Some("CCO")).count_ones(), 3);
//! assert_eq!(adapter.to_fingerprint(None).count_ones(), 0);
//! assert_eq!(adapter.to_fingerprint(Some("not a molecule")).len(), 2048);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod error;
pub mod fingerprint;
pub mod provider;

pub use adapter::FingerprintAdapter;
pub use error::{FingerprintError, Result};
pub use fingerprint::{Fingerprint, FingerprintParams};
pub use provider::{FingerprintTable, Fingerprinter};
