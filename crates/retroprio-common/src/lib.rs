//! retroprio-common — Shared configuration and errors used across the retroprio crates.

pub mod config;
pub mod error;

pub use config::{FingerprintSection, RelevanceSection, RetroprioConfig, TemplatesSection};
pub use error::{ConfigError, Result};
