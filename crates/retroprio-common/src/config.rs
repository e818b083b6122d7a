//! Configuration loading for retroprio.
//! Reads retroprio.toml from the current directory or the path in the RETROPRIO_CONFIG env var.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const CONFIG_ENV_VAR: &str = "RETROPRIO_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "retroprio.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetroprioConfig {
    #[serde(default)]
    pub fingerprint: FingerprintSection,
    #[serde(default)]
    pub relevance: RelevanceSection,
    #[serde(default)]
    pub templates: TemplatesSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintSection {
    #[serde(default = "default_fp_length")]
    pub length: usize,
    #[serde(default = "default_fp_radius")]
    pub radius: u32,
    #[serde(default = "bool_true")]
    pub use_chirality: bool,
    /// Precomputed fingerprint table (JSON).
    #[serde(default = "default_fp_table")]
    pub table: PathBuf,
}

fn default_fp_length() -> usize   { 2048 }
fn default_fp_radius() -> u32     { 2 }
fn bool_true()         -> bool    { true }
fn default_fp_table()  -> PathBuf { PathBuf::from("data/fingerprints.json") }

impl Default for FingerprintSection {
    fn default() -> Self {
        Self {
            length: default_fp_length(),
            radius: default_fp_radius(),
            use_chirality: bool_true(),
            table: default_fp_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceSection {
    #[serde(default = "default_template_count")]
    pub template_count: usize,
    #[serde(default = "default_max_cum_prob")]
    pub max_cum_prob: f32,
    /// Candidate weight files, tried in order; the first that exists is loaded.
    #[serde(default = "default_weight_paths")]
    pub weight_paths: Vec<PathBuf>,
}

fn default_template_count() -> usize { 100 }
fn default_max_cum_prob()   -> f32   { 1.0 }

fn default_weight_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("../prioritizers/template/template_relevance_network_weights.npz"),
        PathBuf::from("prioritizers/template/template_relevance_network_weights.npz"),
    ]
}

impl Default for RelevanceSection {
    fn default() -> Self {
        Self {
            template_count: default_template_count(),
            max_cum_prob: default_max_cum_prob(),
            weight_paths: default_weight_paths(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesSection {
    /// Template library sorted by descending training-time popularity (JSON).
    #[serde(default = "default_templates_path")]
    pub path: PathBuf,
}

fn default_templates_path() -> PathBuf { PathBuf::from("data/templates.json") }

impl Default for TemplatesSection {
    fn default() -> Self {
        Self { path: default_templates_path() }
    }
}

impl RetroprioConfig {
    /// Load configuration from retroprio.toml.
    /// Checks the RETROPRIO_CONFIG env var first, then the current directory.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_path(path)
    }

    /// Load and validate configuration from an explicit TOML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fingerprint.length == 0 {
            return Err(ConfigError::Invalid("fingerprint.length must be positive".into()));
        }
        if !self.relevance.max_cum_prob.is_finite() || self.relevance.max_cum_prob <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "relevance.max_cum_prob must be a positive number, got {}",
                self.relevance.max_cum_prob
            )));
        }
        if self.relevance.weight_paths.is_empty() {
            return Err(ConfigError::Invalid("relevance.weight_paths must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_match_network_training() {
        let config = RetroprioConfig::default();
        assert_eq!(config.fingerprint.length, 2048);
        assert_eq!(config.fingerprint.radius, 2);
        assert!(config.fingerprint.use_chirality);
        assert_eq!(config.relevance.template_count, 100);
        assert_eq!(config.relevance.max_cum_prob, 1.0);
    }

    #[test]
    fn test_parent_path_searched_before_local() {
        let paths = default_weight_paths();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].starts_with(".."));
        assert!(!paths[1].starts_with(".."));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = RetroprioConfig::from_toml_str(
            r#"
            [relevance]
            template_count = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.relevance.template_count, 50);
        assert_eq!(config.relevance.max_cum_prob, 1.0);
        assert_eq!(config.fingerprint.length, 2048);
    }

    #[test]
    fn test_rejects_non_positive_budget() {
        let err = RetroprioConfig::from_toml_str(
            r#"
            [relevance]
            max_cum_prob = 0.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fingerprint]\nlength = 1024\nradius = 3").unwrap();

        let config = RetroprioConfig::from_path(file.path()).unwrap();
        assert_eq!(config.fingerprint.length, 1024);
        assert_eq!(config.fingerprint.radius, 3);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = RetroprioConfig::from_path("/nonexistent/retroprio.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
