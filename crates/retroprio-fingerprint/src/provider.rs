//! Trait for fingerprint computation.
//!
//! Provides an abstraction over the cheminformatics toolkit that parses
//! structures and computes circular fingerprints, so the scorer is not
//! coupled to any particular toolkit.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FingerprintError, Result};
use crate::fingerprint::{Fingerprint, FingerprintParams};

/// Capability: structure string in, fixed-length bit vector out.
///
/// Implementations can use:
/// - A precomputed table exported from a toolkit (local)
/// - A toolkit binding or service (remote)
/// - Hardcoded data (testing)
pub trait Fingerprinter: Send + Sync {
    /// Compute the fingerprint of `structure` with the given parameters.
    ///
    /// Returns None if:
    /// - The structure cannot be parsed
    /// - The provider cannot honour `params`
    fn fingerprint(&self, structure: &str, params: &FingerprintParams) -> Option<Fingerprint>;
}

// ── Precomputed table ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    params: FingerprintParams,
    fingerprints: HashMap<String, Vec<usize>>,
}

/// Fingerprints precomputed by an external toolkit, keyed by structure string.
///
/// Stored as JSON:
/// `{"params": {"radius": 2, "length": 2048, "use_chirality": true},
///   "fingerprints": {"CCO": [80, 1057, 1380]}}`
#[derive(Debug, Clone)]
pub struct FingerprintTable {
    params: FingerprintParams,
    entries: HashMap<String, Vec<usize>>,
}

impl FingerprintTable {
    pub fn new(params: FingerprintParams) -> Self {
        Self {
            params,
            entries: HashMap::new(),
        }
    }

    /// Add a structure with the indices of its set bits.
    ///
    /// Fails with [`FingerprintError::InvalidTable`] if a bit is outside the
    /// table's fingerprint length, as loading from JSON does.
    pub fn with(mut self, structure: &str, on_bits: &[usize]) -> Result<Self> {
        check_entry(&self.params, structure, on_bits)?;
        self.entries.insert(structure.to_string(), on_bits.to_vec());
        Ok(self)
    }

    /// Load a table from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        info!(
            "Loaded {} precomputed fingerprints from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: TableFile = serde_json::from_str(content)?;
        if file.params.length == 0 {
            return Err(FingerprintError::InvalidTable("length must be positive".into()));
        }
        for (structure, on_bits) in &file.fingerprints {
            check_entry(&file.params, structure, on_bits)?;
        }
        Ok(Self {
            params: file.params,
            entries: file.fingerprints,
        })
    }

    pub fn params(&self) -> &FingerprintParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, structure: &str) -> bool {
        self.entries.contains_key(structure.trim())
    }
}

fn check_entry(params: &FingerprintParams, structure: &str, on_bits: &[usize]) -> Result<()> {
    match on_bits.iter().find(|&&i| i >= params.length) {
        Some(&bad) => Err(FingerprintError::InvalidTable(format!(
            "bit {} of {} out of range for length {}",
            bad, structure, params.length
        ))),
        None => Ok(()),
    }
}

impl Fingerprinter for FingerprintTable {
    fn fingerprint(&self, structure: &str, params: &FingerprintParams) -> Option<Fingerprint> {
        if *params != self.params {
            warn!(
                "Fingerprint table computed with {:?}, requested {:?}",
                self.params, params
            );
            return None;
        }
        let on_bits = self.entries.get(structure.trim());
        if on_bits.is_none() {
            debug!("No precomputed fingerprint for {}", structure);
        }
        on_bits.map(|bits| Fingerprint::from_on_bits(self.params.length, bits))
    }
}
