//! Neutral-fingerprint policy over a [`Fingerprinter`].

use tracing::{debug, warn};

use crate::fingerprint::{Fingerprint, FingerprintParams};
use crate::provider::Fingerprinter;

/// Turns structure strings into fingerprints of exactly `params.length` bits.
pub struct FingerprintAdapter {
    provider: Box<dyn Fingerprinter>,
    params: FingerprintParams,
}

impl FingerprintAdapter {
    pub fn new(provider: impl Fingerprinter + 'static, params: FingerprintParams) -> Self {
        Self {
            provider: Box::new(provider),
            params,
        }
    }

    pub fn params(&self) -> &FingerprintParams {
        &self.params
    }

    /// Fingerprint a structure, or None if it is empty or unparsable.
    pub fn try_fingerprint(&self, structure: Option<&str>) -> Option<Fingerprint> {
        let structure = structure.map(str::trim).filter(|s| !s.is_empty())?;

        let fp = self.provider.fingerprint(structure, &self.params)?;
        if fp.len() != self.params.length {
            warn!(
                "Provider returned {} bits for {}, expected {}",
                fp.len(),
                structure,
                self.params.length
            );
            return None;
        }
        debug!("Fingerprint for {}: {} bits set", structure, fp.count_ones());
        Some(fp)
    }

    /// Fingerprint a structure. Never fails: empty or unparsable input yields
    /// the all-zero fingerprint of the configured length.
    pub fn to_fingerprint(&self, structure: Option<&str>) -> Fingerprint {
        self.try_fingerprint(structure)
            .unwrap_or_else(|| Fingerprint::zeros(self.params.length))
    }
}

impl std::fmt::Debug for FingerprintAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintAdapter")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FingerprintTable;

    /// Ignores the requested length.
    struct ShortProvider;

    impl Fingerprinter for ShortProvider {
        fn fingerprint(
            &self,
            _structure: &str,
            _params: &FingerprintParams,
        ) -> Option<Fingerprint> {
            Some(Fingerprint::from_on_bits(16, &[0, 1]))
        }
    }

    fn adapter() -> FingerprintAdapter {
        let params = FingerprintParams::default();
        let table = FingerprintTable::new(params)
            .with("CCCOCCC", &[3, 650, 2047])
            .unwrap();
        FingerprintAdapter::new(table, params)
    }

    #[test]
    fn test_valid_structure() {
        let fp = adapter().to_fingerprint(Some("CCCOCCC"));
        assert_eq!(fp.len(), 2048);
        assert_eq!(fp.on_bits(), vec![3, 650, 2047]);
    }

    #[test]
    fn test_empty_and_missing_are_zero() {
        let adapter = adapter();
        for input in [None, Some(""), Some("   ")] {
            let fp = adapter.to_fingerprint(input);
            assert_eq!(fp, Fingerprint::zeros(2048));
            assert!(adapter.try_fingerprint(input).is_none());
        }
    }

    #[test]
    fn test_unparsable_is_zero() {
        let fp = adapter().to_fingerprint(Some("C1CC(("));
        assert_eq!(fp.len(), 2048);
        assert!(fp.is_zero());
    }

    #[test]
    fn test_wrong_length_from_provider_is_rejected() {
        let adapter = FingerprintAdapter::new(ShortProvider, FingerprintParams::default());
        assert!(adapter.try_fingerprint(Some("CCO")).is_none());
        assert_eq!(adapter.to_fingerprint(Some("CCO")).len(), 2048);
    }
}
