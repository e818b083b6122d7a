//! Fixed-length bit-vector fingerprints.

use retroprio_common::FingerprintSection;
use serde::{Deserialize, Serialize};

/// Parameters a fingerprint was (or must be) computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintParams {
    /// Circular neighbourhood radius (default: 2)
    pub radius: u32,

    /// Number of bits (default: 2048)
    pub length: usize,

    /// Include stereo information (default: true)
    pub use_chirality: bool,
}

impl Default for FingerprintParams {
    fn default() -> Self {
        Self {
            radius: 2,
            length: 2048,
            use_chirality: true,
        }
    }
}

impl FingerprintParams {
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_chirality(mut self, use_chirality: bool) -> Self {
        self.use_chirality = use_chirality;
        self
    }
}

impl From<&FingerprintSection> for FingerprintParams {
    fn from(section: &FingerprintSection) -> Self {
        Self {
            radius: section.radius,
            length: section.length,
            use_chirality: section.use_chirality,
        }
    }
}

/// An immutable fixed-length boolean fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bits: Vec<bool>,
}

impl Fingerprint {
    /// The neutral fingerprint: `length` unset bits.
    pub fn zeros(length: usize) -> Self {
        Self { bits: vec![false; length] }
    }

    /// Build from the indices of set bits. Indices outside `0..length` are ignored.
    pub fn from_on_bits(length: usize, on_bits: &[usize]) -> Self {
        let mut bits = vec![false; length];
        for &i in on_bits {
            if let Some(bit) = bits.get_mut(i) {
                *bit = true;
            }
        }
        Self { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_zero(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Indices of the set bits, ascending.
    pub fn on_bits(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    /// Bits cast to 0.0 / 1.0, the network's input encoding.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.bits.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zeros_has_no_bits_set() {
        let fp = Fingerprint::zeros(2048);
        assert_eq!(fp.len(), 2048);
        assert!(fp.is_zero());
        assert_eq!(fp.count_ones(), 0);
    }

    #[test]
    fn test_from_on_bits_ignores_out_of_range() {
        let fp = Fingerprint::from_on_bits(8, &[0, 3, 3, 7, 8, 100]);
        assert_eq!(fp.len(), 8);
        assert_eq!(fp.on_bits(), vec![0, 3, 7]);
    }

    #[test]
    fn test_f32_encoding() {
        let fp = Fingerprint::from_on_bits(4, &[1, 2]);
        assert_eq!(fp.to_f32_vec(), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_params_from_config_section() {
        let section = FingerprintSection {
            length: 1024,
            radius: 3,
            use_chirality: false,
            ..Default::default()
        };
        let params = FingerprintParams::from(&section);
        assert_eq!(
            params,
            FingerprintParams::default()
                .with_length(1024)
                .with_radius(3)
                .with_chirality(false)
        );
    }
}
