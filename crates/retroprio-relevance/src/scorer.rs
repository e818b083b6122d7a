//! Feed-forward relevance network.

use std::path::Path;

use candle_core::{Device, Tensor};
use retroprio_fingerprint::Fingerprint;
use tracing::debug;

use crate::error::{RelevanceError, Result};
use crate::weights::WeightSet;

/// Applies the relevance network to fingerprints.
///
/// Each layer computes `x = x·W + b`, with ReLU after every layer except the
/// last. The last layer's output is the raw score vector, one entry per
/// template in descending training-time popularity.
///
/// Immutable once built; share it across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    weights: WeightSet,
    device: Device,
}

impl RelevanceScorer {
    pub fn new(weights: WeightSet) -> Self {
        Self {
            weights,
            device: Device::Cpu,
        }
    }

    /// Load weights from the first existing candidate path.
    pub fn from_search_paths<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        let (weights, _) = WeightSet::load_first_existing(candidates)?;
        Ok(Self::new(weights))
    }

    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    pub fn input_dim(&self) -> usize {
        self.weights.input_dim()
    }

    pub fn output_dim(&self) -> usize {
        self.weights.output_dim()
    }

    /// Raw (pre-softmax) scores for one fingerprint.
    pub fn score(&self, fingerprint: &Fingerprint) -> Result<Vec<f32>> {
        let mut rows = self.score_batch(std::slice::from_ref(fingerprint))?;
        rows.pop().ok_or_else(|| RelevanceError::Inference("network returned no rows".into()))
    }

    /// Raw scores for several fingerprints in one forward pass.
    pub fn score_batch(&self, fingerprints: &[Fingerprint]) -> Result<Vec<Vec<f32>>> {
        if fingerprints.is_empty() {
            return Ok(Vec::new());
        }

        let input_dim = self.input_dim();
        let mut data = Vec::with_capacity(fingerprints.len() * input_dim);
        for fp in fingerprints {
            if fp.len() != input_dim {
                return Err(RelevanceError::Configuration(format!(
                    "fingerprint has {} bits, network expects {input_dim}",
                    fp.len()
                )));
            }
            data.extend(fp.to_f32_vec());
        }

        let x = Tensor::from_vec(data, (fingerprints.len(), input_dim), &self.device)?;
        let scores = self.forward(x)?;
        debug!("Scored {} fingerprints -> {:?}", fingerprints.len(), scores.dims());
        Ok(scores.to_vec2::<f32>()?)
    }

    fn forward(&self, x: Tensor) -> Result<Tensor> {
        let last = self.weights.depth() - 1;
        let mut x = x;
        for (i, layer) in self.weights.layers().iter().enumerate() {
            x = x.matmul(&layer.weight)?.broadcast_add(&layer.bias)?;
            if i != last {
                x = x.relu()?;
            }
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use pretty_assertions::assert_eq;

    fn tensor(data: &[f32], shape: &[usize]) -> Tensor {
        Tensor::from_slice(data, shape, &Device::Cpu).unwrap()
    }

    /// 3 -> 2 -> 2 network with a hidden unit that goes negative.
    fn two_layer() -> RelevanceScorer {
        let weights = WeightSet::from_arrays(vec![
            tensor(&[1.0, -1.0, 1.0, -1.0, 1.0, -1.0], &[3, 2]),
            tensor(&[0.0, 0.5], &[2]),
            tensor(&[2.0, 0.0, 0.0, 3.0], &[2, 2]),
            tensor(&[-1.0, -1.0], &[2]),
        ])
        .unwrap();
        RelevanceScorer::new(weights)
    }

    #[test]
    fn test_relu_between_layers_not_after_last() {
        let scorer = two_layer();
        let fp = Fingerprint::from_on_bits(3, &[0, 1, 2]);
        // hidden = [3, -2.5] -> relu -> [3, 0]; out = [6 - 1, 0 - 1]
        assert_eq!(scorer.score(&fp).unwrap(), vec![5.0, -1.0]);
    }

    #[test]
    fn test_zero_fingerprint_scores_biases() {
        let scorer = two_layer();
        // hidden = [0, 0.5]; out = [-1, 1.5 - 1]
        assert_eq!(scorer.score(&Fingerprint::zeros(3)).unwrap(), vec![-1.0, 0.5]);
    }

    #[test]
    fn test_batch_matches_single() {
        let scorer = two_layer();
        let fps = vec![
            Fingerprint::from_on_bits(3, &[0]),
            Fingerprint::from_on_bits(3, &[1, 2]),
        ];
        let batch = scorer.score_batch(&fps).unwrap();
        assert_eq!(batch.len(), 2);
        for (fp, row) in fps.iter().zip(batch) {
            assert_eq!(scorer.score(fp).unwrap(), row);
        }
        assert!(scorer.score_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_output_length_is_template_count() {
        let weights = WeightSet::from_arrays(vec![
            Tensor::ones((16, 7), DType::F32, &Device::Cpu).unwrap(),
            Tensor::zeros(7, DType::F32, &Device::Cpu).unwrap(),
        ])
        .unwrap();
        let scorer = RelevanceScorer::new(weights);
        let scores = scorer.score(&Fingerprint::from_on_bits(16, &[1, 2])).unwrap();
        assert_eq!(scores.len(), scorer.output_dim());
        assert_eq!(scores, vec![2.0; 7]);
    }

    #[test]
    fn test_length_mismatch_is_configuration_error() {
        let err = two_layer().score(&Fingerprint::zeros(2048)).unwrap_err();
        assert!(matches!(err, RelevanceError::Configuration(_)));
    }
}
