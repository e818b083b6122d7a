//! Top-k selection and softmax over raw relevance scores.

use candle_core::{Device, Tensor};

use crate::error::Result;

/// Indices of the `k` largest scores, highest first.
///
/// `k` is clamped to `scores.len()`. Equal scores keep index order, so the
/// lower index ranks first.
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }

    let by_score_desc =
        |a: &usize, b: &usize| scores[*b].total_cmp(&scores[*a]).then_with(|| a.cmp(b));

    let mut indices: Vec<usize> = (0..scores.len()).collect();
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, by_score_desc);
        indices.truncate(k);
    }
    indices.sort_unstable_by(by_score_desc);
    indices
}

/// Numerically stable softmax: `exp(s_i - max(s)) / Σ exp(s_j - max(s))`.
pub fn softmax(scores: &[f32]) -> Result<Vec<f32>> {
    if scores.is_empty() {
        return Ok(Vec::new());
    }
    let t = Tensor::from_slice(scores, scores.len(), &Device::Cpu)?;
    Ok(candle_nn::ops::softmax_last_dim(&t)?.to_vec1::<f32>()?)
}
