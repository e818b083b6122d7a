//! Trained weights for the template relevance network.
//!
//! A [`WeightSet`] is an ordered list of affine layers. On disk it is an ordered
//! list of arrays alternating weight matrix and bias vector:
//! `W0, b0, W1, b1, ...`. Two encodings are read:
//!
//! - NumPy `.npz`, as written by `numpy.savez(f, *arrays)`. Arrays are taken in
//!   archive order.
//! - `.safetensors`, with tensors named `arr_<n>` or `<prefix>.<layer>.weight` /
//!   `<prefix>.<layer>.bias`, ordered by their numeric index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use tracing::{debug, info};

use crate::error::{RelevanceError, Result};

/// One affine layer: `x·weight + bias`.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Shape (in_dim, out_dim)
    pub weight: Tensor,
    /// Shape (out_dim)
    pub bias: Tensor,
}

impl Layer {
    pub fn in_dim(&self) -> usize {
        self.weight.dims()[0]
    }

    pub fn out_dim(&self) -> usize {
        self.weight.dims()[1]
    }
}

/// Validated, read-only layer stack.
#[derive(Debug, Clone)]
pub struct WeightSet {
    layers: Vec<Layer>,
}

impl WeightSet {
    /// Build from arrays in storage order (weight, bias, weight, bias, ...).
    ///
    /// Fails if the list is empty or odd, a weight is not a matrix, a bias is
    /// not a vector of the layer's output width, consecutive layers do not
    /// chain, or any value is NaN or infinite.
    pub fn from_arrays(arrays: Vec<Tensor>) -> Result<Self> {
        if arrays.is_empty() {
            return Err(RelevanceError::Load("weight set is empty".into()));
        }
        if arrays.len() % 2 != 0 {
            return Err(RelevanceError::Load(format!(
                "expected weight/bias pairs, got {} arrays",
                arrays.len()
            )));
        }

        let mut layers = Vec::with_capacity(arrays.len() / 2);
        let mut arrays = arrays.into_iter();
        while let (Some(weight), Some(bias)) = (arrays.next(), arrays.next()) {
            let i = layers.len();
            if weight.rank() != 2 {
                return Err(RelevanceError::Load(format!(
                    "layer {i}: weight must be a matrix, got shape {:?}",
                    weight.dims()
                )));
            }
            if bias.rank() != 1 {
                return Err(RelevanceError::Load(format!(
                    "layer {i}: bias must be a vector, got shape {:?}",
                    bias.dims()
                )));
            }
            let (in_dim, out_dim) = (weight.dims()[0], weight.dims()[1]);
            if bias.dims()[0] != out_dim {
                return Err(RelevanceError::Load(format!(
                    "layer {i}: bias has {} entries, weight has {out_dim} outputs",
                    bias.dims()[0]
                )));
            }
            if let Some(prev) = layers.last().map(Layer::out_dim) {
                if prev != in_dim {
                    return Err(RelevanceError::Load(format!(
                        "layer {i}: expects {in_dim} inputs, previous layer produces {prev}"
                    )));
                }
            }
            let (weight, bias) = (to_f32(weight)?, to_f32(bias)?);
            check_finite(&weight, i, "weight")?;
            check_finite(&bias, i, "bias")?;
            layers.push(Layer { weight, bias });
        }

        Ok(Self { layers })
    }

    /// Load from a `.npz` or `.safetensors` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();

        let arrays: Vec<Tensor> = match path.extension().and_then(|e| e.to_str()) {
            Some("npz") => Tensor::read_npz(path)
                .map_err(|e| RelevanceError::Load(format!("{}: {e}", path.display())))?
                .into_iter()
                .map(|(_, t)| t)
                .collect(),
            Some("safetensors") => {
                let tensors = candle_core::safetensors::load(path, &Device::Cpu)
                    .map_err(|e| RelevanceError::Load(format!("{}: {e}", path.display())))?;
                order_named_tensors(tensors)?
            }
            _ => {
                return Err(RelevanceError::Load(format!(
                    "unsupported weight format: {}",
                    path.display()
                )))
            }
        };

        let weights = Self::from_arrays(arrays)?;
        info!(
            "Loaded relevance network from {} in {:.2}s: {}",
            path.display(),
            start.elapsed().as_secs_f32(),
            weights.describe()
        );
        Ok(weights)
    }

    /// Load from the first candidate path that exists, returning that path.
    pub fn load_first_existing<P: AsRef<Path>>(candidates: &[P]) -> Result<(Self, PathBuf)> {
        for candidate in candidates {
            let path = candidate.as_ref();
            if path.is_file() {
                return Ok((Self::load(path)?, path.to_path_buf()));
            }
            debug!("No weight file at {}", path.display());
        }
        Err(RelevanceError::WeightsNotFound {
            searched: candidates.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Fingerprint length the network expects.
    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim()
    }

    /// Number of templates the network scores.
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim()
    }

    /// Layer widths, e.g. `2048 -> 1024 -> 163723`.
    pub fn describe(&self) -> String {
        let mut dims = vec![self.input_dim().to_string()];
        dims.extend(self.layers.iter().map(|l| l.out_dim().to_string()));
        dims.join(" -> ")
    }
}

fn to_f32(t: Tensor) -> Result<Tensor> {
    if t.dtype() == DType::F32 {
        return Ok(t);
    }
    t.to_dtype(DType::F32)
        .map_err(|e| RelevanceError::Load(format!("cannot convert {:?} to f32: {e}", t.dtype())))
}

/// `t - t` is zero for finite entries and NaN otherwise, so the sum is NaN
/// exactly when some entry is not finite.
fn check_finite(t: &Tensor, layer: usize, what: &str) -> Result<()> {
    let sum = t
        .sub(t)
        .and_then(|d| d.sum_all())
        .and_then(|s| s.to_scalar::<f32>())
        .map_err(|e| RelevanceError::Load(format!("layer {layer}: checking {what}: {e}")))?;
    if sum.is_nan() {
        return Err(RelevanceError::Load(format!(
            "layer {layer}: {what} contains NaN or infinite values"
        )));
    }
    Ok(())
}

/// Position of a named tensor in the weight/bias sequence.
fn storage_position(name: &str) -> Option<usize> {
    if let Some(stem) = name.strip_suffix(".weight") {
        return trailing_index(stem).and_then(|layer| layer.checked_mul(2));
    }
    if let Some(stem) = name.strip_suffix(".bias") {
        return trailing_index(stem)
            .and_then(|layer| layer.checked_mul(2))
            .and_then(|pos| pos.checked_add(1));
    }
    trailing_index(name)
}

fn trailing_index(name: &str) -> Option<usize> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    name[name.len() - digits..].parse().ok()
}

fn order_named_tensors(tensors: HashMap<String, Tensor>) -> Result<Vec<Tensor>> {
    let mut positioned = Vec::with_capacity(tensors.len());
    for (name, tensor) in tensors {
        let pos = storage_position(&name)
            .ok_or_else(|| RelevanceError::Load(format!("cannot order tensor {name:?}")))?;
        positioned.push((pos, name, tensor));
    }
    positioned.sort_by_key(|(pos, _, _)| *pos);

    for (expected, (pos, name, _)) in positioned.iter().enumerate() {
        if *pos != expected {
            return Err(RelevanceError::Load(format!(
                "tensor {name:?} at position {pos}, expected position {expected}"
            )));
        }
    }
    Ok(positioned.into_iter().map(|(_, _, t)| t).collect())
}
