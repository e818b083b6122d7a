//! Test loading relevance network weights from disk.

use std::collections::HashMap;
use std::path::PathBuf;

use candle_core::{DType, Device, Tensor};
use pretty_assertions::assert_eq;
use retroprio_fingerprint::Fingerprint;
use retroprio_relevance::{RelevanceError, RelevanceScorer, WeightSet};

fn arrays() -> Vec<(String, Tensor)> {
    let device = Device::Cpu;
    vec![
        ("arr_0".into(), Tensor::ones((6, 4), DType::F64, &device).unwrap()),
        ("arr_1".into(), Tensor::zeros(4, DType::F64, &device).unwrap()),
        ("arr_2".into(), Tensor::ones((4, 3), DType::F64, &device).unwrap()),
        ("arr_3".into(), Tensor::new(&[0.0f64, 1.0, 2.0], &device).unwrap()),
    ]
}

#[test]
fn test_npz_preserves_array_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.npz");
    Tensor::write_npz(&arrays(), &path).unwrap();

    let weights = WeightSet::load(&path).unwrap();
    assert_eq!(weights.describe(), "6 -> 4 -> 3");

    let scorer = RelevanceScorer::new(weights);
    let scores = scorer.score(&Fingerprint::from_on_bits(6, &[0, 1])).unwrap();
    // hidden = [2, 2, 2, 2]; out = [8, 8, 8] + [0, 1, 2]
    assert_eq!(scores, vec![8.0, 9.0, 10.0]);
}

#[test]
fn test_safetensors_ordered_by_layer_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.safetensors");
    let named: HashMap<String, Tensor> = arrays()
        .into_iter()
        .enumerate()
        .map(|(i, (_, t))| {
            let kind = if i % 2 == 0 { "weight" } else { "bias" };
            (format!("layers.{}.{}", i / 2, kind), t)
        })
        .collect();
    candle_core::safetensors::save(&named, &path).unwrap();

    let weights = WeightSet::load(&path).unwrap();
    assert_eq!(weights.depth(), 2);
    assert_eq!(weights.input_dim(), 6);
    assert_eq!(weights.output_dim(), 3);
}

#[test]
fn test_npz_with_broken_chain_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.npz");
    let mut bad = arrays();
    bad.swap(0, 2);
    Tensor::write_npz(&bad, &path).unwrap();

    let err = WeightSet::load(&path).unwrap_err();
    assert!(matches!(err, RelevanceError::Load(_)), "{err}");
}

#[test]
fn test_search_paths_first_existing_wins() {
    let parent = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    let parent_path = parent.path().join("weights.npz");
    let local_path = local.path().join("weights.npz");

    Tensor::write_npz(&arrays(), &local_path).unwrap();
    let (_, found) = WeightSet::load_first_existing(&[&parent_path, &local_path]).unwrap();
    assert_eq!(found, local_path);

    Tensor::write_npz(&arrays()[..2], &parent_path).unwrap();
    let (weights, found) = WeightSet::load_first_existing(&[&parent_path, &local_path]).unwrap();
    assert_eq!(found, parent_path);
    assert_eq!(weights.depth(), 1);
}

#[test]
fn test_search_paths_none_exist() {
    let missing = vec![
        PathBuf::from("/nonexistent/a/weights.npz"),
        PathBuf::from("/nonexistent/b/weights.npz"),
    ];
    let err = RelevanceScorer::from_search_paths(&missing).unwrap_err();
    match err {
        RelevanceError::WeightsNotFound { searched } => assert_eq!(searched, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_npz_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.npz");
    let empty: Vec<(String, Tensor)> = Vec::new();
    Tensor::write_npz(&empty, &path).unwrap();

    let err = WeightSet::load(&path).unwrap_err();
    assert!(matches!(err, RelevanceError::Load(_)));
}
