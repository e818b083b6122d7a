//! retroprio-relevance — Template relevance prioritization.
//!
//! Ranks reaction templates for a retrosynthesis target with a small
//! feed-forward network trained on template popularity:
//!
//! 1. Fingerprint the target ([`retroprio_fingerprint::FingerprintAdapter`])
//! 2. Score every template with the network ([`RelevanceScorer`])
//! 3. Keep the top k scores and softmax them ([`selection`])
//! 4. Cut the list at a cumulative-probability budget ([`TemplateRanker`])
//!
//! # Example
//! ```rust,no_run
//! use retroprio_fingerprint::{FingerprintAdapter, FingerprintParams, FingerprintTable};
//! use retroprio_relevance::{RankerSettings, RelevanceScorer, TemplateLibrary, TemplateRanker};
//!
//! fn main() -> anyhow::Result<()> {
//!     let params = FingerprintParams::default();
//!     let table = FingerprintTable::from_json_file("data/fingerprints.json")?;
//!     let scorer = RelevanceScorer::from_search_paths(&[
//!         "../prioritizers/template/template_relevance_network_weights.npz",
//!         "prioritizers/template/template_relevance_network_weights.npz",
//!     ])?;
//!     let ranker = TemplateRanker::new(
//!         FingerprintAdapter::new(table, params),
//!         scorer,
//!         RankerSettings::default(),
//!     )?;
//!
//!     let library = TemplateLibrary::from_json_file("data/templates.json")?;
//!     for template in ranker.get_priority(&library, "CCCNc1ccccc1")? {
//!         println!("{:.4} {}", template.score, template.reaction_smarts);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod ranker;
pub mod scorer;
pub mod selection;
pub mod template;
pub mod weights;

pub use error::{RelevanceError, Result};
pub use ranker::{Prioritizer, RankerSettings, TemplateRanker, TopK};
pub use scorer::RelevanceScorer;
pub use template::{Template, TemplateLibrary};
pub use weights::{Layer, WeightSet};
