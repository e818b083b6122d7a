//! Template ranking: target structure in, budget-truncated template list out.

use retroprio_common::RelevanceSection;
use retroprio_fingerprint::{Fingerprint, FingerprintAdapter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RelevanceError, Result};
use crate::scorer::RelevanceScorer;
use crate::selection::{softmax, top_k_indices};
use crate::template::{Template, TemplateLibrary};

/// Truncation policy for [`TemplateRanker::get_priority`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankerSettings {
    /// Maximum number of templates returned (default: 100)
    pub template_count: usize,

    /// Stop once accumulated probability reaches this mass (default: 1.0)
    pub max_cum_prob: f32,
}

impl Default for RankerSettings {
    fn default() -> Self {
        Self {
            template_count: 100,
            max_cum_prob: 1.0,
        }
    }
}

impl RankerSettings {
    pub fn with_template_count(mut self, template_count: usize) -> Self {
        self.template_count = template_count;
        self
    }

    pub fn with_max_cum_prob(mut self, max_cum_prob: f32) -> Self {
        self.max_cum_prob = max_cum_prob;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.max_cum_prob.is_finite() || self.max_cum_prob <= 0.0 {
            return Err(RelevanceError::Configuration(format!(
                "max_cum_prob must be a positive number, got {}",
                self.max_cum_prob
            )));
        }
        Ok(())
    }
}

impl From<&RelevanceSection> for RankerSettings {
    fn from(section: &RelevanceSection) -> Self {
        Self {
            template_count: section.template_count,
            max_cum_prob: section.max_cum_prob,
        }
    }
}

/// The `k` most relevant templates for one target, highest first.
///
/// `probabilities` are a softmax over the selected raw scores only, so they
/// are relative among the top k and sum to 1 whenever `k > 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopK {
    pub probabilities: Vec<f32>,
    pub indices: Vec<usize>,
}

impl TopK {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// `(probability, template index)` pairs, highest first.
    pub fn iter(&self) -> impl Iterator<Item = (f32, usize)> + '_ {
        self.probabilities.iter().copied().zip(self.indices.iter().copied())
    }
}

/// Anything that can order a template library for a retrosynthesis target.
pub trait Prioritizer: Send + Sync {
    /// Templates most worth applying to `target`, best first, each carrying its `score`.
    fn get_priority(&self, templates: &TemplateLibrary, target: &str) -> Result<Vec<Template>>;
}

/// Relevance-network prioritizer.
#[derive(Debug)]
pub struct TemplateRanker {
    adapter: FingerprintAdapter,
    scorer: RelevanceScorer,
    settings: RankerSettings,
}

impl TemplateRanker {
    /// Fails if the fingerprint length does not match the network input, or
    /// the settings are invalid.
    pub fn new(
        adapter: FingerprintAdapter,
        scorer: RelevanceScorer,
        settings: RankerSettings,
    ) -> Result<Self> {
        settings.validate()?;
        if adapter.params().length != scorer.input_dim() {
            return Err(RelevanceError::Configuration(format!(
                "fingerprints have {} bits, network expects {}",
                adapter.params().length,
                scorer.input_dim()
            )));
        }
        Ok(Self {
            adapter,
            scorer,
            settings,
        })
    }

    pub fn settings(&self) -> &RankerSettings {
        &self.settings
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn adapter(&self) -> &FingerprintAdapter {
        &self.adapter
    }

    /// Top `k` templates for a structure string.
    ///
    /// Empty or unparsable structures give an empty result, not an error.
    pub fn get_top_k(&self, structure: &str, k: usize) -> Result<TopK> {
        match self.adapter.try_fingerprint(Some(structure)) {
            Some(fp) => self.get_top_k_from_fingerprint(&fp, k),
            None => {
                debug!("No fingerprint for {:?}; nothing to rank", structure);
                Ok(TopK::default())
            }
        }
    }

    /// Top `k` templates for a precomputed fingerprint. `k` is clamped to the
    /// number of templates the network scores.
    pub fn get_top_k_from_fingerprint(&self, fingerprint: &Fingerprint, k: usize) -> Result<TopK> {
        let scores = self.scorer.score(fingerprint)?;
        let indices = top_k_indices(&scores, k);
        let selected: Vec<f32> = indices.iter().map(|&i| scores[i]).collect();
        let probabilities = softmax(&selected)?;
        debug!("Selected {} of {} templates (k = {})", indices.len(), scores.len(), k);
        Ok(TopK {
            probabilities,
            indices,
        })
    }

    /// Ranked templates for `target`, as owned copies with `score` set.
    ///
    /// At most `template_count` templates are returned; the list stops right
    /// after the template whose probability brings the running total to
    /// `max_cum_prob`.
    pub fn get_priority(&self, templates: &TemplateLibrary, target: &str) -> Result<Vec<Template>> {
        templates.check_aligned(self.scorer.output_dim())?;
        let selection = self.select(templates.len(), target)?;
        Ok(selection
            .into_iter()
            .filter_map(|(prob, idx)| {
                templates.get(idx).map(|t| Template {
                    score: prob,
                    ..t.clone()
                })
            })
            .collect())
    }

    /// In-place variant of [`get_priority`](Self::get_priority): writes `score`
    /// on each selected template and returns their indices, best first.
    /// Templates not selected keep their previous `score`.
    pub fn apply_priority(&self, templates: &mut [Template], target: &str) -> Result<Vec<usize>> {
        if templates.len() != self.scorer.output_dim() {
            return Err(RelevanceError::TemplateMismatch {
                expected: self.scorer.output_dim(),
                found: templates.len(),
            });
        }
        let selection = self.select(templates.len(), target)?;
        for &(prob, idx) in &selection {
            templates[idx].score = prob;
        }
        Ok(selection.into_iter().map(|(_, idx)| idx).collect())
    }

    /// Budget-truncated `(probability, index)` pairs.
    fn select(&self, n_templates: usize, target: &str) -> Result<Vec<(f32, usize)>> {
        let k = self.settings.template_count.min(n_templates);
        let top = self.get_top_k(target, k)?;

        let mut selected = Vec::with_capacity(top.len());
        let mut cum_score = 0.0f64;
        for (prob, idx) in top.iter() {
            selected.push((prob, idx));
            cum_score += f64::from(prob);
            if cum_score >= f64::from(self.settings.max_cum_prob) {
                break;
            }
        }
        debug!(
            "Prioritized {} templates for {:?} (cumulative probability {:.4})",
            selected.len(),
            target,
            cum_score
        );
        Ok(selected)
    }
}

impl Prioritizer for TemplateRanker {
    fn get_priority(&self, templates: &TemplateLibrary, target: &str) -> Result<Vec<Template>> {
        TemplateRanker::get_priority(self, templates, target)
    }
}
