//! Reaction templates and the popularity-ordered library the network scores.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RelevanceError, Result};

/// A reaction template record.
///
/// The ranker only reads `index` and writes `score`; any other fields from the
/// template source are carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Position in descending training-time popularity; equals the network output index.
    pub index: usize,
    pub reaction_smarts: String,
    /// Training-time occurrence count
    #[serde(default)]
    pub count: Option<u64>,
    /// Relevance probability assigned by the last ranking
    #[serde(default)]
    pub score: f32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Template {
    pub fn new(index: usize, reaction_smarts: &str) -> Self {
        Self {
            index,
            reaction_smarts: reaction_smarts.to_string(),
            count: None,
            score: 0.0,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

/// Templates in network output order.
///
/// Construction checks that `templates[i].index == i` and that known counts
/// never increase, so a library sorted differently from the network's
/// training order is caught before anything is scored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Result<Self> {
        for (i, t) in templates.iter().enumerate() {
            if t.index != i {
                return Err(RelevanceError::TemplateOrder(format!(
                    "template at position {i} has index {}",
                    t.index
                )));
            }
        }

        let counts: Vec<(usize, u64)> = templates
            .iter()
            .filter_map(|t| t.count.map(|c| (t.index, c)))
            .collect();
        for pair in counts.windows(2) {
            let ((i, a), (j, b)) = (pair[0], pair[1]);
            if b > a {
                return Err(RelevanceError::TemplateOrder(format!(
                    "template {j} (count {b}) is more popular than template {i} (count {a})"
                )));
            }
        }

        Ok(Self { templates })
    }

    /// Load a JSON array of templates.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let templates: Vec<Template> = serde_json::from_str(&content)?;
        let library = Self::new(templates)?;
        info!("Loaded {} templates from {}", library.len(), path.display());
        Ok(library)
    }

    /// Fail unless the library has exactly one template per network output.
    pub fn check_aligned(&self, network_outputs: usize) -> Result<()> {
        if self.templates.len() != network_outputs {
            return Err(RelevanceError::TemplateMismatch {
                expected: network_outputs,
                found: self.templates.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Template> {
        self.templates.get(index)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn into_inner(self) -> Vec<Template> {
        self.templates
    }
}
