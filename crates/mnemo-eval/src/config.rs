//! Evaluation settings, loaded from a YAML file.

use crate::error::{EvalError, Result};
use mnemo_memory::SimilarityMapSettings;
use mnemo_models::ClientConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Root settings for an evaluation run.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalSettings {
    /// Chat client configuration (provider selection + model parameters).
    pub client: ClientConfig,

    /// Page log sink configuration.
    pub page_log: PageLogSettings,

    /// Fast-learner selection and construction settings.
    pub fast_learner: LearnerSettings,

    /// Ordered list of evaluation scenarios to run.
    #[serde(default)]
    pub evaluations: Vec<EvaluationSettings>,
}

impl EvalSettings {
    /// Loads settings from a YAML file.
    ///
    /// # Errors
    /// Returns `EvalError::Io` if the file cannot be read and
    /// `EvalError::Yaml` if it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        Ok(settings)
    }
}

/// Page log sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PageLogSettings {
    /// Directory the page files are written to.
    pub path: PathBuf,
}

/// Fast-learner selection and construction settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LearnerSettings {
    /// Registry key of the learner implementation (e.g., "prompted", "recall").
    pub name: String,

    /// Directory for the learner's similarity store, where applicable.
    #[serde(default)]
    pub memory_dir: Option<PathBuf>,

    /// Clear the learner's memory before constructing it.
    #[serde(default)]
    pub reset_memory: bool,

    /// Similarity-store settings for memory-backed learners.
    #[serde(default)]
    pub similarity: SimilarityMapSettings,

    /// Embedder selection for memory-backed learners: "hash" or "openai".
    #[serde(default = "default_embedder")]
    pub embedder: String,

    /// Maximum memos retrieved per task.
    #[serde(default = "default_max_memos")]
    pub max_memos: usize,

    /// Maximum retrieval distance for a memo to be used.
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f32,
}

fn default_embedder() -> String {
    "hash".to_string()
}

fn default_max_memos() -> usize {
    5
}

fn default_distance_threshold() -> f32 {
    0.8
}

/// Per-scenario settings from the `evaluations` list.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationSettings {
    /// Scenario name; must match a known scenario.
    pub name: String,

    /// Trials per test pass.
    #[serde(default = "default_one")]
    pub num_trials: u32,

    /// Train/test loops for self-teaching.
    #[serde(default = "default_one")]
    pub num_loops: u32,

    /// Trials per test pass inside each self-teaching loop.
    #[serde(default = "default_one")]
    pub num_final_test_trials: u32,
}

fn default_one() -> u32 {
    1
}

impl EvaluationSettings {
    /// Builds settings for a scenario with all counts at their defaults.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), num_trials: 1, num_loops: 1, num_final_test_trials: 1 }
    }

    /// Rejects zero trial counts, which would make success rates undefined.
    pub fn validate(&self) -> Result<()> {
        if self.num_trials == 0 || self.num_loops == 0 || self.num_final_test_trials == 0 {
            return Err(EvalError::Configuration(format!(
                "evaluation '{}' has a zero trial/loop count",
                self.name
            )));
        }
        Ok(())
    }
}
