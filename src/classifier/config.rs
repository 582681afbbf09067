//! Classifier configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RubricatorError};

/// Configuration for the hybrid classifier and its persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A matched rule short-circuits the model only when its confidence is
    /// strictly greater than this.
    pub rule_override_threshold: f64,
    /// Number of candidates used by company classification and the CLI.
    pub default_top_n: usize,
    /// Category reported when no signal is available.
    pub unknown_label: String,
    /// Training label for records without a rubric.
    pub fallback_label: String,
    /// Company results below this confidence are flagged for review.
    pub review_threshold: f64,
    /// Reports count results below this confidence as low confidence.
    pub low_confidence_threshold: f64,
    /// Semantic ranking drops candidates below this remapped similarity.
    pub min_similarity: f64,
    /// TF-IDF vocabulary cap.
    pub max_features: usize,
    /// Naive Bayes additive smoothing.
    pub smoothing: f64,
    /// Directory holding the model and rule files.
    pub models_directory: PathBuf,
    /// Model file name inside `models_directory`.
    pub model_file: String,
    /// Rule file name inside `models_directory`.
    pub rules_file: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rule_override_threshold: 0.7,
            default_top_n: 3,
            unknown_label: "Unknown".to_string(),
            fallback_label: "Other".to_string(),
            review_threshold: 0.5,
            low_confidence_threshold: 0.6,
            min_similarity: 0.0,
            max_features: 5000,
            smoothing: 1.0,
            models_directory: PathBuf::from("models"),
            model_file: "classifier_model.json".to_string(),
            rules_file: "training_rules.json".to_string(),
        }
    }
}

impl ClassifierConfig {
    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RubricatorError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: ClassifierConfig = serde_json::from_str(&content)
            .map_err(|e| RubricatorError::config(format!("invalid {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check thresholds and sizes are usable.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("rule_override_threshold", self.rule_override_threshold),
            ("review_threshold", self.review_threshold),
            ("low_confidence_threshold", self.low_confidence_threshold),
            ("min_similarity", self.min_similarity),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(RubricatorError::config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.default_top_n == 0 {
            return Err(RubricatorError::config("default_top_n must be positive"));
        }
        if self.max_features == 0 {
            return Err(RubricatorError::config("max_features must be positive"));
        }
        if !(self.smoothing > 0.0 && self.smoothing.is_finite()) {
            return Err(RubricatorError::config("smoothing must be positive"));
        }
        if self.unknown_label.trim().is_empty() || self.fallback_label.trim().is_empty() {
            return Err(RubricatorError::config("labels must not be blank"));
        }
        Ok(())
    }

    pub fn model_path(&self) -> PathBuf {
        self.models_directory.join(&self.model_file)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.models_directory.join(&self.rules_file)
    }
}
