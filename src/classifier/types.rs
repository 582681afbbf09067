//! Classification result types.

use serde::{Deserialize, Serialize};

use crate::category::CategoryId;
use crate::score::CategoryScore;

/// Which signal produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A keyword rule above the override threshold.
    Rule,
    /// The statistical model.
    Model,
    /// Embedding similarity.
    Similarity,
    /// No signal was available; the unknown sentinel.
    Fallback,
}

/// One category candidate with a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    pub confidence: f64,
    pub source: Source,
}

impl Prediction {
    /// The degraded answer: `(unknown_label, 0.0)`.
    pub fn unknown<S: Into<String>>(label: S) -> Self {
        Prediction {
            category: label.into(),
            category_id: None,
            confidence: 0.0,
            source: Source::Fallback,
        }
    }

    pub fn from_score(score: CategoryScore, source: Source) -> Self {
        Prediction {
            category: score.category,
            category_id: score.category_id,
            confidence: score.score.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.source == Source::Fallback
    }

    pub fn as_pair(&self) -> (&str, f64) {
        (&self.category, self.confidence)
    }
}

/// Ranked candidates for one input: descending by confidence, never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClassificationResult {
    predictions: Vec<Prediction>,
}

impl ClassificationResult {
    /// The single-entry `[(unknown_label, 0.0)]` result.
    pub fn unknown<S: Into<String>>(label: S) -> Self {
        ClassificationResult {
            predictions: vec![Prediction::unknown(label)],
        }
    }

    /// Wrap already-ranked scores, falling back to the unknown sentinel
    /// when there are none.
    pub fn from_ranked(scores: Vec<CategoryScore>, source: Source, unknown_label: &str) -> Self {
        if scores.is_empty() {
            return Self::unknown(unknown_label);
        }
        ClassificationResult {
            predictions: scores
                .into_iter()
                .map(|score| Prediction::from_score(score, source))
                .collect(),
        }
    }

    /// Highest-confidence candidate.
    pub fn best(&self) -> &Prediction {
        // Every constructor guarantees at least one entry.
        &self.predictions[0]
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.predictions.iter()
    }

    /// `(category, confidence)` pairs in rank order.
    pub fn pairs(&self) -> Vec<(String, f64)> {
        self.predictions
            .iter()
            .map(|p| (p.category.clone(), p.confidence))
            .collect()
    }

    pub fn into_predictions(self) -> Vec<Prediction> {
        self.predictions
    }
}

impl<'a> IntoIterator for &'a ClassificationResult {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.predictions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ranking_becomes_unknown() {
        let result = ClassificationResult::from_ranked(Vec::new(), Source::Model, "Unknown");
        assert_eq!(result.len(), 1);
        assert_eq!(result.best().as_pair(), ("Unknown", 0.0));
        assert!(result.best().is_unknown());
    }

    #[test]
    fn test_from_ranked_keeps_order() {
        let result = ClassificationResult::from_ranked(
            vec![CategoryScore::new("Food", 0.7), CategoryScore::new("Health", 0.3)],
            Source::Model,
            "Unknown",
        );
        assert_eq!(
            result.pairs(),
            vec![("Food".to_string(), 0.7), ("Health".to_string(), 0.3)]
        );
        assert_eq!(result.best().source, Source::Model);
    }

    #[test]
    fn test_serializes_as_list() {
        let json = serde_json::to_value(ClassificationResult::unknown("Unknown")).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"category": "Unknown", "confidence": 0.0, "source": "fallback"}])
        );
    }
}
