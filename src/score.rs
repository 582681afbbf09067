//! Per-category scores produced by the model and similarity adapters.
//!
//! Adapters hand the classification core a [`Distribution`]: one score per
//! known category, in the adapter's stable category order. The core only
//! accepts validated distributions, so malformed adapter output is rejected
//! at the adapter boundary instead of being patched up at every call site.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::category::CategoryId;
use crate::error::{Result, RubricatorError};

/// Scores this close outside `[0, 1]` are floating point noise and get clamped.
const SCORE_TOLERANCE: f64 = 1e-9;

/// Score of a single category, normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    pub score: f64,
}

impl CategoryScore {
    pub fn new<S: Into<String>>(category: S, score: f64) -> Self {
        CategoryScore {
            category: category.into(),
            category_id: None,
            score,
        }
    }

    pub fn with_id(mut self, id: CategoryId) -> Self {
        self.category_id = Some(id);
        self
    }
}

/// Scores over all known categories, in stable category order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    scores: Vec<CategoryScore>,
}

impl Distribution {
    pub fn new(scores: Vec<CategoryScore>) -> Self {
        Distribution { scores }
    }

    /// Build from parallel slices of names and scores.
    pub fn from_parts(categories: &[String], scores: &[f64]) -> Result<Self> {
        if categories.len() != scores.len() {
            return Err(RubricatorError::adapter(format!(
                "{} categories but {} scores",
                categories.len(),
                scores.len()
            )));
        }

        Ok(Distribution {
            scores: categories
                .iter()
                .zip(scores)
                .map(|(category, &score)| CategoryScore::new(category.clone(), score))
                .collect(),
        })
    }

    /// Reject non-finite or out-of-range scores; clamp rounding noise.
    pub fn validated(mut self) -> Result<Self> {
        for entry in &mut self.scores {
            if !entry.score.is_finite()
                || entry.score < -SCORE_TOLERANCE
                || entry.score > 1.0 + SCORE_TOLERANCE
            {
                return Err(RubricatorError::adapter(format!(
                    "score {} for '{}' is outside [0, 1]",
                    entry.score, entry.category
                )));
            }
            entry.score = entry.score.clamp(0.0, 1.0);
        }
        Ok(self)
    }

    /// Highest-scoring entry; the earliest one wins ties.
    pub fn best(&self) -> Option<&CategoryScore> {
        let mut best: Option<&CategoryScore> = None;
        for entry in &self.scores {
            match best {
                Some(current) if current.score >= entry.score => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    /// Entries sorted by descending score, truncated to `n`.
    ///
    /// The sort is stable, so equal scores keep category order.
    pub fn ranked(&self, n: usize) -> Vec<CategoryScore> {
        let mut ranked = self.scores.clone();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(n);
        ranked
    }

    /// Drop entries scoring below `threshold`.
    pub fn filtered(mut self, threshold: f64) -> Self {
        self.scores.retain(|entry| entry.score >= threshold);
        self
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryScore> {
        self.scores.iter()
    }
}
