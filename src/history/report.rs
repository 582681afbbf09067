//! Summary statistics over classification history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::record::ClassificationRecord;

/// Number of records predicted as one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Aggregate view of stored classifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub unique_categories: usize,
    pub mean_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    /// Descending by count, then by name.
    pub distribution: Vec<CategoryCount>,
    pub low_confidence_threshold: f64,
    /// Records with confidence strictly below the threshold.
    pub low_confidence: usize,
    pub needs_review: usize,
    pub corrected: usize,
    pub rules_applied: usize,
}

impl ClassificationReport {
    pub fn from_records(records: &[ClassificationRecord], low_confidence_threshold: f64) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(record.predicted_category.as_str()).or_insert(0) += 1;
        }

        let mut distribution: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        // BTreeMap order is by name; a stable sort keeps it within equal counts.
        distribution.sort_by(|a, b| b.count.cmp(&a.count));

        let confidences: Vec<f64> = records.iter().map(|r| r.confidence).collect();
        let (mean, min, max) = if confidences.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                confidences.iter().sum::<f64>() / confidences.len() as f64,
                confidences.iter().copied().fold(f64::INFINITY, f64::min),
                confidences.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };

        ClassificationReport {
            generated_at: Utc::now(),
            total: records.len(),
            unique_categories: distribution.len(),
            mean_confidence: mean,
            min_confidence: min,
            max_confidence: max,
            distribution,
            low_confidence_threshold,
            low_confidence: records
                .iter()
                .filter(|r| r.confidence < low_confidence_threshold)
                .count(),
            needs_review: records.iter().filter(|r| r.needs_review).count(),
            corrected: records.iter().filter(|r| r.correction.is_some()).count(),
            rules_applied: records.iter().filter(|r| r.rules_applied).count(),
        }
    }
}
