//! Stored classifications and human corrections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::{CompanyClassification, Prediction, Source};
use crate::rules::Rule;

/// Priority of rules created from corrections.
pub const CORRECTION_RULE_PRIORITY: i64 = 90;

/// One classification as written to a result sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub text: String,
    pub predicted_category: String,
    pub confidence: f64,
    #[serde(default)]
    pub top: Vec<Prediction>,
    #[serde(default)]
    pub rules_applied: bool,
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<Correction>,
}

impl ClassificationRecord {
    /// Record a single-text classification.
    pub fn new<S: Into<String>>(
        text: S,
        best: &Prediction,
        top: Vec<Prediction>,
        review_threshold: f64,
    ) -> Self {
        ClassificationRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            company_name: None,
            text: text.into(),
            predicted_category: best.category.clone(),
            confidence: best.confidence,
            top,
            rules_applied: best.source == Source::Rule,
            needs_review: best.confidence < review_threshold,
            correction: None,
        }
    }

    /// Record a company classification.
    pub fn from_company(result: &CompanyClassification) -> Self {
        ClassificationRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            company_name: Some(result.company.name.clone()),
            text: result.company.classification_text(),
            predicted_category: result.category.clone(),
            confidence: result.confidence,
            top: result.top.clone(),
            rules_applied: result.rules_applied,
            needs_review: result.needs_review,
            correction: None,
        }
    }

    /// The corrected category if there is one, else the prediction.
    pub fn final_category(&self) -> &str {
        self.correction
            .as_ref()
            .map(|c| c.corrected_category.as_str())
            .unwrap_or(&self.predicted_category)
    }
}

/// A human fix for a stored classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub record_id: Uuid,
    pub corrected_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub corrected_at: DateTime<Utc>,
}

impl Correction {
    pub fn new<S: Into<String>>(record_id: Uuid, corrected_category: S) -> Self {
        Correction {
            record_id,
            corrected_category: corrected_category.into(),
            reason: None,
            corrected_at: Utc::now(),
        }
    }

    pub fn with_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Turn a correction into a keyword rule so the fix applies to future inputs.
///
/// The keyword is the company name when the record has one, otherwise the
/// classified text. Returns `None` when that keyword is blank.
pub fn correction_rule(record: &ClassificationRecord, correction: &Correction) -> Option<Rule> {
    let keyword = record
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| record.text.trim());
    if keyword.is_empty() {
        return None;
    }
    Some(Rule::new(
        keyword,
        correction.corrected_category.clone(),
        CORRECTION_RULE_PRIORITY,
    ))
}
