//! Company-level classification.
//!
//! A company is classified by joining its name, description and rubrics
//! into one text and running it through the same hybrid classifier.

use serde::{Deserialize, Serialize};

use crate::classifier::hybrid::HybridClassifier;
use crate::classifier::types::{Prediction, Source};

/// A company listing as exported from a business directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(default, alias = "Наименование")]
    pub name: String,
    #[serde(default, alias = "Описание")]
    pub description: String,
    /// Semicolon-separated rubric list, e.g. `"Cafes; Bakeries"`.
    #[serde(default, alias = "Рубрики")]
    pub rubrics: String,
    #[serde(default, alias = "Адрес")]
    pub address: String,
}

impl CompanyRecord {
    pub fn new<N: Into<String>, D: Into<String>, R: Into<String>>(
        name: N,
        description: D,
        rubrics: R,
    ) -> Self {
        CompanyRecord {
            name: name.into(),
            description: description.into(),
            rubrics: rubrics.into(),
            address: String::new(),
        }
    }

    pub fn with_address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = address.into();
        self
    }

    /// Non-empty name, description and rubrics joined by single spaces.
    pub fn classification_text(&self) -> String {
        join_non_empty(&[&self.name, &self.description, &self.rubrics])
    }

    /// First rubric before any `;`, trimmed.
    pub fn primary_rubric(&self) -> Option<&str> {
        self.rubrics
            .split(';')
            .next()
            .map(str::trim)
            .filter(|rubric| !rubric.is_empty())
    }
}

pub(crate) fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classification of one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyClassification {
    pub company: CompanyRecord,
    pub category: String,
    pub confidence: f64,
    /// Ranked model candidates, rules not applied.
    pub top: Vec<Prediction>,
    /// Whether a keyword rule decided the category.
    pub rules_applied: bool,
    /// Confidence fell below the review threshold.
    pub needs_review: bool,
}

impl HybridClassifier {
    /// Classify a company by its assembled text.
    pub fn classify_company(&self, company: &CompanyRecord) -> CompanyClassification {
        let text = company.classification_text();
        let best = self.classify(&text);
        let top = self
            .classify_top_n(&text, self.config().default_top_n)
            .into_predictions();

        CompanyClassification {
            company: company.clone(),
            rules_applied: best.source == Source::Rule,
            needs_review: best.confidence < self.config().review_threshold,
            category: best.category,
            confidence: best.confidence,
            top,
        }
    }

    /// Classify many companies, in input order.
    pub fn classify_companies(&self, companies: &[CompanyRecord]) -> Vec<CompanyClassification> {
        companies
            .iter()
            .map(|company| self.classify_company(company))
            .collect()
    }
}
