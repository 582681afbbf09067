//! Multinomial naive Bayes over TF-IDF features.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RubricatorError};
use crate::model::tfidf::SparseVector;

/// Multinomial naive Bayes classifier with additive (Laplace/Lidstone) smoothing.
///
/// Classes are kept in lexicographic order; that order is the tie-break
/// order of every distribution this model produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNaiveBayes {
    /// Additive smoothing parameter.
    alpha: f64,
    /// Class labels, sorted.
    classes: Vec<String>,
    /// log P(class)
    class_log_prior: Vec<f64>,
    /// log P(feature | class), one row per class.
    feature_log_prob: Vec<Vec<f64>>,
    n_features: usize,
}

impl MultinomialNaiveBayes {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            classes: Vec::new(),
            class_log_prior: Vec::new(),
            feature_log_prob: Vec::new(),
            n_features: 0,
        }
    }

    /// Fit on feature rows and their labels.
    pub fn fit(
        &mut self,
        features: &[SparseVector],
        labels: &[String],
        n_features: usize,
    ) -> Result<()> {
        if features.is_empty() {
            return Err(RubricatorError::training_data("no training rows"));
        }
        if features.len() != labels.len() {
            return Err(RubricatorError::training_data(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if self.alpha <= 0.0 || !self.alpha.is_finite() {
            return Err(RubricatorError::training_data(format!(
                "smoothing must be positive, got {}",
                self.alpha
            )));
        }

        // BTreeMap gives the sorted class order for free.
        let mut class_rows: BTreeMap<&str, Vec<&SparseVector>> = BTreeMap::new();
        for (row, label) in features.iter().zip(labels) {
            class_rows.entry(label.as_str()).or_default().push(row);
        }

        let total_rows = features.len() as f64;
        let mut classes = Vec::with_capacity(class_rows.len());
        let mut class_log_prior = Vec::with_capacity(class_rows.len());
        let mut feature_log_prob = Vec::with_capacity(class_rows.len());

        for (label, rows) in class_rows {
            let mut feature_count = vec![0.0; n_features];
            for row in &rows {
                for &(idx, weight) in row.iter() {
                    if idx >= n_features {
                        return Err(RubricatorError::training_data(format!(
                            "feature index {idx} out of range for {n_features} features"
                        )));
                    }
                    feature_count[idx] += weight;
                }
            }

            let smoothed_total: f64 =
                feature_count.iter().sum::<f64>() + self.alpha * n_features as f64;
            let log_total = smoothed_total.ln();
            let log_prob = feature_count
                .iter()
                .map(|count| (count + self.alpha).ln() - log_total)
                .collect();

            classes.push(label.to_string());
            class_log_prior.push((rows.len() as f64 / total_rows).ln());
            feature_log_prob.push(log_prob);
        }

        self.classes = classes;
        self.class_log_prior = class_log_prior;
        self.feature_log_prob = feature_log_prob;
        self.n_features = n_features;

        Ok(())
    }

    /// Unnormalized log P(class, features) for each class.
    pub fn joint_log_likelihood(&self, features: &SparseVector) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(RubricatorError::model_not_loaded(
                "naive Bayes classifier has not been fitted",
            ));
        }

        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_prob)| {
                let mut score = *prior;
                for &(idx, weight) in features {
                    let feature = log_prob.get(idx).ok_or_else(|| {
                        RubricatorError::adapter(format!(
                            "feature index {idx} out of range for {} features",
                            self.n_features
                        ))
                    })?;
                    score += weight * feature;
                }
                Ok(score)
            })
            .collect()
    }

    /// Class probabilities, aligned with [`classes`](Self::classes).
    pub fn predict_proba(&self, features: &SparseVector) -> Result<Vec<f64>> {
        let jll = self.joint_log_likelihood(features)?;
        let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_norm = max + jll.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
        Ok(jll.iter().map(|v| (v - log_norm).exp()).collect())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    /// Check the persisted arrays agree with each other.
    pub(crate) fn check_consistency(&self, n_features: usize) -> Result<()> {
        let rows_ok = self.feature_log_prob.len() == self.classes.len()
            && self.class_log_prior.len() == self.classes.len()
            && self.feature_log_prob.iter().all(|row| row.len() == n_features);
        if !rows_ok || self.n_features != n_features {
            return Err(RubricatorError::model_not_loaded(
                "classifier parameters do not match the vectorizer",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_and_predict() {
        // feature 0 = "coffee", feature 1 = "clinic"
        let rows = vec![vec![(0, 1.0)], vec![(0, 1.0)], vec![(1, 1.0)]];
        let mut nb = MultinomialNaiveBayes::new(1.0);
        nb.fit(&rows, &labels(&["Food", "Food", "Health"]), 2).unwrap();

        assert_eq!(nb.classes(), &["Food".to_string(), "Health".to_string()]);

        let proba = nb.predict_proba(&vec![(0, 1.0)]).unwrap();
        assert!(proba[0] > proba[1]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let proba = nb.predict_proba(&vec![(1, 1.0)]).unwrap();
        assert!(proba[1] > proba[0]);
    }

    #[test]
    fn test_empty_features_fall_back_to_priors() {
        let rows = vec![vec![(0, 1.0)], vec![(0, 1.0)], vec![(0, 1.0)], vec![(1, 1.0)]];
        let mut nb = MultinomialNaiveBayes::new(1.0);
        nb.fit(&rows, &labels(&["A", "A", "A", "B"]), 2).unwrap();

        let proba = nb.predict_proba(&Vec::new()).unwrap();
        assert!((proba[0] - 0.75).abs() < 1e-12);
        assert!((proba[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_training_data_error() {
        let mut nb = MultinomialNaiveBayes::new(1.0);
        let err = nb
            .fit(&[vec![(0, 1.0)]], &labels(&["A", "B"]), 1)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TrainingData);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let nb = MultinomialNaiveBayes::new(1.0);
        let err = nb.predict_proba(&Vec::new()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ModelNotLoaded);
    }
}
