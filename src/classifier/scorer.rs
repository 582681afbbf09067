//! Category scorers: the signal the hybrid classifier falls back to when no
//! rule decides.

use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;

use crate::category::CategorySet;
use crate::classifier::types::Source;
use crate::embedding::SemanticIndex;
use crate::error::{Result, RubricatorError};
use crate::model::TextModel;
use crate::score::Distribution;

/// Trait for backends producing a score per category.
///
/// Implementations must return validated distributions and must fail,
/// rather than return something empty, when they are not ready.
pub trait CategoryScorer: Send + Sync + Debug {
    /// Whether the scorer can produce distributions.
    fn is_ready(&self) -> bool;

    /// Scores of every known category for `text`.
    fn distribution(&self, text: &str) -> Result<Distribution>;

    /// Scores for many texts, in input order.
    fn distribution_batch(&self, texts: &[String]) -> Result<Vec<Distribution>> {
        texts
            .par_iter()
            .map(|text| self.distribution(text))
            .collect()
    }

    /// React to a new active category set.
    fn load_categories(&self, _categories: Arc<CategorySet>) -> Result<()> {
        Ok(())
    }

    /// Replace the trained model used by this scorer.
    fn replace_model(&self, _model: Arc<dyn TextModel>) -> Result<()> {
        Err(RubricatorError::invalid_input(format!(
            "{} scorer does not use a trained model",
            self.name()
        )))
    }

    /// Ranked candidates scoring below this are dropped.
    fn min_score(&self) -> f64 {
        0.0
    }

    fn source(&self) -> Source;

    fn name(&self) -> &str;
}

/// Scores categories with a trained [`TextModel`].
///
/// The model is held behind an `Arc` and replaced wholesale, so a retrain
/// never exposes a partially fitted model to concurrent readers.
#[derive(Default)]
pub struct ModelScorer {
    model: RwLock<Option<Arc<dyn TextModel>>>,
}

impl Debug for ModelScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelScorer")
            .field("model", &self.model().map(|m| m.name().to_string()))
            .finish()
    }
}

impl ModelScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: Arc<dyn TextModel>) -> Self {
        Self {
            model: RwLock::new(Some(model)),
        }
    }

    /// Current model, if one has been installed.
    pub fn model(&self) -> Option<Arc<dyn TextModel>> {
        self.model.read().clone()
    }

    fn loaded(&self) -> Result<Arc<dyn TextModel>> {
        match self.model() {
            Some(model) if model.is_trained() => Ok(model),
            _ => Err(RubricatorError::model_not_loaded(
                "no trained model; train or load one first",
            )),
        }
    }
}

impl CategoryScorer for ModelScorer {
    fn is_ready(&self) -> bool {
        self.model().is_some_and(|m| m.is_trained())
    }

    fn distribution(&self, text: &str) -> Result<Distribution> {
        self.loaded()?.predict_distribution(text)
    }

    fn distribution_batch(&self, texts: &[String]) -> Result<Vec<Distribution>> {
        self.loaded()?.predict_distribution_batch(texts)
    }

    fn replace_model(&self, model: Arc<dyn TextModel>) -> Result<()> {
        if !model.is_trained() {
            return Err(RubricatorError::model_not_loaded(
                "refusing to install an untrained model",
            ));
        }
        log::info!(
            "installed {} model with {} categories",
            model.name(),
            model.classes().len()
        );
        *self.model.write() = Some(model);
        Ok(())
    }

    fn source(&self) -> Source {
        Source::Model
    }

    fn name(&self) -> &str {
        "model"
    }
}

impl CategoryScorer for SemanticIndex {
    fn is_ready(&self) -> bool {
        self.is_loaded()
    }

    fn distribution(&self, text: &str) -> Result<Distribution> {
        SemanticIndex::distribution(self, text)
    }

    fn distribution_batch(&self, texts: &[String]) -> Result<Vec<Distribution>> {
        SemanticIndex::distribution_batch(self, texts)
    }

    fn load_categories(&self, categories: Arc<CategorySet>) -> Result<()> {
        SemanticIndex::load_categories(self, categories)
    }

    fn min_score(&self) -> f64 {
        self.min_similarity()
    }

    fn source(&self) -> Source {
        Source::Similarity
    }

    fn name(&self) -> &str {
        "semantic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::TfIdfNaiveBayes;

    #[test]
    fn test_empty_model_scorer_is_not_ready() {
        let scorer = ModelScorer::new();
        assert!(!scorer.is_ready());
        let err = scorer.distribution("coffee").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelNotLoaded);
    }

    #[test]
    fn test_untrained_model_is_rejected() {
        let scorer = ModelScorer::new();
        let err = scorer
            .replace_model(Arc::new(TfIdfNaiveBayes::default()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelNotLoaded);
        assert!(!scorer.is_ready());
    }

    #[test]
    fn test_replace_model() {
        let mut model = TfIdfNaiveBayes::default();
        model
            .fit(
                &["coffee bar".to_string(), "clinic".to_string()],
                &["Food".to_string(), "Health".to_string()],
            )
            .unwrap();

        let scorer = ModelScorer::new();
        scorer.replace_model(Arc::new(model)).unwrap();
        assert!(scorer.is_ready());

        let batch = scorer
            .distribution_batch(&["coffee".to_string(), "clinic".to_string()])
            .unwrap();
        assert_eq!(batch[0].best().unwrap().category, "Food");
        assert_eq!(batch[1].best().unwrap().category, "Health");
    }
}
