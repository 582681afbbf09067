//! TF-IDF vectorizer and naive Bayes classifier as one persisted model.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RubricatorError};
use crate::model::naive_bayes::MultinomialNaiveBayes;
use crate::model::tfidf::TfIdfVectorizer;
use crate::model::{TextModel, validate_training_input};
use crate::score::Distribution;
use crate::storage;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Default additive smoothing.
pub const DEFAULT_SMOOTHING: f64 = 1.0;

/// Model metadata for tracking model information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name/identifier.
    pub name: String,
    /// Crate version that trained the model.
    pub version: String,
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Number of distinct categories learned.
    pub classes: usize,
    /// Vocabulary size after fitting.
    pub vocabulary_size: usize,
}

/// TF-IDF features fed into multinomial naive Bayes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfNaiveBayes {
    max_features: usize,
    smoothing: f64,
    vectorizer: TfIdfVectorizer,
    classifier: MultinomialNaiveBayes,
    metadata: Option<ModelMetadata>,
}

impl Default for TfIdfNaiveBayes {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES, DEFAULT_SMOOTHING)
    }
}

impl TfIdfNaiveBayes {
    pub fn new(max_features: usize, smoothing: f64) -> Self {
        Self {
            max_features,
            smoothing,
            vectorizer: TfIdfVectorizer::new(max_features),
            classifier: MultinomialNaiveBayes::new(smoothing),
            metadata: None,
        }
    }

    /// Load a model saved with [`TextModel::save`].
    ///
    /// A missing, unreadable or inconsistent file is reported as a
    /// model-not-loaded error so callers can answer "train first".
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RubricatorError::model_not_loaded(format!(
                "no model file at {}",
                path.display()
            )));
        }

        let mut model: TfIdfNaiveBayes = storage::read_json(path).map_err(|e| {
            RubricatorError::model_not_loaded(format!(
                "failed to read model {}: {e}",
                path.display()
            ))
        })?;

        model.vectorizer.rebuild_index();
        model.vectorizer.check_consistency()?;
        model
            .classifier
            .check_consistency(model.vectorizer.vocabulary_size())?;
        if !model.is_trained() {
            return Err(RubricatorError::model_not_loaded(format!(
                "model file {} holds an untrained model",
                path.display()
            )));
        }

        log::info!(
            "loaded model from {} ({} categories, {} terms)",
            path.display(),
            model.classes().len(),
            model.vectorizer.vocabulary_size()
        );
        Ok(model)
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }
}

impl TextModel for TfIdfNaiveBayes {
    fn fit(&mut self, texts: &[String], labels: &[String]) -> Result<()> {
        validate_training_input(texts, labels)?;

        // Build into fresh parts so a failed fit leaves the old model usable.
        let mut vectorizer = TfIdfVectorizer::new(self.max_features);
        let features = vectorizer.fit_transform(texts)?;
        let mut classifier = MultinomialNaiveBayes::new(self.smoothing);
        classifier.fit(&features, labels, vectorizer.vocabulary_size())?;

        self.metadata = Some(ModelMetadata {
            name: self.name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Utc::now(),
            training_examples: texts.len(),
            classes: classifier.classes().len(),
            vocabulary_size: vectorizer.vocabulary_size(),
        });
        self.vectorizer = vectorizer;
        self.classifier = classifier;

        log::debug!(
            "fitted {} on {} examples",
            self.name(),
            texts.len()
        );
        Ok(())
    }

    fn predict_distribution(&self, text: &str) -> Result<Distribution> {
        if !self.is_trained() {
            return Err(RubricatorError::model_not_loaded(
                "model has not been trained or loaded",
            ));
        }

        let features = self.vectorizer.transform(text)?;
        let probabilities = self.classifier.predict_proba(&features)?;
        Distribution::from_parts(self.classifier.classes(), &probabilities)?.validated()
    }

    fn is_trained(&self) -> bool {
        self.vectorizer.is_fitted() && self.classifier.is_fitted()
    }

    fn classes(&self) -> &[String] {
        self.classifier.classes()
    }

    fn save(&self, path: &Path) -> Result<()> {
        if !self.is_trained() {
            return Err(RubricatorError::model_not_loaded(
                "refusing to save an untrained model",
            ));
        }
        storage::write_json_atomic(path, self)?;
        log::info!("saved model to {}", path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "tfidf_naive_bayes"
    }
}
