//! Statistical text-to-category models.
//!
//! # Architecture
//!
//! - [`TextModel`] trait: fit on labelled texts, predict a distribution over known categories
//! - [`TfIdfVectorizer`]: feature extraction using TF-IDF
//! - [`MultinomialNaiveBayes`]: probabilistic classifier over TF-IDF features
//! - [`TfIdfNaiveBayes`]: the two combined, persisted as one JSON document
//!
//! # Example
//!
//! ```
//! use rubricator::model::{TextModel, TfIdfNaiveBayes};
//!
//! # fn main() -> rubricator::error::Result<()> {
//! let texts = vec![
//!     "coffee shop and bakery".to_string(),
//!     "dental clinic".to_string(),
//! ];
//! let labels = vec!["Food".to_string(), "Health".to_string()];
//!
//! let mut model = TfIdfNaiveBayes::default();
//! model.fit(&texts, &labels)?;
//!
//! let distribution = model.predict_distribution("fresh coffee")?;
//! assert_eq!(distribution.best().unwrap().category, "Food");
//! # Ok(())
//! # }
//! ```

mod naive_bayes;
mod pipeline;
mod tfidf;

use std::fmt::Debug;
use std::path::Path;

use rayon::prelude::*;

pub use naive_bayes::MultinomialNaiveBayes;
pub use pipeline::{ModelMetadata, TfIdfNaiveBayes};
pub use tfidf::{SparseVector, TfIdfVectorizer};

use crate::error::{Result, RubricatorError};
use crate::score::Distribution;

/// Trait for trained text classifiers.
///
/// Implementations report a probability for every known category. They
/// must fail with a model-not-loaded error before the first successful
/// fit or load instead of returning an empty distribution.
pub trait TextModel: Send + Sync + Debug {
    /// Fit the model on parallel slices of texts and labels.
    fn fit(&mut self, texts: &[String], labels: &[String]) -> Result<()>;

    /// Probability of every known category for `text`.
    fn predict_distribution(&self, text: &str) -> Result<Distribution>;

    /// Predict many texts at once. Results keep the input order.
    fn predict_distribution_batch(&self, texts: &[String]) -> Result<Vec<Distribution>> {
        texts
            .par_iter()
            .map(|text| self.predict_distribution(text))
            .collect()
    }

    fn is_trained(&self) -> bool;

    /// Known categories, in the order used for tie-breaking.
    fn classes(&self) -> &[String];

    /// Persist the trained state.
    fn save(&self, path: &Path) -> Result<()>;

    fn name(&self) -> &str;
}

/// Reject empty or length-mismatched training input.
pub fn validate_training_input(texts: &[String], labels: &[String]) -> Result<()> {
    if texts.is_empty() {
        return Err(RubricatorError::training_data("training texts cannot be empty"));
    }
    if texts.len() != labels.len() {
        return Err(RubricatorError::training_data(format!(
            "{} texts but {} labels",
            texts.len(),
            labels.len()
        )));
    }
    if labels.iter().any(|label| label.trim().is_empty()) {
        return Err(RubricatorError::training_data("labels must not be blank"));
    }
    Ok(())
}
