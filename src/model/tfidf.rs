//! TF-IDF vectorizer for text feature extraction.

use std::collections::HashSet;
use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, StandardAnalyzer};
use crate::error::{Result, RubricatorError};

/// Sparse feature vector: `(feature index, weight)` pairs sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

fn default_analyzer() -> Arc<dyn Analyzer> {
    Arc::new(StandardAnalyzer::new())
}

/// TF-IDF vectorizer.
///
/// Raw term counts are weighted by the smoothed inverse document frequency
/// `ln((1 + n) / (1 + df)) + 1` and each row is L2-normalized. When the
/// corpus has more distinct terms than `max_features`, only the most
/// frequent ones (by total count across the corpus) are kept. Terms are
/// indexed in lexicographic order so a refit on the same corpus yields the
/// same feature layout.
#[derive(Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Maximum vocabulary size.
    max_features: usize,
    /// Vocabulary terms; position is the feature index.
    terms: Vec<String>,
    /// Inverse document frequency for each term.
    idf: Vec<f64>,
    /// Total number of documents seen during fitting.
    n_documents: usize,
    /// term -> feature index, rebuilt after deserialization.
    #[serde(skip)]
    index: AHashMap<String, usize>,
    /// Analyzer for tokenization.
    #[serde(skip, default = "default_analyzer")]
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("max_features", &self.max_features)
            .field("vocabulary_size", &self.terms.len())
            .field("n_documents", &self.n_documents)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Create a vectorizer using the standard analyzer.
    pub fn new(max_features: usize) -> Self {
        Self::with_analyzer(max_features, default_analyzer())
    }

    /// Create a vectorizer with a custom analyzer.
    pub fn with_analyzer(max_features: usize, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            max_features,
            terms: Vec::new(),
            idf: Vec::new(),
            n_documents: 0,
            index: AHashMap::new(),
            analyzer,
        }
    }

    /// Fit the vocabulary and idf weights on training documents.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        if documents.is_empty() {
            return Err(RubricatorError::training_data(
                "cannot fit vectorizer on zero documents",
            ));
        }

        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        let mut term_frequency: AHashMap<String, usize> = AHashMap::new();

        for doc in documents {
            let tokens = self.analyzer.terms(doc)?;
            for token in &tokens {
                *term_frequency.entry(token.clone()).or_insert(0) += 1;
            }
            let unique_tokens: HashSet<String> = tokens.into_iter().collect();
            for token in unique_tokens {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        if term_frequency.is_empty() {
            return Err(RubricatorError::training_data(
                "empty vocabulary; documents contain only stop words or punctuation",
            ));
        }

        let mut candidates: Vec<(String, usize)> = term_frequency.into_iter().collect();
        if candidates.len() > self.max_features {
            candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            candidates.truncate(self.max_features);
        }

        let mut terms: Vec<String> = candidates.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n = documents.len() as f64;
        let idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
                ((n + 1.0) / (df + 1.0)).ln() + 1.0
            })
            .collect();

        self.n_documents = documents.len();
        self.terms = terms;
        self.idf = idf;
        self.rebuild_index();

        Ok(())
    }

    /// Transform a document into an L2-normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        if !self.is_fitted() {
            return Err(RubricatorError::model_not_loaded(
                "vectorizer has not been fitted",
            ));
        }

        let mut counts: AHashMap<usize, f64> = AHashMap::new();
        for token in self.analyzer.terms(document)? {
            if let Some(&idx) = self.index.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut features: SparseVector = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        features.sort_by(|a, b| a.0.cmp(&b.0));

        let norm = features.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut features {
                *weight /= norm;
            }
        }

        Ok(features)
    }

    /// Fit on the documents, then transform each of them.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        documents.iter().map(|doc| self.transform(doc)).collect()
    }

    /// Rebuild the term index; needed after deserialization.
    pub(crate) fn rebuild_index(&mut self) {
        self.index = self
            .terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
    }

    /// Check the persisted arrays agree with each other.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        if self.terms.len() != self.idf.len() {
            return Err(RubricatorError::model_not_loaded(format!(
                "vectorizer has {} terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            )));
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err(RubricatorError::model_not_loaded(
                "vectorizer contains non-finite idf weights",
            ));
        }
        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        !self.terms.is_empty()
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Idf weight of a term, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index.get(term).map(|&idx| self.idf[idx])
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tfidf_vectorizer() {
        let documents = docs(&[
            "coffee shop and bakery",
            "dental clinic",
            "coffee roasters",
        ]);

        let mut vectorizer = TfIdfVectorizer::new(5000);
        vectorizer.fit(&documents).unwrap();
        assert_eq!(vectorizer.vocabulary_size(), 6);

        // "coffee" appears in 2 of 3 documents, "dental" in 1
        let coffee = vectorizer.idf("coffee").unwrap();
        let dental = vectorizer.idf("dental").unwrap();
        assert!((coffee - ((4.0f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!(dental > coffee);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let mut vectorizer = TfIdfVectorizer::new(5000);
        vectorizer
            .fit(&docs(&["pharmacy clinic", "clinic hospital", "bakery"]))
            .unwrap();

        let features = vectorizer.transform("clinic pharmacy clinic").unwrap();
        let norm: f64 = features.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        assert!(features.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_unknown_terms_yield_empty_vector() {
        let mut vectorizer = TfIdfVectorizer::new(5000);
        vectorizer.fit(&docs(&["pharmacy"])).unwrap();
        assert!(vectorizer.transform("zebra").unwrap().is_empty());
    }

    #[test]
    fn test_max_features_keeps_most_frequent_terms() {
        let mut vectorizer = TfIdfVectorizer::new(2);
        vectorizer
            .fit(&docs(&["cafe cafe bar", "cafe bar pub", "bar wine"]))
            .unwrap();

        assert_eq!(vectorizer.vocabulary_size(), 2);
        assert!(vectorizer.idf("cafe").is_some());
        assert!(vectorizer.idf("bar").is_some());
        assert!(vectorizer.idf("pub").is_none());
    }

    #[test]
    fn test_stop_word_only_corpus_is_rejected() {
        let mut vectorizer = TfIdfVectorizer::new(5000);
        let err = vectorizer.fit(&docs(&["the and of", "a"])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TrainingData);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let vectorizer = TfIdfVectorizer::new(10);
        let err = vectorizer.transform("anything").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ModelNotLoaded);
    }
}
