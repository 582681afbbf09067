//! Cached category embeddings and similarity ranking.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::category::CategorySet;
use crate::embedding::similarity::{cosine_similarity, remap_similarity};
use crate::embedding::text_embedder::{Embedding, TextEmbedder};
use crate::error::{Result, RubricatorError};
use crate::score::{CategoryScore, Distribution};

/// One embedding per category, in category load order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEmbeddings {
    categories: Arc<CategorySet>,
    vectors: Vec<Embedding>,
}

impl CategoryEmbeddings {
    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn vectors(&self) -> &[Embedding] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn score(&self, query: &[f32]) -> Result<Distribution> {
        let scores = self
            .categories
            .iter()
            .zip(&self.vectors)
            .map(|(category, vector)| {
                let score = remap_similarity(cosine_similarity(query, vector));
                CategoryScore::new(category.name.clone(), score).with_id(category.id.clone())
            })
            .collect();
        Distribution::new(scores).validated()
    }
}

/// Semantic similarity adapter over a loaded category set.
///
/// The cache is replaced wholesale by [`load_categories`](Self::load_categories):
/// readers holding the previous snapshot finish against it, new readers see
/// the new one, and no category from an older load survives a reload.
pub struct SemanticIndex {
    embedder: Arc<dyn TextEmbedder>,
    cache: RwLock<Option<Arc<CategoryEmbeddings>>>,
    min_similarity: f64,
}

impl fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("embedder", &self.embedder.name())
            .field("categories", &self.snapshot().map(|c| c.len()).unwrap_or(0))
            .field("min_similarity", &self.min_similarity)
            .finish()
    }
}

impl SemanticIndex {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            cache: RwLock::new(None),
            min_similarity: 0.0,
        }
    }

    /// Drop ranked candidates whose remapped score is below `threshold`.
    pub fn with_min_similarity(mut self, threshold: f64) -> Self {
        self.min_similarity = threshold;
        self
    }

    pub fn min_similarity(&self) -> f64 {
        self.min_similarity
    }

    /// Embed every category in one batched call and replace the cache.
    pub fn load_categories(&self, categories: Arc<CategorySet>) -> Result<()> {
        let texts = categories.embedding_texts();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed_batch(&refs)?;

        if vectors.len() != categories.len() {
            return Err(RubricatorError::adapter(format!(
                "embedder returned {} vectors for {} categories",
                vectors.len(),
                categories.len()
            )));
        }
        let dimension = self.embedder.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(RubricatorError::adapter(format!(
                "embedder returned a {}-dimensional vector, expected {dimension}",
                bad.len()
            )));
        }

        let embeddings = Arc::new(CategoryEmbeddings {
            categories,
            vectors,
        });
        *self.cache.write() = Some(embeddings);

        log::info!(
            "embedded {} categories with {}",
            refs.len(),
            self.embedder.name()
        );
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.read().is_some()
    }

    /// Current cache, if categories have been loaded.
    pub fn snapshot(&self) -> Option<Arc<CategoryEmbeddings>> {
        self.cache.read().clone()
    }

    fn loaded(&self) -> Result<Arc<CategoryEmbeddings>> {
        self.snapshot()
            .ok_or_else(|| RubricatorError::model_not_loaded("no categories have been loaded"))
    }

    /// Remapped similarity of `text` to every category, in category order.
    pub fn distribution(&self, text: &str) -> Result<Distribution> {
        let embeddings = self.loaded()?;
        let query = self.embedder.embed(text)?;
        embeddings.score(&query)
    }

    /// Distributions for many texts, embedded in one batched call.
    pub fn distribution_batch(&self, texts: &[String]) -> Result<Vec<Distribution>> {
        let embeddings = self.loaded()?;
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let queries = self.embedder.embed_batch(&refs)?;
        if queries.len() != texts.len() {
            return Err(RubricatorError::adapter(format!(
                "embedder returned {} vectors for {} texts",
                queries.len(),
                texts.len()
            )));
        }
        queries.iter().map(|query| embeddings.score(query)).collect()
    }

    /// Top `n` categories for `text` at or above the similarity threshold.
    ///
    /// May be empty when every category falls below the threshold.
    pub fn rank(&self, text: &str, n: usize) -> Result<Vec<CategoryScore>> {
        Ok(self
            .distribution(text)?
            .filtered(self.min_similarity)
            .ranked(n))
    }
}
