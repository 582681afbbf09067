//! Text embedding trait for the semantic classifier.

use crate::error::Result;

/// Dense embedding vector.
pub type Embedding = Vec<f32>;

/// Trait for converting text to vector embeddings.
///
/// This trait provides a common interface for various embedding methods
/// (local models, API-based services, feature hashing) to plug into the
/// semantic similarity adapter.
///
/// # Examples
///
/// ```
/// use rubricator::embedding::{Embedding, TextEmbedder};
/// use rubricator::error::Result;
///
/// struct ConstantEmbedder;
///
/// impl TextEmbedder for ConstantEmbedder {
///     fn embed(&self, _text: &str) -> Result<Embedding> {
///         Ok(vec![1.0, 0.0])
///     }
///
///     fn dimension(&self) -> usize {
///         2
///     }
/// }
///
/// let vectors = ConstantEmbedder.embed_batch(&["a", "b"]).unwrap();
/// assert_eq!(vectors.len(), 2);
/// ```
pub trait TextEmbedder: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for multiple texts in batch.
    ///
    /// The default implementation calls `embed` sequentially.
    /// Override this method for better performance with batch processing.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Get the dimension of generated embeddings.
    fn dimension(&self) -> usize;

    /// Get the name/identifier of this embedder, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
