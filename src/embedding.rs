//! Semantic similarity between texts and categories.
//!
//! A [`TextEmbedder`] turns text into a fixed-length vector. The
//! [`SemanticIndex`] embeds every category once, caches the vectors, and
//! ranks categories for an input by cosine similarity remapped from
//! `[-1, 1]` to `[0, 1]` via `(s + 1) / 2`.
//!
//! [`HashingEmbedder`] is a deterministic, dependency-free embedder so the
//! semantic variant works without an external model. Any neural or remote
//! embedder plugs in by implementing [`TextEmbedder`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rubricator::category::{Category, CategorySet};
//! use rubricator::embedding::{HashingEmbedder, SemanticIndex};
//!
//! # fn main() -> rubricator::error::Result<()> {
//! let index = SemanticIndex::new(Arc::new(HashingEmbedder::default()));
//! index.load_categories(Arc::new(CategorySet::new(vec![
//!     Category::new(1, "Food", "restaurants, cafes, coffee"),
//!     Category::new(2, "Health", "clinics, pharmacies"),
//! ])?))?;
//!
//! let ranked = index.rank("coffee house", 2)?;
//! assert_eq!(ranked[0].category, "Food");
//! # Ok(())
//! # }
//! ```

mod hashing;
mod index;
mod similarity;
mod text_embedder;

pub use hashing::HashingEmbedder;
pub use index::{CategoryEmbeddings, SemanticIndex};
pub use similarity::{cosine_similarity, remap_similarity};
pub use text_embedder::{Embedding, TextEmbedder};
