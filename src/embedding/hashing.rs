//! Feature-hashing text embedder.

use rayon::prelude::*;

use crate::analysis::analyzer::{Analyzer, StandardAnalyzer};
use crate::embedding::text_embedder::{Embedding, TextEmbedder};
use crate::error::{Result, RubricatorError};

const DEFAULT_DIMENSION: usize = 512;
const DEFAULT_CHAR_NGRAM: usize = 3;

const WORD_WEIGHT: f32 = 1.0;
const CHAR_NGRAM_WEIGHT: f32 = 0.5;

/// Deterministic embedder built from hashed word and character n-gram features.
///
/// Each lowercased word and each character n-gram of the word (padded with
/// `<` and `>`) is hashed with CRC32 into one of `dimension` buckets with a
/// hash-derived sign. The result is L2-normalized. Character n-grams let
/// inflected forms ("кофейня", "кофейни") land close to each other.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    char_ngram: usize,
    analyzer: StandardAnalyzer,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            char_ngram: DEFAULT_CHAR_NGRAM,
            analyzer: StandardAnalyzer::without_stop_words(),
        }
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RubricatorError::config("embedding dimension must be positive"));
        }
        Ok(Self {
            dimension,
            ..Self::default()
        })
    }

    /// Use character n-grams of length `n`; 0 disables them.
    pub fn with_char_ngram(mut self, n: usize) -> Self {
        self.char_ngram = n;
        self
    }

    fn add_feature(&self, vector: &mut [f32], kind: u8, feature: &str, weight: f32) {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&[kind]);
        hasher.update(feature.as_bytes());
        let hash = hasher.finalize();

        let bucket = hash as usize % self.dimension;
        let sign = if hash >> 31 == 1 { -1.0 } else { 1.0 };
        vector[bucket] += sign * weight;
    }

    fn add_char_ngrams(&self, vector: &mut [f32], word: &str) {
        if self.char_ngram == 0 {
            return;
        }
        let padded: Vec<char> = std::iter::once('<')
            .chain(word.chars())
            .chain(std::iter::once('>'))
            .collect();
        if padded.len() < self.char_ngram {
            return;
        }
        for window in padded.windows(self.char_ngram) {
            let gram: String = window.iter().collect();
            self.add_feature(vector, b'c', &gram, CHAR_NGRAM_WEIGHT);
        }
    }
}

impl TextEmbedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in self.analyzer.terms(text)? {
            self.add_feature(&mut vector, b'w', &word, WORD_WEIGHT);
            self.add_char_ngrams(&mut vector, &word);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.par_iter().map(|text| self.embed(text)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
