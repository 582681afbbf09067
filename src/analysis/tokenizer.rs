//! Splitting raw rubric text into word tokens.
//!
//! # Examples
//!
//! ```
//! use rubricator::analysis::tokenizer::{Tokenizer, UnicodeWordTokenizer};
//!
//! let words: Vec<String> = UnicodeWordTokenizer
//!     .tokenize("Кафе; Кондитерские, пекарни")
//!     .unwrap()
//!     .map(|token| token.text)
//!     .collect();
//! assert_eq!(words, vec!["Кафе", "Кондитерские", "пекарни"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    fn name(&self) -> &'static str;
}

/// Splits on Unicode word boundaries (UAX #29).
///
/// Segments without any alphanumeric character (punctuation, the `;`
/// between rubrics, whitespace) are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeWordTokenizer;

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bounds()
            .filter(|segment| segment.chars().any(char::is_alphanumeric))
            .enumerate()
            .map(|(position, word)| Token::new(word, position))
            .collect();
        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<(String, usize)> {
        UnicodeWordTokenizer
            .tokenize(text)
            .unwrap()
            .map(|t| (t.text, t.position))
            .collect()
    }

    #[test]
    fn test_punctuation_is_dropped() {
        assert_eq!(
            words("ГИБДД; автомойка!"),
            vec![("ГИБДД".to_string(), 0), ("автомойка".to_string(), 1)]
        );
    }

    #[test]
    fn test_numbers_are_kept() {
        let texts: Vec<String> = words("Аптека 36.6, дом 12").into_iter().map(|w| w.0).collect();
        assert_eq!(texts, vec!["Аптека", "36.6", "дом", "12"]);
    }

    #[test]
    fn test_blank_text() {
        assert!(words("  ;  ").is_empty());
    }
}
