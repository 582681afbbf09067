//! Unicode-aware case folding.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Lowercases every token, so "ГИБДД" and "гибдд" count as one term.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseFilter;

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.map(|token| Token {
            text: token.text.to_lowercase(),
            ..token
        })))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_filter() {
        let tokens = vec![Token::new("Кафе", 0), Token::new("ГИБДД", 1)];
        let result: Vec<Token> = LowercaseFilter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .collect();

        assert_eq!(result, vec![Token::new("кафе", 0), Token::new("гибдд", 1)]);
    }
}
