//! Tokens flowing through the analysis pipeline.

/// One word of the input, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Index among the tokens the tokenizer emitted.
    pub position: usize,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }

    /// Length in characters; rubric text is mostly Cyrillic, so bytes mislead.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Lazily filtered sequence of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;
