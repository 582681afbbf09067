//! Filters applied to the token stream after tokenization.

pub mod lowercase;
pub mod min_length;
pub mod stop;

pub use lowercase::LowercaseFilter;
pub use min_length::MinLengthFilter;
pub use stop::StopFilter;

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    fn name(&self) -> &'static str;
}
