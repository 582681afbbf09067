//! # Rubricator
//!
//! A rule-first hybrid classifier that maps free-text business rubrics and
//! company descriptions onto a canonical category list.
//!
//! ## Features
//!
//! - Keyword rules that override the model above a confidence threshold
//! - TF-IDF + multinomial naive Bayes model with JSON persistence
//! - Embedding-similarity ranking against category descriptions
//! - Background training with progress and cancellation
//! - Classification history, corrections and reports
//!
//! ```
//! use rubricator::classifier::{ClassifierConfig, HybridClassifier};
//!
//! let classifier = HybridClassifier::statistical(ClassifierConfig::default());
//! classifier.add_rule("аптека", "Аптеки", 90);
//!
//! let prediction = classifier.classify("Аптека на углу");
//! assert_eq!(prediction.as_pair(), ("Аптеки", 0.9));
//! assert!(classifier.classify("что-то другое").is_unknown());
//! ```

pub mod analysis;
pub mod category;
pub mod classifier;
pub mod cli;
pub mod context;
pub mod embedding;
pub mod error;
pub mod history;
pub mod model;
pub mod rules;
pub mod score;
pub mod storage;
pub mod training;

pub mod prelude {
    pub use crate::category::{Category, CategoryId, CategorySet};
    pub use crate::classifier::{
        ClassificationResult, ClassifierConfig, CompanyRecord, HybridClassifier, Prediction,
        Source,
    };
    pub use crate::context::ClassificationContext;
    pub use crate::error::{ErrorKind, Result, RubricatorError};
    pub use crate::rules::{Rule, RuleTable};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
