//! Hybrid classification core.
//!
//! - [`HybridClassifier`]: rule table in front of a [`CategoryScorer`]
//! - [`ModelScorer`]: scores with a trained statistical model
//! - [`SemanticIndex`](crate::embedding::SemanticIndex): scores by embedding similarity
//! - [`CompanyRecord`]: company listings classified through the same core
//!
//! # Example
//!
//! ```
//! use rubricator::classifier::{ClassifierConfig, HybridClassifier};
//!
//! let classifier = HybridClassifier::statistical(ClassifierConfig::default());
//! classifier.add_rule("GIBDD", "Police", 95);
//!
//! let prediction = classifier.classify("GIBDD office downtown");
//! assert_eq!(prediction.as_pair(), ("Police", 0.95));
//!
//! // No trained model yet: everything else is unknown.
//! assert_eq!(classifier.classify("Best coffee shop").as_pair(), ("Unknown", 0.0));
//! ```

mod company;
mod config;
mod hybrid;
mod scorer;
mod types;

pub use company::{CompanyClassification, CompanyRecord};
pub use config::ClassifierConfig;
pub use hybrid::HybridClassifier;
pub use scorer::{CategoryScorer, ModelScorer};
pub use types::{ClassificationResult, Prediction, Source};

pub(crate) use company::join_non_empty;
