//! Training coordinator.
//!
//! Turns company records into `(text, label)` pairs and fits a model on
//! them, either synchronously with [`train`] or on a background thread
//! with [`TrainingJob`].

mod job;
mod pairs;

pub use job::{TrainingJob, TrainingSource, TrainingState, TrainingStatus};
pub use pairs::{
    TrainingSet, TrainingSummary, prepare_training_pairs, read_company_records, train,
};
