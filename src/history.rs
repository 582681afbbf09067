//! Classification history, corrections and reports.
//!
//! The classifier never writes history itself; callers hand results to a
//! [`ResultSink`]. Corrections stored in a sink can be turned back into
//! rules with [`correction_rule`] so a human fix applies to future inputs
//! without retraining.

mod record;
mod report;
mod sink;

pub use record::{CORRECTION_RULE_PRIORITY, ClassificationRecord, Correction, correction_rule};
pub use report::{CategoryCount, ClassificationReport};
pub use sink::{JsonlSink, MemorySink, ResultSink};
