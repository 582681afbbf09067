//! Output formatting for CLI commands.

use std::path::Path;

use serde::Serialize;

use crate::classifier::{ClassificationResult, CompanyClassification, Prediction};
use crate::context::Health;
use crate::error::Result;
use crate::history::{ClassificationRecord, ClassificationReport};
use crate::rules::RuleTable;
use crate::storage;
use crate::training::TrainingSummary;

use super::args::{OutputFormat, RubricatorArgs};

/// Result of classifying one text.
#[derive(Debug, Serialize)]
pub struct TextClassification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<uuid::Uuid>,
    pub text: String,
    pub best: Prediction,
    pub top: ClassificationResult,
}

/// Result of classifying one rubric in a batch.
#[derive(Debug, Serialize)]
pub struct RubricResult {
    pub rubric: String,
    pub top: ClassificationResult,
}

/// Values that have a human-readable rendering.
pub trait HumanOutput {
    fn print_human(&self);
}

/// Output a result in the requested format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &RubricatorArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_json<T: Serialize>(result: &T, args: &RubricatorArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Write results to a JSON file.
pub fn write_output_file<T: Serialize + ?Sized>(path: &Path, result: &T) -> Result<()> {
    storage::write_json_atomic(path, result)
}

fn print_ranked(top: &ClassificationResult) {
    for (i, prediction) in top.iter().enumerate() {
        println!(
            "  {}. {:<40} {:>6.2}%",
            i + 1,
            prediction.category,
            prediction.confidence * 100.0
        );
    }
}

impl HumanOutput for TextClassification {
    fn print_human(&self) {
        println!("Text: {}", self.text);
        println!(
            "Category: {} ({:.2}%, {:?})",
            self.best.category,
            self.best.confidence * 100.0,
            self.best.source
        );
        if let Some(id) = self.record_id {
            println!("Record: {id}");
        }
        println!("Top candidates:");
        print_ranked(&self.top);
    }
}

impl HumanOutput for Vec<RubricResult> {
    fn print_human(&self) {
        for result in self {
            println!("{}", result.rubric);
            print_ranked(&result.top);
        }
        println!();
        println!("Classified {} rubrics", self.len());
    }
}

impl HumanOutput for CompanyClassification {
    fn print_human(&self) {
        println!("Company: {}", self.company.name);
        println!(
            "Category: {} ({:.2}%)",
            self.category,
            self.confidence * 100.0
        );
        if self.rules_applied {
            println!("Decided by a keyword rule");
        }
        if self.needs_review {
            println!("Needs review: confidence below threshold");
        }
        println!("Top candidates:");
        for (i, prediction) in self.top.iter().enumerate() {
            println!(
                "  {}. {:<40} {:>6.2}%",
                i + 1,
                prediction.category,
                prediction.confidence * 100.0
            );
        }
    }
}

impl HumanOutput for Vec<CompanyClassification> {
    fn print_human(&self) {
        for result in self {
            let flag = if result.needs_review { " [review]" } else { "" };
            println!(
                "{:<40} {:<40} {:>6.2}%{flag}",
                result.company.name,
                result.category,
                result.confidence * 100.0
            );
        }
        let review = self.iter().filter(|r| r.needs_review).count();
        println!();
        println!("Classified {} companies, {review} need review", self.len());
    }
}

impl HumanOutput for RuleTable {
    fn print_human(&self) {
        if self.is_empty() {
            println!("No rules");
            return;
        }
        for rule in self.iter() {
            println!("{:>4}  {:<30} -> {}", rule.priority, rule.keyword, rule.category);
        }
    }
}

impl HumanOutput for crate::rules::Rule {
    fn print_human(&self) {
        println!(
            "Added rule '{}' -> '{}' (priority {}, confidence {:.2})",
            self.keyword,
            self.category,
            self.priority,
            self.confidence()
        );
    }
}

impl HumanOutput for TrainingSummary {
    fn print_human(&self) {
        println!("Trained on {} examples ({} skipped)", self.examples, self.skipped);
        println!("Categories: {}", self.classes.len());
        println!("Training accuracy: {:.2}%", self.training_accuracy * 100.0);
    }
}

impl HumanOutput for ClassificationRecord {
    fn print_human(&self) {
        println!("Record: {}", self.id);
        println!(
            "Predicted: {} ({:.2}%)",
            self.predicted_category,
            self.confidence * 100.0
        );
        println!("Final: {}", self.final_category());
    }
}

impl HumanOutput for ClassificationReport {
    fn print_human(&self) {
        println!("Classification Report:");
        println!("══════════════════════");
        println!("Total: {}", self.total);
        println!("Unique categories: {}", self.unique_categories);
        println!(
            "Confidence: mean {:.3}, min {:.3}, max {:.3}",
            self.mean_confidence, self.min_confidence, self.max_confidence
        );
        println!(
            "Low confidence (< {:.2}): {}",
            self.low_confidence_threshold, self.low_confidence
        );
        println!("Needs review: {}", self.needs_review);
        println!("Corrected: {}", self.corrected);
        println!("Decided by rules: {}", self.rules_applied);
        if !self.distribution.is_empty() {
            println!();
            println!("By category:");
            for entry in &self.distribution {
                println!("  {:<40} {}", entry.category, entry.count);
            }
        }
    }
}

impl HumanOutput for Health {
    fn print_human(&self) {
        println!("Scorer: {} ({})", self.scorer, if self.scorer_ready { "ready" } else { "not ready" });
        println!("Rules: {}", self.rules);
        if let Some(categories) = self.categories {
            println!("Categories: {categories}");
        }
        println!("Training: {:?}", self.training);
    }
}
