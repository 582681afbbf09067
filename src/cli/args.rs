//! Command line argument parsing for the rubricator CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Rubricator - rule-first hybrid classifier for business rubrics
#[derive(Parser, Debug, Clone)]
#[command(name = "rubricator")]
#[command(about = "Classify business rubrics and company listings into canonical categories")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RubricatorArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Classifier configuration file (JSON)
    #[arg(short, long, env = "RUBRICATOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the trained model and rule table
    #[arg(long, env = "RUBRICATOR_MODELS_DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    /// Append classifications to this JSON Lines history file
    #[arg(long, env = "RUBRICATOR_HISTORY", global = true)]
    pub history: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RubricatorArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify one text
    Classify(ClassifyArgs),

    /// Classify every rubric in a TXT or JSON file
    Batch(BatchArgs),

    /// Classify one company
    Company(CompanyArgs),

    /// Classify company records from a JSON or JSONL file
    Companies(CompaniesArgs),

    /// Add a keyword rule
    #[command(name = "add-rule")]
    AddRule(AddRuleArgs),

    /// List keyword rules
    Rules,

    /// Train the statistical model from company records
    Train(TrainArgs),

    /// Rank categories by embedding similarity
    Semantic(SemanticArgs),

    /// Correct a stored classification
    Correct(CorrectArgs),

    /// Summarize the classification history
    Report,

    /// Show what is loaded
    Health,
}

/// Arguments for classifying one text
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Text to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Number of ranked candidates to show
    #[arg(short = 'n', long)]
    pub top: Option<usize>,
}

/// Arguments for batch classification
#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    /// Rubric file: TXT (one per line) or JSON array of strings
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Number of ranked candidates per rubric
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Write results to this JSON file instead of stdout
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Arguments for classifying one company
#[derive(Parser, Debug, Clone)]
pub struct CompanyArgs {
    /// Company name
    #[arg(long)]
    pub name: String,

    /// Free-text description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Semicolon-separated rubrics
    #[arg(long, default_value = "")]
    pub rubrics: String,

    /// Address
    #[arg(long, default_value = "")]
    pub address: String,
}

/// Arguments for classifying company records
#[derive(Parser, Debug, Clone)]
pub struct CompaniesArgs {
    /// Company records (JSON array or JSONL)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Write results to this JSON file instead of stdout
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Arguments for adding a rule
#[derive(Parser, Debug, Clone)]
pub struct AddRuleArgs {
    /// Keyword matched case-insensitively as a substring
    #[arg(value_name = "KEYWORD")]
    pub keyword: String,

    /// Category assigned when the keyword matches
    #[arg(value_name = "CATEGORY")]
    pub category: String,

    /// Priority; rules above 70 override the model
    #[arg(short, long, default_value_t = crate::rules::DEFAULT_RULE_PRIORITY)]
    pub priority: i64,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Company records (JSON array or JSONL)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

/// Arguments for semantic ranking
#[derive(Parser, Debug, Clone)]
pub struct SemanticArgs {
    /// Categories file: JSON array of {id, name, description}
    #[arg(value_name = "CATEGORIES")]
    pub categories: PathBuf,

    /// Rubrics to classify
    #[arg(value_name = "RUBRIC", required_unless_present = "input")]
    pub rubrics: Vec<String>,

    /// Read rubrics from a TXT or JSON file
    #[arg(short, long, conflicts_with = "rubrics")]
    pub input: Option<PathBuf>,

    /// Number of ranked candidates per rubric
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Minimum remapped similarity in [0, 1]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Embedding dimension of the hashing embedder
    #[arg(long, default_value = "512")]
    pub dimension: usize,
}

/// Arguments for correcting a classification
#[derive(Parser, Debug, Clone)]
pub struct CorrectArgs {
    /// Id of the stored classification
    #[arg(value_name = "RECORD_ID")]
    pub record_id: uuid::Uuid,

    /// Correct category
    #[arg(value_name = "CATEGORY")]
    pub category: String,

    /// Why the prediction was wrong
    #[arg(short, long)]
    pub reason: Option<String>,

    /// Also add the correction as a keyword rule
    #[arg(long)]
    pub learn: bool,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity() {
        let args = RubricatorArgs::try_parse_from(["rubricator", "health"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = RubricatorArgs::try_parse_from(["rubricator", "-vv", "health"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = RubricatorArgs::try_parse_from(["rubricator", "health", "-q", "-v"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_classify_args() {
        let args = RubricatorArgs::try_parse_from([
            "rubricator",
            "classify",
            "Best coffee shop",
            "-n",
            "5",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.output_format, OutputFormat::Json);
        if let Command::Classify(classify) = args.command {
            assert_eq!(classify.text, "Best coffee shop");
            assert_eq!(classify.top, Some(5));
        } else {
            panic!("Expected classify command");
        }
    }

    #[test]
    fn test_add_rule_default_priority() {
        let args =
            RubricatorArgs::try_parse_from(["rubricator", "add-rule", "GIBDD", "Police"]).unwrap();
        if let Command::AddRule(rule) = args.command {
            assert_eq!(rule.priority, 50);
        } else {
            panic!("Expected add-rule command");
        }
    }

    #[test]
    fn test_semantic_requires_rubrics_or_input() {
        assert!(RubricatorArgs::try_parse_from(["rubricator", "semantic", "cats.json"]).is_err());
        assert!(
            RubricatorArgs::try_parse_from(["rubricator", "semantic", "cats.json", "Кафе"]).is_ok()
        );
        assert!(
            RubricatorArgs::try_parse_from([
                "rubricator",
                "semantic",
                "cats.json",
                "--input",
                "rubrics.txt"
            ])
            .is_ok()
        );
    }

    #[test]
    fn test_correct_parses_uuid() {
        assert!(
            RubricatorArgs::try_parse_from(["rubricator", "correct", "not-a-uuid", "Food"]).is_err()
        );
    }
}
