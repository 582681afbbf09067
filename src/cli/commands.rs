//! Command implementations for the rubricator CLI.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::category::CategorySet;
use crate::classifier::{ClassifierConfig, CompanyClassification, CompanyRecord};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::context::ClassificationContext;
use crate::embedding::HashingEmbedder;
use crate::error::{Result, RubricatorError};
use crate::history::{ClassificationRecord, Correction, JsonlSink};
use crate::training::{TrainingSource, read_company_records};

/// Execute a CLI command.
pub fn execute_command(args: RubricatorArgs) -> Result<()> {
    let config = load_config(&args)?;

    match &args.command {
        Command::Classify(classify_args) => classify(classify_args, config, &args),
        Command::Batch(batch_args) => classify_batch(batch_args, config, &args),
        Command::Company(company_args) => classify_company(company_args, config, &args),
        Command::Companies(companies_args) => classify_companies(companies_args, config, &args),
        Command::AddRule(rule_args) => add_rule(rule_args, config, &args),
        Command::Rules => list_rules(config, &args),
        Command::Train(train_args) => train(train_args, config, &args),
        Command::Semantic(semantic_args) => semantic(semantic_args, config, &args),
        Command::Correct(correct_args) => correct(correct_args, config, &args),
        Command::Report => report(config, &args),
        Command::Health => health(config, &args),
    }
}

fn load_config(args: &RubricatorArgs) -> Result<ClassifierConfig> {
    let mut config = match &args.config {
        Some(path) => ClassifierConfig::from_file(path)?,
        None => ClassifierConfig::default(),
    };
    if let Some(models_dir) = &args.models_dir {
        config.models_directory = models_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_context(config: ClassifierConfig, args: &RubricatorArgs) -> Result<ClassificationContext> {
    let context = ClassificationContext::open(config)?;
    Ok(attach_history(context, args))
}

fn attach_history(context: ClassificationContext, args: &RubricatorArgs) -> ClassificationContext {
    match &args.history {
        Some(path) => context.with_sink(Arc::new(JsonlSink::new(path))),
        None => context,
    }
}

fn require_history(args: &RubricatorArgs) -> Result<()> {
    if args.history.is_none() {
        return Err(RubricatorError::invalid_input(
            "this command needs a history file; pass --history or set RUBRICATOR_HISTORY",
        ));
    }
    Ok(())
}

/// Read rubrics from a JSON array of strings, or one per non-empty line.
pub fn read_rubrics(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let rubrics: Vec<String> = serde_json::from_str(&content)?;
        return Ok(rubrics
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect());
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn classify(args: &ClassifyArgs, config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    let context = open_context(config, cli_args)?;
    let n = args.top.unwrap_or(context.config().default_top_n);

    let result = classify_text(&context, &args.text, n, cli_args.history.is_some())?;
    output_result("Classification", &result, cli_args)
}

fn classify_text(
    context: &ClassificationContext,
    text: &str,
    n: usize,
    record: bool,
) -> Result<TextClassification> {
    let best = context.classifier().classify(text);
    let top = context.classifier().classify_top_n(text, n);
    let record_id = if record {
        Some(context.record_classification(text, &best, &top)?.id)
    } else {
        None
    };

    Ok(TextClassification {
        record_id,
        text: text.to_string(),
        best,
        top,
    })
}

fn classify_batch(
    args: &BatchArgs,
    config: ClassifierConfig,
    cli_args: &RubricatorArgs,
) -> Result<()> {
    let context = open_context(config, cli_args)?;
    let rubrics = read_rubrics(&args.input)
        .with_context(|| format!("cannot read rubrics from {}", args.input.display()))?;
    let n = args.top.unwrap_or(context.config().default_top_n);

    log::info!("classifying {} rubrics from {}", rubrics.len(), args.input.display());
    let results: Vec<RubricResult> = context
        .classifier()
        .classify_batch(&rubrics, n)
        .into_iter()
        .zip(rubrics)
        .map(|(top, rubric)| RubricResult { rubric, top })
        .collect();

    match &args.output {
        Some(path) => {
            write_output_file(path, &results)?;
            if cli_args.verbosity() > 0 {
                println!("Wrote {} results to {}", results.len(), path.display());
            }
            Ok(())
        }
        None => output_result("Batch classification", &results, cli_args),
    }
}

fn classify_company(
    args: &CompanyArgs,
    config: ClassifierConfig,
    cli_args: &RubricatorArgs,
) -> Result<()> {
    if args.name.trim().is_empty() {
        return Err(RubricatorError::invalid_input("company name must not be empty"));
    }
    let context = open_context(config, cli_args)?;
    let company = CompanyRecord::new(&args.name, &args.description, &args.rubrics)
        .with_address(&args.address);

    let (result, _record) = context.classify_company_and_record(&company)?;
    output_result("Company classification", &result, cli_args)
}

fn classify_companies(
    args: &CompaniesArgs,
    config: ClassifierConfig,
    cli_args: &RubricatorArgs,
) -> Result<()> {
    let context = open_context(config, cli_args)?;
    let companies = read_company_records(&args.input)
        .with_context(|| format!("cannot read companies from {}", args.input.display()))?;

    let results: Vec<CompanyClassification> = companies
        .iter()
        .map(|company| {
            context
                .classify_company_and_record(company)
                .map(|(result, _)| result)
        })
        .collect::<Result<_>>()?;

    match &args.output {
        Some(path) => {
            write_output_file(path, &results)?;
            if cli_args.verbosity() > 0 {
                println!("Wrote {} results to {}", results.len(), path.display());
            }
            Ok(())
        }
        None => output_result("Company classification", &results, cli_args),
    }
}

fn add_rule(args: &AddRuleArgs, config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    let context = open_context(config, cli_args)?;
    let rule = context.add_rule(&args.keyword, &args.category, args.priority)?;
    output_result("Rule added", &rule, cli_args)
}

fn list_rules(config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    let context = open_context(config, cli_args)?;
    output_result("Rules", &context.classifier().rules(), cli_args)
}

fn train(args: &TrainArgs, config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    let context = open_context(config, cli_args)?;
    context.start_training(TrainingSource::File(args.input.clone()))?;
    let summary = context.wait_for_training()?;
    output_result("Training completed", &summary, cli_args)
}

fn semantic(args: &SemanticArgs, mut config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    if let Some(threshold) = args.threshold {
        config.min_similarity = threshold;
        config.validate()?;
    }
    let categories = CategorySet::from_json_file(&args.categories).with_context(|| {
        format!("cannot read categories from {}", args.categories.display())
    })?;
    let embedder = Arc::new(HashingEmbedder::new(args.dimension)?);
    let context = attach_history(
        ClassificationContext::semantic(config, embedder, categories)?,
        cli_args,
    );

    let rubrics = match &args.input {
        Some(path) => read_rubrics(path)
            .with_context(|| format!("cannot read rubrics from {}", path.display()))?,
        None => args.rubrics.clone(),
    };
    let n = args.top.unwrap_or(context.config().default_top_n);

    let results: Vec<RubricResult> = context
        .classifier()
        .classify_batch(&rubrics, n)
        .into_iter()
        .zip(rubrics)
        .map(|(top, rubric)| RubricResult { rubric, top })
        .collect();
    output_result("Semantic classification", &results, cli_args)
}

fn correct(args: &CorrectArgs, config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    require_history(cli_args)?;
    let context = open_context(config, cli_args)?;

    let mut correction = Correction::new(args.record_id, &args.category);
    if let Some(reason) = &args.reason {
        correction = correction.with_reason(reason);
    }
    let record: ClassificationRecord = context.correct(correction, args.learn)?;
    output_result("Correction stored", &record, cli_args)
}

fn report(config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    require_history(cli_args)?;
    let context = open_context(config, cli_args)?;
    output_result("Report", &context.report()?, cli_args)
}

fn health(config: ClassifierConfig, cli_args: &RubricatorArgs) -> Result<()> {
    let context = open_context(config, cli_args)?;
    output_result("Health", &context.health(), cli_args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_rubrics_txt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rubrics.txt");
        fs::write(&path, "Кафе\n\n  Аптеки  \n").unwrap();
        assert_eq!(read_rubrics(&path).unwrap(), vec!["Кафе", "Аптеки"]);
    }

    #[test]
    fn test_read_rubrics_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rubrics.json");
        fs::write(&path, r#"["ГИБДД", " ", "Школы"]"#).unwrap();
        assert_eq!(read_rubrics(&path).unwrap(), vec!["ГИБДД", "Школы"]);
    }

    #[test]
    fn test_add_rule_then_classify() {
        let dir = TempDir::new().unwrap();
        let models_dir = dir.path().to_str().unwrap();

        let args = RubricatorArgs::parse_from_for_test(&[
            "rubricator",
            "--models-dir",
            models_dir,
            "add-rule",
            "GIBDD",
            "Police",
            "-p",
            "95",
        ]);
        execute_command(args).unwrap();
        assert!(dir.path().join("training_rules.json").exists());

        let args = RubricatorArgs::parse_from_for_test(&[
            "rubricator",
            "--models-dir",
            models_dir,
            "-f",
            "json",
            "classify",
            "GIBDD office",
        ]);
        execute_command(args).unwrap();
    }

    #[test]
    fn test_classify_records_what_it_prints() {
        let dir = TempDir::new().unwrap();
        let config = ClassifierConfig {
            models_directory: dir.path().to_path_buf(),
            default_top_n: 3,
            ..Default::default()
        };
        let context = ClassificationContext::open(config).unwrap();
        context
            .start_training(TrainingSource::Records(vec![
                CompanyRecord::new("Bean", "coffee and pastries", "Cafes"),
                CompanyRecord::new("Smile", "dental care", "Clinics"),
                CompanyRecord::new("Tyre", "wheel repair", "Garages"),
            ]))
            .unwrap();
        context.wait_for_training().unwrap();
        assert_eq!(context.classifier().classify_top_n("coffee", 3).len(), 3);

        let printed = classify_text(&context, "coffee", 1, true).unwrap();
        let records = context.sink().records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(printed.record_id, Some(records[0].id));
        assert_eq!(records[0].predicted_category, printed.best.category);
        assert_eq!(records[0].top, printed.top.predictions().to_vec());
        assert_eq!(records[0].top.len(), 1);

        let unrecorded = classify_text(&context, "coffee", 1, false).unwrap();
        assert!(unrecorded.record_id.is_none());
        assert_eq!(context.sink().records().unwrap().len(), 1);
    }

    #[test]
    fn test_report_requires_history() {
        let dir = TempDir::new().unwrap();
        let args = RubricatorArgs::parse_from_for_test(&[
            "rubricator",
            "--models-dir",
            dir.path().to_str().unwrap(),
            "report",
        ]);
        assert!(execute_command(args).is_err());
    }

    impl RubricatorArgs {
        fn parse_from_for_test(argv: &[&str]) -> Self {
            use clap::Parser;
            let mut args = RubricatorArgs::try_parse_from(argv).unwrap();
            // Ignore RUBRICATOR_* variables from the environment running the tests.
            if !argv.contains(&"--history") {
                args.history = None;
            }
            if !argv.contains(&"--config") {
                args.config = None;
            }
            args
        }
    }
}
