//! Training pairs derived from company records.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::classifier::{CompanyRecord, join_non_empty};
use crate::error::{Result, RubricatorError};
use crate::model::TextModel;

/// Parallel training texts and labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub texts: Vec<String>,
    pub labels: Vec<String>,
    /// Records dropped because their text was empty.
    pub skipped: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn into_pairs(self) -> (Vec<String>, Vec<String>) {
        (self.texts, self.labels)
    }
}

/// Outcome of a successful training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub examples: usize,
    pub skipped: usize,
    pub classes: Vec<String>,
    /// Share of training texts the fitted model labels correctly.
    pub training_accuracy: f64,
}

/// Derive one `(text, label)` pair per record.
///
/// The text is the record's description and rubrics joined by a space; the
/// label is the first `;`-separated rubric, or `fallback_label` when the
/// record has none. Records whose text is empty are skipped.
pub fn prepare_training_pairs(records: &[CompanyRecord], fallback_label: &str) -> TrainingSet {
    let mut set = TrainingSet::default();

    for record in records {
        let text = join_non_empty(&[&record.description, &record.rubrics]);
        if text.is_empty() {
            set.skipped += 1;
            continue;
        }
        let label = record.primary_rubric().unwrap_or(fallback_label);
        set.texts.push(text);
        set.labels.push(label.to_string());
    }

    if set.skipped > 0 {
        log::debug!("skipped {} records with no description or rubrics", set.skipped);
    }
    set
}

/// Steps of a training run, announced before each one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrainingStep {
    Preprocessing,
    Fitting,
    Validating,
}

/// Fit `model` on the pairs derived from `records`.
///
/// Fails with a no-trainable-data error when no pair survives filtering;
/// shape errors from the model itself are passed through unchanged.
pub fn train(
    model: &mut dyn TextModel,
    records: &[CompanyRecord],
    fallback_label: &str,
) -> Result<TrainingSummary> {
    train_in_steps(model, records, fallback_label, |_| Ok(()))
}

/// [`train`], calling `before` ahead of each step. An error from `before`
/// stops the run with `model` left as it was at that point.
pub(crate) fn train_in_steps(
    model: &mut dyn TextModel,
    records: &[CompanyRecord],
    fallback_label: &str,
    mut before: impl FnMut(TrainingStep) -> Result<()>,
) -> Result<TrainingSummary> {
    before(TrainingStep::Preprocessing)?;
    let set = prepare_training_pairs(records, fallback_label);
    if set.is_empty() {
        return Err(RubricatorError::no_trainable_data(format!(
            "none of {} records has a description or rubrics",
            records.len()
        )));
    }

    before(TrainingStep::Fitting)?;
    model.fit(&set.texts, &set.labels)?;

    before(TrainingStep::Validating)?;
    let training_accuracy = training_accuracy(model, &set)?;

    log::info!(
        "trained {} on {} examples ({} skipped), training accuracy {:.3}",
        model.name(),
        set.len(),
        set.skipped,
        training_accuracy
    );

    Ok(TrainingSummary {
        examples: set.len(),
        skipped: set.skipped,
        classes: model.classes().to_vec(),
        training_accuracy,
    })
}

/// Share of `set` the fitted model labels correctly.
fn training_accuracy(model: &dyn TextModel, set: &TrainingSet) -> Result<f64> {
    let distributions = model.predict_distribution_batch(&set.texts)?;
    let correct = distributions
        .iter()
        .zip(&set.labels)
        .filter(|(distribution, label)| {
            distribution
                .best()
                .is_some_and(|best| &best.category == *label)
        })
        .count();
    Ok(correct as f64 / set.len().max(1) as f64)
}

/// Read company records from a JSON array or a JSON Lines file.
///
/// Files ending in `.jsonl` are read line by line; blank lines are ignored.
pub fn read_company_records<P: AsRef<Path>>(path: P) -> Result<Vec<CompanyRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let is_jsonl = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    if !is_jsonl {
        return Ok(serde_json::from_str(&content)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|e| {
                RubricatorError::invalid_input(format!(
                    "{}:{}: {e}",
                    path.display(),
                    number + 1
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::TfIdfNaiveBayes;
    use tempfile::TempDir;

    fn record(description: &str, rubrics: &str) -> CompanyRecord {
        CompanyRecord::new("ignored name", description, rubrics)
    }

    #[test]
    fn test_prepare_training_pairs() {
        let records = vec![
            record("производственная компания", "Металлоизделия; Лестницы"),
            record("сеть аптек", ""),
            record("", ""),
            record("  ", " "),
        ];

        let set = prepare_training_pairs(&records, "Other");
        assert_eq!(
            set.texts,
            vec![
                "производственная компания Металлоизделия; Лестницы".to_string(),
                "сеть аптек".to_string(),
            ]
        );
        assert_eq!(set.labels, vec!["Металлоизделия".to_string(), "Other".to_string()]);
        assert_eq!(set.skipped, 2);
    }

    #[test]
    fn test_name_is_not_part_of_training_text() {
        let set = prepare_training_pairs(&[CompanyRecord::new("Acme", "", "Tools")], "Other");
        assert_eq!(set.texts, vec!["Tools".to_string()]);
    }

    #[test]
    fn test_train_without_usable_records() {
        let mut model = TfIdfNaiveBayes::default();
        let err = train(&mut model, &[record("", "")], "Other").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoTrainableData);

        let err = train(&mut model, &[], "Other").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoTrainableData);
    }

    #[test]
    fn test_train_in_steps_order_and_stop() {
        let records = vec![record("coffee bar", "Cafes"), record("dental care", "Clinics")];

        let mut steps = Vec::new();
        let mut model = TfIdfNaiveBayes::default();
        let summary = train_in_steps(&mut model, &records, "Other", |step| {
            steps.push(step);
            Ok(())
        })
        .unwrap();
        assert_eq!(
            steps,
            vec![
                TrainingStep::Preprocessing,
                TrainingStep::Fitting,
                TrainingStep::Validating
            ]
        );
        assert_eq!(summary.examples, 2);
        assert_eq!(summary.training_accuracy, 1.0);

        let mut model = TfIdfNaiveBayes::default();
        let err = train_in_steps(&mut model, &records, "Other", |step| match step {
            TrainingStep::Fitting => Err(RubricatorError::cancelled("stop")),
            _ => Ok(()),
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!model.is_trained());
    }

    #[test]
    fn test_train_propagates_model_errors() {
        // Only stop words: pairs survive, but the vectorizer has no vocabulary.
        let mut model = TfIdfNaiveBayes::default();
        let err = train(&mut model, &[record("the", "")], "Other").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TrainingData);
    }

    #[test]
    fn test_train() {
        let records = vec![
            record("coffee and pastries", "Cafes; Bakeries"),
            record("espresso bar", "Cafes"),
            record("dental care", "Clinics"),
            record("family doctors", "Clinics; Pharmacies"),
        ];

        let mut model = TfIdfNaiveBayes::default();
        let summary = train(&mut model, &records, "Other").unwrap();

        assert_eq!(summary.examples, 4);
        assert_eq!(summary.classes, vec!["Cafes".to_string(), "Clinics".to_string()]);
        assert!(summary.training_accuracy > 0.5);
        assert!(model.is_trained());
    }

    #[test]
    fn test_read_company_records() {
        let dir = TempDir::new().unwrap();

        let json = dir.path().join("companies.json");
        fs::write(&json, r#"[{"name": "ЗАГС", "rubrics": "ЗАГС"}]"#).unwrap();
        assert_eq!(read_company_records(&json).unwrap()[0].rubrics, "ЗАГС");

        let jsonl = dir.path().join("companies.jsonl");
        fs::write(
            &jsonl,
            "{\"name\": \"A\", \"description\": \"x\"}\n\n{\"Наименование\": \"B\"}\n",
        )
        .unwrap();
        let records = read_company_records(&jsonl).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "B");
    }
}
