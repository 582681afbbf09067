//! Process-wide classification context.
//!
//! One [`ClassificationContext`] is built at start-up and handed to every
//! request handler. It owns the classifier, the history sink and the
//! current training job, and persists rules and models under the
//! configured models directory.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::category::CategorySet;
use crate::classifier::{
    ClassificationResult, ClassifierConfig, CompanyClassification, CompanyRecord,
    HybridClassifier, Prediction,
};
use crate::embedding::TextEmbedder;
use crate::error::{ErrorKind, Result, RubricatorError};
use crate::history::{
    ClassificationRecord, ClassificationReport, Correction, MemorySink, ResultSink,
    correction_rule,
};
use crate::model::TfIdfNaiveBayes;
use crate::rules::{Rule, RuleTable};
use crate::training::{TrainingJob, TrainingSource, TrainingState, TrainingStatus, TrainingSummary};

/// What is loaded and ready.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub scorer: String,
    pub scorer_ready: bool,
    pub rules: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<usize>,
    pub training: TrainingState,
}

/// Explicit replacement for a global classifier instance.
pub struct ClassificationContext {
    classifier: Arc<HybridClassifier>,
    sink: Arc<dyn ResultSink>,
    training: Mutex<Option<Arc<TrainingJob>>>,
    // Serializes rule edits with the write of the rule file.
    rules_lock: Mutex<()>,
}

impl std::fmt::Debug for ClassificationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationContext")
            .field("classifier", &self.classifier)
            .field("sink", &self.sink.name())
            .finish()
    }
}

impl ClassificationContext {
    /// Statistical classifier with persisted rules and model, if present.
    ///
    /// A missing or unreadable model leaves the classifier untrained; it
    /// answers "Unknown" until training completes.
    pub fn open(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let rules = RuleTable::load(&config.rules_path())?;
        let model_path = config.model_path();
        let classifier = HybridClassifier::statistical(config).with_rules(rules);

        match TfIdfNaiveBayes::load(&model_path) {
            Ok(model) => classifier.replace_model(Arc::new(model))?,
            Err(e) if e.kind() == ErrorKind::ModelNotLoaded => {
                log::warn!("starting without a trained model: {e}");
            }
            Err(e) => return Err(e),
        }

        Ok(Self::with_classifier(classifier))
    }

    /// Embedding-similarity classifier over `categories`, with persisted rules.
    pub fn semantic(
        config: ClassifierConfig,
        embedder: Arc<dyn TextEmbedder>,
        categories: CategorySet,
    ) -> Result<Self> {
        config.validate()?;
        let rules = RuleTable::load(&config.rules_path())?;
        let classifier = HybridClassifier::semantic(config, embedder).with_rules(rules);
        classifier.load_categories(categories)?;
        Ok(Self::with_classifier(classifier))
    }

    pub fn with_classifier(classifier: HybridClassifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
            sink: Arc::new(MemorySink::new()),
            training: Mutex::new(None),
            rules_lock: Mutex::new(()),
        }
    }

    /// Send history to `sink` instead of memory.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn classifier(&self) -> &Arc<HybridClassifier> {
        &self.classifier
    }

    pub fn config(&self) -> &ClassifierConfig {
        self.classifier.config()
    }

    pub fn sink(&self) -> &Arc<dyn ResultSink> {
        &self.sink
    }

    /// Classify one text and store the result.
    pub fn classify_and_record(&self, text: &str) -> Result<ClassificationRecord> {
        let best = self.classifier.classify(text);
        let top = self
            .classifier
            .classify_top_n(text, self.config().default_top_n);
        self.record_classification(text, &best, &top)
    }

    /// Store an already computed classification of `text`.
    pub fn record_classification(
        &self,
        text: &str,
        best: &Prediction,
        top: &ClassificationResult,
    ) -> Result<ClassificationRecord> {
        let record = ClassificationRecord::new(
            text,
            best,
            top.predictions().to_vec(),
            self.config().review_threshold,
        );
        self.sink.record(record.clone())?;
        Ok(record)
    }

    /// Classify one company and store the result.
    pub fn classify_company_and_record(
        &self,
        company: &CompanyRecord,
    ) -> Result<(CompanyClassification, ClassificationRecord)> {
        let result = self.classifier.classify_company(company);
        let record = ClassificationRecord::from_company(&result);
        self.sink.record(record.clone())?;
        Ok((result, record))
    }

    /// Add a rule and persist the rule table.
    pub fn add_rule(&self, keyword: &str, category: &str, priority: i64) -> Result<Rule> {
        if keyword.trim().is_empty() {
            return Err(RubricatorError::invalid_input("rule keyword must not be empty"));
        }
        let _guard = self.rules_lock.lock();
        let rule = self.classifier.add_rule(keyword, category, priority);
        self.write_rules()?;
        Ok(rule)
    }

    pub fn save_rules(&self) -> Result<()> {
        let _guard = self.rules_lock.lock();
        self.write_rules()
    }

    fn write_rules(&self) -> Result<()> {
        self.classifier.rules().save(&self.config().rules_path())
    }

    /// Store a correction; with `learn`, also add it as a rule.
    pub fn correct(&self, correction: Correction, learn: bool) -> Result<ClassificationRecord> {
        let record = self.sink.apply_correction(correction)?;
        if learn
            && let Some(correction) = &record.correction
            && let Some(rule) = correction_rule(&record, correction)
        {
            self.add_rule(&rule.keyword, &rule.category, rule.priority)?;
        }
        Ok(record)
    }

    pub fn report(&self) -> Result<ClassificationReport> {
        Ok(ClassificationReport::from_records(
            &self.sink.records()?,
            self.config().low_confidence_threshold,
        ))
    }

    /// Start background training; fails if a job is still running.
    pub fn start_training(&self, source: TrainingSource) -> Result<()> {
        let mut training = self.training.lock();
        if let Some(job) = training.as_ref()
            && !job.is_finished()
        {
            return Err(RubricatorError::invalid_input("training is already running"));
        }

        let job = TrainingJob::spawn(
            self.classifier.clone(),
            source,
            Some(self.config().model_path()),
        )?;
        *training = Some(Arc::new(job));
        Ok(())
    }

    pub fn training_status(&self) -> TrainingStatus {
        self.training
            .lock()
            .as_ref()
            .map(|job| job.status())
            .unwrap_or_default()
    }

    pub fn cancel_training(&self) {
        if let Some(job) = self.training.lock().as_ref() {
            job.cancel();
        }
    }

    /// Block until the current training job ends.
    pub fn wait_for_training(&self) -> Result<TrainingSummary> {
        let job = self
            .training
            .lock()
            .clone()
            .ok_or_else(|| RubricatorError::invalid_input("no training job has been started"))?;
        job.wait()
    }

    pub fn health(&self) -> Health {
        Health {
            scorer: self.classifier.scorer().name().to_string(),
            scorer_ready: self.classifier.is_ready(),
            rules: self.classifier.rules().len(),
            categories: self.classifier.categories().map(|c| c.len()),
            training: self.training_status().state,
        }
    }
}
