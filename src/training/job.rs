//! Background training with observable progress.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::classifier::{CompanyRecord, HybridClassifier};
use crate::error::{Result, RubricatorError};
use crate::model::{TextModel, TfIdfNaiveBayes};
use crate::training::pairs::{TrainingStep, TrainingSummary, read_company_records, train_in_steps};

/// Lifecycle of a training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TrainingState {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            TrainingState::Completed | TrainingState::Failed | TrainingState::Cancelled
        )
    }
}

/// Snapshot of a training job's progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingStatus {
    pub state: TrainingState,
    /// 0 to 100.
    pub progress: u8,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TrainingSummary>,
}

impl Default for TrainingStatus {
    fn default() -> Self {
        Self {
            state: TrainingState::Idle,
            progress: 0,
            message: String::new(),
            started_at: None,
            finished_at: None,
            summary: None,
        }
    }
}

/// Where a job takes its company records from.
#[derive(Debug, Clone)]
pub enum TrainingSource {
    Records(Vec<CompanyRecord>),
    /// JSON array or JSON Lines file, read on the training thread.
    File(PathBuf),
}

/// Training stages and the progress reported on entering them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Loading,
    Preprocessing,
    Fitting,
    Validating,
    Saving,
}

impl From<TrainingStep> for Stage {
    fn from(step: TrainingStep) -> Self {
        match step {
            TrainingStep::Preprocessing => Stage::Preprocessing,
            TrainingStep::Fitting => Stage::Fitting,
            TrainingStep::Validating => Stage::Validating,
        }
    }
}

impl Stage {
    fn progress(self) -> u8 {
        match self {
            Stage::Loading => 20,
            Stage::Preprocessing => 40,
            Stage::Fitting => 70,
            Stage::Validating => 90,
            Stage::Saving => 100,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Stage::Loading => "loading records",
            Stage::Preprocessing => "preparing training pairs",
            Stage::Fitting => "fitting model",
            Stage::Validating => "validating model",
            Stage::Saving => "saving model",
        }
    }
}

/// Shared state between a job handle and its worker thread.
#[derive(Debug, Default)]
struct JobState {
    status: RwLock<TrainingStatus>,
    cancelled: AtomicBool,
}

impl JobState {
    fn enter(&self, stage: Stage) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(RubricatorError::cancelled(format!(
                "training cancelled before {}",
                stage.message()
            )));
        }
        log::info!("training: {} ({}%)", stage.message(), stage.progress());
        let mut status = self.status.write();
        status.progress = stage.progress();
        status.message = stage.message().to_string();
        Ok(())
    }

    fn finish(&self, outcome: &Result<TrainingSummary>) {
        let mut status = self.status.write();
        status.finished_at = Some(Utc::now());
        match outcome {
            Ok(summary) => {
                status.state = TrainingState::Completed;
                status.progress = 100;
                status.message = format!("trained on {} examples", summary.examples);
                status.summary = Some(summary.clone());
            }
            Err(RubricatorError::Cancelled(msg)) => {
                status.state = TrainingState::Cancelled;
                status.message = msg.clone();
            }
            Err(e) => {
                status.state = TrainingState::Failed;
                status.message = e.to_string();
            }
        }
    }
}

/// Training running on a background thread.
///
/// Classification keeps using the previous model while the job runs. On
/// success the new model is saved (when a path is given) and then swapped
/// into the classifier in one step.
#[derive(Debug)]
pub struct TrainingJob {
    state: Arc<JobState>,
    handle: Mutex<Option<JoinHandle<Result<TrainingSummary>>>>,
}

impl TrainingJob {
    /// Start training a fresh model for `classifier`.
    pub fn spawn(
        classifier: Arc<HybridClassifier>,
        source: TrainingSource,
        model_path: Option<PathBuf>,
    ) -> Result<Self> {
        let state = Arc::new(JobState::default());
        {
            let mut status = state.status.write();
            status.state = TrainingState::Running;
            status.message = "queued".to_string();
            status.started_at = Some(Utc::now());
        }

        let worker_state = state.clone();
        let handle = thread::Builder::new()
            .name("rubricator-training".to_string())
            .spawn(move || {
                let outcome = run(&classifier, source, model_path, &worker_state);
                if let Err(e) = &outcome {
                    log::warn!("training did not complete: {e}");
                }
                worker_state.finish(&outcome);
                outcome
            })?;

        Ok(Self {
            state,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn status(&self) -> TrainingStatus {
        self.state.status.read().clone()
    }

    /// Ask the job to stop at the next stage boundary.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.status().state.is_finished()
    }

    /// Block until the job ends and return its outcome.
    pub fn wait(&self) -> Result<TrainingSummary> {
        let handle = self
            .handle
            .lock()
            .take()
            .ok_or_else(|| RubricatorError::other("training job was already awaited"))?;
        handle
            .join()
            .map_err(|_| RubricatorError::other("training thread panicked"))?
    }
}

fn run(
    classifier: &HybridClassifier,
    source: TrainingSource,
    model_path: Option<PathBuf>,
    state: &JobState,
) -> Result<TrainingSummary> {
    let config = classifier.config();

    state.enter(Stage::Loading)?;
    let records = match source {
        TrainingSource::Records(records) => records,
        TrainingSource::File(path) => read_company_records(&path)?,
    };

    let mut model = TfIdfNaiveBayes::new(config.max_features, config.smoothing);
    let summary = train_in_steps(&mut model, &records, &config.fallback_label, |step| {
        state.enter(step.into())
    })?;

    state.enter(Stage::Saving)?;
    if let Some(path) = &model_path {
        model.save(path)?;
    }
    classifier.replace_model(Arc::new(model))?;
    Ok(summary)
}
