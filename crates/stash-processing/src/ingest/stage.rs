//! Per-run state tracking
//!
//! Every ingestion run walks `Received → Validated → Transformed → Persisted →
//! Done`, or ends in `Failed` from any non-terminal stage. Transitions are
//! logged with the pipeline kind and the file being ingested.

use std::fmt;

use stash_core::{ErrorMetadata, LogLevel};

use super::{IngestError, PipelineKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Validated,
    /// Derivative generated (local) or object uploaded (remote).
    Transformed,
    Persisted,
    Done,
    Failed(String),
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed(_))
    }

    fn successor(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Received => Some(PipelineStage::Validated),
            PipelineStage::Validated => Some(PipelineStage::Transformed),
            PipelineStage::Transformed => Some(PipelineStage::Persisted),
            PipelineStage::Persisted => Some(PipelineStage::Done),
            PipelineStage::Done | PipelineStage::Failed(_) => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Received => write!(f, "received"),
            PipelineStage::Validated => write!(f, "validated"),
            PipelineStage::Transformed => write!(f, "transformed"),
            PipelineStage::Persisted => write!(f, "persisted"),
            PipelineStage::Done => write!(f, "done"),
            PipelineStage::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Stage tracker for one ingestion run.
#[derive(Debug)]
pub struct PipelineRun {
    kind: PipelineKind,
    file: String,
    stage: PipelineStage,
}

impl PipelineRun {
    pub fn start(kind: PipelineKind) -> Self {
        tracing::debug!(pipeline = %kind, stage = %PipelineStage::Received, "Ingestion run started");
        Self {
            kind,
            file: String::new(),
            stage: PipelineStage::Received,
        }
    }

    pub fn stage(&self) -> &PipelineStage {
        &self.stage
    }

    /// Record the file name reported in later transitions.
    pub fn set_file(&mut self, file: impl Into<String>) {
        self.file = file.into();
    }

    /// Move to the next stage.
    pub fn advance_to(&mut self, next: PipelineStage) {
        debug_assert_eq!(
            self.stage.successor().as_ref(),
            Some(&next),
            "invalid stage transition"
        );
        tracing::debug!(
            pipeline = %self.kind,
            file = %self.file,
            from = %self.stage,
            to = %next,
            "Ingestion stage transition"
        );
        self.stage = next;
    }

    /// Terminate the run with `err`, logging it at the error's level.
    pub fn fail(&mut self, err: IngestError) -> IngestError {
        let details = err.detailed_message();
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(
                pipeline = %self.kind,
                file = %self.file,
                stage = %self.stage,
                error_code = err.error_code(),
                error = %details,
                "Ingestion run failed"
            ),
            LogLevel::Warn => tracing::warn!(
                pipeline = %self.kind,
                file = %self.file,
                stage = %self.stage,
                error_code = err.error_code(),
                error = %details,
                "Ingestion run failed"
            ),
            LogLevel::Error => tracing::error!(
                pipeline = %self.kind,
                file = %self.file,
                stage = %self.stage,
                error_code = err.error_code(),
                error = %details,
                "Ingestion run failed"
            ),
        }
        self.stage = PipelineStage::Failed(err.to_string());
        err
    }
}
