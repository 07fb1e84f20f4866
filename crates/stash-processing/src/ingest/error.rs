use stash_core::{AppError, ErrorMetadata, LogLevel};
use stash_storage::UploadError;
use thiserror::Error;

use super::PipelineKind;
use crate::image::TransformError;

/// Request validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File not found")]
    MissingFile,

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
}

/// Ingestion run errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Thumbnail generation failed")]
    Transform(#[source] TransformError),

    /// Displays exactly as the uploader reported it.
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Failed to store file record")]
    Store(#[source] AppError),

    #[error("The {0} pipeline is not configured")]
    PipelineUnavailable(PipelineKind),
}

impl IngestError {
    /// Display of the error followed by its source chain.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }
        details
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        match self {
            IngestError::Validation(_) | IngestError::Transform(_) => 400,
            IngestError::Upload(_) => 502,
            IngestError::Store(err) => err.http_status_code(),
            IngestError::PipelineUnavailable(_) => 503,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            IngestError::Validation(ValidationError::MissingFile) => "FILE_NOT_FOUND",
            IngestError::Validation(ValidationError::InvalidFileName(_)) => "INVALID_FILE_NAME",
            IngestError::Transform(_) => "BAD_REQUEST",
            IngestError::Upload(_) => "UPLOAD_FAILED",
            IngestError::Store(err) => err.error_code(),
            IngestError::PipelineUnavailable(_) => "PIPELINE_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            IngestError::Upload(UploadError::Network(_)) => true,
            IngestError::Store(err) => err.is_recoverable(),
            _ => false,
        }
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::Transform(_) => "Bad request".to_string(),
            IngestError::Store(err) => err.client_message(),
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            IngestError::Validation(_) => LogLevel::Debug,
            IngestError::Transform(_) | IngestError::Upload(_) => LogLevel::Warn,
            IngestError::Store(err) => err.log_level(),
            IngestError::PipelineUnavailable(_) => LogLevel::Error,
        }
    }
}
