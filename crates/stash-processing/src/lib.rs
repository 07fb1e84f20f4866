//! Derivative generation and ingestion pipelines.

pub mod image;
pub mod ingest;

pub use image::{ImageResize, ThumbnailGenerator, ThumbnailOutput, TransformError};
pub use ingest::{
    IngestError, IngestOrchestrator, IngestPipeline, IngestRequest, LocalThumbnailPipeline,
    PipelineKind, PipelineRun, PipelineStage, RemoteUploadPipeline, ValidationError,
};
