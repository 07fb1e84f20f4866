//! Ingestion orchestration
//!
//! An [`IngestOrchestrator`] owns one pipeline per [`PipelineKind`] and
//! dispatches each [`IngestRequest`] to the selected one:
//!
//! - `Local` generates a fixed-size thumbnail next to the staged file and
//!   records both local URLs.
//! - `Remote` pushes the staged file to the object storage provider, records
//!   what the provider reports and removes the staged file.
//!
//! A record is persisted if and only if the pipeline's transform or upload
//! step succeeded.

mod error;
mod local;
mod remote;
mod stage;

pub use error::{IngestError, ValidationError};
pub use local::LocalThumbnailPipeline;
pub use remote::RemoteUploadPipeline;
pub use stage::{PipelineRun, PipelineStage};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stash_core::{FileRecord, IngestConfig, UploadedFile};
use stash_db::FileRepository;
use stash_storage::{ObjectUploader, StagingArea, StagingResult};

/// Which pipeline an ingestion run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Local,
    Remote,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Local => write!(f, "local"),
            PipelineKind::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(PipelineKind::Local),
            "remote" => Ok(PipelineKind::Remote),
            other => Err(format!("Unknown pipeline kind: {}", other)),
        }
    }
}

/// Input of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// The landed upload; `None` when the client sent no file.
    pub upload: Option<UploadedFile>,
    pub owner_id: Option<i64>,
    /// Remote tags; `None` falls back to the configured default tag.
    pub tags: Option<Vec<String>>,
}

impl IngestRequest {
    pub fn new(upload: UploadedFile) -> Self {
        Self {
            upload: Some(upload),
            ..Default::default()
        }
    }

    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// One ingestion strategy.
#[async_trait]
pub trait IngestPipeline: Send + Sync {
    fn kind(&self) -> PipelineKind;

    /// Run the pipeline to completion and return the persisted record.
    async fn run(&self, request: IngestRequest) -> Result<FileRecord, IngestError>;
}

/// Check record invariants, then hand the record to the gateway exactly once.
pub(crate) async fn store_record(
    repository: &dyn FileRepository,
    record: FileRecord,
) -> Result<FileRecord, IngestError> {
    record.ensure_storable().map_err(IngestError::Store)?;
    repository.store(record).await.map_err(IngestError::Store)
}

/// Dispatches ingestion requests to the pipeline selected by [`PipelineKind`].
pub struct IngestOrchestrator {
    local: LocalThumbnailPipeline,
    remote: Option<RemoteUploadPipeline>,
}

impl IngestOrchestrator {
    pub fn new(local: LocalThumbnailPipeline, remote: Option<RemoteUploadPipeline>) -> Self {
        Self { local, remote }
    }

    /// Wire both pipelines from configuration.
    ///
    /// The remote pipeline is only available when an uploader is supplied.
    pub async fn build(
        config: IngestConfig,
        repository: Arc<dyn FileRepository>,
        uploader: Option<Arc<dyn ObjectUploader>>,
    ) -> StagingResult<Self> {
        let staging = StagingArea::new(config.upload_dir.clone()).await?;
        let config = Arc::new(config);

        let local =
            LocalThumbnailPipeline::new(config.clone(), staging.clone(), repository.clone());
        let remote = uploader.map(|uploader| {
            RemoteUploadPipeline::new(config.clone(), staging.clone(), uploader, repository.clone())
        });

        tracing::info!(
            upload_dir = %config.upload_dir.display(),
            thumbnail_width = config.thumbnail.width,
            thumbnail_height = config.thumbnail.height,
            remote_enabled = remote.is_some(),
            "Ingest orchestrator ready"
        );

        Ok(Self::new(local, remote))
    }

    pub fn pipeline(&self, kind: PipelineKind) -> Option<&dyn IngestPipeline> {
        match kind {
            PipelineKind::Local => Some(&self.local as &dyn IngestPipeline),
            PipelineKind::Remote => self
                .remote
                .as_ref()
                .map(|pipeline| pipeline as &dyn IngestPipeline),
        }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            pipeline = %kind,
            owner_id = ?request.owner_id,
            filename = request.upload.as_ref().map(|u| u.filename.as_str()).unwrap_or("")
        )
    )]
    pub async fn ingest(
        &self,
        kind: PipelineKind,
        request: IngestRequest,
    ) -> Result<FileRecord, IngestError> {
        let Some(pipeline) = self.pipeline(kind) else {
            tracing::error!(pipeline = %kind, "Ingestion requested for an unconfigured pipeline");
            return Err(IngestError::PipelineUnavailable(kind));
        };
        pipeline.run(request).await
    }
}
