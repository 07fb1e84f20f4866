use std::sync::Arc;

use async_trait::async_trait;
use stash_core::{FileRecord, IngestConfig};
use stash_db::FileRepository;
use stash_storage::StagingArea;

use super::{
    store_record, IngestError, IngestPipeline, IngestRequest, PipelineKind, PipelineRun,
    PipelineStage, ValidationError,
};
use crate::image::ThumbnailGenerator;

/// Serves the upload from local disk and derives a fixed-size thumbnail.
///
/// The original upload stays in the staging area whether or not the run
/// succeeds.
pub struct LocalThumbnailPipeline {
    config: Arc<IngestConfig>,
    staging: StagingArea,
    repository: Arc<dyn FileRepository>,
}

impl LocalThumbnailPipeline {
    pub fn new(
        config: Arc<IngestConfig>,
        staging: StagingArea,
        repository: Arc<dyn FileRepository>,
    ) -> Self {
        Self {
            config,
            staging,
            repository,
        }
    }
}

#[async_trait]
impl IngestPipeline for LocalThumbnailPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Local
    }

    async fn run(&self, request: IngestRequest) -> Result<FileRecord, IngestError> {
        let mut run = PipelineRun::start(self.kind());

        let Some(upload) = request.upload else {
            return Err(run.fail(ValidationError::MissingFile.into()));
        };
        run.set_file(&upload.filename);

        let thumb_name = self.config.thumbnail.derivative_name(&upload.filename);
        let target = match self.staging.resolve(&thumb_name) {
            Ok(target) => target,
            Err(e) => {
                return Err(run.fail(ValidationError::InvalidFileName(e.to_string()).into()))
            }
        };
        run.advance_to(PipelineStage::Validated);

        let mut record = FileRecord::new_image(request.owner_id);
        record.origin_url = self.config.local_file_url(&upload.filename);

        let output = match ThumbnailGenerator::generate_thumbnail(
            &upload.storage_path,
            &target,
            self.config.thumbnail,
        )
        .await
        {
            Ok(output) => output,
            Err(e) => return Err(run.fail(IngestError::Transform(e))),
        };
        record.thumb_url = Some(thumb_name);
        run.advance_to(PipelineStage::Transformed);

        let stored = store_record(self.repository.as_ref(), record)
            .await
            .map_err(|e| run.fail(e))?;
        run.advance_to(PipelineStage::Persisted);

        tracing::info!(
            file_id = ?stored.id,
            owner_id = ?stored.owner_id,
            origin_url = %stored.origin_url,
            thumbnail = %output.path.display(),
            thumbnail_bytes = output.size_bytes,
            "Local ingestion completed"
        );
        run.advance_to(PipelineStage::Done);
        Ok(stored)
    }
}
