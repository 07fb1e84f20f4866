use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use stash_core::{FileRecord, IngestConfig};
use stash_db::FileRepository;
use stash_storage::{ObjectDescriptor, ObjectUploader, StagingArea, UploadError};

use super::{
    store_record, IngestError, IngestPipeline, IngestRequest, PipelineKind, PipelineRun,
    PipelineStage, ValidationError,
};

/// Public id of an upload: `{namespace}/{unix_millis}-{original_name}`.
pub(crate) fn public_id_for(namespace: &str, original_name: &str) -> String {
    format!(
        "{}/{}-{}",
        namespace,
        Utc::now().timestamp_millis(),
        original_name
    )
}

/// Build the record for a remotely hosted object from what the provider reported.
///
/// Owner id `0` is recorded as anonymous.
pub(crate) fn record_from_descriptor(
    owner_id: Option<i64>,
    descriptor: ObjectDescriptor,
) -> Result<FileRecord, UploadError> {
    let out_of_range =
        |field: &str| UploadError::InvalidResponse(format!("{} is out of range", field));

    let width = i32::try_from(descriptor.width).map_err(|_| out_of_range("width"))?;
    let height = i32::try_from(descriptor.height).map_err(|_| out_of_range("height"))?;
    let size_bytes = i64::try_from(descriptor.byte_size).map_err(|_| out_of_range("bytes"))?;
    let raw = serde_json::to_string(&descriptor.raw_metadata)
        .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

    Ok(FileRecord {
        origin_url: descriptor.url,
        width: Some(width),
        height: Some(height),
        size_bytes: Some(size_bytes),
        provider_public_id: Some(descriptor.provider_public_id),
        raw_provider_metadata: Some(raw),
        ..FileRecord::new_image(owner_id.filter(|id| *id != 0))
    })
}

/// Pushes the upload to remote object storage and drops the staged copy.
pub struct RemoteUploadPipeline {
    config: Arc<IngestConfig>,
    staging: StagingArea,
    uploader: Arc<dyn ObjectUploader>,
    repository: Arc<dyn FileRepository>,
}

impl RemoteUploadPipeline {
    pub fn new(
        config: Arc<IngestConfig>,
        staging: StagingArea,
        uploader: Arc<dyn ObjectUploader>,
        repository: Arc<dyn FileRepository>,
    ) -> Self {
        Self {
            config,
            staging,
            uploader,
            repository,
        }
    }

    fn warn_orphaned(&self, public_id: &str, reason: &str) {
        tracing::warn!(
            provider = self.uploader.provider(),
            provider_public_id = %public_id,
            reason,
            "Remote object orphaned"
        );
    }
}

#[async_trait]
impl IngestPipeline for RemoteUploadPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Remote
    }

    async fn run(&self, request: IngestRequest) -> Result<FileRecord, IngestError> {
        let mut run = PipelineRun::start(self.kind());

        let Some(upload) = request.upload else {
            return Err(run.fail(ValidationError::MissingFile.into()));
        };
        run.set_file(&upload.original_name);
        run.advance_to(PipelineStage::Validated);

        let settings = &self.config.remote;
        let public_id = public_id_for(&settings.namespace, &upload.original_name);
        let tags = request.tags.as_deref().filter(|tags| !tags.is_empty());

        let descriptor = match self
            .uploader
            .upload(&upload.storage_path, &public_id, tags, settings.quality)
            .await
        {
            Ok(descriptor) => descriptor,
            Err(e) => return Err(run.fail(e.into())),
        };
        let record = match record_from_descriptor(request.owner_id, descriptor) {
            Ok(record) => record,
            Err(e) => {
                self.warn_orphaned(&public_id, "provider descriptor rejected");
                return Err(run.fail(e.into()));
            }
        };
        run.advance_to(PipelineStage::Transformed);

        let stored = match store_record(self.repository.as_ref(), record).await {
            Ok(stored) => stored,
            Err(e) => {
                self.warn_orphaned(&public_id, "record could not be stored");
                return Err(run.fail(e));
            }
        };
        run.advance_to(PipelineStage::Persisted);

        if let Err(e) = self.staging.remove(&upload.storage_path).await {
            tracing::warn!(
                path = %upload.storage_path.display(),
                error = %e,
                "Failed to clean up staged file after remote upload"
            );
        }

        tracing::info!(
            file_id = ?stored.id,
            owner_id = ?stored.owner_id,
            provider = self.uploader.provider(),
            provider_public_id = ?stored.provider_public_id,
            origin_url = %stored.origin_url,
            "Remote ingestion completed"
        );
        run.advance_to(PipelineStage::Done);
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> ObjectDescriptor {
        ObjectDescriptor {
            url: "http://res.example.com/demo/image/upload/file/1-logo.png".to_string(),
            width: 128,
            height: 64,
            byte_size: 2048,
            provider_public_id: "file/1-logo.png".to_string(),
            raw_metadata: json!({"public_id": "file/1-logo.png", "format": "png"}),
        }
    }

    #[test]
    fn test_public_id_layout() {
        let id = public_id_for("file", "logo.png");
        let (namespace, rest) = id.split_once('/').unwrap();
        assert_eq!(namespace, "file");
        let (millis, name) = rest.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(name, "logo.png");
    }

    #[test]
    fn test_record_from_descriptor_copies_provider_fields() {
        let record = record_from_descriptor(None, descriptor()).unwrap();

        assert_eq!(record.owner_id, None);
        assert_eq!(record.width, Some(128));
        assert_eq!(record.height, Some(64));
        assert_eq!(record.size_bytes, Some(2048));
        assert_eq!(record.provider_public_id.as_deref(), Some("file/1-logo.png"));
        assert_eq!(record.thumb_url, None);
        let raw: serde_json::Value =
            serde_json::from_str(record.raw_provider_metadata.as_deref().unwrap()).unwrap();
        assert_eq!(raw["format"], "png");
        assert!(record.ensure_storable().is_ok());
    }

    #[test]
    fn test_owner_zero_is_anonymous() {
        assert_eq!(record_from_descriptor(Some(0), descriptor()).unwrap().owner_id, None);
        assert_eq!(
            record_from_descriptor(Some(42), descriptor()).unwrap().owner_id,
            Some(42)
        );
    }

    #[test]
    fn test_oversized_geometry_is_rejected() {
        let mut descriptor = descriptor();
        descriptor.width = u32::MAX;
        assert!(matches!(
            record_from_descriptor(Some(1), descriptor),
            Err(UploadError::InvalidResponse(_))
        ));
    }
}
