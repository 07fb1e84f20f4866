//! Wiring helpers for the `stash` binary.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use stash_core::{DatabaseSettings, RemoteSettings};
use stash_db::{FileRepository, MemoryFileRepository, PgFileRepository};
use stash_storage::{CloudinaryUploader, ObjectUploader};

/// Postgres gateway when a database URL is configured, otherwise an in-memory one.
pub async fn open_repository(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn FileRepository>> {
    if settings.url.is_none() {
        tracing::warn!("DATABASE_URL not set, records are kept in memory for this run only");
        return Ok(Arc::new(MemoryFileRepository::new()));
    }

    let pool = stash_db::connect(settings)
        .await
        .context("Failed to connect to the database")?;
    Ok(Arc::new(PgFileRepository::new(pool)))
}

/// Remote uploader, when provider credentials are configured.
pub fn build_uploader(settings: &RemoteSettings) -> anyhow::Result<Option<Arc<dyn ObjectUploader>>> {
    if !settings.is_configured() {
        return Ok(None);
    }
    let uploader = CloudinaryUploader::from_settings(settings)
        .context("Failed to create Cloudinary uploader")?;
    Ok(Some(Arc::new(uploader)))
}

/// Name a local file is ingested under when the caller gives none.
pub fn original_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}
