//! Local staging area
//!
//! The upload directory holds files landed by the intake layer and the
//! thumbnails derived from them. All names handed to this module are validated
//! so a crafted filename cannot escape the directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use stash_core::UploadedFile;
use thiserror::Error;
use tokio::fs;

/// Staging operation errors
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Invalid staged filename: {0}")]
    InvalidName(String),

    #[error("Staged file not found: {0}")]
    NotFound(String),

    #[error("Failed to land upload: {0}")]
    LandFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for staging operations
pub type StagingResult<T> = Result<T, StagingError>;

/// Reduce a client-supplied filename to a safe basename.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 200;
    let path = Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Upload directory on local disk
#[derive(Clone, Debug)]
pub struct StagingArea {
    base_path: PathBuf,
}

impl StagingArea {
    /// Open the staging area, creating the directory when missing.
    pub async fn new(base_path: impl Into<PathBuf>) -> StagingResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StagingError::ConfigError(format!(
                "Failed to create upload directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(StagingArea { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of `filename` inside the upload directory.
    pub fn resolve(&self, filename: &str) -> StagingResult<PathBuf> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(StagingError::InvalidName(filename.to_string()));
        }
        Ok(self.base_path.join(filename))
    }

    /// Whether `path` lies inside the upload directory.
    pub fn contains(&self, path: &Path) -> bool {
        let Ok(base) = self.base_path.canonicalize() else {
            return false;
        };
        match path.canonicalize() {
            Ok(canonical) => canonical.starts_with(&base),
            Err(_) => path
                .parent()
                .and_then(|p| p.canonicalize().ok())
                .map(|parent| parent.starts_with(&base))
                .unwrap_or(false),
        }
    }

    /// Copy `source` into the upload directory under a unique name.
    ///
    /// This is what the intake layer does before handing an upload to a pipeline.
    pub async fn land(&self, source: &Path, original_name: &str) -> StagingResult<UploadedFile> {
        let filename = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(original_name)
        );
        let target = self.resolve(&filename)?;
        let start = std::time::Instant::now();

        let size = fs::copy(source, &target).await.map_err(|e| {
            StagingError::LandFailed(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                target.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %target.display(),
            original_name = %original_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload landed in staging area"
        );

        Ok(UploadedFile::new(filename, target, original_name))
    }

    /// Delete a staged file.
    ///
    /// Unlike a plain `remove_file`, a missing file is reported as `NotFound`.
    pub async fn remove(&self, path: &Path) -> StagingResult<()> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(StagingError::NotFound(path.display().to_string()));
        }
        if !self.contains(path) {
            return Err(StagingError::InvalidName(format!(
                "{} is outside the upload directory",
                path.display()
            )));
        }

        fs::remove_file(path).await.map_err(|e| {
            StagingError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Staged file deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("cat.png"), "cat.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("a"), "file");
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        assert!(staging.resolve("cat.png").is_ok());
        assert!(matches!(
            staging.resolve("../cat.png"),
            Err(StagingError::InvalidName(_))
        ));
        assert!(staging.resolve("nested/cat.png").is_err());
        assert!(staging.resolve("").is_err());
    }

    #[tokio::test]
    async fn test_new_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let staging = StagingArea::new(&nested).await.unwrap();
        assert!(staging.base_path().is_dir());
    }

    #[tokio::test]
    async fn test_land_copies_into_directory() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("logo.png");
        std::fs::write(&source, b"not really a png").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();
        let upload = staging.land(&source, "logo.png").await.unwrap();

        assert!(upload.filename.ends_with("-logo.png"));
        assert_eq!(upload.original_name, "logo.png");
        assert!(upload.storage_path.exists());
        assert!(staging.contains(&upload.storage_path));
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();
        let path = staging.resolve("gone.png").unwrap();

        assert!(matches!(
            staging.remove(&path).await,
            Err(StagingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_refuses_files_outside() {
        let outside_dir = tempfile::tempdir().unwrap();
        let outside = outside_dir.path().join("keep.png");
        std::fs::write(&outside, b"data").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        assert!(staging.remove(&outside).await.is_err());
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_remove_deletes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();
        let path = staging.resolve("cat.png").unwrap();
        std::fs::write(&path, b"data").unwrap();

        staging.remove(&path).await.unwrap();
        assert!(!path.exists());
    }
}
