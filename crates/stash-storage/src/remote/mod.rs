//! Remote object storage abstraction
//!
//! The remote pipeline depends only on [`ObjectUploader`]; provider clients
//! live in submodules behind feature flags.

#[cfg(feature = "remote-cloudinary")]
mod cloudinary;

#[cfg(feature = "remote-cloudinary")]
pub use cloudinary::{CloudinaryCredentials, CloudinaryUploader};

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Remote upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Provider unreachable: {0}")]
    Network(String),

    #[error("Provider rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for remote uploads
pub type UploadResult<T> = Result<T, UploadError>;

/// What the provider reports about an uploaded object.
///
/// Every field is populated on success; geometry and size are unsigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDescriptor {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    pub provider_public_id: String,
    /// The full provider response.
    pub raw_metadata: serde_json::Value,
}

/// Remote object storage client
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Push `local_path` to the provider under `public_id`.
    ///
    /// `tags` of `None` means the provider's configured default tag. The source
    /// file is never deleted here.
    async fn upload(
        &self,
        local_path: &Path,
        public_id: &str,
        tags: Option<&[String]>,
        quality: u8,
    ) -> UploadResult<ObjectDescriptor>;

    /// Provider name used in logs.
    fn provider(&self) -> &'static str;
}
