//! Stash Core Library
//!
//! This crate provides the file record model, error types and configuration
//! shared by the storage, processing and persistence crates.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{DatabaseSettings, IngestConfig, RemoteSettings, ThumbnailGeometry};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileKind, FileRecord, UploadedFile};
