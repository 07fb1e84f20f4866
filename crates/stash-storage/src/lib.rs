//! Stash Storage Library
//!
//! This crate provides the local staging area uploads land in and the remote
//! object storage abstraction used by the remote ingestion pipeline.
//!
//! Staged filenames are plain names relative to the upload directory. They must
//! not contain `..`, path separators or a leading `/`.

pub mod remote;
pub mod staging;

// Re-export commonly used types
#[cfg(feature = "remote-cloudinary")]
pub use remote::{CloudinaryCredentials, CloudinaryUploader};
pub use remote::{ObjectDescriptor, ObjectUploader, UploadError, UploadResult};
pub use staging::{StagingArea, StagingError, StagingResult};
