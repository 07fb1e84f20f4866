use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A file already landed on local disk by the intake layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Name the file is stored under inside the upload directory.
    pub filename: String,
    /// Full path of the stored file.
    pub storage_path: PathBuf,
    /// Name the client uploaded the file as.
    pub original_name: String,
}

impl UploadedFile {
    pub fn new(
        filename: impl Into<String>,
        storage_path: impl Into<PathBuf>,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            storage_path: storage_path.into(),
            original_name: original_name.into(),
        }
    }
}
