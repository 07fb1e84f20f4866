use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use crate::error::AppError;

/// Artifact type of a stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "file_kind", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    Image,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Image => write!(f, "image"),
        }
    }
}

/// Metadata for one stored file and its derivatives.
///
/// A record produced by the local pipeline carries `thumb_url`; a record produced
/// by the remote pipeline carries the provider fields instead. The two sets never
/// mix on a persisted record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct FileRecord {
    /// Assigned by the persistence gateway; `None` until stored.
    pub id: Option<i64>,
    pub owner_id: Option<i64>,
    pub origin_url: String,
    pub thumb_url: Option<String>,
    pub kind: FileKind,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub size_bytes: Option<i64>,
    pub provider_public_id: Option<String>,
    /// Serialized JSON exactly as the remote provider returned it.
    pub raw_provider_metadata: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Start a record for an image owned by `owner_id`.
    pub fn new_image(owner_id: Option<i64>) -> Self {
        Self {
            owner_id,
            kind: FileKind::Image,
            ..Default::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// True when the record was produced by the local thumbnail pipeline.
    pub fn has_local_derivative(&self) -> bool {
        self.thumb_url.is_some()
    }

    /// True when the record points at a remotely hosted object.
    pub fn is_remote(&self) -> bool {
        self.provider_public_id.is_some()
    }

    /// Check the invariants a record must satisfy before it is handed to storage.
    pub fn ensure_storable(&self) -> Result<(), AppError> {
        if self.origin_url.trim().is_empty() {
            return Err(AppError::InvalidRecord(
                "origin_url must be set before storing".to_string(),
            ));
        }

        match (self.has_local_derivative(), self.is_remote()) {
            (true, true) => Err(AppError::InvalidRecord(
                "record carries both a local thumbnail and provider metadata".to_string(),
            )),
            (false, false) => Err(AppError::InvalidRecord(
                "record carries neither a local thumbnail nor provider metadata".to_string(),
            )),
            (false, true) if self.raw_provider_metadata.is_none() => Err(AppError::InvalidRecord(
                "remote record is missing provider metadata".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
