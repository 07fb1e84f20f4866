//! File record repository: persistence for the `files` table.
//!
//! Expected table shape:
//!
//! ```sql
//! CREATE TYPE file_kind AS ENUM ('image');
//! CREATE TABLE files (
//!     id                    BIGSERIAL PRIMARY KEY,
//!     owner_id              BIGINT,
//!     origin_url            TEXT NOT NULL,
//!     thumb_url             TEXT,
//!     kind                  file_kind NOT NULL,
//!     width                 INTEGER,
//!     height                INTEGER,
//!     size_bytes            BIGINT,
//!     provider_public_id    TEXT,
//!     raw_provider_metadata TEXT,
//!     created_at            TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use stash_core::{AppError, FileRecord};

const FILE_COLUMNS: &str = "id, owner_id, origin_url, thumb_url, kind, width, height, \
     size_bytes, provider_public_id, raw_provider_metadata, created_at";

/// Durable storage of file records.
///
/// `store` is called at most once per ingestion run and is never retried by
/// the caller.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Persist a new record and return it with its assigned id.
    async fn store(&self, record: FileRecord) -> Result<FileRecord, AppError>;

    /// Fetch a record by id.
    async fn get(&self, id: i64) -> Result<Option<FileRecord>, AppError>;
}

/// Reject records that must not reach storage.
pub(crate) fn check_new_record(record: &FileRecord) -> Result<(), AppError> {
    if let Some(id) = record.id {
        return Err(AppError::InvalidRecord(format!(
            "file record {} is already persisted",
            id
        )));
    }
    record.ensure_storable()
}

/// Postgres-backed [`FileRepository`]
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", owner_id = ?record.owner_id))]
    async fn store(&self, record: FileRecord) -> Result<FileRecord, AppError> {
        check_new_record(&record)?;

        let query = format!(
            r#"
            INSERT INTO files (
                owner_id, origin_url, thumb_url, kind, width, height,
                size_bytes, provider_public_id, raw_provider_metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );

        let stored: FileRecord = sqlx::query_as::<Postgres, FileRecord>(&query)
            .bind(record.owner_id)
            .bind(&record.origin_url)
            .bind(&record.thumb_url)
            .bind(record.kind)
            .bind(record.width)
            .bind(record.height)
            .bind(record.size_bytes)
            .bind(&record.provider_public_id)
            .bind(&record.raw_provider_metadata)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(file_id = ?stored.id, "File record inserted");
        Ok(stored)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = id))]
    async fn get(&self, id: i64) -> Result<Option<FileRecord>, AppError> {
        let query = format!("SELECT {} FROM files WHERE id = $1", FILE_COLUMNS);
        let record: Option<FileRecord> = sqlx::query_as::<Postgres, FileRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }
}
