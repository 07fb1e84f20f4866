//! Stash persistence gateway
//!
//! File records are stored through the [`FileRepository`] trait. The Postgres
//! implementation is used in deployments; the in-memory one backs dry runs and tests.

pub mod db;

pub use db::{connect, FileRepository, MemoryFileRepository, PgFileRepository};
