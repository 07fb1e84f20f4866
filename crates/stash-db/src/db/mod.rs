//! Database repositories for data access layer

pub mod file;
pub mod memory;
pub mod pool;

pub use file::{FileRepository, PgFileRepository};
pub use memory::MemoryFileRepository;
pub use pool::connect;
