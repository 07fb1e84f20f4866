//! Data models for the application

mod file;
mod upload;

pub use file::*;
pub use upload::*;
