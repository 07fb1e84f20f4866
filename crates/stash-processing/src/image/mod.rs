//! Image derivatives
//!
//! - Exact-size resizing with ratio-dependent filter selection (resize)
//! - Thumbnail generation from a staged file (thumbnail)

pub mod resize;
pub mod thumbnail;

pub use resize::ImageResize;
pub use thumbnail::{ThumbnailGenerator, ThumbnailOutput, TransformError};
