//! Fixed-geometry thumbnail generation
//!
//! The generator decodes a staged file, resizes it to exactly the configured
//! geometry and writes the result next to it. The target only ever appears
//! fully written: the encoded bytes go to a temporary file in the target
//! directory which is synced and then renamed into place.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use stash_core::ThumbnailGeometry;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::resize::ImageResize;

/// Derivative generation errors
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to read source image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode source image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode thumbnail as {format:?}: {source}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write thumbnail {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid thumbnail geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

/// What the generator wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailOutput {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// Formats the enabled encoders can write.
fn is_writable(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Gif
    )
}

fn output_format(target: &Path, source_format: Option<ImageFormat>) -> ImageFormat {
    ImageFormat::from_path(target)
        .ok()
        .filter(|f| is_writable(*f))
        .or(source_format.filter(|f| is_writable(*f)))
        .unwrap_or(ImageFormat::Png)
}

/// Convert to a color type the encoder for `format` accepts.
///
/// PNG takes anything. JPEG takes 8-bit gray or RGB without alpha. GIF and WebP
/// take 8-bit RGB or RGBA.
fn encodable(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match (format, img.color()) {
        (ImageFormat::Png, _) => img,
        (ImageFormat::Jpeg, ColorType::L8 | ColorType::Rgb8) => img,
        (ImageFormat::Jpeg, _) => DynamicImage::ImageRgb8(img.to_rgb8()),
        (_, ColorType::Rgb8 | ColorType::Rgba8) => img,
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    }
}

fn encode(img: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, TransformError> {
    let img = encodable(img, format);

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .map_err(|source| TransformError::Encode { format, source })?;
    Ok(buffer.into_inner())
}

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), TransformError> {
    let write_err = |source: std::io::Error| TransformError::Write {
        path: target.display().to_string(),
        source,
    };

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(target).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Generates fixed-size thumbnails from staged images
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Synchronous generation; call from a blocking context.
    pub fn generate_blocking(
        source: &Path,
        target: &Path,
        geometry: ThumbnailGeometry,
    ) -> Result<ThumbnailOutput, TransformError> {
        if geometry.width == 0 || geometry.height == 0 {
            return Err(TransformError::InvalidGeometry {
                width: geometry.width,
                height: geometry.height,
            });
        }

        let read_err = |e: std::io::Error| TransformError::Read {
            path: source.display().to_string(),
            source: e,
        };
        let reader = image::ImageReader::open(source)
            .map_err(read_err)?
            .with_guessed_format()
            .map_err(read_err)?;
        let source_format = reader.format();
        let img = reader.decode().map_err(|e| TransformError::Decode {
            path: source.display().to_string(),
            source: e,
        })?;

        let (orig_width, orig_height) = img.dimensions();
        let thumbnail = ImageResize::resize_exact(&img, geometry.width, geometry.height);

        let format = output_format(target, source_format);
        let bytes = encode(thumbnail, format)?;
        write_atomically(target, &bytes)?;

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            orig_width,
            orig_height,
            width = geometry.width,
            height = geometry.height,
            format = ?format,
            size_bytes = bytes.len(),
            "Thumbnail written"
        );

        Ok(ThumbnailOutput {
            path: target.to_path_buf(),
            width: geometry.width,
            height: geometry.height,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Generate a thumbnail of exactly `geometry` from `source` into `target`.
    ///
    /// Decoding and encoding run on the blocking thread pool. On error nothing
    /// exists at `target` that was not there before.
    pub async fn generate_thumbnail(
        source: &Path,
        target: &Path,
        geometry: ThumbnailGeometry,
    ) -> Result<ThumbnailOutput, TransformError> {
        let source = source.to_path_buf();
        let target = target.to_path_buf();

        tokio::task::spawn_blocking(move || Self::generate_blocking(&source, &target, geometry))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))?
    }
}
