//! Decode, resize and re-encode. CPU-bound; callers run it on the blocking pool.

use std::io::Cursor;

use bytes::Bytes;
use image::{imageops::FilterType, ImageFormat};

use super::{PipelineError, Transformed};
use crate::cache::content_hash;

/// Resizes a JPEG to exactly `width`x`height` and re-encodes it as JPEG.
pub fn resize_jpeg(source: &[u8], width: u32, height: u32) -> Result<Transformed, PipelineError> {
    let format =
        image::guess_format(source).map_err(|e| PipelineError::Decode(e.to_string()))?;
    if format != ImageFormat::Jpeg {
        let name = format.extensions_str().first().copied().unwrap_or("unknown");
        return Err(PipelineError::UnsupportedFormat(name.to_string()));
    }

    let decoded = image::load_from_memory_with_format(source, ImageFormat::Jpeg)
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    // JPEG has no alpha channel, so encode from RGB
    let resized = decoded
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgb8();

    let mut buffer = Cursor::new(Vec::new());
    resized
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| PipelineError::Encode(e.to_string()))?;

    let payload = Bytes::from(buffer.into_inner());
    let content_hash = content_hash(&payload);
    Ok(Transformed {
        payload,
        content_hash,
    })
}
