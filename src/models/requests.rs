//! Request DTOs for the resize service
//!
//! Defines the query parameters accepted by the resize endpoint.

use serde::Deserialize;

/// Query string of the resize endpoint (`GET /?url=&width=&height=`)
///
/// All fields are optional at the extractor level so that a missing
/// parameter is reported by [`ResizeQuery::validate`] with a precise message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResizeQuery {
    /// Source image URL
    pub url: Option<String>,
    /// Requested width, as sent
    pub width: Option<String>,
    /// Requested height, as sent
    pub height: Option<String>,
}

/// A resize request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSpec {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl ResizeQuery {
    /// Validates the query against the dimension limits.
    ///
    /// Returns the first problem found, checked in the order: presence of
    /// url, width and height; positivity of width and height; limits.
    pub fn validate(&self, max_width: u32, max_height: u32) -> Result<ResizeSpec, String> {
        let url = present(&self.url).ok_or("url is required")?;
        let width = present(&self.width).ok_or("width is required")?;
        let height = present(&self.height).ok_or("height is required")?;

        let width = positive(width).ok_or("width should be a positive number")?;
        let height = positive(height).ok_or("height should be a positive number")?;

        if width > max_width {
            return Err(format!("max width {} limit exceeded", max_width));
        }
        if height > max_height {
            return Err(format!("max height {} limit exceeded", max_height));
        }

        Ok(ResizeSpec {
            url: url.to_string(),
            width,
            height,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Parses a positive integer; values beyond `u32` count as over any limit.
fn positive(value: &str) -> Option<u32> {
    match value.parse::<i64>() {
        Ok(n) if n > 0 => Some(u32::try_from(n).unwrap_or(u32::MAX)),
        _ => None,
    }
}
