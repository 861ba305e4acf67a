//! Source image download with a byte limit.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::PipelineError;

/// HTTP client for fetching source images.
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Downloads `url`, refusing bodies larger than `byte_limit`.
    ///
    /// The limit is checked against `Content-Length` up front and again while
    /// the body streams in, so an oversized body is never fully buffered.
    pub async fn fetch(&self, url: &str, byte_limit: u64) -> Result<Bytes, PipelineError> {
        let url = Url::parse(url).map_err(|e| PipelineError::InvalidSource(e.to_string()))?;

        debug!(url = %url, "fetching source image");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PipelineError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = %status, url = %url, "source returned non-success status");
            return Err(PipelineError::UpstreamStatus(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > byte_limit {
                return Err(PipelineError::TooLarge { limit: byte_limit });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PipelineError::Decode(e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > byte_limit {
                return Err(PipelineError::TooLarge { limit: byte_limit });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %url, bytes = body.len(), "fetched source image");
        Ok(body.freeze())
    }
}
