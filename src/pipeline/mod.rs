//! Transform Pipeline
//!
//! Fetches a source image, resizes it and re-encodes it. The request handler
//! only sees the [`Transformer`] trait; [`JpegTransformer`] is the production
//! implementation.

mod fetch;
mod resize;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

pub use fetch::SourceFetcher;
pub use resize::resize_jpeg;

// == Transform Request ==
/// What to fetch and how large the output should be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Location of the source image
    pub source_url: String,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Maximum accepted source size in bytes
    pub byte_limit: u64,
}

// == Transformed ==
/// Encoded output image and its content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub payload: Bytes,
    pub content_hash: String,
}

// == Failure Class ==
/// Coarse classification used to pick the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    BadGateway,
    NotFound,
    BadRequest,
}

// == Pipeline Error ==
/// Why a transform produced no image.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source URL cannot be turned into a request
    #[error("invalid source url: {0}")]
    InvalidSource(String),

    /// Network failure talking to the source
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// The source answered with a non-200 status
    #[error("gateway status code: {0}")]
    UpstreamStatus(u16),

    /// The source body is larger than the byte limit
    #[error("image exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    /// The body could not be decoded as an image
    #[error("failed decode: {0}")]
    Decode(String),

    /// The body is an image, but not a JPEG
    #[error("only jpeg is supported (got '{0}')")]
    UnsupportedFormat(String),

    /// The resized image could not be encoded
    #[error("failed encode: {0}")]
    Encode(String),

    /// The blocking worker died
    #[error("transform worker failed: {0}")]
    Worker(String),
}

impl PipelineError {
    /// Maps the failure to its response class.
    pub fn class(&self) -> FailureClass {
        match self {
            PipelineError::InvalidSource(_)
            | PipelineError::UpstreamStatus(_)
            | PipelineError::Worker(_) => FailureClass::BadGateway,
            PipelineError::Unreachable(_) => FailureClass::NotFound,
            PipelineError::TooLarge { .. }
            | PipelineError::Decode(_)
            | PipelineError::UnsupportedFormat(_)
            | PipelineError::Encode(_) => FailureClass::BadRequest,
        }
    }

    /// Short message safe to show to clients; no upstream error details.
    pub fn client_message(&self) -> String {
        match self {
            PipelineError::InvalidSource(_) | PipelineError::Worker(_) => "error".to_string(),
            PipelineError::Unreachable(_) => "image not found".to_string(),
            PipelineError::UpstreamStatus(code) => format!("gateway status code: {}", code),
            PipelineError::TooLarge { .. } | PipelineError::Decode(_) => {
                "failed decode or image is too big".to_string()
            }
            PipelineError::UnsupportedFormat(format) => {
                format!("only jpeg is supported(got '{}')", format)
            }
            PipelineError::Encode(_) => "failed convert to jpeg".to_string(),
        }
    }
}

// == Transformer Trait ==
/// Produces a resized, encoded image for a request.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, request: TransformRequest) -> Result<Transformed, PipelineError>;
}

// == JPEG Transformer ==
/// Fetches over HTTP, then resizes and re-encodes on the blocking pool.
pub struct JpegTransformer {
    fetcher: SourceFetcher,
}

impl JpegTransformer {
    /// Creates a transformer whose source fetches give up after `fetch_timeout`.
    pub fn new(fetch_timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            fetcher: SourceFetcher::new(fetch_timeout)?,
        })
    }
}

#[async_trait]
impl Transformer for JpegTransformer {
    async fn transform(&self, request: TransformRequest) -> Result<Transformed, PipelineError> {
        let source = self
            .fetcher
            .fetch(&request.source_url, request.byte_limit)
            .await?;

        let (width, height) = (request.width, request.height);
        let transformed = tokio::task::spawn_blocking(move || resize_jpeg(&source, width, height))
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))??;

        debug!(
            url = %request.source_url,
            width,
            height,
            bytes = transformed.payload.len(),
            "image transformed"
        );
        Ok(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        let cases = vec![
            (PipelineError::InvalidSource("x".into()), FailureClass::BadGateway),
            (PipelineError::Unreachable("x".into()), FailureClass::NotFound),
            (PipelineError::UpstreamStatus(500), FailureClass::BadGateway),
            (PipelineError::TooLarge { limit: 1 }, FailureClass::BadRequest),
            (PipelineError::Decode("x".into()), FailureClass::BadRequest),
            (PipelineError::UnsupportedFormat("Png".into()), FailureClass::BadRequest),
            (PipelineError::Encode("x".into()), FailureClass::BadRequest),
        ];

        for (error, class) in cases {
            assert_eq!(error.class(), class, "{error}");
        }
    }

    #[test]
    fn test_client_messages_hide_details() {
        let err = PipelineError::Unreachable("dns error: secret.internal".into());
        assert_eq!(err.client_message(), "image not found");

        let err = PipelineError::UnsupportedFormat("Png".into());
        assert_eq!(err.client_message(), "only jpeg is supported(got 'Png')");
    }

    #[tokio::test]
    async fn test_transformer_rejects_unparseable_url() {
        let transformer = JpegTransformer::new(Duration::from_secs(1)).unwrap();
        let result = transformer
            .transform(TransformRequest {
                source_url: "not a url".to_string(),
                width: 10,
                height: 10,
                byte_limit: 1024,
            })
            .await;

        assert!(matches!(result, Err(PipelineError::InvalidSource(_))));
    }
}
