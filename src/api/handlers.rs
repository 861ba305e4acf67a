//! API Handlers
//!
//! HTTP request handlers for the resize endpoint and the auxiliary
//! health and stats endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::cache::{fingerprint, CachedImage, ResultCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{HealthResponse, ResizeQuery, ResizeSpec, StatsResponse};
use crate::pipeline::{TransformRequest, Transformer};

/// Client-side cache lifetime advertised on every image response.
pub const CLIENT_CACHE_CONTROL: &str = "max-age=3600";

/// Header reporting whether the image came from the result cache.
pub const X_CACHE: &str = "x-cache";

/// Request limits enforced before any fetch.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_width: u32,
    pub max_height: u32,
    /// Maximum accepted source size in bytes
    pub max_image_size: u64,
}

impl From<&Config> for Limits {
    fn from(config: &Config) -> Self {
        Self {
            max_width: config.max_image_width,
            max_height: config.max_image_height,
            max_image_size: config.max_image_size,
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared result cache
    pub cache: Arc<ResultCache>,
    /// Fetch + resize pipeline
    pub transformer: Arc<dyn Transformer>,
    pub limits: Limits,
}

impl AppState {
    pub fn new(cache: ResultCache, transformer: Arc<dyn Transformer>, limits: Limits) -> Self {
        Self {
            cache: Arc::new(cache),
            transformer,
            limits,
        }
    }
}

/// Where a served image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Hit,
    Miss,
}

impl Source {
    fn header_value(self) -> HeaderValue {
        match self {
            Source::Hit => HeaderValue::from_static("HIT"),
            Source::Miss => HeaderValue::from_static("MISS"),
        }
    }
}

/// Looks the request up in the cache and runs the pipeline on a miss.
///
/// Only successful transforms are stored; a failure leaves the cache untouched.
pub async fn fetch_or_transform(
    state: &AppState,
    spec: &ResizeSpec,
) -> Result<(CachedImage, Source)> {
    let key = fingerprint(&spec.url, spec.width, spec.height);

    if let Some(image) = state.cache.get(&key).await {
        return Ok((image, Source::Hit));
    }

    let request = TransformRequest {
        source_url: spec.url.clone(),
        width: spec.width,
        height: spec.height,
        byte_limit: state.limits.max_image_size,
    };

    let transformed = state.transformer.transform(request).await.map_err(|e| {
        warn!(url = %spec.url, error = %e, "transform failed");
        AppError::from(e)
    })?;

    state
        .cache
        .add(
            key,
            transformed.payload.clone(),
            transformed.content_hash.clone(),
        )
        .await;

    Ok((
        CachedImage {
            payload: transformed.payload,
            content_hash: transformed.content_hash,
        },
        Source::Miss,
    ))
}

/// Handler for GET /?url=&width=&height=
///
/// Returns the resized JPEG, or 304 when `If-None-Match` carries its hash.
pub async fn resize_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ResizeQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let spec = query
        .validate(state.limits.max_width, state.limits.max_height)
        .map_err(AppError::Validation)?;

    let (image, source) = fetch_or_transform(&state, &spec).await?;

    let etag = HeaderValue::from_str(&image.content_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let cache_control = HeaderValue::from_static(CLIENT_CACHE_CONTROL);

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| !token.is_empty() && token.contains(&image.content_hash));

    if not_modified {
        info!(hash = %image.content_hash, "not modified");
        return Ok((
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, etag), (header::CACHE_CONTROL, cache_control)],
        )
            .into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CONTENT_LENGTH, HeaderValue::from(image.payload.len())),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, cache_control),
            (header::HeaderName::from_static(X_CACHE), source.header_value()),
        ],
        image.payload,
    )
        .into_response())
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
