//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Aggregate byte budget of the result cache
    pub cache_max_size: u64,
    /// Maximum age of a cached result in seconds
    pub cache_max_age: u64,
    /// Maximum source image size in bytes
    pub max_image_size: u64,
    /// Maximum requested width in pixels
    pub max_image_width: u32,
    /// Maximum requested height in pixels
    pub max_image_height: u32,
    /// Source fetch timeout in seconds
    pub fetch_timeout: u64,
    /// Whole-request timeout in seconds
    pub request_timeout: u64,
    /// Maximum number of requests processed at once
    pub max_concurrent_requests: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8189)
    /// - `CACHE_MAX_SIZE` - Cache byte budget (default: 50 MiB)
    /// - `CACHE_MAX_AGE` - Cache entry lifetime in seconds (default: 3600)
    /// - `MAX_IMAGE_SIZE` - Source image byte limit (default: 1024000)
    /// - `MAX_IMAGE_WIDTH` / `MAX_IMAGE_HEIGHT` - Dimension limits (default: 1000)
    /// - `FETCH_TIMEOUT` - Source fetch timeout in seconds (default: 30)
    /// - `REQUEST_TIMEOUT` - Request timeout in seconds (default: 60)
    /// - `MAX_CONCURRENT_REQUESTS` - In-flight request limit (default: 500)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_max_size: env_or("CACHE_MAX_SIZE", defaults.cache_max_size),
            cache_max_age: env_or("CACHE_MAX_AGE", defaults.cache_max_age),
            max_image_size: env_or("MAX_IMAGE_SIZE", defaults.max_image_size),
            max_image_width: env_or("MAX_IMAGE_WIDTH", defaults.max_image_width),
            max_image_height: env_or("MAX_IMAGE_HEIGHT", defaults.max_image_height),
            fetch_timeout: env_or("FETCH_TIMEOUT", defaults.fetch_timeout),
            request_timeout: env_or("REQUEST_TIMEOUT", defaults.request_timeout),
            max_concurrent_requests: env_or(
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            ),
        }
    }

    /// Checks the values that would make the server unable to start.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_max_size == 0 {
            return Err("CACHE_MAX_SIZE must be positive".to_string());
        }
        if self.max_concurrent_requests == 0 {
            return Err("MAX_CONCURRENT_REQUESTS must be positive".to_string());
        }
        if self.max_image_width == 0 || self.max_image_height == 0 {
            return Err("image dimension limits must be positive".to_string());
        }
        Ok(())
    }

    /// Returns the cache construction parameters.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_size: self.cache_max_size,
            max_age: Duration::from_secs(self.cache_max_age),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8189,
            cache_max_size: 50 * 1024 * 1024,
            cache_max_age: 60 * 60,
            max_image_size: 1024 * 1000,
            max_image_width: 1000,
            max_image_height: 1000,
            fetch_timeout: 30,
            request_timeout: 60,
            max_concurrent_requests: 500,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
