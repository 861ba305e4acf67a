//! Request and Response models for the resize service
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing query strings and serializing JSON response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ResizeQuery, ResizeSpec};
pub use responses::{HealthResponse, StatsResponse};
