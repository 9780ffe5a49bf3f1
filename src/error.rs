//! Crate-level error type.

use thiserror::Error;

/// Errors produced by chart construction and rendering.
///
/// Invalid configuration is rejected here rather than silently clamped;
/// transient surface failures are reported so the scheduler can log and
/// continue.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("capacity error: {0}")]
    InvalidCapacity(String),

    #[error("interval error: {0}")]
    InvalidInterval(String),

    #[error("cursor error: {0}")]
    InvalidCursor(String),

    #[error("scale error: {0}")]
    InvalidScale(String),

    #[error("surface error: {0}")]
    Surface(String),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
