//! Error types for the NebulaGPU resource layer
//!
//! This module defines the error types used throughout the crate,
//! including device calls, resource creation and descriptor management.

use std::fmt;

/// Result type for NebulaGPU operations
pub type Result<T> = std::result::Result<T, Error>;

/// NebulaGPU errors
///
/// Every device-call failure reported here is unrecoverable: it indicates
/// device loss or a programming error (bad sizes, exhausted heap). There is
/// no retry path anywhere in this crate.
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, DirectX, mock, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, descriptor handle, etc.)
    InvalidResource(String),

    /// Initialization failed (device, queue, heaps)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
