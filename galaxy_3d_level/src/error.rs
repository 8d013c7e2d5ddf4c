//! Error types for the Galaxy3D level loader
//!
//! This module defines the error types produced while importing, validating
//! and building a level. Per-frame work never returns errors: once a level
//! has loaded, every index it stores has been validated.

use std::fmt;

/// Result type for Galaxy3D level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D level errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Load-fatal condition (unreadable scene, missing required node,
    /// light without a matching light source, failed load task)
    LoadFailed(String),

    /// Imported scene data failed validation (index out of range,
    /// non-triangle face, attribute length mismatch)
    InvalidScene(String),

    /// Two nodes claim the same special role
    DuplicateNode(String),

    /// Node handle does not belong to this scene graph (or is stale)
    InvalidHandle(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LoadFailed(msg) => write!(f, "Load failed: {}", msg),
            Error::InvalidScene(msg) => write!(f, "Invalid scene: {}", msg),
            Error::DuplicateNode(msg) => write!(f, "Duplicate node: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid node handle: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
