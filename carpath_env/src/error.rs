//! Error types for the carpath environment abstraction.

use thiserror::Error;

/// Errors reported by the collaborators behind the environment traits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// The user refused (or policy restricts) access to device location
    #[error("Location permission denied")]
    PermissionDenied,

    /// Location service could not produce a fix
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// Directions lookup failed (service error, connectivity, etc.)
    #[error("Directions error: {0}")]
    DirectionsError(String),
}

impl EnvError {
    /// Creates a location error.
    pub fn location(msg: impl Into<String>) -> Self {
        Self::LocationUnavailable(msg.into())
    }

    /// Creates a directions error.
    pub fn directions(msg: impl Into<String>) -> Self {
        Self::DirectionsError(msg.into())
    }

    /// True for the permission-denied kind.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}
