//! Error types for rust_dtspn

use std::fmt;

/// Main error type for tour planning
#[derive(Debug)]
pub enum DtspnError {
    /// Invalid caller input (turning radius, sampling resolution, ...)
    ConfigurationError(String),
    /// The discrete solver failed or returned a malformed tour
    PlanningError(String),
    /// Internal defect, never caused by user input
    InvariantViolation(String),
    /// Malformed problem description
    ParseError(String),
    /// I/O error
    IoError(std::io::Error),
}

impl fmt::Display for DtspnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DtspnError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            DtspnError::PlanningError(msg) => write!(f, "Planning error: {}", msg),
            DtspnError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            DtspnError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DtspnError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for DtspnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DtspnError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DtspnError {
    fn from(e: std::io::Error) -> Self {
        DtspnError::IoError(e)
    }
}

/// Result type alias for tour planning operations
pub type DtspnResult<T> = Result<T, DtspnError>;
