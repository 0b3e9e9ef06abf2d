//! Error types for sievecache

use std::collections::TryReserveError;
use std::fmt;

/// Result type alias for sievecache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be at least 1
    InvalidCapacity,

    /// Reserving room for a new entry failed
    AllocationFailure(TryReserveError),

    /// Internal list/table state is inconsistent
    Invariant(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity => write!(f, "Invalid capacity: must be greater than 0"),
            Error::AllocationFailure(e) => write!(f, "Allocation failure: {}", e),
            Error::Invariant(msg) => write!(f, "Invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::AllocationFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::AllocationFailure(err)
    }
}
