//! Registry error types
//!
//! Error types for source registry operations.

use super::clock::ClockError;

/// Error type for registry operations
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Source index outside `[0, n_sources)`
    IndexOutOfRange {
        /// The rejected index
        index: usize,
        /// Number of slots in the registry
        n_sources: usize,
    },
    /// Slot table could not be allocated
    AllocationFailure(usize),
    /// Configuration rejected at construction
    InvalidConfig(&'static str),
    /// Time source could not be read
    TimeSource(ClockError),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::IndexOutOfRange { index, n_sources } => {
                write!(
                    f,
                    "Source index {} out of range (n_sources = {})",
                    index, n_sources
                )
            }
            RegistryError::AllocationFailure(n) => {
                write!(f, "Failed to allocate {} source slots", n)
            }
            RegistryError::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
            RegistryError::TimeSource(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<ClockError> for RegistryError {
    fn from(e: ClockError) -> Self {
        RegistryError::TimeSource(e)
    }
}
