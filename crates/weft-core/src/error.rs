//! Error types for the weft runtime.
//!
//! Only lifecycle operations produce error values. Thread creation on a
//! full core reports through the null thread identifier, and operations
//! on stale identifiers are silent no-ops; an oversized thread closure
//! is rejected at compile time.

use core::fmt;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced by runtime lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime was already initialized by an earlier `init`.
    AlreadyInitialized,

    /// An operation that needs the runtime ran before `init`.
    NotInitialized,

    /// Configuration failed validation.
    InvalidConfig(&'static str),

    /// Reserving or protecting stack memory failed.
    StackAllocation,

    /// Pinning a kernel thread to its core failed.
    Affinity,

    /// Spawning a kernel thread failed.
    SpawnFailed,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::AlreadyInitialized => write!(f, "runtime already initialized"),
            RuntimeError::NotInitialized => write!(f, "runtime not initialized"),
            RuntimeError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            RuntimeError::StackAllocation => write!(f, "stack memory allocation failed"),
            RuntimeError::Affinity => write!(f, "failed to set kernel thread affinity"),
            RuntimeError::SpawnFailed => write!(f, "failed to spawn kernel thread"),
        }
    }
}

impl std::error::Error for RuntimeError {}
