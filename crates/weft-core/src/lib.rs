//! # weft-core
//!
//! Core primitives for the weft M:N threading runtime.
//!
//! This crate is platform-agnostic and dependency-free. Everything that
//! touches the OS or the CPU (context switching, stack memory, the
//! per-core dispatcher) lives in `weft-runtime`.
//!
//! ## Modules
//!
//! - `occupancy` - per-core occupancy word, the lock-free slot allocator
//! - `invocation` - cache-line-sized inline storage for thread closures
//! - `spinlock` - spinlock for short critical sections
//! - `random` - xorshift generator used by thread placement
//! - `error` - error types
//! - `env` - environment variable helpers
//! - `klog` - kernel-style leveled logging macros

pub mod env;
pub mod error;
pub mod invocation;
pub mod klog;
pub mod occupancy;
pub mod random;
pub mod spinlock;

// Re-exports for convenience
pub use env::{env_get, env_get_bool};
pub use error::{RuntimeError, RuntimeResult};
pub use invocation::InvocationCell;
pub use klog::LogLevel;
pub use occupancy::OccupancyWord;
pub use spinlock::{SpinLock, SpinLockGuard};

/// Constants shared across the runtime.
pub mod constants {
    /// Largest number of user threads that can be live on one core at a
    /// time; also the width of the occupancy bitfield.
    pub const MAX_THREADS_PER_CORE: usize = 56;

    /// Cache line size, used for alignment and for the invocation cell.
    pub const CACHE_LINE_SIZE: usize = 64;

    /// `wakeup_time` value for a live thread that is parked indefinitely.
    pub const BLOCKED: u64 = u64::MAX;

    /// `wakeup_time` value for a context that is not hosting a thread.
    pub const UNOCCUPIED: u64 = u64::MAX - 1;

    /// Bytes reserved on each stack for the callee-saved registers the
    /// calling convention makes the context switch preserve.
    pub const SPACE_FOR_SAVED_REGISTERS: usize = 48;
}
