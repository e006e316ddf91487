//! # weft-runtime
//!
//! Platform- and architecture-specific half of the weft threading
//! runtime:
//!
//! - `cycles` - the cycle clock sleep deadlines are expressed in
//! - `arch` - context-switch assembly and stack bootstrap
//! - `stack` - per-core stack pools (mmap + guard pages)
//! - `context` - thread contexts and identifiers
//! - `condvar` - condition variable built on the dispatcher
//! - `dispatcher` - the per-core selection and switch loop
//! - `spawn` - creation, two-choice placement, signal, join
//! - `runtime` - lifecycle: init, shutdown, kernel threads, pinning
//! - `tls` - per-kernel-thread state
//! - `config` - runtime configuration

#![allow(dead_code)]

pub mod arch;
pub mod condvar;
pub mod config;
pub mod context;
pub mod cycles;
pub mod dispatcher;
pub mod runtime;
pub mod spawn;
pub mod stack;
pub mod tls;

// Re-exports
pub use condvar::ConditionVariable;
pub use config::RuntimeConfig;
pub use context::{ThreadId, NULL_THREAD};
pub use dispatcher::{block, current_thread_id, dispatch, sleep, sleep_ns, yield_now};
pub use runtime::{core_occupancy, current_core, init, num_cores, shutdown, wait_for_termination};
pub use spawn::{create, create_on, join, signal};
pub use tls::is_runtime_thread;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        // Stack memory and core pinning go through libc.
    } else {
        compile_error!("weft currently supports Unix platforms only");
    }
}
