//! # weft - cooperative M:N threading
//!
//! Many lightweight user threads multiplexed over a fixed pool of
//! kernel threads, one pinned per core. Threads are cooperative: a
//! running thread keeps its core until it yields, sleeps, blocks, or
//! exits. Creation costs one compare-and-swap and one cache-line write;
//! new work spreads across cores by two-choice load balancing.
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! static COUNTER: AtomicUsize = AtomicUsize::new(0);
//!
//! fn main() {
//!     weft::init(weft::RuntimeConfig::default()).unwrap();
//!
//!     let id = weft::create(|| {
//!         COUNTER.fetch_add(1, Ordering::Relaxed);
//!         weft::yield_now();
//!         COUNTER.fetch_add(1, Ordering::Relaxed);
//!     });
//!     weft::join(id);
//!
//!     assert_eq!(COUNTER.load(Ordering::Relaxed), 2);
//!     weft::shutdown().unwrap();
//!     weft::wait_for_termination().unwrap();
//! }
//! ```
//!
//! ## Constraints
//!
//! - A thread's closure and captures must fit in one cache line
//!   (56 usable bytes); bigger payloads fail to compile. Capture an
//!   `Arc` or a `&'static` when more state is needed.
//! - The scheduler never preempts: a thread that spins without calling
//!   into the runtime starves its core.
//! - A blocking OS call blocks the whole core, not just the thread.

use std::time::Duration;

// Re-export the types the API surface speaks in.
pub use weft_core::error::{RuntimeError, RuntimeResult};
pub use weft_core::klog::{set_log_level, LogLevel};
pub use weft_core::{SpinLock, SpinLockGuard};
pub use weft_runtime::{ConditionVariable, RuntimeConfig, ThreadId, NULL_THREAD};

/// Start the runtime. Returns once every core's dispatcher is scanning
/// for work. One runtime per process; a second call returns
/// [`RuntimeError::AlreadyInitialized`].
pub fn init(config: RuntimeConfig) -> RuntimeResult<()> {
    weft_runtime::init(config)
}

/// Ask every dispatcher to exit once its runqueue drains. A thread that
/// never unblocks keeps its core alive; draining is the caller's
/// responsibility. Before [`init`] this is
/// [`RuntimeError::NotInitialized`].
pub fn shutdown() -> RuntimeResult<()> {
    weft_runtime::shutdown()
}

/// Block the calling OS thread until [`shutdown`] completes and stack
/// memory has been released. Before [`init`] this is
/// [`RuntimeError::NotInitialized`].
pub fn wait_for_termination() -> RuntimeResult<()> {
    weft_runtime::wait_for_termination()
}

/// Create a thread on the less-loaded of two randomly chosen cores.
///
/// Returns [`NULL_THREAD`] when the chosen core has all 56 slots live;
/// callers may retry or treat that as overload.
pub fn create<F>(f: F) -> ThreadId
where
    F: FnOnce() + Send + 'static,
{
    weft_runtime::create(f)
}

/// Create a thread pinned to `core_id`; `-1` targets the caller's core,
/// which improves locality when creator and child share state.
pub fn create_on<F>(core_id: isize, f: F) -> ThreadId
where
    F: FnOnce() + Send + 'static,
{
    weft_runtime::create_on(core_id, f)
}

/// Give other ready threads on this core the CPU.
///
/// Guaranteed: every thread on the core that is ready when the caller
/// yields runs before the caller resumes, because the dispatcher's scan
/// restarts just past the yielder's slot.
pub fn yield_now() {
    weft_runtime::yield_now()
}

/// Park the calling thread for at least `duration`.
pub fn sleep(duration: Duration) {
    weft_runtime::sleep(duration)
}

/// Park the calling thread for at least `ns` nanoseconds.
pub fn sleep_ns(ns: u64) {
    weft_runtime::sleep_ns(ns)
}

/// Park the calling thread until [`signal`]ed or notified.
pub fn block() {
    weft_runtime::block()
}

/// Re-enter the dispatcher without changing the caller's wakeup state.
pub fn dispatch() {
    weft_runtime::dispatch()
}

/// Make the thread named by `id` runnable now. No-op for stale or null
/// identifiers; idempotent on an already-runnable thread.
pub fn signal(id: ThreadId) {
    weft_runtime::signal(id)
}

/// Wait until the thread named by `id` has finished. Stale and null
/// identifiers return immediately, so joining twice is harmless.
pub fn join(id: ThreadId) {
    weft_runtime::join(id)
}

/// Identifier of the calling thread; [`NULL_THREAD`] outside the
/// runtime.
pub fn current_thread_id() -> ThreadId {
    weft_runtime::current_thread_id()
}

/// Core the calling thread runs on, `None` outside the runtime.
pub fn current_core() -> Option<usize> {
    weft_runtime::current_core()
}

/// Whether the calling OS thread belongs to the runtime.
pub fn is_runtime_thread() -> bool {
    weft_runtime::is_runtime_thread()
}

/// Number of active cores; [`RuntimeError::NotInitialized`] before
/// [`init`].
pub fn num_cores() -> RuntimeResult<usize> {
    weft_runtime::num_cores()
}

/// Live threads on `core_id` right now;
/// [`RuntimeError::NotInitialized`] before [`init`].
pub fn core_occupancy(core_id: usize) -> RuntimeResult<u8> {
    weft_runtime::core_occupancy(core_id)
}
