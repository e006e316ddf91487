//! Per-kernel-thread state.
//!
//! Fast access to the core an OS thread drives and the context currently
//! executing on it. Threads that are not kernel threads of the runtime
//! (the application's main thread, test harness threads) see the
//! sentinels.

use std::cell::Cell;

use crate::context::ThreadContext;

pub(crate) const NOT_A_CORE: usize = usize::MAX;

thread_local! {
    /// Index of the core this OS thread drives; `NOT_A_CORE` elsewhere.
    static KERNEL_THREAD_ID: Cell<usize> = const { Cell::new(NOT_A_CORE) };

    /// Context currently loaded on this core.
    static LOADED_CONTEXT: Cell<*const ThreadContext> = const { Cell::new(std::ptr::null()) };
}

pub(crate) fn set_kernel_thread_id(id: usize) {
    KERNEL_THREAD_ID.with(|cell| cell.set(id));
}

#[inline]
pub(crate) fn kernel_thread_id() -> usize {
    KERNEL_THREAD_ID.with(|cell| cell.get())
}

pub(crate) fn set_loaded_context(ctx: &ThreadContext) {
    LOADED_CONTEXT.with(|cell| cell.set(ctx));
}

pub(crate) fn clear_loaded_context() {
    LOADED_CONTEXT.with(|cell| cell.set(std::ptr::null()));
}

/// The context executing on this core, `None` off the runtime.
#[inline]
pub(crate) fn loaded_context() -> Option<&'static ThreadContext> {
    let ptr = LOADED_CONTEXT.with(|cell| cell.get());
    // Safety: contexts live until process exit; the pointer is only set
    // by this core's own dispatch path.
    unsafe { ptr.as_ref() }
}

/// Whether the calling OS thread is one of the runtime's kernel threads.
#[inline]
pub fn is_runtime_thread() -> bool {
    kernel_thread_id() != NOT_A_CORE
}
