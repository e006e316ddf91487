//! Thread contexts and identifiers.

use core::cell::UnsafeCell;
use core::fmt;
use core::ptr;
use core::sync::atomic::{AtomicU32, AtomicU64};

use weft_core::constants::UNOCCUPIED;
use weft_core::{InvocationCell, SpinLock};

use crate::condvar::ConditionVariable;

/// Per-slot record for one user thread.
///
/// Contexts live in their core's contiguous array from init until the
/// process exits; a finished thread only bumps `generation` and frees
/// the occupancy bit, never the storage, so identifiers can always be
/// checked for staleness.
#[repr(align(64))]
pub struct ThreadContext {
    /// Lowest address of this context's stack inside the core's pool.
    pub(crate) stack_base: *mut u8,

    /// Saved stack pointer while the context is not executing.
    pub(crate) sp: UnsafeCell<*mut u8>,

    /// Cycle deadline. 0 = run at the next opportunity; `BLOCKED` and
    /// `UNOCCUPIED` are the sentinels in `weft_core::constants`; any
    /// other value is the earliest cycle at which to run.
    pub(crate) wakeup_time: AtomicU64,

    /// Incremented each time a thread finishes in this slot.
    pub(crate) generation: AtomicU32,

    /// Index of this slot within its core. Immutable after init.
    pub(crate) id_in_core: u8,

    /// Joiners serialize on this lock and park on the condition variable.
    pub(crate) join_lock: SpinLock<()>,
    pub(crate) join_cv: ConditionVariable,

    /// Inline storage for the thread's entry closure.
    pub(crate) invocation: InvocationCell,
}

// Safety: fields with interior mutability are either atomics or written
// only under the occupancy/dispatch protocol (sp by the owning core's
// switches, the invocation cell by the slot owner).
unsafe impl Send for ThreadContext {}
unsafe impl Sync for ThreadContext {}

impl ThreadContext {
    pub(crate) fn new(id_in_core: u8, stack_base: *mut u8, initial_sp: *mut u8) -> Self {
        Self {
            stack_base,
            sp: UnsafeCell::new(initial_sp),
            wakeup_time: AtomicU64::new(UNOCCUPIED),
            generation: AtomicU32::new(0),
            id_in_core,
            join_lock: SpinLock::new(()),
            join_cv: ConditionVariable::new(),
            invocation: InvocationCell::new(),
        }
    }
}

/// Identifier for a user thread: the context hosting it plus the slot
/// generation at creation.
///
/// Identifiers outlive the threads they name. Once the slot's generation
/// advances, the identifier is stale and every operation on it is a
/// well-defined no-op.
#[derive(Clone, Copy)]
pub struct ThreadId {
    context: *const ThreadContext,
    generation: u32,
}

/// The non-existent thread. Returned by creation when the target core is
/// full and by `current_thread_id` outside the runtime.
pub const NULL_THREAD: ThreadId = ThreadId {
    context: ptr::null(),
    generation: 0,
};

// Safety: contexts are allocated at init and stay alive for the life of
// the process, so the pointer may travel between threads freely.
unsafe impl Send for ThreadId {}
unsafe impl Sync for ThreadId {}

impl ThreadId {
    pub(crate) fn new(context: &ThreadContext, generation: u32) -> Self {
        Self {
            context,
            generation,
        }
    }

    /// Whether this is the null identifier.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.context.is_null()
    }

    pub(crate) fn context(&self) -> Option<&'static ThreadContext> {
        // Safety: see the Send/Sync justification; contexts are never
        // freed while the runtime can be reached.
        unsafe { self.context.as_ref() }
    }

    #[inline]
    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl PartialEq for ThreadId {
    fn eq(&self, other: &Self) -> bool {
        self.context == other.context && self.generation == other.generation
    }
}

impl Eq for ThreadId {}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context() {
            None => write!(f, "ThreadId(null)"),
            Some(ctx) => write!(
                f,
                "ThreadId(slot {} gen {})",
                ctx.id_in_core, self.generation
            ),
        }
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        NULL_THREAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::Ordering;

    fn test_context(id_in_core: u8) -> ThreadContext {
        ThreadContext::new(id_in_core, ptr::null_mut(), ptr::null_mut())
    }

    #[test]
    fn test_null_thread() {
        assert!(NULL_THREAD.is_null());
        assert!(NULL_THREAD.context().is_none());
        assert_eq!(NULL_THREAD, ThreadId::default());
    }

    #[test]
    fn test_equality_needs_both_fields() {
        let ctx = test_context(3);
        let a = ThreadId::new(&ctx, 0);
        let b = ThreadId::new(&ctx, 0);
        let later = ThreadId::new(&ctx, 1);

        assert_eq!(a, b);
        assert_ne!(a, later);
        assert_ne!(a, NULL_THREAD);
    }

    #[test]
    fn test_new_context_is_unoccupied() {
        let ctx = test_context(0);
        assert_eq!(ctx.wakeup_time.load(Ordering::Relaxed), UNOCCUPIED);
        assert_eq!(ctx.generation.load(Ordering::Relaxed), 0);
    }
}
