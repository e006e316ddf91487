//! Inline storage for a thread's entry closure.
//!
//! The closure for a new thread is written directly into its context
//! rather than boxed: creation stays allocation-free, and the bytes live
//! in a cache line no neighboring slot shares. The first word of the
//! cell is a monomorphized invoker function; the remaining bytes hold
//! the closure and its captures.

use core::cell::UnsafeCell;
use core::mem;

use crate::constants::CACHE_LINE_SIZE;

/// Bytes of the cell available to the closure payload. The leading word
/// is spent on the type-erased invoker.
pub const MAX_PAYLOAD_SIZE: usize = CACHE_LINE_SIZE - mem::size_of::<usize>();

const PAYLOAD_OFFSET: usize = mem::size_of::<usize>();

/// One cache line of closure storage, cache-line aligned.
#[repr(C, align(64))]
pub struct InvocationCell {
    bytes: UnsafeCell<[u8; CACHE_LINE_SIZE]>,
}

// The occupancy protocol serializes access: between slot acquisition and
// the hosted thread's exit, exactly one thread owns the cell.
unsafe impl Send for InvocationCell {}
unsafe impl Sync for InvocationCell {}

const _: () = {
    assert!(mem::size_of::<InvocationCell>() == CACHE_LINE_SIZE);
    assert!(mem::align_of::<InvocationCell>() == CACHE_LINE_SIZE);
};

impl InvocationCell {
    pub const fn new() -> Self {
        Self {
            bytes: UnsafeCell::new([0u8; CACHE_LINE_SIZE]),
        }
    }

    /// Store `f` in the cell.
    ///
    /// A closure whose captures exceed [`MAX_PAYLOAD_SIZE`] bytes, or
    /// whose alignment exceeds the word alignment of the cell, fails to
    /// compile.
    ///
    /// # Safety
    ///
    /// The caller must own the slot (hold its occupancy bit), and the
    /// cell must not hold an unconsumed closure.
    pub unsafe fn store<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        const {
            assert!(
                mem::size_of::<F>() <= MAX_PAYLOAD_SIZE,
                "a thread's closure and captures must fit in one cache line"
            )
        };
        const {
            assert!(
                mem::align_of::<F>() <= mem::align_of::<usize>(),
                "a thread's closure must not require alignment above 8"
            )
        };

        let base = self.bytes.get() as *mut u8;
        (base as *mut usize).write(invoke_erased::<F> as fn(*mut u8) as usize);
        (base.add(PAYLOAD_OFFSET) as *mut F).write(f);
    }

    /// Consume and run the stored closure. Captures are dropped when the
    /// call returns.
    ///
    /// # Safety
    ///
    /// Must be called exactly once per `store`, on the core the slot was
    /// published to.
    pub unsafe fn run(&self) {
        let base = self.bytes.get() as *mut u8;
        let invoker: fn(*mut u8) = mem::transmute((base as *const usize).read());
        invoker(base.add(PAYLOAD_OFFSET));
    }
}

fn invoke_erased<F: FnOnce()>(payload: *mut u8) {
    let f = unsafe { (payload as *mut F).read() };
    f();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_store_and_run() {
        let cell = InvocationCell::new();
        let hit = Arc::new(AtomicUsize::new(0));

        let hit2 = Arc::clone(&hit);
        unsafe {
            cell.store(move || {
                hit2.fetch_add(1, Ordering::SeqCst);
            });
            cell.run();
        }

        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_captures_by_value() {
        let cell = InvocationCell::new();
        let out = Arc::new(AtomicUsize::new(0));

        let out2 = Arc::clone(&out);
        let a: usize = 40;
        let b: usize = 2;
        unsafe {
            cell.store(move || {
                out2.store(a + b, Ordering::SeqCst);
            });
            cell.run();
        }

        assert_eq!(out.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_captures_dropped_after_run() {
        let cell = InvocationCell::new();
        let token = Arc::new(());
        let witness = Arc::downgrade(&token);

        unsafe {
            cell.store(move || {
                let _keep = &token;
            });
            cell.run();
        }

        // The closure owned the last strong reference and ran to
        // completion, so the allocation is gone.
        assert!(witness.upgrade().is_none());
    }

    #[test]
    fn test_full_payload_fits() {
        let cell = InvocationCell::new();
        let sum = Arc::new(AtomicUsize::new(0));

        // Arc (8) + [u8; 48] = 56 bytes, the whole payload area.
        let payload = [1u8; 48];
        let sum2 = Arc::clone(&sum);
        unsafe {
            cell.store(move || {
                let total: usize = payload.iter().map(|&b| b as usize).sum();
                sum2.store(total, Ordering::SeqCst);
            });
            cell.run();
        }

        assert_eq!(sum.load(Ordering::SeqCst), 48);
    }

    #[test]
    fn test_reuse_after_run() {
        let cell = InvocationCell::new();
        let out = Arc::new(AtomicUsize::new(0));

        for round in 1..=3usize {
            let out2 = Arc::clone(&out);
            unsafe {
                cell.store(move || {
                    out2.store(round, Ordering::SeqCst);
                });
                cell.run();
            }
            assert_eq!(out.load(Ordering::SeqCst), round);
        }
    }
}
