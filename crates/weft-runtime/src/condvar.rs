//! Condition variable for user threads.
//!
//! Waiters park by setting their context's `wakeup_time` to `BLOCKED`
//! and dispatching away; notifiers hand the front of a FIFO queue a
//! wakeup by storing 0. Pairs with [`SpinLock`]; the wait side releases
//! the caller's lock while parked and reacquires it before returning.

use std::collections::VecDeque;

use core::sync::atomic::Ordering;

use weft_core::constants::BLOCKED;
use weft_core::{SpinLock, SpinLockGuard};

use crate::context::ThreadId;
use crate::dispatcher;
use crate::spawn;
use crate::tls;

/// Blocks threads until a condition might hold, waking them in FIFO
/// order: `notify_one` always wakes the longest-waiting thread.
pub struct ConditionVariable {
    waiters: SpinLock<VecDeque<ThreadId>>,
}

impl ConditionVariable {
    pub const fn new() -> Self {
        Self {
            waiters: SpinLock::new(VecDeque::new()),
        }
    }

    /// Park the caller until notified, releasing `guard` while parked
    /// and reacquiring it before returning.
    ///
    /// Wakeups can be spurious (and a caller outside the runtime always
    /// wakes after an OS-level yield), so callers loop on their
    /// predicate.
    pub fn wait<'a, T>(&self, guard: SpinLockGuard<'a, T>) -> SpinLockGuard<'a, T> {
        let lock = guard.spinlock();
        match tls::loaded_context() {
            Some(ctx) => {
                let id = ThreadId::new(ctx, ctx.generation.load(Ordering::Relaxed));
                // Park before enqueueing: a notifier can only pop this
                // entry after the BLOCKED store, so its wakeup is never
                // overwritten, even when notify runs without the
                // caller's lock.
                ctx.wakeup_time.store(BLOCKED, Ordering::Release);
                self.waiters.lock().push_back(id);
                drop(guard);
                dispatcher::dispatch();
            }
            None => {
                drop(guard);
                std::thread::yield_now();
            }
        }
        lock.lock()
    }

    /// Wake the longest-waiting thread, if any. An entry whose slot has
    /// moved on to a newer generation is consumed without effect.
    pub fn notify_one(&self) {
        let front = self.waiters.lock().pop_front();
        if let Some(id) = front {
            spawn::signal(id);
        }
    }

    /// Wake every queued waiter.
    pub fn notify_all(&self) {
        let drained: Vec<ThreadId> = {
            let mut waiters = self.waiters.lock();
            waiters.drain(..).collect()
        };
        for id in drained {
            spawn::signal(id);
        }
    }

    /// Number of queued waiters (diagnostics).
    pub fn waiter_count(&self) -> usize {
        self.waiters.lock().len()
    }
}

impl Default for ConditionVariable {
    fn default() -> Self {
        Self::new()
    }
}
