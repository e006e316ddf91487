//! The per-core dispatcher.
//!
//! There is no separate scheduler task: `dispatch` is executed by
//! whichever user context wants to give up the CPU. It scans the core's
//! slots round-robin for the next ready context and swaps directly onto
//! that context's stack. A context parked inside `dispatch` resumes
//! exactly there when a later scan selects it, so "starting" a newly
//! published slot and "resuming" a sleeper are the same operation.

use core::ptr;
use core::sync::atomic::Ordering;

use std::time::Duration;

use weft_core::constants::{BLOCKED, MAX_THREADS_PER_CORE, UNOCCUPIED};

use crate::arch;
use crate::context::{ThreadId, NULL_THREAD};
use crate::cycles;
use crate::runtime;
use crate::tls;

/// Give up the CPU until this context is selected again.
///
/// The scan starts just past the current slot and wraps, selecting the
/// first occupied context whose `wakeup_time` has passed; the cycle
/// clock is re-read on every full pass. The kernel thread never sleeps
/// here: it spins until a context becomes ready, trading efficiency for
/// wakeup latency. Selecting the caller itself returns without a switch.
///
/// Once shutdown has been requested and the core's occupancy drains to
/// zero, the scan instead swaps back to the kernel thread's own stack,
/// ending that core's dispatcher.
pub fn dispatch() {
    let Some(current) = tls::loaded_context() else {
        // Not on a runtime core; there is nothing to switch.
        std::thread::yield_now();
        return;
    };
    let core = runtime::core_state(tls::kernel_thread_id());

    let start = (current.id_in_core as usize + 1) % MAX_THREADS_PER_CORE;
    let mut index = start;
    let mut now = cycles::now();
    loop {
        let candidate = &core.contexts[index];
        // The sentinels BLOCKED and UNOCCUPIED sit above any real cycle
        // count, so one comparison filters both.
        if candidate.wakeup_time.load(Ordering::Acquire) <= now {
            if ptr::eq(candidate, current) {
                return;
            }
            tls::set_loaded_context(candidate);
            unsafe { arch::swap_context(current.sp.get(), candidate.sp.get()) };
            return;
        }

        index = (index + 1) % MAX_THREADS_PER_CORE;
        if index == start {
            now = cycles::now();
            if runtime::shutdown_requested() && core.occupancy.num_occupied() == 0 {
                unsafe { arch::swap_context(current.sp.get(), core.kernel_sp.get()) };
                // A core whose dispatcher has exited never reselects
                // this context.
                unreachable!("parked context resumed after core shutdown");
            }
            core::hint::spin_loop();
        }
    }
}

/// Let every other ready thread on this core run before the caller
/// resumes: the selection scan starts just past the yielder, so it
/// reaches the caller's slot again only after visiting all 55 others.
pub fn yield_now() {
    let Some(ctx) = tls::loaded_context() else {
        std::thread::yield_now();
        return;
    };
    ctx.wakeup_time.store(0, Ordering::Relaxed);
    dispatch();
}

/// Park the caller for at least `ns` nanoseconds. The slot stays
/// occupied; the dispatcher runs it again once the deadline passes.
pub fn sleep_ns(ns: u64) {
    let Some(ctx) = tls::loaded_context() else {
        std::thread::sleep(Duration::from_nanos(ns));
        return;
    };
    let deadline = cycles::now() + cycles::from_ns(ns);
    ctx.wakeup_time.store(deadline, Ordering::Relaxed);
    dispatch();
}

/// Park the caller for at least `duration`.
pub fn sleep(duration: Duration) {
    sleep_ns(duration.as_nanos() as u64);
}

/// Park the caller indefinitely. A `signal` or a condition-variable
/// notify makes it runnable again.
pub fn block() {
    let Some(ctx) = tls::loaded_context() else {
        std::thread::yield_now();
        return;
    };
    ctx.wakeup_time.store(BLOCKED, Ordering::Release);
    dispatch();
}

/// Identifier of the calling thread; `NULL_THREAD` outside the runtime.
pub fn current_thread_id() -> ThreadId {
    match tls::loaded_context() {
        Some(ctx) => ThreadId::new(ctx, ctx.generation.load(Ordering::Relaxed)),
        None => NULL_THREAD,
    }
}

/// Main loop executed on every context's stack; the architecture
/// trampoline lands here with the slot index.
///
/// Each turn parks until the slot has been published and selected, runs
/// the stored closure, then retires the slot: cancel any wakeup the
/// thread left behind, advance the generation and wake joiners, mark the
/// context unoccupied, and only then release the occupancy bit — a
/// remote creator that wins the freed bit must never have its
/// `wakeup_time` publication overwritten by this exit path.
pub(crate) fn thread_main(id_in_core: usize) -> ! {
    loop {
        // Parks while the slot is empty; returns once a creator has
        // published it and the scan picked this context.
        dispatch();

        let core = runtime::core_state(tls::kernel_thread_id());
        let ctx = &core.contexts[id_in_core];
        debug_assert!(tls::loaded_context().is_some_and(|c| ptr::eq(c, ctx)));

        // Safety: dispatch only selects this slot after a creator stored
        // a closure and published the slot with release ordering.
        unsafe { ctx.invocation.run() };

        ctx.wakeup_time.store(BLOCKED, Ordering::Relaxed);

        {
            let _held = ctx.join_lock.lock();
            ctx.generation.fetch_add(1, Ordering::Release);
            ctx.join_cv.notify_all();
        }

        ctx.wakeup_time.store(UNOCCUPIED, Ordering::Release);
        core.occupancy.release(ctx.id_in_core);
    }
}
