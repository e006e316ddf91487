//! Thread creation, placement, signal and join.

use core::sync::atomic::Ordering;

use weft_core::random::random;

use crate::context::{ThreadId, NULL_THREAD};
use crate::runtime;
use crate::tls;

/// Create a thread on core `core_id`; `-1` means the caller's core.
///
/// The closure and its captures must fit in one cache line; larger
/// payloads fail to compile. Returns [`NULL_THREAD`] when all 56 of the
/// target core's slots are live — callers may retry or treat that as
/// overload.
///
/// Placing a thread on the creator's own core improves locality when the
/// two share state; use the load-balanced [`create`] otherwise.
pub fn create_on<F>(core_id: isize, f: F) -> ThreadId
where
    F: FnOnce() + Send + 'static,
{
    let rt = runtime::get().expect("weft runtime not initialized");
    let kid = if core_id < 0 {
        match tls::kernel_thread_id() {
            tls::NOT_A_CORE => 0,
            id => id,
        }
    } else {
        core_id as usize
    };
    assert!(kid < rt.cores.len(), "core id {} out of range", kid);
    let core = &rt.cores[kid];

    let Some(index) = core.occupancy.acquire() else {
        return NULL_THREAD;
    };
    let ctx = &core.contexts[index as usize];

    // The slot is owned between the acquire above and the publication
    // below; nothing else touches it.
    unsafe { ctx.invocation.store(f) };

    // Read the generation before publishing: a thread that runs and
    // exits instantly must not hand back an already-stale identifier.
    let generation = ctx.generation.load(Ordering::Relaxed);

    // Publication. The release pairs with the dispatcher's acquire scan,
    // making the invocation bytes visible to the target core.
    ctx.wakeup_time.store(0, Ordering::Release);

    ThreadId::new(ctx, generation)
}

/// Create a thread on the less-loaded of two randomly chosen cores.
///
/// Two random choices keep the maximum imbalance O(log log n) for the
/// price of two occupancy reads.
pub fn create<F>(f: F) -> ThreadId
where
    F: FnOnce() + Send + 'static,
{
    let rt = runtime::get().expect("weft runtime not initialized");
    let kid = choose_core(rt.cores.len());
    create_on(kid as isize, f)
}

/// Pick two distinct cores uniformly at random and take the one with
/// fewer live threads. A single-core runtime short-circuits: there is no
/// distinct second choice to draw.
fn choose_core(num_cores: usize) -> usize {
    if num_cores == 1 {
        return 0;
    }
    let first = (random() % num_cores as u64) as usize;
    let mut second = (random() % num_cores as u64) as usize;
    while second == first {
        second = (random() % num_cores as u64) as usize;
    }
    select_less_loaded(
        first,
        runtime::core_state(first).occupancy.num_occupied(),
        second,
        runtime::core_state(second).occupancy.num_occupied(),
    )
}

/// Ties go to the second choice.
fn select_less_loaded(first: usize, first_load: u8, second: usize, second_load: u8) -> usize {
    if first_load < second_load {
        first
    } else {
        second
    }
}

/// Make the thread named by `id` runnable now.
///
/// Stale and null identifiers are ignored, and signaling an
/// already-runnable thread is an idempotent rewrite of 0.
pub fn signal(id: ThreadId) {
    let Some(ctx) = id.context() else {
        return;
    };
    if ctx.generation.load(Ordering::Relaxed) != id.generation() {
        return;
    }
    // Release so data the signaler wrote beforehand is visible to the
    // woken thread via the dispatcher's acquire scan.
    ctx.wakeup_time.store(0, Ordering::Release);
}

/// Wait until the thread named by `id` has finished.
///
/// Returns immediately for stale or null identifiers. On return the
/// slot's generation has advanced past `id`'s. The application's main
/// thread may join: without a context to park it spins on the
/// generation, yielding the OS thread between checks.
pub fn join(id: ThreadId) {
    let Some(ctx) = id.context() else {
        return;
    };
    let mut guard = ctx.join_lock.lock();
    while ctx.generation.load(Ordering::Acquire) == id.generation() {
        guard = ctx.join_cv.wait(guard);
    }
    drop(guard);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_breaks_to_second_choice() {
        assert_eq!(select_less_loaded(0, 3, 1, 3), 1);
        assert_eq!(select_less_loaded(2, 0, 3, 0), 3);
    }

    #[test]
    fn test_less_loaded_wins() {
        assert_eq!(select_less_loaded(0, 1, 1, 5), 0);
        assert_eq!(select_less_loaded(0, 5, 1, 1), 1);
    }

    #[test]
    fn test_signal_null_is_noop() {
        signal(NULL_THREAD);
        join(NULL_THREAD);
    }

    #[test]
    fn test_signal_stale_is_noop() {
        use crate::context::ThreadContext;
        use core::ptr;
        use weft_core::constants::UNOCCUPIED;

        let ctx = ThreadContext::new(0, ptr::null_mut(), ptr::null_mut());
        let id = ThreadId::new(&ctx, 0);
        ctx.generation.store(2, Ordering::Relaxed);

        signal(id);
        assert_eq!(ctx.wakeup_time.load(Ordering::Relaxed), UNOCCUPIED);

        // A fresh identifier for the current generation does land.
        let live = ThreadId::new(&ctx, 2);
        signal(live);
        assert_eq!(ctx.wakeup_time.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_join_stale_returns() {
        use crate::context::ThreadContext;
        use core::ptr;

        let ctx = ThreadContext::new(0, ptr::null_mut(), ptr::null_mut());
        ctx.generation.store(4, Ordering::Relaxed);

        // Generation already past the identifier's: returns immediately.
        join(ThreadId::new(&ctx, 1));
    }
}
