//! Placement randomness.
//!
//! A three-word xorshift generator with fixed seeds. Thread placement
//! only needs a cheap spread across cores, not statistical quality. The
//! state words are relaxed atomics: concurrent creators may interleave
//! steps and bias the sequence slightly, which placement tolerates.

use core::sync::atomic::{AtomicU64, Ordering};

static X: AtomicU64 = AtomicU64::new(123456789);
static Y: AtomicU64 = AtomicU64::new(362436069);
static Z: AtomicU64 = AtomicU64::new(521288629);

#[cfg(test)]
std::thread_local! {
    static SCRIPTED: std::cell::RefCell<std::collections::VecDeque<u64>> =
        std::cell::RefCell::new(std::collections::VecDeque::new());
}

/// Queue a value to be returned by [`random`] ahead of the generator,
/// letting tests drive placement deterministically.
#[cfg(test)]
pub fn push_scripted(value: u64) {
    SCRIPTED.with(|q| q.borrow_mut().push_back(value));
}

/// Next value of the process-global sequence.
pub fn random() -> u64 {
    #[cfg(test)]
    {
        let scripted = SCRIPTED.with(|q| q.borrow_mut().pop_front());
        if let Some(value) = scripted {
            return value;
        }
    }

    let x = X.load(Ordering::Relaxed);
    let y = Y.load(Ordering::Relaxed);
    let z = Z.load(Ordering::Relaxed);
    let (x, y, z) = step(x, y, z);
    X.store(x, Ordering::Relaxed);
    Y.store(y, Ordering::Relaxed);
    Z.store(z, Ordering::Relaxed);
    z
}

/// One xorshift step: shift `x` by 16/5/1, rotate the words, fold.
fn step(x: u64, y: u64, z: u64) -> (u64, u64, u64) {
    let mut t = x;
    t ^= t << 16;
    t ^= t >> 5;
    t ^= t << 1;
    (y, z, t ^ y ^ z)
}
