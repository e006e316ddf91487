//! Cycle clock.
//!
//! Sleep deadlines are expressed in cycles of a monotonically increasing
//! counter: the timestamp counter on x86_64, monotonic-clock nanoseconds
//! elsewhere. Nanosecond intervals convert through a rate measured once
//! against the monotonic clock.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Current value of the cycle counter.
#[inline]
pub fn now() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { core::arch::x86_64::_rdtsc() }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        monotonic_ns()
    }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
fn monotonic_ns() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Cycles per second, measured once over a short window.
pub fn per_second() -> u64 {
    static CYCLES_PER_SECOND: OnceLock<u64> = OnceLock::new();
    *CYCLES_PER_SECOND.get_or_init(calibrate)
}

fn calibrate() -> u64 {
    let start_cycles = now();
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(10) {
        core::hint::spin_loop();
    }
    let elapsed_ns = start.elapsed().as_nanos().max(1);
    let cycles = now().wrapping_sub(start_cycles).max(1);
    ((cycles as u128 * 1_000_000_000) / elapsed_ns).max(1) as u64
}

/// Convert a nanosecond interval to a cycle count.
#[inline]
pub fn from_ns(ns: u64) -> u64 {
    ((ns as u128 * per_second() as u128) / 1_000_000_000) as u64
}

/// Warm the calibration so the first sleep does not pay for it.
pub(crate) fn init() {
    let _ = per_second();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_advances() {
        let a = now();
        std::thread::sleep(Duration::from_millis(2));
        let b = now();
        assert!(b > a);
    }

    #[test]
    fn test_rate_sane() {
        // Anything from an embedded board to a server lands well inside
        // this range; the assert mostly guards the calibration math.
        let rate = per_second();
        assert!(rate > 1_000_000, "rate {} too low", rate);
        assert!(rate < 100_000_000_000, "rate {} too high", rate);
    }

    #[test]
    fn test_from_ns() {
        assert_eq!(from_ns(0), 0);
        assert_eq!(from_ns(1_000_000_000), per_second());
        assert!(from_ns(1_000_000) <= from_ns(10_000_000));
    }

    #[test]
    fn test_sleep_measures_close() {
        let begin = now();
        std::thread::sleep(Duration::from_millis(20));
        let measured = now() - begin;
        let expected = from_ns(20_000_000);
        // Allow generous skew for scheduling noise.
        assert!(measured > expected / 4);
        assert!(measured < expected * 8);
    }
}
