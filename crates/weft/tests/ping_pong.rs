//! Two threads on one core alternating through yield.

use std::sync::atomic::{AtomicUsize, Ordering};

use weft::RuntimeConfig;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

const ROUNDS: usize = 1000;

#[test]
fn ping_pong() {
    weft::init(RuntimeConfig::new().num_cores(1).stack_size(256 * 1024)).unwrap();

    let player = || {
        for _ in 0..ROUNDS {
            COUNTER.fetch_add(1, Ordering::Relaxed);
            weft::yield_now();
        }
    };

    let ping = weft::create_on(0, player);
    let pong = weft::create_on(0, player);
    assert!(!ping.is_null());
    assert!(!pong.is_null());

    weft::join(ping);
    weft::join(pong);
    assert_eq!(COUNTER.load(Ordering::Relaxed), 2 * ROUNDS);

    weft::shutdown().unwrap();
    weft::wait_for_termination().unwrap();
}
