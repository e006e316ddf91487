//! Create-join storms leave every occupancy word empty.

use std::sync::atomic::{AtomicUsize, Ordering};

use weft::RuntimeConfig;

static RUNS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn create_join_round_trip() {
    weft::init(RuntimeConfig::new().num_cores(2).stack_size(128 * 1024)).unwrap();

    const N: usize = 300;
    for _ in 0..N {
        let id = weft::create(|| {
            RUNS.fetch_add(1, Ordering::Relaxed);
        });
        assert!(!id.is_null());
        weft::join(id);
    }
    assert_eq!(RUNS.load(Ordering::Relaxed), N);

    for core in 0..weft::num_cores().unwrap() {
        while weft::core_occupancy(core).unwrap() != 0 {
            std::thread::yield_now();
        }
    }

    weft::shutdown().unwrap();
    weft::wait_for_termination().unwrap();
}
