//! A shorter sleep wakes before a longer one started at the same time.

use std::sync::atomic::{AtomicUsize, Ordering};

use weft::RuntimeConfig;

static WAKE_SEQ: AtomicUsize = AtomicUsize::new(1);
static LONG_TICKET: AtomicUsize = AtomicUsize::new(0);
static SHORT_TICKET: AtomicUsize = AtomicUsize::new(0);

#[test]
fn sleep_order() {
    weft::init(RuntimeConfig::new().num_cores(1).stack_size(256 * 1024)).unwrap();

    let long = weft::create_on(0, || {
        weft::sleep_ns(10_000_000); // 10 ms
        LONG_TICKET.store(WAKE_SEQ.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
    });
    let short = weft::create_on(0, || {
        weft::sleep_ns(1_000_000); // 1 ms
        SHORT_TICKET.store(WAKE_SEQ.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
    });

    weft::join(long);
    weft::join(short);

    let long_ticket = LONG_TICKET.load(Ordering::SeqCst);
    let short_ticket = SHORT_TICKET.load(Ordering::SeqCst);
    assert!(long_ticket > 0 && short_ticket > 0);
    assert!(
        short_ticket < long_ticket,
        "1 ms sleeper woke at {} but 10 ms sleeper at {}",
        short_ticket,
        long_ticket
    );

    weft::shutdown().unwrap();
    weft::wait_for_termination().unwrap();
}
