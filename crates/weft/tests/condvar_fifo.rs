//! notify_one wakes condition-variable waiters in arrival order.

use std::time::Duration;

use weft::{ConditionVariable, RuntimeConfig, SpinLock};

static PERMITS: SpinLock<usize> = SpinLock::new(0);
static PERMIT_READY: ConditionVariable = ConditionVariable::new();
static WAKE_LOG: SpinLock<Vec<usize>> = SpinLock::new(Vec::new());

fn waiter(tag: usize) {
    let mut permits = PERMITS.lock();
    while *permits == 0 {
        permits = PERMIT_READY.wait(permits);
    }
    *permits -= 1;
    drop(permits);
    WAKE_LOG.lock().push(tag);
}

#[test]
fn condvar_fifo() {
    weft::init(RuntimeConfig::new().num_cores(1).stack_size(256 * 1024)).unwrap();

    // Stagger creation so the wait queue order is t1, t2, t3.
    let t1 = weft::create_on(0, || waiter(1));
    std::thread::sleep(Duration::from_millis(50));
    let t2 = weft::create_on(0, || waiter(2));
    std::thread::sleep(Duration::from_millis(50));
    let t3 = weft::create_on(0, || waiter(3));
    std::thread::sleep(Duration::from_millis(50));

    for _ in 0..3 {
        {
            let mut permits = PERMITS.lock();
            *permits += 1;
            PERMIT_READY.notify_one();
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    weft::join(t1);
    weft::join(t2);
    weft::join(t3);

    assert_eq!(*WAKE_LOG.lock(), vec![1, 2, 3]);

    weft::shutdown().unwrap();
    weft::wait_for_termination().unwrap();
}
