//! Runtime lifecycle: double init, introspection, clean termination.

use weft::{RuntimeConfig, RuntimeError};

#[test]
fn lifecycle() {
    assert!(!weft::is_runtime_thread());
    assert!(weft::current_thread_id().is_null());
    assert!(weft::current_core().is_none());

    // Lifecycle and introspection report rather than panic before init.
    assert_eq!(weft::shutdown().unwrap_err(), RuntimeError::NotInitialized);
    assert_eq!(
        weft::wait_for_termination().unwrap_err(),
        RuntimeError::NotInitialized
    );
    assert_eq!(weft::num_cores().unwrap_err(), RuntimeError::NotInitialized);
    assert_eq!(
        weft::core_occupancy(0).unwrap_err(),
        RuntimeError::NotInitialized
    );

    // Invalid configuration is rejected before anything starts.
    let err = weft::init(RuntimeConfig::new().num_cores(0)).unwrap_err();
    assert_eq!(err, RuntimeError::InvalidConfig("num_cores must be > 0"));

    weft::init(RuntimeConfig::new().num_cores(2).stack_size(128 * 1024)).unwrap();
    assert_eq!(weft::num_cores().unwrap(), 2);

    // Only one runtime per process.
    let err = weft::init(RuntimeConfig::new().num_cores(1)).unwrap_err();
    assert_eq!(err, RuntimeError::AlreadyInitialized);

    // Calling the cooperative operations from the main thread degrades
    // to OS-level equivalents instead of faulting.
    weft::yield_now();
    weft::dispatch();
    weft::sleep_ns(1_000_000);

    let id = weft::create_on(1, || {
        assert!(weft::is_runtime_thread());
        assert_eq!(weft::current_core(), Some(1));
        assert!(!weft::current_thread_id().is_null());
    });
    assert!(!id.is_null());
    weft::join(id);

    weft::shutdown().unwrap();
    weft::wait_for_termination().unwrap();
}
