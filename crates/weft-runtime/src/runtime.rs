//! Runtime lifecycle: per-core state, kernel threads, init and shutdown.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use std::sync::{Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use weft_core::constants::MAX_THREADS_PER_CORE;
use weft_core::error::{RuntimeError, RuntimeResult};
use weft_core::{kdebug, kinfo, kwarn, OccupancyWord};

use crate::arch;
use crate::config::RuntimeConfig;
use crate::context::ThreadContext;
use crate::cycles;
use crate::stack::StackPool;
use crate::tls;

/// Everything one core owns: occupancy word, context array, stack pool,
/// and the spot where its kernel thread's own stack pointer parks while
/// the core runs user contexts.
pub(crate) struct CoreState {
    pub(crate) occupancy: OccupancyWord,
    pub(crate) contexts: Box<[ThreadContext]>,
    pub(crate) stacks: StackPool,
    /// The dispatcher swaps back through this pointer at shutdown.
    pub(crate) kernel_sp: UnsafeCell<*mut u8>,
}

// Safety: kernel_sp is written only by this core's own kernel thread and
// the dispatcher running on it; everything else is atomic or immutable.
unsafe impl Send for CoreState {}
unsafe impl Sync for CoreState {}

impl CoreState {
    fn new(stack_size: usize) -> RuntimeResult<Self> {
        let stacks = StackPool::new(stack_size)?;
        let mut contexts = Vec::with_capacity(MAX_THREADS_PER_CORE);
        for index in 0..MAX_THREADS_PER_CORE {
            let sp = unsafe { arch::prepare_stack(stacks.stack_top(index), index) };
            contexts.push(ThreadContext::new(index as u8, stacks.stack_base(index), sp));
        }
        Ok(Self {
            occupancy: OccupancyWord::new(),
            contexts: contexts.into_boxed_slice(),
            stacks,
            kernel_sp: UnsafeCell::new(std::ptr::null_mut()),
        })
    }
}

pub(crate) struct Runtime {
    pub(crate) cores: Box<[CoreState]>,
    config: RuntimeConfig,
    shutdown_requested: AtomicBool,
    started: AtomicUsize,
    handles: Mutex<Vec<JoinHandle<()>>>,
    terminated: AtomicBool,
}

// One runtime per process; init after shutdown is not supported.
static RUNTIME: OnceLock<Runtime> = OnceLock::new();

pub(crate) fn get() -> RuntimeResult<&'static Runtime> {
    RUNTIME.get().ok_or(RuntimeError::NotInitialized)
}

/// Per-core state. Only reachable from paths that postdate `init`:
/// kernel threads and identifiers handed out by creation.
pub(crate) fn core_state(core_id: usize) -> &'static CoreState {
    let rt = RUNTIME.get().expect("weft runtime not initialized");
    &rt.cores[core_id]
}

pub(crate) fn shutdown_requested() -> bool {
    match RUNTIME.get() {
        Some(rt) => rt.shutdown_requested.load(Ordering::Acquire),
        None => false,
    }
}

/// Number of active cores.
pub fn num_cores() -> RuntimeResult<usize> {
    Ok(get()?.cores.len())
}

/// Live threads on `core_id` right now.
pub fn core_occupancy(core_id: usize) -> RuntimeResult<u8> {
    Ok(get()?.cores[core_id].occupancy.num_occupied())
}

/// Core the calling thread runs on, `None` off the runtime.
pub fn current_core() -> Option<usize> {
    match tls::kernel_thread_id() {
        tls::NOT_A_CORE => None,
        id => Some(id),
    }
}

/// Start the runtime: allocate every core's contexts and stacks, spawn
/// one kernel thread per core, and return once every core is scanning
/// for work.
pub fn init(config: RuntimeConfig) -> RuntimeResult<()> {
    config.validate()?;
    weft_core::klog::init();
    cycles::init();

    let mut cores = Vec::with_capacity(config.num_cores);
    for _ in 0..config.num_cores {
        cores.push(CoreState::new(config.stack_size)?);
    }

    let runtime = Runtime {
        cores: cores.into_boxed_slice(),
        config: config.clone(),
        shutdown_requested: AtomicBool::new(false),
        started: AtomicUsize::new(0),
        handles: Mutex::new(Vec::new()),
        terminated: AtomicBool::new(false),
    };
    RUNTIME
        .set(runtime)
        .map_err(|_| RuntimeError::AlreadyInitialized)?;
    let rt = get()?;

    {
        let mut handles = rt.handles.lock().unwrap();
        for core_id in 0..rt.cores.len() {
            let handle = thread::Builder::new()
                .name(format!("weft-core-{}", core_id))
                .spawn(move || kernel_thread_main(core_id))
                .map_err(|_| RuntimeError::SpawnFailed)?;
            handles.push(handle);
        }
    }

    while rt.started.load(Ordering::Acquire) < rt.cores.len() {
        thread::yield_now();
    }

    kinfo!(
        "weft: {} core(s) online, {} KiB stacks",
        rt.cores.len(),
        config.stack_size / 1024
    );
    Ok(())
}

/// Ask every dispatcher to exit once its runqueue drains. Returns
/// immediately; pair with [`wait_for_termination`].
pub fn shutdown() -> RuntimeResult<()> {
    get()?.shutdown_requested.store(true, Ordering::Release);
    Ok(())
}

/// Block the calling OS thread until every core has stopped, then
/// release stack memory.
pub fn wait_for_termination() -> RuntimeResult<()> {
    let rt = get()?;
    let handles: Vec<JoinHandle<()>> = {
        let mut guard = rt.handles.lock().unwrap();
        guard.drain(..).collect()
    };
    for handle in handles {
        let _ = handle.join();
    }
    if !rt.terminated.swap(true, Ordering::AcqRel) {
        for core in rt.cores.iter() {
            // Safety: every kernel thread has exited; no context can be
            // switched to anymore.
            unsafe { core.stacks.release() };
        }
        kinfo!("weft: terminated");
    }
    Ok(())
}

/// Body of one core's kernel thread. Pins itself, then hands its stack
/// over to the dispatch cycle; the swap returns only at shutdown.
fn kernel_thread_main(core_id: usize) {
    tls::set_kernel_thread_id(core_id);
    let rt = RUNTIME.get().expect("weft runtime not initialized");

    if rt.config.pin_cores {
        if let Err(err) = pin_to_core(core_id) {
            kwarn!("weft: core {}: {} (continuing unpinned)", core_id, err);
        }
    }

    let core = &rt.cores[core_id];
    rt.started.fetch_add(1, Ordering::AcqRel);
    kdebug!("weft: core {} dispatching", core_id);

    // Swap onto context 0's fresh stack. Its trampoline enters the
    // dispatcher, which parks the context until work arrives; the core
    // then cycles between contexts until shutdown swaps back here.
    tls::set_loaded_context(&core.contexts[0]);
    unsafe { arch::swap_context(core.kernel_sp.get(), core.contexts[0].sp.get()) };

    tls::clear_loaded_context();
    kdebug!("weft: core {} stopped", core_id);
}

#[cfg(target_os = "linux")]
fn pin_to_core(core_id: usize) -> RuntimeResult<()> {
    let cpus = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let cpu = core_id % cpus;
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(cpu, &mut set);
        let ret = libc::pthread_setaffinity_np(
            libc::pthread_self(),
            std::mem::size_of::<libc::cpu_set_t>(),
            &set,
        );
        if ret != 0 {
            return Err(RuntimeError::Affinity);
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn pin_to_core(_core_id: usize) -> RuntimeResult<()> {
    // No portable affinity call here; the scheduler still works, just
    // without the cache locality pinning buys.
    Err(RuntimeError::Affinity)
}
