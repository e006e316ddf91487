//! Stack memory for user threads.
//!
//! Each core reserves one contiguous mapping of 56 slots at init. A slot
//! is a PROT_NONE guard page followed by a read-write stack, so running
//! off the bottom of a stack faults instead of corrupting the neighbor
//! below it. The mapping is released when the runtime terminates.

use weft_core::constants::MAX_THREADS_PER_CORE;
use weft_core::error::{RuntimeError, RuntimeResult};

pub(crate) const PAGE_SIZE: usize = 4096;

/// The stacks for one core's contexts.
pub struct StackPool {
    base: *mut u8,
    slot_size: usize,
    stack_size: usize,
    total_size: usize,
}

// Safety: the pool only hands out raw addresses; the contexts that use
// them serialize access through the dispatcher.
unsafe impl Send for StackPool {}
unsafe impl Sync for StackPool {}

impl StackPool {
    /// Reserve and protect stacks for one core.
    ///
    /// `stack_size` must be a multiple of the page size (validated by
    /// the runtime configuration).
    pub fn new(stack_size: usize) -> RuntimeResult<Self> {
        let slot_size = PAGE_SIZE + stack_size;
        let total_size = slot_size * MAX_THREADS_PER_CORE;

        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                total_size,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(RuntimeError::StackAllocation);
        }
        let base = base as *mut u8;

        // Open up each stack area; the guard page below it stays
        // PROT_NONE from the initial reservation.
        for index in 0..MAX_THREADS_PER_CORE {
            let stack_low = unsafe { base.add(index * slot_size + PAGE_SIZE) };
            let ret = unsafe {
                libc::mprotect(
                    stack_low as *mut libc::c_void,
                    stack_size,
                    libc::PROT_READ | libc::PROT_WRITE,
                )
            };
            if ret != 0 {
                unsafe { libc::munmap(base as *mut libc::c_void, total_size) };
                return Err(RuntimeError::StackAllocation);
            }
        }

        Ok(Self {
            base,
            slot_size,
            stack_size,
            total_size,
        })
    }

    /// Lowest writable address of slot `index`'s stack.
    pub fn stack_base(&self, index: usize) -> *mut u8 {
        debug_assert!(index < MAX_THREADS_PER_CORE);
        unsafe { self.base.add(index * self.slot_size + PAGE_SIZE) }
    }

    /// One past the highest usable address of slot `index`'s stack.
    /// Page-aligned, hence 16-aligned for the context bootstrap.
    pub fn stack_top(&self, index: usize) -> *mut u8 {
        unsafe { self.stack_base(index).add(self.stack_size) }
    }

    /// Unmap the whole pool.
    ///
    /// # Safety
    ///
    /// No context belonging to this core may run, or be switched to,
    /// after this call.
    pub unsafe fn release(&self) {
        libc::munmap(self.base as *mut libc::c_void, self.total_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_writable_and_disjoint() {
        let pool = StackPool::new(64 * 1024).unwrap();

        for index in [0usize, 1, MAX_THREADS_PER_CORE - 1] {
            let base = pool.stack_base(index);
            let top = pool.stack_top(index);
            assert_eq!(top as usize - base as usize, 64 * 1024);
            assert_eq!(top as usize % 16, 0);

            unsafe {
                base.write(0xAB);
                top.sub(1).write(0xCD);
                assert_eq!(base.read(), 0xAB);
                assert_eq!(top.sub(1).read(), 0xCD);
            }
        }

        // Slots ascend and never overlap: a full stack ends below the
        // next slot's guard page.
        let gap = pool.stack_base(1) as usize - pool.stack_base(0) as usize;
        assert_eq!(gap, 64 * 1024 + PAGE_SIZE);

        unsafe { pool.release() };
    }
}
