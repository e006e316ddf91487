//! aarch64 context switching.
//!
//! TODO: port the stack-frame save/restore to AAPCS64 (x19-x28, fp, lr,
//! d8-d15) and size the register frame accordingly.

/// Switch stacks.
///
/// # Safety
///
/// See the x86_64 implementation for the contract.
pub unsafe extern "C" fn swap_context(_save_into: *mut *mut u8, _load_from: *const *mut u8) {
    todo!("aarch64 swap_context not yet implemented")
}

/// Seed a fresh stack for the thread trampoline.
///
/// # Safety
///
/// See the x86_64 implementation for the contract.
pub unsafe fn prepare_stack(_stack_top: *mut u8, _id_in_core: usize) -> *mut u8 {
    todo!("aarch64 prepare_stack not yet implemented")
}
