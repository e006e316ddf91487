//! x86_64 context switch.
//!
//! Callee-saved registers travel on the stacks themselves: `swap_context`
//! pushes rbx/rbp/r12-r15 (48 bytes, `SPACE_FOR_SAVED_REGISTERS`) onto
//! the outgoing stack, parks the stack pointer through `save_into`, then
//! unwinds the same frame from the incoming stack and returns on it.

use std::arch::naked_asm;

use weft_core::constants::SPACE_FOR_SAVED_REGISTERS;

use crate::dispatcher;

/// Switch stacks: save the current register state onto the running stack
/// and store rsp into `*save_into`, then load rsp from `*load_from` and
/// restore. Returns when some later switch resumes the saved state.
///
/// # Safety
///
/// `save_into` must be writable; `*load_from` must be a stack pointer
/// previously produced by this function or by [`prepare_stack`].
#[unsafe(naked)]
pub unsafe extern "C" fn swap_context(_save_into: *mut *mut u8, _load_from: *const *mut u8) {
    naked_asm!(
        "push r15",
        "push r14",
        "push r13",
        "push r12",
        "push rbp",
        "push rbx",
        "mov [rdi], rsp",
        "mov rsp, [rsi]",
        "pop rbx",
        "pop rbp",
        "pop r12",
        "pop r13",
        "pop r14",
        "pop r15",
        "ret",
    );
}

/// First code a fresh context executes. `prepare_stack` parked the slot
/// index in the r12 save slot; hand it on and enter the per-context main
/// loop, which never returns.
#[unsafe(naked)]
unsafe extern "C" fn thread_trampoline() {
    naked_asm!(
        "mov rdi, r12",
        "call {main}",
        "ud2",
        main = sym trampoline_main,
    );
}

extern "C" fn trampoline_main(id_in_core: usize) -> ! {
    dispatcher::thread_main(id_in_core)
}

/// Seed a fresh stack: the trampoline's address sits where `ret` will
/// find it, above a zeroed register frame whose r12 slot carries
/// `id_in_core`. Returns the stack pointer to store in the context.
///
/// # Safety
///
/// `stack_top` must be the highest address of a writable region with at
/// least `SPACE_FOR_SAVED_REGISTERS + 16` bytes below it.
pub unsafe fn prepare_stack(stack_top: *mut u8, id_in_core: usize) -> *mut u8 {
    // The trampoline must see rsp 16-aligned so calls out of it follow
    // the System V stack discipline.
    let top = (stack_top as usize) & !0xF;

    let ret_slot = top - 8;
    (ret_slot as *mut u64).write(thread_trampoline as usize as u64);

    let sp = ret_slot - SPACE_FOR_SAVED_REGISTERS;
    core::ptr::write_bytes(sp as *mut u8, 0, SPACE_FOR_SAVED_REGISTERS);

    // Third slot popped by swap_context is r12.
    ((sp + 16) as *mut u64).write(id_in_core as u64);

    sp as *mut u8
}
