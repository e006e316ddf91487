//! Architecture-specific context switching.
//!
//! `swap_context` parks the caller's callee-saved registers on its own
//! stack and resumes whatever the target stack last parked;
//! `prepare_stack` seeds a fresh stack so its first resume enters the
//! thread trampoline.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub mod x86_64;
        pub use x86_64::{prepare_stack, swap_context};
    } else if #[cfg(target_arch = "aarch64")] {
        pub mod aarch64;
        pub use aarch64::{prepare_stack, swap_context};
    } else {
        compile_error!("weft has no context switch for this architecture");
    }
}
