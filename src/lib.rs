//! Radiant Kernel Library.
//!
//! Núcleo de processos do Radiant OS: tabela de tasks, scheduler round-robin,
//! dispatch de traps e a interface de syscalls. Hardware, VMM, filesystem e
//! compositor entram como colaboradores (traits em `arch`, `mm`, `fs` e
//! `drivers::display`).
//!
//! Nos testes o crate compila com `std` e o backend `arch::hosted`.

#![cfg_attr(not(test), no_std)]

// Vec/Box/String das tabelas e dos buffers de syscall
extern crate alloc;

// --- Baixo nível (hardware) ---
pub mod arch; // HAL (CPU, PIC, TSS, IDT)
pub mod drivers; // Serial, Display

// --- Núcleo ---
pub mod core; // Logging
pub mod kernel; // Estado global + entrada de trap
pub mod klib; // Bitmap, alinhamento
pub mod mm; // Layout de slots, paginação, heap de task
pub mod sync; // Spinlock, SpinFlag, InterruptGuard
pub mod sys; // Tipos de sistema

// --- Subsistemas ---
pub mod fs; // VFS
pub mod sched; // Tasks e Scheduler
pub mod syscall; // Interface com Userspace
pub mod trap; // Dispatch de traps

#[cfg(test)]
mod testing;

pub use crate::kernel::{Kernel, KernelCell, Machine};
pub use crate::trap::{Fatal, TrapFrame};
