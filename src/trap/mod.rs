//! # Trap Dispatch
//!
//! Todo trap (exceção, IRQ, syscall, yield) chega como um `TrapFrame` e é
//! entregue ao handler registrado para o vetor. Ver `table.rs`.

pub mod fault;
pub mod frame;
pub mod table;

pub use frame::TrapFrame;
pub use table::{TrapHandler, TrapTable};

use crate::sched::task::TaskId;
use crate::sys::types::Word;

/// Exceções da CPU ocupam os vetores 0..32.
pub const EXCEPTION_COUNT: u8 = 32;

/// Primeiro vetor das IRQs remapeadas do PIC.
pub const IRQ_BASE: u8 = 32;

/// Linhas de IRQ (mestre + escravo).
pub const IRQ_COUNT: u8 = 16;

/// Primeira linha servida pelo PIC escravo.
pub const PIC_SLAVE_FIRST_LINE: u8 = 8;

/// IRQ0, o PIT.
pub const TIMER_VECTOR: u8 = IRQ_BASE;

/// Gate de syscall (`int 0x7F`), DPL 3.
pub const SYSCALL_VECTOR: u8 = 0x7F;

/// Yield por software: reescalona sem contar tick e sem EOI.
pub const YIELD_VECTOR: u8 = 0x81;

pub const INVALID_OPCODE_VECTOR: u8 = 6;
pub const GENERAL_PROTECTION_VECTOR: u8 = 13;
pub const PAGE_FAULT_VECTOR: u8 = 14;

/// Erro fatal do kernel. Volta até o stub de entrada, que loga e para a
/// máquina.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    /// Exceção da CPU sem handler registrado
    UnhandledException { vector: u8, eip: Word, error: Word },
    /// Falha de CPU em ring 0
    KernelFault { vector: u8, eip: Word, error: Word },
    /// Stack pointer salvo fora da stack de kernel da task
    KernelStackOverflow { task: TaskId, esp: Word },
    /// Asserção falhou sem contexto de task
    AssertFailed(&'static str),
    /// Trap chegou com o núcleo já travado
    Reentry { vector: u8, eip: Word },
}

impl Fatal {
    pub fn report(&self) {
        match *self {
            Fatal::UnhandledException { vector, eip, .. } => {
                crate::kerror!("(Trap) Exceção sem handler, vetor=", vector);
                crate::kerror!("(Trap) eip=", eip);
            }
            Fatal::KernelFault { vector, eip, error } => {
                crate::kerror!("(Trap) Falha em ring 0, vetor=", vector);
                crate::kerror!("(Trap) eip=", eip);
                crate::kerror!("(Trap) erro=", error);
            }
            Fatal::KernelStackOverflow { task, esp } => {
                crate::kerror!("(Sched) Stack de kernel estourada, task=", task.as_word());
                crate::kerror!("(Sched) esp=", esp);
            }
            Fatal::AssertFailed(msg) => {
                crate::kerror!("(Kernel) Asserção falhou fora de task:");
                crate::kerror!(msg);
            }
            Fatal::Reentry { vector, eip } => {
                crate::kerror!("(Trap) Trap reentrante com o núcleo travado, vetor=", vector);
                crate::kerror!("(Trap) eip=", eip);
            }
        }
    }
}
