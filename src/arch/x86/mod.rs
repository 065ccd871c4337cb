//! Backend i386 (protected mode, single-CPU).

pub mod cpu;
pub mod entry;
pub mod idt;
pub mod pic;
pub mod port;
pub mod tss;

pub use cpu::Cpu;
pub use pic::Pic8259;
pub use tss::TssStack;
