//! Traits da HAL consumidos pelo núcleo.

pub mod cpu;
pub mod platform;

pub use cpu::CpuOps;
pub use platform::{InterruptController, PrivilegedStack};
