//! # Hardware Abstraction Layer (HAL)
//!
//! Única ponte entre o núcleo de processos e o hardware.
//!
//! - `traits/` define o que o núcleo consome (CPU, PIC, TSS).
//! - `x86/` é o backend real (i386, protected mode).
//! - `hosted` é o backend de host: flag de interrupção em software,
//!   usado pelos testes unitários e por alvos que não são i386.
//!
//! O resto do kernel importa apenas `crate::arch::Cpu` e os traits.

pub mod traits;

#[cfg(all(target_arch = "x86", not(test)))]
pub mod x86;

#[cfg(all(target_arch = "x86", not(test)))]
pub use x86 as platform;

#[cfg(not(all(target_arch = "x86", not(test))))]
pub mod hosted;

#[cfg(not(all(target_arch = "x86", not(test))))]
pub use hosted as platform;

pub use platform::Cpu;
pub use traits::*;
