//! Primitivas de sincronização.
//!
//! Single-CPU: exclusão mútua é "interrupções mascaradas". O `Spinlock`
//! mascara IF enquanto o guard vive, `InterruptGuard` faz o mesmo sem
//! dados, e `SpinFlag` é a flag test-and-set dos arquivos abertos.

pub mod critical;
pub mod flag;
pub mod spinlock;

pub use critical::InterruptGuard;
pub use flag::{SpinFlag, SpinFlagGuard};
pub use spinlock::{Spinlock, SpinlockGuard};
