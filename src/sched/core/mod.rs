//! Núcleo do scheduler: seleção round-robin, tick do timer, sleep e idle.

pub mod idle;
pub mod scheduler;

pub use scheduler::{ScheduleReason, SleepAction};

use crate::kernel::{Kernel, Machine};
use crate::trap::{TIMER_VECTOR, YIELD_VECTOR};

/// Registra o timer (IRQ0) e o vetor de yield.
pub(crate) fn install<M: Machine>(kernel: &mut Kernel<M>) {
    kernel.register_interrupt_handler(TIMER_VECTOR, scheduler::timer_interrupt::<M>);
    kernel.register_interrupt_handler(YIELD_VECTOR, scheduler::yield_trap::<M>);
}
