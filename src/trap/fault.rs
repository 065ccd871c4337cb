//! Handlers de falha de CPU.
//!
//! Falha vinda de ring 3 mata só a task corrente (`SegmentationFault`); em
//! ring 0 não há recuperação.

use super::{
    Fatal, TrapFrame, GENERAL_PROTECTION_VECTOR, INVALID_OPCODE_VECTOR, PAGE_FAULT_VECTOR,
};
use crate::kernel::{Kernel, Machine};
use crate::sched::task::KillReason;

pub(crate) fn install<M: Machine>(kernel: &mut Kernel<M>) {
    kernel.register_interrupt_handler(INVALID_OPCODE_VECTOR, cpu_fault::<M>);
    kernel.register_interrupt_handler(GENERAL_PROTECTION_VECTOR, cpu_fault::<M>);
    kernel.register_interrupt_handler(PAGE_FAULT_VECTOR, cpu_fault::<M>);
}

fn cpu_fault<M: Machine>(kernel: &mut Kernel<M>, frame: &mut TrapFrame) -> Result<(), Fatal> {
    let vector = frame.vector();
    match kernel.current_task() {
        Some(task) if frame.from_user_mode() => {
            crate::kwarn!("(Fault) Falha em ring 3, vetor=", vector);
            crate::kwarn!("(Fault) eip=", frame.eip);
            if kernel.kill_task(task, KillReason::SegmentationFault).is_err() {
                crate::kerror!("(Fault) Task corrente sumiu da tabela, id=", task.as_word());
            }
            Ok(())
        }
        _ => Err(Fatal::KernelFault {
            vector,
            eip: frame.eip,
            error: frame.err_code,
        }),
    }
}
