//! # Syscall Dispatcher
//!
//! Table-based dispatcher para O(1) dispatch.

pub mod table;

pub use table::{SyscallHandler, SyscallTable};

use super::abi::SyscallArgs;
use super::error::{result_to_word, SysError, SysResult};
use super::numbers::SYS_EXIT;
use crate::kernel::{Kernel, Machine};
use crate::sys::types::Word;
use crate::trap::{Fatal, TrapFrame, SYSCALL_VECTOR};

/// Registra o gate de syscall.
pub(crate) fn install<M: Machine>(kernel: &mut Kernel<M>) {
    kernel.register_interrupt_handler(SYSCALL_VECTOR, syscall_trap::<M>);
}

/// Handler do vetor 0x7F.
///
/// O resultado vai para EAX, menos no `exit` bem-sucedido: a task não volta
/// e o frame é trocado pelo reescalonamento ao fim do trap.
fn syscall_trap<M: Machine>(kernel: &mut Kernel<M>, frame: &mut TrapFrame) -> Result<(), Fatal> {
    let args = SyscallArgs::from_frame(frame);
    crate::ktrace!("[SYSCALL] num=", args.num);

    let result = dispatch(kernel, &args);
    if args.num == SYS_EXIT && result.is_ok() {
        return Ok(());
    }
    if let Err(e) = result {
        crate::ktrace!("[SYSCALL] Handler retornou erro ", e as u32);
    }
    frame.eax = result_to_word(result);
    Ok(())
}

/// Dispatch via tabela
pub fn dispatch<M: Machine>(kernel: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    let handler = kernel.syscalls.get(args.num);
    match handler {
        Some(handler) => handler(kernel, args),
        None => {
            crate::ktrace!("[SYSCALL] num fora do range");
            Err(SysError::InvalidArgument)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
