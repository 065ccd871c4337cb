//! # Syscall Table
//!
//! Handlers indexados por número de syscall. Genérica na máquina, então é
//! montada junto com o `Kernel` em vez de ser estática.

use super::super::abi::SyscallArgs;
use super::super::error::SysResult;
use super::super::numbers::*;
use super::super::{display, fs, memory, process};
use crate::kernel::{Kernel, Machine};
use crate::sys::types::Word;

/// Tipo de handler de syscall
pub type SyscallHandler<M> = fn(&mut Kernel<M>, &SyscallArgs) -> SysResult<Word>;

pub struct SyscallTable<M> {
    handlers: [Option<SyscallHandler<M>>; SYSCALL_COUNT],
}

impl<M: Machine> SyscallTable<M> {
    /// Tabela com todos os handlers. None = syscall não implementada.
    pub fn new() -> Self {
        let mut table: [Option<SyscallHandler<M>>; SYSCALL_COUNT] = [None; SYSCALL_COUNT];

        // === PROCESSO ===
        table[SYS_EXIT] = Some(process::sys_exit_wrapper::<M>);
        table[SYS_LOAD] = Some(process::sys_load_wrapper::<M>);
        table[SYS_DESTROY_PROCESS] = Some(process::sys_destroy_process_wrapper::<M>);
        table[SYS_CREATE_TASK] = Some(process::sys_create_task_wrapper::<M>);
        table[SYS_GET_STATE] = Some(process::sys_get_state_wrapper::<M>);

        // === MEMÓRIA ===
        table[SYS_MALLOC] = Some(memory::sys_malloc_wrapper::<M>);
        table[SYS_FREE] = Some(memory::sys_free_wrapper::<M>);

        // === FILESYSTEM / DISPOSITIVOS ===
        table[SYS_WRITE] = Some(fs::sys_write_wrapper::<M>);
        table[SYS_READ] = Some(fs::sys_read_wrapper::<M>);
        table[SYS_OPEN] = Some(fs::sys_open_wrapper::<M>);
        table[SYS_CLOSE] = Some(fs::sys_close_wrapper::<M>);
        table[SYS_LISTDIR] = Some(fs::sys_listdir_wrapper::<M>);

        // === DISPLAY ===
        table[SYS_GET_DISPLAY_INFO] = Some(display::sys_get_display_info_wrapper::<M>);
        table[SYS_REQUEST_BUFFER] = Some(display::sys_request_buffer_wrapper::<M>);
        table[SYS_BUFFER_READY] = Some(display::sys_buffer_ready_wrapper::<M>);

        Self { handlers: table }
    }

    pub fn get(&self, num: usize) -> Option<SyscallHandler<M>> {
        self.handlers.get(num).copied().flatten()
    }
}

impl<M: Machine> Default for SyscallTable<M> {
    fn default() -> Self {
        Self::new()
    }
}
