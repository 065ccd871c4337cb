//! Sistema de Syscalls do Radiant
//!
//! Gate `int 0x7F` (DPL 3). Número em EAX, até cinco argumentos em EBX, ECX,
//! EDX, ESI e EDI, resultado em EAX. Erros voltam como o negativo do código
//! (`SysError::as_word`).
//!
//! # Módulos
//!
//! - `abi`: extração dos argumentos do trap frame
//! - `error`: códigos de erro (SysError)
//! - `numbers`: constantes das syscalls
//! - `dispatch`: tabela + dispatcher
//! - `uaccess`: validação e cópia de ponteiros de usuário
//! - `process`: exit, load, destroy_process, create_task, get_state
//! - `memory`: malloc, free
//! - `fs`: write, read, open, close, listdir
//! - `display`: get_display_info, request_buffer, buffer_ready

pub mod abi;
pub mod dispatch;
pub mod error;
pub mod numbers;
pub mod uaccess;

// Módulos de implementação
pub mod display;
pub mod fs;
pub mod memory;
pub mod process;

// Re-exports principais
pub use abi::SyscallArgs;
pub use error::{SysError, SysResult};
