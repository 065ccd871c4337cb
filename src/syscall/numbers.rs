//! # Syscall Numbers Registry
//!
//! Numeração densa, índice direto na tabela de despacho. O userspace usa os
//! mesmos valores; nunca renumerar.
//!
//! | Nº | Syscall           | Argumentos |
//! |----|-------------------|------------|
//! | 0  | exit              | code |
//! | 1  | write             | fd, size, buf |
//! | 2  | read              | fd, size, buf |
//! | 3  | open              | path, mode |
//! | 4  | malloc            | size |
//! | 5  | free              | ptr |
//! | 6  | listdir           | path, buf, buf_size, count_ptr |
//! | 7  | load              | path, desc_ptr, flags |
//! | 8  | destroy_process   | desc_ptr |
//! | 9  | create_task       | desc_ptr |
//! | 10 | get_state         | id, ret_ptr |
//! | 11 | get_display_info  | info_ptr |
//! | 12 | request_buffer    | width, height |
//! | 13 | buffer_ready      | x, y |
//! | 14 | close             | fd |

pub const SYS_EXIT: usize = 0;
pub const SYS_WRITE: usize = 1;
pub const SYS_READ: usize = 2;
pub const SYS_OPEN: usize = 3;
pub const SYS_MALLOC: usize = 4;
pub const SYS_FREE: usize = 5;
pub const SYS_LISTDIR: usize = 6;
pub const SYS_LOAD: usize = 7;
pub const SYS_DESTROY_PROCESS: usize = 8;
pub const SYS_CREATE_TASK: usize = 9;
pub const SYS_GET_STATE: usize = 10;
pub const SYS_GET_DISPLAY_INFO: usize = 11;
pub const SYS_REQUEST_BUFFER: usize = 12;
pub const SYS_BUFFER_READY: usize = 13;
pub const SYS_CLOSE: usize = 14;

/// Tamanho da tabela de despacho.
pub const SYSCALL_COUNT: usize = 15;

/// Bit de `load` que concede permissão de buffer de display.
pub const LOAD_ALLOW_BUFFER: u32 = 0x1;
