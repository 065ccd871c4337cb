//! Constantes de configuração do Scheduler

use crate::sys::types::Word;

/// Capacidade da tabela de tasks (idle incluída)
pub const MAX_TASKS: usize = 64;

/// Tamanho da stack de kernel privada de cada task (em bytes)
pub const KERNEL_STACK_SIZE: usize = 4096;

/// Frequência do PIT; um tick por milissegundo
pub const TIMER_HZ: u32 = 1000;

/// Seletor de código de ring 0 na GDT
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

/// Seletor de dados de ring 0
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;

/// Seletor de código de ring 3 (RPL 3)
pub const USER_CODE_SELECTOR: u16 = 0x1B;

/// Seletor de dados de ring 3 (RPL 3)
pub const USER_DATA_SELECTOR: u16 = 0x23;

/// EFLAGS inicial: IF ligado + bit reservado 1
pub const INITIAL_EFLAGS: Word = 0x202;

/// Distância do topo do slot até o stack pointer inicial de usuário
pub const USER_STACK_TOP_GAP: Word = 16;

/// Converte milissegundos em ticks do timer.
#[inline]
pub const fn ms_to_ticks(ms: u32) -> u32 {
    ((ms as u64 * TIMER_HZ as u64) / 1000) as u32
}
