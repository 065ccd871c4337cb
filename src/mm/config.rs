//! # Layout de memória do userspace
//!
//! A região reservada para binários é fatiada em slots de tamanho fixo, um
//! por processo. Dentro de cada slot:
//!
//! ```text
//! base                                             base + SLOT_SIZE
//! | binário | heap ... | [buffer] | guard | stack (128 KiB) |
//! ```

use crate::sys::types::Word;

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: Word = 0x1000;

/// Início da região de binários de usuário
pub const USER_REGION_BASE: Word = 0x4000_0000;

/// Fim (exclusivo) da região de binários de usuário
pub const USER_REGION_END: Word = 0x8000_0000;

/// Tamanho de um slot de processo (8 MiB)
pub const SLOT_SIZE: Word = 0x0080_0000;

/// Número de slots rastreados pelo bitmap
pub const MAX_PROCESS_SLOTS: usize = 128;

/// Palavras de 64 bits no bitmap de slots
pub const SLOT_BITMAP_WORDS: usize = MAX_PROCESS_SLOTS.div_ceil(64);

/// Stack de usuário no topo do slot (128 KiB)
pub const USER_STACK_SIZE: Word = 0x0002_0000;

/// Framebuffer linear mapeado para o userspace
pub const LFB_VADDR: Word = 0xD000_0000;

/// Tamanho máximo do framebuffer (2 MiB)
pub const LFB_SIZE: Word = 0x0020_0000;

/// Maior binário que cabe num slot (sem invadir guard page e stack)
pub const MAX_BINARY_SIZE: Word = SLOT_SIZE - USER_STACK_SIZE - PAGE_SIZE;

const _: () = assert!(
    (USER_REGION_END - USER_REGION_BASE) / SLOT_SIZE >= MAX_PROCESS_SLOTS as Word
);

/// Endereço base de um slot.
#[inline]
pub const fn slot_base(slot: usize) -> Word {
    USER_REGION_BASE + slot as Word * SLOT_SIZE
}

/// Fim (exclusivo) de um slot.
#[inline]
pub const fn slot_end(slot: usize) -> Word {
    slot_base(slot) + SLOT_SIZE
}

/// Página de guarda logo abaixo da stack de usuário.
#[inline]
pub const fn guard_page(slot: usize) -> Word {
    slot_end(slot) - USER_STACK_SIZE - PAGE_SIZE
}

/// Slot que contém `addr`, se estiver na região de usuário.
#[inline]
pub const fn slot_of(addr: Word) -> Option<usize> {
    if addr < USER_REGION_BASE || addr >= USER_REGION_END {
        return None;
    }
    let slot = ((addr - USER_REGION_BASE) / SLOT_SIZE) as usize;
    if slot < MAX_PROCESS_SLOTS {
        Some(slot)
    } else {
        None
    }
}
