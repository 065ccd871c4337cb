//! Identificador estável de task.
//!
//! Índice do slot na tabela + geração. A geração avança sempre que o slot é
//! liberado, então um id guardado depois da coleta da task nunca aponta
//! para outra task que reaproveitou o slot.

use crate::sys::types::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    slot: u16,
    generation: u16,
}

impl TaskId {
    /// A idle é sempre o slot 0, geração 0.
    pub const IDLE: TaskId = TaskId::new(0, 0);

    /// Gerações usam 15 bits: o bit 31 da palavra fica livre para erros.
    pub const GENERATION_MASK: u16 = 0x7FFF;

    pub const fn new(slot: u16, generation: u16) -> Self {
        Self { slot, generation }
    }

    pub const fn slot(self) -> usize {
        self.slot as usize
    }

    pub const fn generation(self) -> u16 {
        self.generation
    }

    /// Geração seguinte de um slot da tabela, dando a volta em 15 bits.
    pub const fn next_generation(generation: u16) -> u16 {
        generation.wrapping_add(1) & Self::GENERATION_MASK
    }

    /// Formato usado no ABI de syscall: `generation << 16 | slot`.
    pub const fn as_word(self) -> Word {
        ((self.generation as Word) << 16) | self.slot as Word
    }

    pub const fn from_word(word: Word) -> Self {
        Self {
            slot: (word & 0xFFFF) as u16,
            generation: (word >> 16) as u16,
        }
    }
}
