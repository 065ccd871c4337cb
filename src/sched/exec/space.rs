//! Slots de processo.
//!
//! Cada processo ocupa um slot de 8 MiB da região de usuário. O kernel guarda
//! o descritor autoritativo (`SlotRegistry`); o userspace só recebe cópias
//! (`AddressSpaceDescriptor`) e se refere ao slot pelo índice.

use bitflags::bitflags;

use crate::klib::{align_up, Bitmap};
use crate::mm::config::{
    guard_page, slot_base, slot_end, MAX_PROCESS_SLOTS, PAGE_SIZE, SLOT_BITMAP_WORDS,
    USER_STACK_SIZE,
};
use crate::sched::config::USER_STACK_TOP_GAP;
use crate::sched::task::TaskId;
use crate::sys::types::Word;

bitflags! {
    /// Permissão/estado do buffer de display.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufferFlags: u8 {
        /// Pode pedir um buffer
        const ALLOWED = 0b01;
        /// Já pediu
        const REQUESTED = 0b10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAddressSpace {
    slot: usize,
    binary_size: Word,
    pub buffer: BufferFlags,
    pub buffer_start: Word,
}

impl ProcessAddressSpace {
    pub fn new(slot: usize, binary_size: Word, buffer: BufferFlags) -> Self {
        Self {
            slot,
            binary_size,
            buffer,
            buffer_start: 0,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn binary_size(&self) -> Word {
        self.binary_size
    }

    pub fn base(&self) -> Word {
        slot_base(self.slot)
    }

    pub fn end(&self) -> Word {
        slot_end(self.slot)
    }

    /// O binário é carregado na base do slot e começa ali.
    pub fn entry(&self) -> Word {
        self.base()
    }

    /// Primeira página depois do binário.
    pub fn heap_start(&self) -> Word {
        align_up(self.base() + self.binary_size, PAGE_SIZE)
    }

    pub fn guard_page(&self) -> Word {
        guard_page(self.slot)
    }

    pub fn user_stack_bottom(&self) -> Word {
        self.end() - USER_STACK_SIZE
    }

    pub fn user_stack_top(&self) -> Word {
        self.end() - USER_STACK_TOP_GAP
    }

    /// `[addr, addr + len)` cabe inteiro neste slot.
    pub fn contains(&self, addr: Word, len: usize) -> bool {
        let Some(end) = (addr as usize).checked_add(len) else {
            return false;
        };
        addr >= self.base() && end <= self.end() as usize
    }

    pub fn buffer_allowed(&self) -> bool {
        self.buffer.contains(BufferFlags::ALLOWED)
    }

    pub fn buffer_requested(&self) -> bool {
        self.buffer.contains(BufferFlags::REQUESTED)
    }

    pub fn descriptor(&self) -> AddressSpaceDescriptor {
        AddressSpaceDescriptor {
            slot: self.slot as u32,
            binary_size: self.binary_size,
            flags: self.buffer.bits() as u32,
            buffer_start: self.buffer_start,
        }
    }
}

/// Cópia do descritor entregue ao userspace por `load` e devolvida em
/// `create_task`/`destroy_process`. Só o `slot` é confiado na volta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct AddressSpaceDescriptor {
    pub slot: u32,
    pub binary_size: u32,
    pub flags: u32,
    pub buffer_start: u32,
}

impl AddressSpaceDescriptor {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        let words = [self.slot, self.binary_size, self.flags, self.buffer_start];
        for (chunk, w) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&w.to_ne_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let word = |i: usize| {
            let mut w = [0u8; 4];
            w.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            u32::from_ne_bytes(w)
        };
        Self {
            slot: word(0),
            binary_size: word(1),
            flags: word(2),
            buffer_start: word(3),
        }
    }
}

/// Situação de um slot no registro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEntry {
    Free,
    /// Carregado, esperando `create_task`
    Loaded(ProcessAddressSpace),
    /// Entregue a uma task (que agora é dona do descritor)
    Attached(TaskId),
    /// A task dona já foi coletada; o código de retorno fica aqui até o
    /// `destroy_process`
    Exited { task: TaskId, code: Word },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    NotAllocated,
    AlreadyAttached,
}

/// Bitmap de alocação + descritores de todos os slots.
pub struct SlotRegistry {
    bitmap: Bitmap<SLOT_BITMAP_WORDS>,
    entries: [SlotEntry; MAX_PROCESS_SLOTS],
}

impl SlotRegistry {
    pub const fn new() -> Self {
        Self {
            bitmap: Bitmap::new(MAX_PROCESS_SLOTS),
            entries: [SlotEntry::Free; MAX_PROCESS_SLOTS],
        }
    }

    /// Marca o primeiro slot livre como alocado.
    pub fn reserve(&mut self) -> Option<usize> {
        let slot = self.bitmap.find_first_zero()?;
        self.bitmap.set(slot);
        Some(slot)
    }

    pub fn release(&mut self, slot: usize) {
        if slot < MAX_PROCESS_SLOTS {
            self.bitmap.clear(slot);
            self.entries[slot] = SlotEntry::Free;
        }
    }

    pub fn is_allocated(&self, slot: usize) -> bool {
        self.bitmap.test(slot)
    }

    pub fn allocated_count(&self) -> usize {
        self.bitmap.count_ones()
    }

    pub fn entry(&self, slot: usize) -> SlotEntry {
        self.entries.get(slot).copied().unwrap_or(SlotEntry::Free)
    }

    /// Guarda o descritor de um slot já reservado.
    pub fn store(&mut self, space: ProcessAddressSpace) {
        self.entries[space.slot()] = SlotEntry::Loaded(space);
    }

    /// Descritor de um slot carregado e ainda sem task.
    pub fn loaded(&self, slot: usize) -> Result<ProcessAddressSpace, SlotError> {
        if !self.is_allocated(slot) {
            return Err(SlotError::NotAllocated);
        }
        match self.entries[slot] {
            SlotEntry::Loaded(space) => Ok(space),
            SlotEntry::Attached(_) | SlotEntry::Exited { .. } => Err(SlotError::AlreadyAttached),
            SlotEntry::Free => Err(SlotError::NotAllocated),
        }
    }

    pub fn attach(&mut self, slot: usize, task: TaskId) {
        self.entries[slot] = SlotEntry::Attached(task);
    }

    /// Registra a saída de `task` no slot dela, se ela ainda for a dona.
    pub fn mark_exited(&mut self, slot: usize, task: TaskId, code: Word) {
        if let Some(entry) = self.entries.get_mut(slot) {
            if *entry == SlotEntry::Attached(task) {
                *entry = SlotEntry::Exited { task, code };
            }
        }
    }

    /// Código de retorno de uma task já coletada cujo slot ainda existe.
    pub fn exit_code(&self, task: TaskId) -> Option<Word> {
        self.entries.iter().find_map(|entry| match *entry {
            SlotEntry::Exited { task: t, code } if t == task => Some(code),
            _ => None,
        })
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}
