//! Loader de binários planos.
//!
//! O binário é copiado inteiro para a base de um slot livre e começa a
//! executar ali. O slot todo é mapeado no diretório do kernel (template
//! clonado por toda task), então a carga é visível em qualquer espaço.
//!
//! ```text
//! slot + 0x000000 .. fim do binário   código/dados
//! fim (alinhado)  .. 0x7DEFFF         heap [e buffer de display no topo]
//! 0x7DF000        .. 0x7DFFFF         guard page (desmapeada por task)
//! 0x7E0000        .. 0x7FFFFF         stack de usuário (128 KiB)
//! ```

use super::space::{BufferFlags, ProcessAddressSpace, SlotEntry};
use crate::fs::{IoError, OpenMode};
use crate::kernel::{Kernel, Machine};
use crate::mm::config::{slot_base, slot_end, MAX_BINARY_SIZE, PAGE_SIZE};
use crate::mm::PageDir;
use crate::sched::task::TaskState;
use crate::sys::types::Word;

/// Erro de carga/descarga de processo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    NotFound,
    /// Binário vazio
    InvalidBinary,
    /// Binário não cabe no slot
    TooLarge,
    NoFreeSlot,
    OutOfMemory,
    /// Leitura curta ou erro do driver
    Io,
    /// Slot não alocado
    NotLoaded,
    /// Task do slot ainda viva
    Busy,
}

impl From<IoError> for LoadError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::NotFound | IoError::NotADirectory => LoadError::NotFound,
            _ => LoadError::Io,
        }
    }
}

impl<M: Machine> Kernel<M> {
    /// Carrega `path` num slot livre e registra o descritor.
    pub fn load_process(&mut self, path: &str, allow_buffer: bool) -> Result<ProcessAddressSpace, LoadError> {
        let fs = self.vfs.filesystem();
        let file = fs.open(path, OpenMode::R)?;
        let size = file.size();
        if size == 0 || size > MAX_BINARY_SIZE {
            fs.close(file);
            crate::kwarn!("(Loader) Tamanho de binário inválido: ", size);
            return Err(if size == 0 {
                LoadError::InvalidBinary
            } else {
                LoadError::TooLarge
            });
        }

        let Some(slot) = self.spaces.reserve() else {
            self.vfs.filesystem().close(file);
            return Err(LoadError::NoFreeSlot);
        };

        let kernel_dir = self.machine.kernel_dir();
        if let Err(e) = self.map_slot(slot) {
            self.vfs.filesystem().close(file);
            self.spaces.release(slot);
            return Err(e);
        }

        let base = slot_base(slot);
        let read = match self.machine.kernel_ptr(base) {
            Some(ptr) => {
                // SAFETY: o slot inteiro acabou de ser mapeado e `size` cabe
                // nele (MAX_BINARY_SIZE < SLOT_SIZE).
                let dst = unsafe { core::slice::from_raw_parts_mut(ptr, size as usize) };
                self.vfs.filesystem().read(&file, 0, dst)
            }
            None => Err(IoError::Device),
        };
        self.vfs.filesystem().close(file);

        match read {
            Ok(n) if n == size as usize => {}
            Ok(_) | Err(_) => {
                crate::kerror!("(Loader) Leitura do binário falhou, slot=", slot);
                self.unmap_slot(slot, kernel_dir);
                self.spaces.release(slot);
                return Err(LoadError::Io);
            }
        }

        let flags = if allow_buffer {
            BufferFlags::ALLOWED
        } else {
            BufferFlags::empty()
        };
        let space = ProcessAddressSpace::new(slot, size, flags);
        self.spaces.store(space);
        crate::kinfo!("(Loader) Binário carregado em ", base);
        crate::kdebug!("(Loader) tamanho=", size);
        Ok(space)
    }

    /// Libera os frames e o slot. Recusa se a task dona ainda não terminou.
    /// Um código de retorno guardado no slot some junto.
    pub fn destroy_process(&mut self, slot: usize) -> Result<(), LoadError> {
        if !self.spaces.is_allocated(slot) {
            return Err(LoadError::NotLoaded);
        }
        if let SlotEntry::Attached(owner) = self.spaces.entry(slot) {
            if self
                .tasks
                .get(owner)
                .is_some_and(|t| t.state != TaskState::Terminated)
            {
                return Err(LoadError::Busy);
            }
        }

        let kernel_dir = self.machine.kernel_dir();
        self.unmap_slot(slot, kernel_dir);
        self.spaces.release(slot);
        crate::kinfo!("(Loader) Slot destruído: ", slot);
        Ok(())
    }

    fn map_slot(&mut self, slot: usize) -> Result<(), LoadError> {
        let dir = self.machine.kernel_dir();
        let mut page: Word = slot_base(slot);
        while page < slot_end(slot) {
            if self.machine.alloc_frame(page, dir).is_err() {
                // desfaz só o que foi mapeado
                let mut undo = slot_base(slot);
                while undo < page {
                    self.machine.free_frame(undo, dir);
                    undo += PAGE_SIZE;
                }
                return Err(LoadError::OutOfMemory);
            }
            page += PAGE_SIZE;
        }
        Ok(())
    }

    fn unmap_slot(&mut self, slot: usize, dir: PageDir) {
        let mut page = slot_base(slot);
        while page < slot_end(slot) {
            self.machine.free_frame(page, dir);
            page += PAGE_SIZE;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
