//! Tabela de tasks.
//!
//! Armazenamento em slots estáveis (cada TCB fica no mesmo slot a vida toda)
//! mais uma ordem densa de execução, compactada na coleta. O round-robin
//! percorre a ordem densa; os ids apontam para slots e não mudam com a
//! compactação.

use alloc::boxed::Box;

use super::config::MAX_TASKS;
use super::task::{TaskId, TaskState, Tcb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// Tabela cheia
    TableFull,
    /// Id inválido ou de task já coletada
    NoSuchTask,
    /// Operação não permitida na idle
    IdleTask,
    /// Paginação não conseguiu criar o diretório
    OutOfMemory,
    /// Slot não carregado
    NotLoaded,
    /// Slot já tem task viva
    Busy,
    /// `init_tasking` ainda não rodou
    TaskingOff,
}

struct Slot {
    generation: u16,
    tcb: Option<Box<Tcb>>,
}

pub struct TaskTable {
    slots: [Slot; MAX_TASKS],
    /// Slots vivos, em ordem de criação
    order: [u8; MAX_TASKS],
    live: usize,
    /// `None` = contexto só de kernel (antes do primeiro escalonamento)
    current: Option<TaskId>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot {
                generation: 0,
                tcb: None,
            }),
            order: [0; MAX_TASKS],
            live: 0,
            current: None,
        }
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Cria um TCB no primeiro slot livre.
    pub fn insert(&mut self, build: impl FnOnce(TaskId) -> Tcb) -> Result<TaskId, TaskError> {
        let index = self
            .slots
            .iter()
            .position(|s| s.tcb.is_none())
            .ok_or(TaskError::TableFull)?;
        let id = TaskId::new(index as u16, self.slots[index].generation);
        self.slots[index].tcb = Some(Box::new(build(id)));
        self.order[self.live] = index as u8;
        self.live += 1;
        Ok(id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Tcb> {
        let slot = self.slots.get(id.slot())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.tcb.as_deref()
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Tcb> {
        let slot = self.slots.get_mut(id.slot())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.tcb.as_deref_mut()
    }

    /// TCB na posição `pos` da ordem de execução; `None` se `pos >= live`.
    pub fn task_at(&self, pos: usize) -> Option<&Tcb> {
        if pos >= self.live {
            return None;
        }
        self.slots[self.order[pos] as usize].tcb.as_deref()
    }

    pub fn position_of(&self, id: TaskId) -> Option<usize> {
        self.get(id)?;
        self.order[..self.live]
            .iter()
            .position(|&s| s as usize == id.slot())
    }

    /// Ids vivos em ordem de execução.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.order[..self.live]
            .iter()
            .map(move |&s| TaskId::new(s as u16, self.slots[s as usize].generation))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tcb> + '_ {
        self.slots.iter_mut().filter_map(|s| s.tcb.as_deref_mut())
    }

    pub fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub fn set_current(&mut self, id: Option<TaskId>) {
        self.current = id;
    }

    pub fn current_tcb(&self) -> Option<&Tcb> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn current_tcb_mut(&mut self) -> Option<&mut Tcb> {
        let id = self.current?;
        self.get_mut(id)
    }

    /// Remove todo TCB `Terminated` (menos o corrente), compactando a ordem
    /// e avançando a geração do slot. `reap` recebe cada TCB removido.
    pub fn remove_terminated(&mut self, mut reap: impl FnMut(Box<Tcb>)) -> usize {
        let current = self.current;
        let mut kept = 0;
        let mut removed = 0;
        for pos in 0..self.live {
            let index = self.order[pos] as usize;
            let slot = &mut self.slots[index];
            let dead = slot.tcb.as_ref().is_some_and(|t| {
                t.state == TaskState::Terminated && Some(t.id) != current
            });
            if dead {
                if let Some(tcb) = slot.tcb.take() {
                    slot.generation = TaskId::next_generation(slot.generation);
                    reap(tcb);
                }
                removed += 1;
            } else {
                self.order[kept] = index as u8;
                kept += 1;
            }
        }
        self.live = kept;
        removed
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
