//! Ciclo de vida de task: criação, kill/exit, checagem de stack e coleta.

use super::entity::{KillReason, Tcb};
use super::id::TaskId;
use super::state::TaskState;
use crate::kernel::{Kernel, Machine};
use crate::mm::{HeapRegion, TaskHeap, UserMemory};
use crate::sched::exec::space::SlotError;
use crate::sched::exec::ProcessAddressSpace;
use crate::sched::table::TaskError;
use crate::sys::types::Word;
use crate::trap::{Fatal, TrapFrame};

/// Heap de usuário sobre `[start, end)`. `None` se a região não tiver
/// memória por trás ou for pequena demais.
pub(crate) fn build_heap(mem: &impl UserMemory, start: Word, end: Word) -> Option<HeapRegion> {
    let base = mem.kernel_ptr(start)?;
    // SAFETY: `kernel_ptr` vale até o fim do slot, e [start, end) não passa
    // da guard page; a região é exclusiva da task que vai recebê-la.
    unsafe { HeapRegion::new(start, end, base) }
}

impl<M: Machine> Kernel<M> {
    /// Cria uma task de kernel (ring 0) começando em `entry`.
    pub fn create_kernel_task(&mut self, entry: Word) -> Result<TaskId, TaskError> {
        if !self.tasking {
            return Err(TaskError::TaskingOff);
        }
        let dir = self
            .machine
            .clone_kernel_dir()
            .map_err(|_| TaskError::OutOfMemory)?;
        let id = self
            .tasks
            .insert(|id| Tcb::kernel(id, entry, dir))
            .inspect_err(|_| self.machine.release_dir(dir))?;
        crate::kinfo!("(Task) Task de kernel criada id=", id.as_word());
        crate::kdebug!("(Task) entry=", entry);
        Ok(id)
    }

    /// Cria uma task de usuário (ring 3) dona de `space`.
    ///
    /// A página logo abaixo da stack de usuário fica desmapeada no
    /// diretório da task. Sem permissão de buffer o heap nasce já, entre o
    /// fim do binário e a guard page; com permissão ele espera o
    /// `request_buffer`, que decide onde a região termina.
    pub fn create_user_task(&mut self, space: ProcessAddressSpace) -> Result<TaskId, TaskError> {
        if !self.tasking {
            return Err(TaskError::TaskingOff);
        }
        let dir = self
            .machine
            .clone_kernel_dir()
            .map_err(|_| TaskError::OutOfMemory)?;
        self.machine.unmap_page(space.guard_page(), dir);

        let heap = if space.buffer_allowed() {
            TaskHeap::NoHeapYet
        } else {
            match build_heap(&self.machine, space.heap_start(), space.guard_page()) {
                Some(region) => TaskHeap::Heap(region),
                None => {
                    crate::kwarn!("(Task) Sem memória para o heap, slot=", space.slot());
                    TaskHeap::NoHeapYet
                }
            }
        };

        let id = self
            .tasks
            .insert(|id| Tcb::user(id, space, dir, heap))
            .inspect_err(|_| self.machine.release_dir(dir))?;
        crate::kinfo!("(Task) Task de usuário criada id=", id.as_word());
        crate::kdebug!("(Task) slot=", space.slot());
        Ok(id)
    }

    /// Cria a task de um slot carregado pelo loader e liga os dois.
    pub fn spawn_from_slot(&mut self, slot: usize) -> Result<TaskId, TaskError> {
        let space = self.spaces.loaded(slot).map_err(|e| match e {
            SlotError::NotAllocated => TaskError::NotLoaded,
            SlotError::AlreadyAttached => TaskError::Busy,
        })?;
        let id = self.create_user_task(space)?;
        self.spaces.attach(slot, id);
        Ok(id)
    }

    /// Termina uma task guardando `reason` como código de retorno.
    ///
    /// Idempotente: uma task já terminada mantém o primeiro código. Sempre
    /// pede reescalonamento; o efeito vale no próximo ponto de troca.
    pub fn kill_task(&mut self, id: TaskId, reason: KillReason) -> Result<(), TaskError> {
        if id == TaskId::IDLE {
            return Err(TaskError::IdleTask);
        }
        let tcb = self.tasks.get_mut(id).ok_or(TaskError::NoSuchTask)?;
        if tcb.state != TaskState::Terminated {
            tcb.state = TaskState::Terminated;
            tcb.return_code = reason as u32;
            crate::kinfo!("(Task) Task morta id=", id.as_word());
            crate::kdebug!("(Task) motivo=", reason as u32);
        } else {
            crate::kdebug!("(Task) Task já terminada id=", id.as_word());
        }
        self.need_resched = true;
        Ok(())
    }

    /// `exit` da task corrente.
    pub fn exit_current(&mut self, code: u32) -> Result<(), TaskError> {
        let id = self.tasks.current().ok_or(TaskError::NoSuchTask)?;
        if id == TaskId::IDLE {
            return Err(TaskError::IdleTask);
        }
        let tcb = self.tasks.get_mut(id).ok_or(TaskError::NoSuchTask)?;
        tcb.state = TaskState::Terminated;
        tcb.return_code = code;
        self.need_resched = true;
        crate::kinfo!("(Task) Task saiu id=", id.as_word());
        crate::kdebug!("(Task) código=", code);
        Ok(())
    }

    /// Coleta toda task terminada (menos a corrente): devolve o diretório
    /// de páginas e fecha os arquivos que ela deixou abertos. O código de
    /// retorno de uma task de usuário passa para o slot dela. Só roda na
    /// idle, com o núcleo travado.
    pub fn cleanup_terminated(&mut self) -> usize {
        let Self {
            tasks,
            machine,
            vfs,
            spaces,
            ..
        } = self;
        tasks.remove_terminated(|tcb| {
            crate::kinfo!("(Task) Task coletada id=", tcb.id.as_word());
            crate::kdebug!("(Task) código de retorno=", tcb.return_code);
            if let Some(space) = tcb.address_space() {
                spaces.mark_exited(space.slot(), tcb.id, tcb.return_code);
            }
            machine.release_dir(tcb.page_dir);
            vfs.release_owner(tcb.id);
        })
    }

    /// Confere o stack pointer recém-salvo de `id`.
    ///
    /// Vindo de ring 0, `esp` tem que estar na stack de kernel da task (senão
    /// é fatal). Vindo de ring 3, a stack de usuário tem que estar acima da
    /// guard page e dentro do slot (senão a task morre).
    pub fn check_stack_usage(&mut self, id: TaskId, frame: &TrapFrame) -> Result<(), Fatal> {
        let Some(tcb) = self.tasks.get(id) else {
            return Ok(());
        };
        if frame.from_user_mode() {
            if !tcb.user_stack_ok() {
                crate::kwarn!("(Task) Stack de usuário fora do lugar, id=", id.as_word());
                crate::kwarn!("(Task) useresp=", frame.useresp);
                if tcb.state != TaskState::Terminated {
                    let _ = self.kill_task(id, KillReason::SegmentationFault);
                }
            }
            return Ok(());
        }
        if !tcb.kernel_stack_contains(frame.esp) {
            return Err(Fatal::KernelStackOverflow {
                task: id,
                esp: frame.esp,
            });
        }
        Ok(())
    }

    /// Asserção com contexto de task: falhou com task corrente, ela morre
    /// com `AssertFailed`; sem task (ou na idle), o erro fica em
    /// `self.fatal` e para a máquina ao fim do trap.
    pub fn task_assert(&mut self, cond: bool, msg: &'static str) -> bool {
        if cond {
            return true;
        }
        crate::kerror!("(Task) Asserção falhou:");
        crate::kerror!(msg);
        let killed = self
            .tasks
            .current()
            .is_some_and(|id| self.kill_task(id, KillReason::AssertFailed).is_ok());
        if !killed {
            self.fatal = Some(Fatal::AssertFailed(msg));
        }
        false
    }
}

// =============================================================================
// TESTS
// =============================================================================
