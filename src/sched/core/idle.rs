//! Idle Task - fallback permanente do scheduler
//!
//! A idle ocupa sempre o slot 0 (`TaskId::IDLE`) e nunca é coletada. O laço
//! em si (`KernelCell::idle_loop`) coleta tasks terminadas e faz `hlt` com
//! interrupções ligadas; a compactação roda com o núcleo travado (IF=0).

use crate::kernel::{Kernel, Machine};
use crate::mm::Paging;
use crate::sched::table::TaskError;
use crate::sched::task::{TaskId, TaskState, Tcb};
use crate::sys::types::Word;

impl<M: Machine> Kernel<M> {
    /// Instala a idle em `idle_entry` e liga o tasking.
    ///
    /// Até o primeiro tick não há task corrente: o código de boot continua
    /// em contexto só de kernel e é abandonado na primeira troca.
    pub fn init_tasking(&mut self, idle_entry: Word) -> Result<(), TaskError> {
        if self.tasking {
            crate::kwarn!("(Idle) init_tasking chamado duas vezes");
            return Ok(());
        }
        if self.tasks.live_count() != 0 {
            return Err(TaskError::Busy);
        }

        #[cfg(feature = "self_test")]
        crate::sched::test::run_sched_tests();

        let dir = self
            .machine
            .clone_kernel_dir()
            .map_err(|_| TaskError::OutOfMemory)?;
        let id = self
            .tasks
            .insert(|id| {
                let mut idle = Tcb::kernel(id, idle_entry, dir);
                idle.state = TaskState::Running;
                idle
            })
            .inspect_err(|_| self.machine.release_dir(dir))?;
        debug_assert_eq!(id, TaskId::IDLE);

        self.tasks.set_current(None);
        self.tasking = true;
        crate::kok!("(Idle) Tasking habilitado");
        Ok(())
    }
}
