//! Estado do núcleo e a instância global.
//!
//! Tudo que o scheduler e as syscalls mutam vive em `Kernel<M>`. A instância
//! global fica num `KernelCell`, cujo lock mascara interrupções enquanto
//! existe: é a seção crítica de toda mutação da tabela de tasks, já que o
//! único caminho para `&mut Kernel` passa por ele (ou pelo trap, que já entra
//! com IF=0 e também pega o lock).

use alloc::boxed::Box;

use crate::arch::{Cpu, CpuOps, InterruptController, PrivilegedStack};
use crate::drivers::display::Display;
use crate::fs::{FileSystem, Vfs};
use crate::mm::{Paging, UserMemory};
use crate::sched::exec::SlotRegistry;
use crate::sched::table::{TaskError, TaskTable};
use crate::sched::task::{KillReason, TaskId};
use crate::sched::SleepAction;
use crate::sync::Spinlock;
use crate::syscall::dispatch::SyscallTable;
use crate::sys::types::Word;
use crate::trap::{self, Fatal, TrapFrame, TrapTable};

/// Todos os colaboradores de hardware/VMM que o núcleo consome.
pub trait Machine: Paging + UserMemory + InterruptController + PrivilegedStack + Display {}

impl<T> Machine for T where T: Paging + UserMemory + InterruptController + PrivilegedStack + Display {}

pub struct Kernel<M> {
    pub(crate) machine: M,
    pub(crate) vfs: Vfs,
    pub(crate) tasks: TaskTable,
    pub(crate) spaces: SlotRegistry,
    pub(crate) traps: TrapTable<M>,
    pub(crate) syscalls: SyscallTable<M>,
    pub(crate) ticks: u64,
    pub(crate) tasking: bool,
    /// Pedido de reescalonamento ao fim do trap corrente (exit, kill, yield)
    pub(crate) need_resched: bool,
    /// Erro fatal levantado onde não dá para devolver `Fatal` (syscalls);
    /// entregue ao fim do trap corrente.
    pub(crate) fatal: Option<Fatal>,
}

impl<M: Machine> Kernel<M> {
    /// Monta o núcleo com os handlers padrão já registrados (timer, yield,
    /// syscall, falhas de CPU). Tasking só liga em `init_tasking`.
    pub fn new(machine: M, fs: Box<dyn FileSystem + Send>) -> Self {
        let mut kernel = Self {
            machine,
            vfs: Vfs::new(fs),
            tasks: TaskTable::new(),
            spaces: SlotRegistry::new(),
            traps: TrapTable::new(),
            syscalls: SyscallTable::new(),
            ticks: 0,
            tasking: false,
            need_resched: false,
            fatal: None,
        };
        trap::fault::install(&mut kernel);
        crate::sched::core::install(&mut kernel);
        crate::syscall::dispatch::install(&mut kernel);
        crate::kinfo!("(Kernel) Handlers de trap registrados");
        kernel
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    pub fn vfs_mut(&mut self) -> &mut Vfs {
        &mut self.vfs
    }

    pub fn tasks(&self) -> &TaskTable {
        &self.tasks
    }

    pub fn spaces(&self) -> &SlotRegistry {
        &self.spaces
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tasking_enabled(&self) -> bool {
        self.tasking
    }

    pub fn current_task(&self) -> Option<TaskId> {
        self.tasks.current()
    }
}

/// Instância global do núcleo.
pub struct KernelCell<M> {
    inner: Spinlock<Option<Kernel<M>>>,
}

impl<M> KernelCell<M> {
    pub const fn new() -> Self {
        Self {
            inner: Spinlock::new(None),
        }
    }
}

impl<M> Default for KernelCell<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Machine> KernelCell<M> {
    pub fn install(&self, kernel: Kernel<M>) {
        *self.inner.lock() = Some(kernel);
    }

    /// Executa `f` com o núcleo travado e interrupções mascaradas.
    /// `None` antes de `install`.
    pub fn with<R>(&self, f: impl FnOnce(&mut Kernel<M>) -> R) -> Option<R> {
        self.inner.lock().as_mut().map(f)
    }

    /// Ponto de entrada de todo trap (chamado pelo stub assembly).
    pub fn trap_entry(&self, frame: &mut TrapFrame) {
        if let Err(fatal) = self.dispatch_trap(frame) {
            fatal.report();
            Cpu::hang();
        }
    }

    /// Entrega o trap ao núcleo. Um trap que chega com o lock já tomado
    /// (falha dentro de uma syscall, por exemplo) não pode girar no lock.
    fn dispatch_trap(&self, frame: &mut TrapFrame) -> Result<(), Fatal> {
        let Some(mut guard) = self.inner.try_lock() else {
            return Err(Fatal::Reentry {
                vector: frame.vector(),
                eip: frame.eip,
            });
        };
        match guard.as_mut() {
            Some(kernel) => kernel.handle_trap(frame),
            None if frame.vector() < trap::EXCEPTION_COUNT => Err(Fatal::UnhandledException {
                vector: frame.vector(),
                eip: frame.eip,
                error: frame.err_code,
            }),
            None => Ok(()),
        }
    }

    /// Sleep voluntário da task corrente. Sem task corrente, espera ocupada
    /// no contador de ticks.
    pub fn sleep(&self, ms: u32) {
        match self.with(|k| k.begin_sleep(ms)) {
            Some(SleepAction::Yield) => {
                Cpu::software_yield();
                Cpu::enable_interrupts();
            }
            Some(SleepAction::BusyWait { until }) => {
                while self.with(|k| k.ticks()).is_some_and(|now| now < until) {
                    Cpu::enable_interrupts();
                    Cpu::halt();
                }
            }
            None => {}
        }
    }

    /// Mata uma task e cede a CPU se houver task corrente.
    pub fn kill_task(&self, id: TaskId, reason: KillReason) -> Result<(), TaskError> {
        let (result, yield_now) = self
            .with(|k| (k.kill_task(id, reason), k.current_task().is_some()))
            .ok_or(TaskError::NoSuchTask)?;
        if yield_now {
            Cpu::software_yield();
        }
        result
    }

    pub fn create_kernel_task(&self, entry: Word) -> Result<TaskId, TaskError> {
        self.with(|k| k.create_kernel_task(entry))
            .unwrap_or(Err(TaskError::NoSuchTask))
    }

    pub fn preempt_disable(&self) {
        self.with(|k| k.preempt_disable());
    }

    pub fn preempt_enable(&self) {
        self.with(|k| k.preempt_enable());
    }

    /// Asserção de kernel: mata a task corrente ou para a máquina.
    pub fn kassert(&self, cond: bool, msg: &'static str) {
        if cond {
            return;
        }
        let outcome = self.with(|k| {
            k.task_assert(false, msg);
            k.fatal.take()
        });
        match outcome {
            Some(None) => Cpu::software_yield(),
            Some(Some(fatal)) => {
                fatal.report();
                Cpu::hang();
            }
            None => {
                Fatal::AssertFailed(msg).report();
                Cpu::hang();
            }
        }
    }

    /// Laço da task idle: coleta tasks terminadas e dorme até o próximo IRQ.
    pub fn idle_loop(&self) -> ! {
        loop {
            self.with(|k| k.cleanup_terminated());
            Cpu::enable_interrupts();
            Cpu::halt();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{boot_kernel, MockMachine};
    use crate::trap::{PAGE_FAULT_VECTOR, TIMER_VECTOR};

    fn frame(vector: u8) -> TrapFrame {
        TrapFrame {
            int_no: vector as Word,
            eip: 0xC010_2030,
            ..TrapFrame::default()
        }
    }

    #[test]
    fn test_trap_while_locked_is_fatal_reentry() {
        let cell: KernelCell<MockMachine> = KernelCell::new();
        cell.install(boot_kernel());

        let _held = cell.inner.lock();
        assert_eq!(
            cell.dispatch_trap(&mut frame(PAGE_FAULT_VECTOR)),
            Err(Fatal::Reentry {
                vector: PAGE_FAULT_VECTOR,
                eip: 0xC010_2030
            })
        );
    }

    #[test]
    fn test_trap_before_install() {
        let cell: KernelCell<MockMachine> = KernelCell::new();
        assert_eq!(cell.dispatch_trap(&mut frame(TIMER_VECTOR)), Ok(()));
        assert!(matches!(
            cell.dispatch_trap(&mut frame(PAGE_FAULT_VECTOR)),
            Err(Fatal::UnhandledException { vector: PAGE_FAULT_VECTOR, .. })
        ));
    }

    #[test]
    fn test_trap_reaches_installed_kernel() {
        let cell: KernelCell<MockMachine> = KernelCell::new();
        cell.install(boot_kernel());
        assert_eq!(cell.dispatch_trap(&mut frame(TIMER_VECTOR)), Ok(()));
        assert_eq!(cell.with(|k| k.ticks()), Some(1));
        assert!(!cell.inner.is_locked());
    }
}
