//! # Orquestrador de Agendamento
//!
//! Decide quem ocupa a CPU e faz a troca reescrevendo o trap frame.
//!
//! ## Fluxo de `schedule` (IF=0, tabela travada)
//! 1. Salva o frame interrompido no TCB corrente e confere as stacks.
//! 2. Só no tick: decrementa os sleeps e acorda quem chegou a zero.
//! 3. Task corrente rodando com preempção suprimida: fica onde está.
//! 4. `pick_next` (ou idle), rebaixa a anterior, promove a escolhida.
//!
//! A idle nunca volta para `Ready`: quando perde a CPU ela fica estacionada
//! em `Blocked` com contador zero (nenhum tick a acorda) e só é escolhida
//! como último recurso. Assim há sempre exatamente uma task `Running`.

use crate::kernel::{Kernel, Machine};
use crate::sched::config::ms_to_ticks;
use crate::sched::task::{TaskId, TaskState};
use crate::trap::{Fatal, TrapFrame};

/// Por que o scheduler foi chamado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleReason {
    /// IRQ0: conta o tempo de sleep
    Tick,
    /// Pedido voluntário (sleep, exit, kill); não conta tempo
    Yield,
}

/// O que o chamador de `sleep` deve fazer depois de soltar o núcleo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepAction {
    /// Disparar o yield por software
    Yield,
    /// Sem contexto de task: esperar o contador chegar em `until`
    BusyWait { until: u64 },
}

impl<M: Machine> Kernel<M> {
    /// Próxima task a rodar.
    ///
    /// Varre a ordem de execução a partir da posição seguinte à corrente e
    /// devolve a primeira `Ready`. Sem nenhuma pronta, fica a corrente se
    /// ainda estiver `Running`; senão `None` (o chamador usa a idle).
    pub fn pick_next(&self) -> Option<TaskId> {
        let live = self.tasks.live_count();
        if live == 0 {
            return None;
        }

        let start = self
            .tasks
            .current()
            .and_then(|id| self.tasks.position_of(id))
            .map_or(0, |pos| (pos + 1) % live);

        (0..live)
            .filter_map(|i| self.tasks.task_at((start + i) % live))
            .find(|t| t.state == TaskState::Ready)
            .or_else(|| {
                self.tasks
                    .current_tcb()
                    .filter(|t| t.state == TaskState::Running)
            })
            .map(|t| t.id)
    }

    /// Ponto único de troca de contexto. `frame` é o trap frame do trap
    /// corrente; na saída contém o estado da task que vai rodar.
    pub fn schedule(&mut self, frame: &mut TrapFrame, reason: ScheduleReason) -> Result<(), Fatal> {
        self.need_resched = false;

        if let Some(id) = self.tasks.current() {
            if let Some(tcb) = self.tasks.get_mut(id) {
                tcb.frame = *frame;
            }
            self.check_stack_usage(id, frame)?;
        }

        if reason == ScheduleReason::Tick {
            self.wake_sleepers();
        }

        if self
            .tasks
            .current_tcb()
            .is_some_and(|t| t.state == TaskState::Running && t.preempt_depth > 0)
        {
            return Ok(());
        }

        let next = self.pick_next().unwrap_or(TaskId::IDLE);
        let prev = self.tasks.current();
        if prev == Some(next) {
            return Ok(());
        }

        // Antes do primeiro escalonamento quem "roda" é a idle.
        let prev = prev.unwrap_or(TaskId::IDLE);
        if let Some(tcb) = self.tasks.get_mut(prev) {
            if tcb.state == TaskState::Running {
                if prev == TaskId::IDLE {
                    tcb.state = TaskState::Blocked;
                    tcb.sleep_remaining = 0;
                } else {
                    tcb.state = TaskState::Ready;
                }
            }
        }

        self.switch_to(next, frame);
        Ok(())
    }

    /// Reescalonamento pedido durante um trap (yield, exit, kill).
    pub(crate) fn reschedule(&mut self, frame: &mut TrapFrame) -> Result<(), Fatal> {
        if !self.tasking {
            self.need_resched = false;
            return Ok(());
        }
        self.schedule(frame, ScheduleReason::Yield)
    }

    fn wake_sleepers(&mut self) {
        for tcb in self.tasks.iter_mut() {
            if tcb.state == TaskState::Blocked && tcb.sleep_remaining > 0 {
                tcb.sleep_remaining -= 1;
                if tcb.sleep_remaining == 0 {
                    tcb.state = TaskState::Ready;
                }
            }
        }
    }

    fn switch_to(&mut self, next: TaskId, frame: &mut TrapFrame) {
        let Some(tcb) = self.tasks.get_mut(next) else {
            crate::kerror!("(Sched) Task escolhida não existe, id=", next.as_word());
            return;
        };
        tcb.state = TaskState::Running;
        *frame = tcb.frame;
        if tcb.is_user() {
            // iret para ring 3 usa a stack de usuário salva
            frame.esp = frame.useresp;
        }
        let dir = tcb.page_dir;
        let stack_top = tcb.kernel_stack_top();

        self.machine.switch_dir(dir);
        self.machine.set_kernel_stack(stack_top);
        self.tasks.set_current(Some(next));
        crate::ktrace!("(Sched) Troca para task id=", next.as_word());
    }

    /// Suprime a preempção da task corrente (reentrante).
    pub fn preempt_disable(&mut self) {
        if let Some(tcb) = self.tasks.current_tcb_mut() {
            tcb.preempt_depth = tcb.preempt_depth.saturating_add(1);
        }
    }

    pub fn preempt_enable(&mut self) {
        if let Some(tcb) = self.tasks.current_tcb_mut() {
            tcb.preempt_depth = tcb.preempt_depth.saturating_sub(1);
        }
    }

    /// Primeira metade de `sleep`: bloqueia a task corrente e diz ao
    /// chamador como esperar.
    pub fn begin_sleep(&mut self, ms: u32) -> SleepAction {
        let ticks = ms_to_ticks(ms);
        if !self.tasking {
            return SleepAction::BusyWait {
                until: self.ticks + ticks as u64,
            };
        }
        let Some(tcb) = self.tasks.current_tcb_mut() else {
            return SleepAction::BusyWait {
                until: self.ticks + ticks as u64,
            };
        };
        if ticks > 0 {
            tcb.state = TaskState::Blocked;
            tcb.sleep_remaining = ticks;
            crate::ktrace!("(Sched) Task dormindo, ticks=", ticks);
        }
        SleepAction::Yield
    }
}

/// IRQ0: conta o tick e escalona.
pub(crate) fn timer_interrupt<M: Machine>(
    kernel: &mut Kernel<M>,
    frame: &mut TrapFrame,
) -> Result<(), Fatal> {
    kernel.ticks += 1;
    if kernel.tasking {
        kernel.schedule(frame, ScheduleReason::Tick)?;
    }
    Ok(())
}

/// Vetor de yield: só marca o pedido; `handle_trap` faz a troca.
pub(crate) fn yield_trap<M: Machine>(
    kernel: &mut Kernel<M>,
    _frame: &mut TrapFrame,
) -> Result<(), Fatal> {
    kernel.need_resched = true;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
