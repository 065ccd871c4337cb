//! # Multitasking & Scheduler Subsystem
//!
//! Modelo de processos do núcleo: tabela de tasks, round-robin com sleep e
//! supressão de preempção, criação/coleta de tasks e carga de binários nos
//! slots de usuário.
//!
//! ## Arquitetura
//! 1. **Preemptivo:** o timer (IRQ0) chama `schedule` a cada tick.
//! 2. **Cooperativo:** `sleep`, `exit` e `kill` pedem um reescalonamento pelo
//!    vetor de yield, que não conta tick.
//!
//! A troca de contexto não tem assembly próprio: o scheduler reescreve o
//! `TrapFrame` do trap corrente e o `iret` do stub de entrada retoma a task
//! escolhida.
//!
//! | Módulo   | Papel |
//! |----------|-------|
//! | `config` | Constantes (capacidade, stacks, seletores, timer) |
//! | `core`   | Seleção, tick, sleep, idle |
//! | `exec`   | Slots de processo e loader |
//! | `table`  | Armazenamento dos TCBs |
//! | `task`   | TCB, ids, estados, ciclo de vida |

pub mod config;
pub mod core;
pub mod exec;
pub mod table;
pub mod task;

#[cfg(feature = "self_test")]
pub mod test;

pub use self::core::{ScheduleReason, SleepAction};
pub use table::{TaskError, TaskTable};
