//! # Scheduler Self Test
//!
//! Verificações de sanidade executadas no boot, antes de ligar o tasking.

use super::config::{ms_to_ticks, MAX_TASKS};
use super::exec::SlotRegistry;
use super::task::TaskId;
use crate::mm::config::{guard_page, slot_base, slot_end, slot_of, MAX_PROCESS_SLOTS, PAGE_SIZE};

/// Executa os testes do subsistema de processos
pub fn run_sched_tests() {
    crate::kinfo!("[Sched Test] Iniciando...");

    test_slot_layout();
    test_task_id();
    test_slot_registry();

    crate::kinfo!("[Sched Test] Todos os testes passaram!");
}

fn test_slot_layout() {
    for slot in [0, 1, MAX_PROCESS_SLOTS - 1] {
        assert_eq!(slot_of(slot_base(slot)), Some(slot));
        assert_eq!(slot_of(slot_end(slot) - 1), Some(slot));
        assert!(guard_page(slot) > slot_base(slot));
        assert_eq!(guard_page(slot) % PAGE_SIZE, 0);
    }
    crate::ktrace!("[Sched Test] test_slot_layout OK");
}

fn test_task_id() {
    let id = TaskId::new((MAX_TASKS - 1) as u16, 7);
    assert_eq!(TaskId::from_word(id.as_word()), id);
    assert_eq!(TaskId::IDLE.as_word(), 0);
    assert_eq!(ms_to_ticks(10), 10);
    crate::ktrace!("[Sched Test] test_task_id OK");
}

fn test_slot_registry() {
    let mut slots = SlotRegistry::new();
    let Some(a) = slots.reserve() else {
        panic!("registry vazio sem slot livre");
    };
    assert_ne!(slots.reserve(), Some(a));
    slots.release(a);
    assert_eq!(slots.reserve(), Some(a));
    crate::ktrace!("[Sched Test] test_slot_registry OK");
}
