//! Seção crítica com escopo.
//!
//! Salva o estado de IF, desabilita interrupções e restaura no drop.
//! Aninhável: só o guard mais externo reabilita.

use crate::arch::{Cpu, CpuOps};

pub struct InterruptGuard {
    were_enabled: bool,
}

impl InterruptGuard {
    pub fn new() -> Self {
        let were_enabled = Cpu::are_interrupts_enabled();
        Cpu::disable_interrupts();
        Self { were_enabled }
    }

    /// Estado de IF quando o guard foi criado.
    pub fn interrupts_were_enabled(&self) -> bool {
        self.were_enabled
    }
}

impl Default for InterruptGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.were_enabled {
            Cpu::enable_interrupts();
        }
    }
}

/// Executa `f` com interrupções mascaradas.
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    let _guard = InterruptGuard::new();
    f()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_guards_restore_outer_state() {
        Cpu::enable_interrupts();
        {
            let outer = InterruptGuard::new();
            assert!(outer.interrupts_were_enabled());
            assert!(!Cpu::are_interrupts_enabled());
            {
                let inner = InterruptGuard::new();
                assert!(!inner.interrupts_were_enabled());
            }
            assert!(!Cpu::are_interrupts_enabled());
        }
        assert!(Cpu::are_interrupts_enabled());
    }

    #[test]
    fn test_without_interrupts_keeps_disabled_state() {
        Cpu::disable_interrupts();
        let seen = without_interrupts(Cpu::are_interrupts_enabled);
        assert!(!seen);
        assert!(!Cpu::are_interrupts_enabled());
    }
}
