//! Spinlock - bloqueio com busy-wait que mascara interrupções.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use super::critical::InterruptGuard;

/// Spinlock - usa busy-wait, NÃO pode dormir.
///
/// Enquanto o guard existe, IF fica desligada: numa CPU só isso já exclui o
/// tick do timer, então o lock em si nunca gira de verdade fora de reentrada.
pub struct Spinlock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: Spinlock protege acesso com lock atômico
unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Adquire o lock
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        let irq = InterruptGuard::new();

        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }

        SpinlockGuard {
            lock: self,
            _irq: irq,
        }
    }

    /// Tenta adquirir sem bloquear
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        let irq = InterruptGuard::new();

        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinlockGuard {
                lock: self,
                _irq: irq,
            })
        } else {
            // `irq` cai aqui e restaura IF
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Guard do spinlock - libera ao sair do escopo.
///
/// A ordem dos campos importa: o lock é solto no `Drop` abaixo e só depois
/// `_irq` restaura as interrupções.
pub struct SpinlockGuard<'a, T> {
    lock: &'a Spinlock<T>,
    _irq: InterruptGuard,
}

impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::{Cpu, CpuOps};

    #[test]
    fn test_lock_masks_interrupts_until_drop() {
        Cpu::enable_interrupts();
        let lock = Spinlock::new(5u32);
        {
            let mut guard = lock.lock();
            *guard += 1;
            assert!(!Cpu::are_interrupts_enabled());
            assert!(lock.is_locked());
        }
        assert!(Cpu::are_interrupts_enabled());
        assert!(!lock.is_locked());
        assert_eq!(*lock.lock(), 6);
    }

    #[test]
    fn test_try_lock_fails_while_held() {
        Cpu::enable_interrupts();
        let lock = Spinlock::new(());
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        // try_lock falho não pode reabilitar IF por baixo do guard
        assert!(!Cpu::are_interrupts_enabled());
        drop(guard);
        assert!(lock.try_lock().is_some());
        assert!(Cpu::are_interrupts_enabled());
    }
}
