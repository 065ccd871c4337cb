//! Flag test-and-set dos arquivos abertos.
//!
//! É segurada durante uma leitura/escrita. Os handlers de syscall rodam
//! serializados com IF=0, então a flag só pode estar ocupada na entrada se
//! houver reentrada no mesmo arquivo; girar com IF=0 numa CPU só seria um
//! deadlock, por isso a aquisição falha em vez de esperar.

use core::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SpinFlag {
    held: AtomicBool,
}

impl SpinFlag {
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Tenta marcar a flag. `None` se já estava marcada.
    pub fn try_acquire(&self) -> Option<SpinFlagGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SpinFlagGuard { flag: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

pub struct SpinFlagGuard<'a> {
    flag: &'a SpinFlag,
}

impl Drop for SpinFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.held.store(false, Ordering::Release);
    }
}
