//! Backend de host.
//!
//! Não existe hardware aqui: a flag de interrupção é emulada em software e
//! `halt`/`software_yield` não fazem nada. Os testes dirigem o scheduler
//! chamando os handlers de trap diretamente.

use super::traits::CpuOps;

#[cfg(test)]
std::thread_local! {
    // Cada thread de teste tem sua própria "CPU".
    static IF: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

#[cfg(not(test))]
static IF: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(false);

pub struct Cpu;

impl CpuOps for Cpu {
    #[inline]
    fn halt() {
        core::hint::spin_loop();
    }

    #[cfg(test)]
    fn disable_interrupts() {
        IF.with(|f| f.set(false));
    }

    #[cfg(test)]
    fn enable_interrupts() {
        IF.with(|f| f.set(true));
    }

    #[cfg(test)]
    fn are_interrupts_enabled() -> bool {
        IF.with(|f| f.get())
    }

    #[cfg(not(test))]
    fn disable_interrupts() {
        IF.store(false, core::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(not(test))]
    fn enable_interrupts() {
        IF.store(true, core::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(not(test))]
    fn are_interrupts_enabled() -> bool {
        IF.load(core::sync::atomic::Ordering::SeqCst)
    }

    fn software_yield() {}
}
