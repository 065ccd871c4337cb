//! Interface Abstrata de CPU (HAL).

pub trait CpuOps {
    /// Para a execução até a próxima interrupção (HLT).
    fn halt();

    /// Desabilita interrupções globalmente (CLI).
    fn disable_interrupts();

    /// Habilita interrupções globalmente (STI).
    fn enable_interrupts();

    /// Verifica se as interrupções estão habilitadas (IF).
    fn are_interrupts_enabled() -> bool;

    /// Dispara o trap de yield por software.
    ///
    /// O handler reescalona sem contar um tick. Usado por `sleep` e por
    /// `kill_task` quando chamados de dentro de uma task.
    fn software_yield();

    /// Entra em loop infinito de halt com interrupções desabilitadas.
    /// Usado em erros fatais do kernel.
    fn hang() -> ! {
        Self::disable_interrupts();
        loop {
            Self::halt();
        }
    }
}
