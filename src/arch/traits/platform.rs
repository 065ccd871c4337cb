//! Colaboradores de plataforma usados pelo trap dispatch e pelo scheduler.

use crate::sys::types::Word;

/// Controlador de interrupções (8259 em cascata).
pub trait InterruptController {
    /// Envia End-Of-Interrupt. Com `slave` o EOI vai primeiro para o
    /// controlador escravo e depois para o mestre.
    fn end_of_interrupt(&mut self, slave: bool);
}

/// Estrutura que o hardware consulta para escolher a stack de ring 0
/// no próximo trap vindo de ring 3 (TSS.esp0 no i386).
pub trait PrivilegedStack {
    fn set_kernel_stack(&mut self, top: Word);
}
