//! Tabela de 256 vetores e o despacho de traps.

use super::{Fatal, TrapFrame, EXCEPTION_COUNT, IRQ_BASE, IRQ_COUNT, PIC_SLAVE_FIRST_LINE};
use crate::arch::InterruptController;
use crate::kernel::{Kernel, Machine};

/// Handler de trap. Recebe o frame por referência e pode reescrevê-lo.
pub type TrapHandler<M> = fn(&mut Kernel<M>, &mut TrapFrame) -> Result<(), Fatal>;

pub struct TrapTable<M> {
    handlers: [Option<TrapHandler<M>>; 256],
}

impl<M> TrapTable<M> {
    pub const fn new() -> Self {
        Self {
            handlers: [None; 256],
        }
    }

    pub fn register(&mut self, vector: u8, handler: TrapHandler<M>) {
        self.handlers[vector as usize] = Some(handler);
    }

    pub fn get(&self, vector: u8) -> Option<TrapHandler<M>> {
        self.handlers[vector as usize]
    }
}

impl<M> Default for TrapTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Classe do vetor, decide o que acontece sem handler e se há EOI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VectorKind {
    Exception,
    Irq(u8),
    Software,
}

impl VectorKind {
    fn of(vector: u8) -> Self {
        if vector < EXCEPTION_COUNT {
            VectorKind::Exception
        } else if vector < IRQ_BASE + IRQ_COUNT {
            VectorKind::Irq(vector - IRQ_BASE)
        } else {
            VectorKind::Software
        }
    }
}

impl<M: Machine> Kernel<M> {
    /// Registra o handler de um vetor. Feito no boot, um por vetor.
    pub fn register_interrupt_handler(&mut self, vector: u8, handler: TrapHandler<M>) {
        self.traps.register(vector, handler);
    }

    /// Despacha um trap.
    ///
    /// - Exceção sem handler: fatal.
    /// - IRQ: handler (se houver) e depois EOI no PIC.
    /// - Vetor de software sem handler: descartado.
    ///
    /// Se o handler pediu reescalonamento (exit, kill), o frame é trocado
    /// aqui pelo da próxima task.
    pub fn handle_trap(&mut self, frame: &mut TrapFrame) -> Result<(), Fatal> {
        // O vetor é lido antes: o handler pode trocar o frame inteiro.
        let vector = frame.vector();
        let handler = self.traps.get(vector);

        match VectorKind::of(vector) {
            VectorKind::Exception => match handler {
                Some(h) => h(self, frame)?,
                None => {
                    return Err(Fatal::UnhandledException {
                        vector,
                        eip: frame.eip,
                        error: frame.err_code,
                    })
                }
            },
            VectorKind::Irq(line) => {
                if let Some(h) = handler {
                    h(self, frame)?;
                }
                self.machine
                    .end_of_interrupt(line >= PIC_SLAVE_FIRST_LINE);
            }
            VectorKind::Software => {
                if let Some(h) = handler {
                    h(self, frame)?;
                }
            }
        }

        if let Some(fatal) = self.fatal.take() {
            return Err(fatal);
        }
        if self.need_resched {
            self.reschedule(frame)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
