/// Arquivo: x86/idt.rs
///
/// Propósito: Interrupt Descriptor Table do i386 (gates de 8 bytes).
/// Instala os stubs de `entry.rs` para exceções, IRQs do PIC, o gate de
/// syscall (DPL 3) e o gate de yield por software.
use core::mem::size_of;

use super::entry::{isr_stub, STUB_VECTORS};
use crate::sched::config::KERNEL_CODE_SELECTOR;
use crate::trap::SYSCALL_VECTOR;

/// Entrada da IDT (8 bytes em 32-bit)
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct IdtEntry {
    offset_low: u16,
    selector: u16,
    zero: u8,
    type_attr: u8,
    offset_high: u16,
}

impl IdtEntry {
    pub const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            zero: 0,
            type_attr: 0,
            offset_high: 0,
        }
    }

    /// Interrupt gate de 32 bits. `dpl` 3 permite `int n` vindo de ring 3.
    pub fn new(handler: u32, dpl: u8) -> Self {
        Self {
            offset_low: (handler & 0xFFFF) as u16,
            selector: KERNEL_CODE_SELECTOR,
            zero: 0,
            type_attr: 0x8E | ((dpl & 0x3) << 5),
            offset_high: (handler >> 16) as u16,
        }
    }
}

#[repr(C, align(8))]
pub struct Idt {
    entries: [IdtEntry; 256],
}

impl Idt {
    pub const fn new() -> Self {
        Self {
            entries: [IdtEntry::missing(); 256],
        }
    }

    pub fn set_handler(&mut self, vector: u8, handler: u32, dpl: u8) {
        self.entries[vector as usize] = IdtEntry::new(handler, dpl);
    }
}

#[repr(C, packed)]
struct IdtDescriptor {
    limit: u16,
    base: u32,
}

static IDT: spin::Mutex<Idt> = spin::Mutex::new(Idt::new());

/// Preenche e carrega a IDT.
///
/// # Safety
///
/// Deve ser chamada uma vez, no boot, com interrupções desabilitadas e a
/// GDT do kernel já carregada.
pub unsafe fn init() {
    let mut idt = IDT.lock();
    for &vector in STUB_VECTORS.iter() {
        let dpl = if vector == SYSCALL_VECTOR { 3 } else { 0 };
        idt.set_handler(vector, isr_stub(vector), dpl);
    }

    let descriptor = IdtDescriptor {
        limit: (size_of::<Idt>() - 1) as u16,
        base: &*idt as *const Idt as usize as u32,
    };
    core::arch::asm!("lidt [{}]", in(reg) &descriptor, options(readonly, nostack, preserves_flags));
    crate::kinfo!("(IDT) Carregada, gates=", STUB_VECTORS.len());
}
