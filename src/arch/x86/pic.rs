//! Driver do 8259 PIC em cascata (mestre + escravo).
//!
//! IRQs remapeadas para os vetores 32-47.

use super::port::{inb, io_wait, outb};
use crate::arch::traits::InterruptController;
use crate::trap::IRQ_BASE;

const PIC1_CMD: u16 = 0x20;
const PIC1_DATA: u16 = 0x21;
const PIC2_CMD: u16 = 0xA0;
const PIC2_DATA: u16 = 0xA1;

const PIC_EOI: u8 = 0x20;

static PIC_LOCK: spin::Mutex<()> = spin::Mutex::new(());

pub struct Pic8259;

impl Pic8259 {
    /// Inicializa e remapeia os dois controladores.
    pub fn init() {
        let _guard = PIC_LOCK.lock();
        crate::kdebug!("(PIC) Remapeando IRQs para vetores base=", IRQ_BASE);

        let mask1 = inb(PIC1_DATA);
        let mask2 = inb(PIC2_DATA);

        // ICW1
        outb(PIC1_CMD, 0x11);
        io_wait();
        outb(PIC2_CMD, 0x11);
        io_wait();

        // ICW2: offsets
        outb(PIC1_DATA, IRQ_BASE);
        io_wait();
        outb(PIC2_DATA, IRQ_BASE + 8);
        io_wait();

        // ICW3: cascata na IRQ2
        outb(PIC1_DATA, 4);
        io_wait();
        outb(PIC2_DATA, 2);
        io_wait();

        // ICW4: modo 8086
        outb(PIC1_DATA, 0x01);
        io_wait();
        outb(PIC2_DATA, 0x01);
        io_wait();

        outb(PIC1_DATA, mask1);
        outb(PIC2_DATA, mask2);

        crate::kinfo!("(PIC) Inicializado e Remapeado");
    }
}

impl InterruptController for Pic8259 {
    fn end_of_interrupt(&mut self, slave: bool) {
        let _guard = PIC_LOCK.lock();
        if slave {
            outb(PIC2_CMD, PIC_EOI);
        }
        outb(PIC1_CMD, PIC_EOI);
    }
}
