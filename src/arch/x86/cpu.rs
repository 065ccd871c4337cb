//! Instruções privilegiadas do i386.

use crate::arch::traits::CpuOps;
use crate::trap::YIELD_VECTOR;

const _: () = assert!(YIELD_VECTOR == 0x81);

pub struct Cpu;

impl CpuOps for Cpu {
    #[inline]
    fn halt() {
        // SAFETY: HLT apenas suspende até a próxima interrupção
        unsafe { core::arch::asm!("hlt", options(nomem, nostack, preserves_flags)) }
    }

    #[inline]
    fn disable_interrupts() {
        // SAFETY: CLI altera apenas a flag IF
        unsafe { core::arch::asm!("cli", options(nomem, nostack)) }
    }

    #[inline]
    fn enable_interrupts() {
        // SAFETY: STI altera apenas a flag IF
        unsafe { core::arch::asm!("sti", options(nomem, nostack)) }
    }

    #[inline]
    fn are_interrupts_enabled() -> bool {
        let eflags: u32;
        // SAFETY: apenas lê EFLAGS via stack
        unsafe {
            core::arch::asm!("pushfd", "pop {}", out(reg) eflags, options(nomem, preserves_flags));
        }
        eflags & (1 << 9) != 0
    }

    #[inline]
    fn software_yield() {
        // SAFETY: o vetor de yield tem handler instalado desde o boot
        unsafe { core::arch::asm!("int 0x81") }
    }
}
