//! Trap frame do i386.
//!
//! Mesmo layout que o stub de entrada monta na stack: segmentos, `pushad`,
//! vetor + código de erro, e o que a CPU empilha (`eip, cs, eflags` e, vindo
//! de ring 3, `useresp, ss`).

use crate::sched::config::{
    INITIAL_EFLAGS, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR, USER_CODE_SELECTOR,
    USER_DATA_SELECTOR,
};
use crate::sys::types::Word;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct TrapFrame {
    pub gs: Word,
    pub fs: Word,
    pub es: Word,
    pub ds: Word,
    pub edi: Word,
    pub esi: Word,
    pub ebp: Word,
    pub esp: Word,
    pub ebx: Word,
    pub edx: Word,
    pub ecx: Word,
    pub eax: Word,
    pub int_no: Word,
    pub err_code: Word,
    pub eip: Word,
    pub cs: Word,
    pub eflags: Word,
    pub useresp: Word,
    pub ss: Word,
}

const _: () = assert!(core::mem::size_of::<TrapFrame>() == 19 * 4);

impl TrapFrame {
    /// Frame inicial de uma task de kernel (ring 0).
    pub fn kernel(entry: Word, stack_top: Word) -> Self {
        let data = KERNEL_DATA_SELECTOR as Word;
        Self {
            gs: data,
            fs: data,
            es: data,
            ds: data,
            ss: data,
            cs: KERNEL_CODE_SELECTOR as Word,
            eflags: INITIAL_EFLAGS,
            eip: entry,
            esp: stack_top,
            ebp: stack_top,
            useresp: stack_top,
            ..Self::default()
        }
    }

    /// Frame inicial de uma task de usuário (ring 3).
    pub fn user(entry: Word, user_stack_top: Word) -> Self {
        let data = USER_DATA_SELECTOR as Word;
        Self {
            gs: data,
            fs: data,
            es: data,
            ds: data,
            ss: data,
            cs: USER_CODE_SELECTOR as Word,
            eflags: INITIAL_EFLAGS,
            eip: entry,
            esp: user_stack_top,
            ebp: user_stack_top,
            useresp: user_stack_top,
            ..Self::default()
        }
    }

    /// O trap veio de ring 3?
    #[inline]
    pub fn from_user_mode(&self) -> bool {
        self.cs & 0x3 == 0x3
    }

    #[inline]
    pub fn vector(&self) -> u8 {
        (self.int_no & 0xFF) as u8
    }
}
