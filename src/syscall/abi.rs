//! # Syscall Arguments
//!
//! Extração de argumentos do trap frame.

use crate::sys::types::Word;
use crate::trap::TrapFrame;

/// Argumentos de syscall extraídos do frame
///
/// Convenção de registradores (i386):
/// - EAX: número da syscall
/// - EBX: arg1
/// - ECX: arg2
/// - EDX: arg3
/// - ESI: arg4
/// - EDI: arg5
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyscallArgs {
    pub num: usize,
    pub arg1: Word,
    pub arg2: Word,
    pub arg3: Word,
    pub arg4: Word,
    pub arg5: Word,
}

impl SyscallArgs {
    pub fn from_frame(frame: &TrapFrame) -> Self {
        Self {
            num: frame.eax as usize,
            arg1: frame.ebx,
            arg2: frame.ecx,
            arg3: frame.edx,
            arg4: frame.esi,
            arg5: frame.edi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_convention() {
        let frame = TrapFrame {
            eax: 7,
            ebx: 1,
            ecx: 2,
            edx: 3,
            esi: 4,
            edi: 5,
            ..TrapFrame::default()
        };
        let args = SyscallArgs::from_frame(&frame);
        assert_eq!(args.num, 7);
        assert_eq!((args.arg1, args.arg2, args.arg3, args.arg4, args.arg5), (1, 2, 3, 4, 5));
    }
}
