//! Stubs de entrada de trap (assembly) e a ponte para o núcleo em Rust.
//!
//! Cada stub empilha código de erro (0 quando a CPU não empilha) e o número
//! do vetor, salva o resto dos registradores no layout de `TrapFrame` e
//! chama `radiant_trap_entry(&mut TrapFrame)`. Na volta os registradores
//! são restaurados do mesmo frame, que o scheduler pode ter reescrito.

use crate::trap::{SYSCALL_VECTOR, YIELD_VECTOR};

core::arch::global_asm!(
    ".macro RADIANT_ISR_NOERR n",
    ".global radiant_isr_\\n",
    "radiant_isr_\\n:",
    "    push 0",
    "    push \\n",
    "    jmp radiant_isr_common",
    ".endm",
    ".macro RADIANT_ISR_ERR n",
    ".global radiant_isr_\\n",
    "radiant_isr_\\n:",
    "    push \\n",
    "    jmp radiant_isr_common",
    ".endm",
    ".irp n, 0,1,2,3,4,5,6,7,9,15,16,18,19,20,21,22,23,24,25,26,27,28,29,30,31",
    "    RADIANT_ISR_NOERR \\n",
    ".endr",
    ".irp n, 8,10,11,12,13,14,17",
    "    RADIANT_ISR_ERR \\n",
    ".endr",
    ".irp n, 32,33,34,35,36,37,38,39,40,41,42,43,44,45,46,47,127,129",
    "    RADIANT_ISR_NOERR \\n",
    ".endr",
    "radiant_isr_common:",
    "    pushad",
    "    push ds",
    "    push es",
    "    push fs",
    "    push gs",
    "    mov ax, 0x10",
    "    mov ds, ax",
    "    mov es, ax",
    "    mov fs, ax",
    "    mov gs, ax",
    "    push esp",
    "    call radiant_trap_entry",
    "    add esp, 4",
    "    pop gs",
    "    pop fs",
    "    pop es",
    "    pop ds",
    "    popad",
    "    add esp, 8",
    "    iretd",
);

extern "C" {
    fn radiant_isr_0();
    fn radiant_isr_1();
    fn radiant_isr_2();
    fn radiant_isr_3();
    fn radiant_isr_4();
    fn radiant_isr_5();
    fn radiant_isr_6();
    fn radiant_isr_7();
    fn radiant_isr_8();
    fn radiant_isr_9();
    fn radiant_isr_10();
    fn radiant_isr_11();
    fn radiant_isr_12();
    fn radiant_isr_13();
    fn radiant_isr_14();
    fn radiant_isr_15();
    fn radiant_isr_16();
    fn radiant_isr_17();
    fn radiant_isr_18();
    fn radiant_isr_19();
    fn radiant_isr_20();
    fn radiant_isr_21();
    fn radiant_isr_22();
    fn radiant_isr_23();
    fn radiant_isr_24();
    fn radiant_isr_25();
    fn radiant_isr_26();
    fn radiant_isr_27();
    fn radiant_isr_28();
    fn radiant_isr_29();
    fn radiant_isr_30();
    fn radiant_isr_31();
    fn radiant_isr_32();
    fn radiant_isr_33();
    fn radiant_isr_34();
    fn radiant_isr_35();
    fn radiant_isr_36();
    fn radiant_isr_37();
    fn radiant_isr_38();
    fn radiant_isr_39();
    fn radiant_isr_40();
    fn radiant_isr_41();
    fn radiant_isr_42();
    fn radiant_isr_43();
    fn radiant_isr_44();
    fn radiant_isr_45();
    fn radiant_isr_46();
    fn radiant_isr_47();
    fn radiant_isr_127();
    fn radiant_isr_129();
}

/// Vetores que têm stub: exceções, IRQs remapeadas, syscall e yield.
pub const STUB_VECTORS: [u8; 50] = {
    let mut v = [0u8; 50];
    let mut i = 0;
    while i < 48 {
        v[i] = i as u8;
        i += 1;
    }
    v[48] = SYSCALL_VECTOR;
    v[49] = YIELD_VECTOR;
    v
};

const _: () = assert!(SYSCALL_VECTOR == 127 && YIELD_VECTOR == 129);

const STUBS: [unsafe extern "C" fn(); 48] = [
    radiant_isr_0, radiant_isr_1, radiant_isr_2, radiant_isr_3,
    radiant_isr_4, radiant_isr_5, radiant_isr_6, radiant_isr_7,
    radiant_isr_8, radiant_isr_9, radiant_isr_10, radiant_isr_11,
    radiant_isr_12, radiant_isr_13, radiant_isr_14, radiant_isr_15,
    radiant_isr_16, radiant_isr_17, radiant_isr_18, radiant_isr_19,
    radiant_isr_20, radiant_isr_21, radiant_isr_22, radiant_isr_23,
    radiant_isr_24, radiant_isr_25, radiant_isr_26, radiant_isr_27,
    radiant_isr_28, radiant_isr_29, radiant_isr_30, radiant_isr_31,
    radiant_isr_32, radiant_isr_33, radiant_isr_34, radiant_isr_35,
    radiant_isr_36, radiant_isr_37, radiant_isr_38, radiant_isr_39,
    radiant_isr_40, radiant_isr_41, radiant_isr_42, radiant_isr_43,
    radiant_isr_44, radiant_isr_45, radiant_isr_46, radiant_isr_47,
];

/// Endereço do stub de um vetor que consta em `STUB_VECTORS`.
pub fn isr_stub(vector: u8) -> u32 {
    let f: unsafe extern "C" fn() = match vector {
        SYSCALL_VECTOR => radiant_isr_127,
        YIELD_VECTOR => radiant_isr_129,
        v => STUBS[v as usize],
    };
    f as usize as u32
}

/// Liga os símbolos esperados pelo assembly à instância global do kernel:
/// `radiant_trap_entry` (chamado pelos stubs) e `radiant_idle_entry` (o
/// `eip` inicial da task idle).
///
/// ```ignore
/// static KERNEL: KernelCell<Board> = KernelCell::new();
/// radiant::radiant_kernel!(KERNEL);
/// // ...
/// KERNEL.with(|k| k.init_tasking(radiant_idle_entry as usize as u32));
/// ```
#[macro_export]
macro_rules! radiant_kernel {
    ($cell:path) => {
        #[no_mangle]
        pub extern "C" fn radiant_trap_entry(frame: &mut $crate::trap::TrapFrame) {
            $cell.trap_entry(frame);
        }

        #[no_mangle]
        pub extern "C" fn radiant_idle_entry() -> ! {
            $cell.idle_loop()
        }
    };
}
