//! Task State Segment do i386.
//!
//! Só `esp0`/`ss0` são usados: o hardware troca para essa stack em todo
//! trap vindo de ring 3. O descritor na GDT é responsabilidade do boot.

use core::ptr::NonNull;

use volatile::VolatilePtr;

use crate::arch::traits::PrivilegedStack;
use crate::sched::config::KERNEL_DATA_SELECTOR;
use crate::sys::types::Word;

#[repr(C)]
pub struct TaskStateSegment {
    pub prev_tss: u32,
    pub esp0: u32,
    pub ss0: u32,
    pub esp1: u32,
    pub ss1: u32,
    pub esp2: u32,
    pub ss2: u32,
    pub cr3: u32,
    pub eip: u32,
    pub eflags: u32,
    pub eax: u32,
    pub ecx: u32,
    pub edx: u32,
    pub ebx: u32,
    pub esp: u32,
    pub ebp: u32,
    pub esi: u32,
    pub edi: u32,
    pub es: u32,
    pub cs: u32,
    pub ss: u32,
    pub ds: u32,
    pub fs: u32,
    pub gs: u32,
    pub ldt: u32,
    pub trap: u16,
    pub iomap_base: u16,
}

impl TaskStateSegment {
    const fn new() -> Self {
        Self {
            prev_tss: 0,
            esp0: 0,
            ss0: KERNEL_DATA_SELECTOR as u32,
            esp1: 0,
            ss1: 0,
            esp2: 0,
            ss2: 0,
            cr3: 0,
            eip: 0,
            eflags: 0,
            eax: 0,
            ecx: 0,
            edx: 0,
            ebx: 0,
            esp: 0,
            ebp: 0,
            esi: 0,
            edi: 0,
            es: 0,
            cs: 0,
            ss: 0,
            ds: 0,
            fs: 0,
            gs: 0,
            ldt: 0,
            trap: 0,
            iomap_base: core::mem::size_of::<TaskStateSegment>() as u16,
        }
    }
}

static TSS: spin::Mutex<TaskStateSegment> = spin::Mutex::new(TaskStateSegment::new());

/// Endereço e limite do TSS, para o descritor da GDT.
pub fn descriptor_base_limit() -> (u32, u32) {
    let tss = TSS.lock();
    let base = &*tss as *const TaskStateSegment as usize as u32;
    (base, core::mem::size_of::<TaskStateSegment>() as u32 - 1)
}

/// Implementação de `PrivilegedStack` sobre o TSS global.
pub struct TssStack;

impl PrivilegedStack for TssStack {
    fn set_kernel_stack(&mut self, top: Word) {
        let mut tss = TSS.lock();
        let esp0 = core::ptr::addr_of_mut!(tss.esp0);
        // SAFETY: campo do TSS estático, protegido pelo lock; o hardware lê
        // esse valor sem passar pelo compilador.
        unsafe { VolatilePtr::new(NonNull::new_unchecked(esp0)).write(top) };
    }
}
