//! Task Control Block

use alloc::boxed::Box;

use super::id::TaskId;
use super::state::TaskState;
use crate::mm::config::PAGE_SIZE;
use crate::mm::{PageDir, TaskHeap};
use crate::sched::config::KERNEL_STACK_SIZE;
use crate::sched::exec::ProcessAddressSpace;
use crate::sys::types::{addr_word, Word};
use crate::trap::TrapFrame;

/// Motivo gravado como código de retorno de uma task morta pelo kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum KillReason {
    Killed = 1,
    SegmentationFault = 2,
    AssertFailed = 3,
}

/// Stack de kernel privada. Alinhada ao próprio tamanho para nunca cruzar
/// uma fronteira de 4 GiB (os frames guardam endereços de 32 bits).
#[repr(C, align(4096))]
pub struct KernelStack([u8; KERNEL_STACK_SIZE]);

impl KernelStack {
    fn new_boxed() -> Box<Self> {
        Box::new(KernelStack([0; KERNEL_STACK_SIZE]))
    }
}

/// Privilégio da task. Tasks de usuário são donas do seu espaço.
#[derive(Debug)]
pub enum TaskKind {
    Kernel,
    User(ProcessAddressSpace),
}

/// Task Control Block
pub struct Tcb {
    /// Id estável (slot + geração)
    pub id: TaskId,
    /// Kernel ou usuário (com o espaço de endereçamento)
    pub kind: TaskKind,
    /// Registradores salvos, usados para retomar a task
    pub frame: TrapFrame,
    /// Heap privado, criado sob demanda
    pub heap: TaskHeap,
    /// Diretório de páginas próprio
    pub page_dir: PageDir,
    pub state: TaskState,
    /// Ticks restantes de sleep (só vale em `Blocked`)
    pub sleep_remaining: u32,
    /// Contador reentrante de supressão de preempção
    pub preempt_depth: u32,
    /// Código de saída ou `KillReason`
    pub return_code: u32,
    pub buffer_width: u32,
    pub buffer_height: u32,
    kernel_stack: Box<KernelStack>,
}

impl Tcb {
    /// Task de kernel (ring 0) começando em `entry`.
    pub fn kernel(id: TaskId, entry: Word, page_dir: PageDir) -> Self {
        let mut tcb = Self::blank(id, TaskKind::Kernel, page_dir);
        tcb.frame = TrapFrame::kernel(entry, tcb.kernel_stack_top());
        tcb
    }

    /// Task de usuário (ring 3) no slot de `space`.
    pub fn user(id: TaskId, space: ProcessAddressSpace, page_dir: PageDir, heap: TaskHeap) -> Self {
        let frame = TrapFrame::user(space.entry(), space.user_stack_top());
        let mut tcb = Self::blank(id, TaskKind::User(space), page_dir);
        tcb.frame = frame;
        tcb.heap = heap;
        tcb
    }

    fn blank(id: TaskId, kind: TaskKind, page_dir: PageDir) -> Self {
        Self {
            id,
            kind,
            frame: TrapFrame::default(),
            heap: TaskHeap::NoHeapYet,
            page_dir,
            state: TaskState::Ready,
            sleep_remaining: 0,
            preempt_depth: 0,
            return_code: 0,
            buffer_width: 0,
            buffer_height: 0,
            kernel_stack: KernelStack::new_boxed(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.kind, TaskKind::User(_))
    }

    pub fn address_space(&self) -> Option<&ProcessAddressSpace> {
        match &self.kind {
            TaskKind::User(space) => Some(space),
            TaskKind::Kernel => None,
        }
    }

    pub fn address_space_mut(&mut self) -> Option<&mut ProcessAddressSpace> {
        match &mut self.kind {
            TaskKind::User(space) => Some(space),
            TaskKind::Kernel => None,
        }
    }

    /// Endereço mais baixo da stack de kernel.
    pub fn kernel_stack_bottom(&self) -> Word {
        addr_word(self.kernel_stack.0.as_ptr())
    }

    /// Topo (exclusivo) da stack de kernel; vai para o TSS.esp0.
    pub fn kernel_stack_top(&self) -> Word {
        self.kernel_stack_bottom()
            .wrapping_add(KERNEL_STACK_SIZE as Word)
    }

    /// `esp` está dentro da stack de kernel (topo incluso: stack vazia).
    pub fn kernel_stack_contains(&self, esp: Word) -> bool {
        esp.wrapping_sub(self.kernel_stack_bottom()) <= KERNEL_STACK_SIZE as Word
    }

    /// Stack de usuário salva está acima da guard page e dentro do slot.
    pub fn user_stack_ok(&self) -> bool {
        match self.address_space() {
            Some(space) => {
                let sp = self.frame.useresp;
                sp >= space.guard_page() + PAGE_SIZE && sp <= space.end()
            }
            None => true,
        }
    }
}

impl core::fmt::Debug for Tcb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tcb")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("user", &self.is_user())
            .field("sleep_remaining", &self.sleep_remaining)
            .field("preempt_depth", &self.preempt_depth)
            .finish()
    }
}
