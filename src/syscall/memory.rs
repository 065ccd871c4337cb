//! # Memory Management Syscalls
//!
//! malloc, free sobre o heap privado da task corrente.

use super::abi::SyscallArgs;
use super::error::{SysError, SysResult};
use crate::kernel::{Kernel, Machine};
use crate::sys::types::Word;

pub fn sys_malloc_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_malloc(k, args.arg1)
}

pub fn sys_free_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_free(k, args.arg1)
}

/// Aloca `size` bytes no heap da task. Devolve o endereço de usuário.
///
/// Task com permissão de buffer não tem heap até o `request_buffer`.
pub fn sys_malloc<M: Machine>(k: &mut Kernel<M>, size: Word) -> SysResult<Word> {
    if size == 0 {
        return Err(SysError::InvalidArgument);
    }
    let tcb = k.tasks.current_tcb_mut().ok_or(SysError::OutOfMemory)?;
    let addr = tcb.heap.alloc(size).ok_or(SysError::OutOfMemory)?;
    crate::ktrace!("(Syscall) sys_malloc ->", addr);
    Ok(addr)
}

/// Libera um bloco do heap da task. Endereços estranhos são ignorados.
pub fn sys_free<M: Machine>(k: &mut Kernel<M>, addr: Word) -> SysResult<Word> {
    if addr == 0 {
        return Err(SysError::InvalidArgument);
    }
    if let Some(tcb) = k.tasks.current_tcb_mut() {
        tcb.heap.free(addr);
    }
    Ok(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::numbers::{SYS_FREE, SYS_MALLOC};
    use crate::testing::{boot_kernel, load_user, put_str, run_task, syscall, tasking_kernel};
    use crate::trap::TrapFrame;

    #[test]
    fn test_malloc_returns_address_in_own_heap() {
        let mut k = tasking_kernel();
        let space = load_user(&mut k, "/bin/hello", false);
        let id = k.spawn_from_slot(space.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, id);

        let a = syscall(&mut k, &mut frame, SYS_MALLOC as u32, [128, 0, 0, 0, 0]);
        let b = syscall(&mut k, &mut frame, SYS_MALLOC as u32, [128, 0, 0, 0, 0]);
        assert_eq!(SysError::from_word(a), None);
        assert!(a >= space.heap_start() && a < space.guard_page());
        assert!(b >= space.heap_start() && b < space.guard_page());
        assert_ne!(a, b);

        assert_eq!(syscall(&mut k, &mut frame, SYS_FREE as u32, [a, 0, 0, 0, 0]), 0);
        assert_eq!(syscall(&mut k, &mut frame, SYS_FREE as u32, [b, 0, 0, 0, 0]), 0);
        let used = match &k.tasks().get(id).unwrap().heap {
            crate::mm::TaskHeap::Heap(region) => region.used(),
            crate::mm::TaskHeap::NoHeapYet => usize::MAX,
        };
        assert_eq!(used, 0);
    }

    fn live_blocks(k: &Kernel<crate::testing::MockMachine>) -> usize {
        match &k.tasks().current_tcb().unwrap().heap {
            crate::mm::TaskHeap::Heap(region) => region.live_blocks(),
            crate::mm::TaskHeap::NoHeapYet => usize::MAX,
        }
    }

    #[test]
    fn test_repeated_and_forged_free_leave_heap_intact() {
        let mut k = tasking_kernel();
        let space = load_user(&mut k, "/bin/hello", false);
        let id = k.spawn_from_slot(space.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, id);

        let a = syscall(&mut k, &mut frame, SYS_MALLOC as u32, [64, 0, 0, 0, 0]);
        let b = syscall(&mut k, &mut frame, SYS_MALLOC as u32, [64, 0, 0, 0, 0]);
        assert_eq!(syscall(&mut k, &mut frame, SYS_FREE as u32, [a, 0, 0, 0, 0]), 0);
        assert_eq!(syscall(&mut k, &mut frame, SYS_FREE as u32, [a, 0, 0, 0, 0]), 0);
        assert_eq!(live_blocks(&k), 1);

        // tamanho falso escrito pela task dentro do bloco vivo
        put_str(&mut k, b, "\u{7f}\u{7f}\u{7f}\u{7f}");
        assert_eq!(syscall(&mut k, &mut frame, SYS_FREE as u32, [b + 8, 0, 0, 0, 0]), 0);
        assert_eq!(syscall(&mut k, &mut frame, SYS_FREE as u32, [space.heap_start(), 0, 0, 0, 0]), 0);
        assert_eq!(live_blocks(&k), 1);

        assert_eq!(syscall(&mut k, &mut frame, SYS_FREE as u32, [b, 0, 0, 0, 0]), 0);
        assert_eq!(live_blocks(&k), 0);
        let c = syscall(&mut k, &mut frame, SYS_MALLOC as u32, [64, 0, 0, 0, 0]);
        assert_eq!(SysError::from_word(c), None);
    }

    #[test]
    fn test_malloc_zero_and_free_null_are_invalid() {
        let mut k = tasking_kernel();
        let space = load_user(&mut k, "/bin/hello", false);
        let id = k.spawn_from_slot(space.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, id);

        assert_eq!(
            syscall(&mut k, &mut frame, SYS_MALLOC as u32, [0; 5]),
            SysError::InvalidArgument.as_word()
        );
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_FREE as u32, [0; 5]),
            SysError::InvalidArgument.as_word()
        );
    }

    #[test]
    fn test_malloc_without_heap_is_out_of_memory() {
        // com permissão de buffer o heap só nasce no request_buffer
        let mut k = tasking_kernel();
        let space = load_user(&mut k, "/bin/hello", true);
        let id = k.spawn_from_slot(space.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, id);
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_MALLOC as u32, [16, 0, 0, 0, 0]),
            SysError::OutOfMemory.as_word()
        );

        let mut k = boot_kernel();
        let mut frame = TrapFrame::default();
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_MALLOC as u32, [16, 0, 0, 0, 0]),
            SysError::OutOfMemory.as_word()
        );
    }

    #[test]
    fn test_malloc_larger_than_heap_fails() {
        let mut k = tasking_kernel();
        let space = load_user(&mut k, "/bin/hello", false);
        let id = k.spawn_from_slot(space.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, id);
        let too_big = space.guard_page() - space.heap_start();
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_MALLOC as u32, [too_big, 0, 0, 0, 0]),
            SysError::OutOfMemory.as_word()
        );
    }
}
