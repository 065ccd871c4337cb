//! # Display Syscalls
//!
//! get_display_info, request_buffer, buffer_ready
//!
//! O buffer de uma task fica no topo do heap dela, logo abaixo da guard
//! page. Só pode ser pedido uma vez, e só se o slot foi carregado com
//! permissão de buffer.

use super::abi::SyscallArgs;
use super::error::{SysError, SysResult};
use super::uaccess::copy_to_user;
use crate::drivers::display::{BYTES_PER_PIXEL, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::kernel::{Kernel, Machine};
use crate::klib::align_up;
use crate::mm::config::{LFB_SIZE, LFB_VADDR, PAGE_SIZE};
use crate::mm::TaskHeap;
use crate::sched::exec::BufferFlags;
use crate::sched::task::lifecycle::build_heap;
use crate::sys::types::Word;

pub fn sys_get_display_info_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_get_display_info(k, args.arg1)
}

pub fn sys_request_buffer_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_request_buffer(k, args.arg1, args.arg2)
}

pub fn sys_buffer_ready_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_buffer_ready(k, args.arg1, args.arg2)
}

/// Copia a geometria da tela. O framebuffer é o endereço visto pelo
/// userspace, não o físico.
pub fn sys_get_display_info<M: Machine>(k: &mut Kernel<M>, info_ptr: Word) -> SysResult<Word> {
    if info_ptr == 0 {
        return Err(SysError::InvalidArgument);
    }
    let mut info = k.machine.info();
    info.framebuffer = LFB_VADDR;
    copy_to_user(k, info_ptr, &info.to_bytes())?;
    Ok(0)
}

/// Reserva um buffer `width` x `height` e cria o heap abaixo dele.
/// Devolve o endereço de usuário do buffer.
pub fn sys_request_buffer<M: Machine>(k: &mut Kernel<M>, width: Word, height: Word) -> SysResult<Word> {
    // o kernel desenha direto em LFB_VADDR
    let Kernel { tasks, machine, .. } = k;
    let tcb = tasks
        .current_tcb_mut()
        .filter(|t| t.is_user())
        .ok_or(SysError::PermissionDenied)?;

    if width == 0 || height == 0 || width > SCREEN_WIDTH || height > SCREEN_HEIGHT {
        return Err(SysError::InvalidArgument);
    }
    let size = width * height * BYTES_PER_PIXEL;
    if size > LFB_SIZE {
        return Err(SysError::OutOfMemory);
    }

    let space = *tcb.address_space().ok_or(SysError::PermissionDenied)?;
    if !space.buffer_allowed() {
        return Err(SysError::PermissionDenied);
    }
    if space.buffer_requested() {
        return Err(SysError::AlreadyExists);
    }

    let buffer_start = space.guard_page() - align_up(size, PAGE_SIZE);
    let region = build_heap(&*machine, space.heap_start(), buffer_start).ok_or(SysError::OutOfMemory)?;

    tcb.heap = TaskHeap::Heap(region);
    tcb.buffer_width = width;
    tcb.buffer_height = height;
    if let Some(space) = tcb.address_space_mut() {
        space.buffer |= BufferFlags::REQUESTED;
        space.buffer_start = buffer_start;
    }
    crate::kdebug!("(Syscall) Buffer criado em ", buffer_start);
    Ok(buffer_start)
}

/// Entrega o buffer da task ao compositor na posição (x, y).
pub fn sys_buffer_ready<M: Machine>(k: &mut Kernel<M>, x: Word, y: Word) -> SysResult<Word> {
    let tcb = k
        .tasks
        .current_tcb()
        .filter(|t| t.is_user())
        .ok_or(SysError::PermissionDenied)?;
    if x > SCREEN_WIDTH || y > SCREEN_HEIGHT {
        return Err(SysError::InvalidArgument);
    }
    if !tcb.address_space().is_some_and(|s| s.buffer_requested()) {
        return Err(SysError::PermissionDenied);
    }
    let id = tcb.id;
    k.machine.queue_buffer(id, x, y);
    Ok(0)
}

// =============================================================================
// TESTS
// =============================================================================
