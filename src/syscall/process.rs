//! # Process Lifecycle
//!
//! exit, load, create_task, get_state, destroy_process
//!
//! O userspace guarda só uma cópia do descritor do slot
//! (`AddressSpaceDescriptor`). Na volta, só o índice do slot é lido; as
//! permissões vêm sempre do registro do kernel.

use super::abi::SyscallArgs;
use super::error::{SysError, SysResult};
use super::numbers::LOAD_ALLOW_BUFFER;
use super::uaccess::{copy_from_user, copy_to_user, read_user_string, write_user_word};
use crate::kernel::{Kernel, Machine};
use crate::sched::exec::AddressSpaceDescriptor;
use crate::sched::task::{TaskId, TaskState};
use crate::sys::types::Word;

// === WRAPPERS ===

pub fn sys_exit_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_exit(k, args.arg1)
}

pub fn sys_load_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_load(k, args.arg1, args.arg2, args.arg3)
}

pub fn sys_destroy_process_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_destroy_process(k, args.arg1)
}

pub fn sys_create_task_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_create_task(k, args.arg1)
}

pub fn sys_get_state_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_get_state(k, args.arg1, args.arg2)
}

// === IMPLEMENTAÇÕES ===

/// Encerra a task corrente. Não volta para o chamador.
pub fn sys_exit<M: Machine>(k: &mut Kernel<M>, code: Word) -> SysResult<Word> {
    crate::kdebug!("(Syscall) sys_exit code=", code);
    k.exit_current(code)?;
    Ok(0)
}

/// Carrega o binário em `path_ptr` num slot e copia o descritor para
/// `desc_ptr`.
pub fn sys_load<M: Machine>(k: &mut Kernel<M>, path_ptr: Word, desc_ptr: Word, flags: Word) -> SysResult<Word> {
    if desc_ptr == 0 {
        return Err(SysError::InvalidArgument);
    }
    let path = read_user_string(k, path_ptr)?;
    let space = k.load_process(&path, flags & LOAD_ALLOW_BUFFER != 0)?;

    if let Err(e) = copy_to_user(k, desc_ptr, &space.descriptor().to_bytes()) {
        // ninguém vai saber o slot: desfaz a carga
        let _ = k.destroy_process(space.slot());
        return Err(e);
    }
    Ok(0)
}

fn read_descriptor<M: Machine>(k: &Kernel<M>, desc_ptr: Word) -> SysResult<AddressSpaceDescriptor> {
    if desc_ptr == 0 {
        return Err(SysError::InvalidArgument);
    }
    let mut raw = [0u8; AddressSpaceDescriptor::SIZE];
    copy_from_user(k, desc_ptr, &mut raw)?;
    Ok(AddressSpaceDescriptor::from_bytes(&raw))
}

pub fn sys_destroy_process<M: Machine>(k: &mut Kernel<M>, desc_ptr: Word) -> SysResult<Word> {
    let desc = read_descriptor(k, desc_ptr)?;
    k.destroy_process(desc.slot as usize)?;
    Ok(0)
}

/// Cria a task de um slot carregado. Devolve o id.
pub fn sys_create_task<M: Machine>(k: &mut Kernel<M>, desc_ptr: Word) -> SysResult<Word> {
    let desc = read_descriptor(k, desc_ptr)?;
    let id = k.spawn_from_slot(desc.slot as usize)?;
    Ok(id.as_word())
}

/// Estado da task `id`. Se terminou, o código de retorno vai para
/// `ret_ptr` (quando não nulo). Uma task de usuário já coletada continua
/// respondendo `Terminated` até o `destroy_process` do slot; depois, ESRCH.
pub fn sys_get_state<M: Machine>(k: &mut Kernel<M>, id: Word, ret_ptr: Word) -> SysResult<Word> {
    let id = TaskId::from_word(id);
    let (state, ret) = match k.tasks.get(id) {
        Some(tcb) => (tcb.state, tcb.return_code),
        None => {
            let code = k.spaces.exit_code(id).ok_or(SysError::NoSuchProcess)?;
            (TaskState::Terminated, code)
        }
    };

    if state == TaskState::Terminated && ret_ptr != 0 {
        write_user_word(k, ret_ptr, ret)?;
    }
    Ok(state.as_word())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::config::slot_base;
    use crate::sched::exec::BufferFlags;
    use crate::sched::task::KillReason;
    use crate::sched::SleepAction;
    use crate::syscall::numbers::*;
    use crate::testing::{load_user, put_str, run_task, syscall, tasking_kernel, tick, yield_now};
    use crate::trap::TrapFrame;

    #[test]
    fn test_load_then_create_from_user_task() {
        let mut k = tasking_kernel();
        let shell = load_user(&mut k, "/bin/shell", false);
        let shell_id = k.spawn_from_slot(shell.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, shell_id);

        let path = put_str(&mut k, shell.base() + 0x3000, "/bin/clock");
        let desc_ptr = shell.base() + 0x3100;
        assert_eq!(syscall(&mut k, &mut frame, SYS_LOAD as u32, [path, desc_ptr, 0, 0, 0]), 0);

        let mut raw = [0u8; AddressSpaceDescriptor::SIZE];
        copy_from_user(&k, desc_ptr, &mut raw).unwrap();
        let desc = AddressSpaceDescriptor::from_bytes(&raw);
        assert_eq!(desc.slot, 1);
        assert_eq!(desc.flags, 0);

        let id = syscall(&mut k, &mut frame, SYS_CREATE_TASK as u32, [desc_ptr, 0, 0, 0, 0]);
        let child = TaskId::from_word(id);
        assert_eq!(k.tasks().get(child).map(|t| t.state), Some(TaskState::Ready));
        assert_eq!(
            k.tasks().get(child).and_then(|t| t.address_space()).map(|s| s.slot()),
            Some(1)
        );

        // segundo create no mesmo slot
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_CREATE_TASK as u32, [desc_ptr, 0, 0, 0, 0]),
            SysError::Busy.as_word()
        );
    }

    #[test]
    fn test_forged_descriptor_flags_are_ignored() {
        let mut k = tasking_kernel();
        let shell = load_user(&mut k, "/bin/shell", false);
        let shell_id = k.spawn_from_slot(shell.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, shell_id);

        let child = load_user(&mut k, "/bin/clock", false);
        let mut desc = child.descriptor();
        desc.flags = BufferFlags::ALLOWED.bits() as u32;
        let desc_ptr = shell.base() + 0x3100;
        copy_to_user(&mut k, desc_ptr, &desc.to_bytes()).unwrap();

        let id = syscall(&mut k, &mut frame, SYS_CREATE_TASK as u32, [desc_ptr, 0, 0, 0, 0]);
        let tcb = k.tasks().get(TaskId::from_word(id)).unwrap();
        assert!(!tcb.address_space().unwrap().buffer_allowed());
    }

    #[test]
    fn test_get_state_reports_return_code_and_destroy() {
        let mut k = tasking_kernel();
        let shell = load_user(&mut k, "/bin/shell", false);
        let shell_id = k.spawn_from_slot(shell.slot()).unwrap();
        let child = load_user(&mut k, "/bin/clock", false);
        let child_id = k.spawn_from_slot(child.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, shell_id);

        let ret_ptr = shell.base() + 0x3200;
        let desc_ptr = shell.base() + 0x3100;
        copy_to_user(&mut k, desc_ptr, &child.descriptor().to_bytes()).unwrap();
        let id = child_id.as_word();

        assert_eq!(
            syscall(&mut k, &mut frame, SYS_GET_STATE as u32, [id, ret_ptr, 0, 0, 0]),
            TaskState::Ready.as_word()
        );
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_DESTROY_PROCESS as u32, [desc_ptr, 0, 0, 0, 0]),
            SysError::Busy.as_word()
        );

        k.kill_task(child_id, KillReason::SegmentationFault).unwrap();
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_GET_STATE as u32, [id, ret_ptr, 0, 0, 0]),
            TaskState::Terminated.as_word()
        );
        let mut ret = [0u8; 4];
        copy_from_user(&k, ret_ptr, &mut ret).unwrap();
        assert_eq!(u32::from_ne_bytes(ret), KillReason::SegmentationFault as u32);

        assert_eq!(syscall(&mut k, &mut frame, SYS_DESTROY_PROCESS as u32, [desc_ptr, 0, 0, 0, 0]), 0);
        assert!(!k.spaces().is_allocated(child.slot()));

        k.cleanup_terminated();
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_GET_STATE as u32, [id, ret_ptr, 0, 0, 0]),
            SysError::NoSuchProcess.as_word()
        );
    }

    #[test]
    fn test_return_code_survives_reap_while_parent_sleeps() {
        let mut k = tasking_kernel();
        let shell = load_user(&mut k, "/bin/shell", false);
        let shell_id = k.spawn_from_slot(shell.slot()).unwrap();
        let child = load_user(&mut k, "/bin/clock", false);
        let child_id = k.spawn_from_slot(child.slot()).unwrap();
        let mut frame = TrapFrame::default();

        // o filho sai com 42
        run_task(&mut k, &mut frame, child_id);
        syscall(&mut k, &mut frame, SYS_EXIT as u32, [42, 0, 0, 0, 0]);

        // o pai dorme; sem ninguém Ready a idle roda e coleta o filho
        run_task(&mut k, &mut frame, shell_id);
        assert_eq!(k.begin_sleep(3), SleepAction::Yield);
        yield_now(&mut k, &mut frame);
        assert_eq!(k.current_task(), Some(TaskId::IDLE));
        assert_eq!(k.cleanup_terminated(), 1);
        assert!(k.tasks().get(child_id).is_none());
        for _ in 0..3 {
            tick(&mut k, &mut frame);
        }
        assert_eq!(k.current_task(), Some(shell_id));

        let ret_ptr = shell.base() + 0x3200;
        let desc_ptr = shell.base() + 0x3100;
        let id = child_id.as_word();
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_GET_STATE as u32, [id, ret_ptr, 0, 0, 0]),
            TaskState::Terminated.as_word()
        );
        let mut ret = [0u8; 4];
        copy_from_user(&k, ret_ptr, &mut ret).unwrap();
        assert_eq!(u32::from_ne_bytes(ret), 42);

        copy_to_user(&mut k, desc_ptr, &child.descriptor().to_bytes()).unwrap();
        assert_eq!(syscall(&mut k, &mut frame, SYS_DESTROY_PROCESS as u32, [desc_ptr, 0, 0, 0, 0]), 0);
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_GET_STATE as u32, [id, ret_ptr, 0, 0, 0]),
            SysError::NoSuchProcess.as_word()
        );
    }

    #[test]
    fn test_exit_switches_away_without_writing_result() {
        let mut k = tasking_kernel();
        let space = load_user(&mut k, "/bin/hello", false);
        let id = k.spawn_from_slot(space.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, id);

        syscall(&mut k, &mut frame, SYS_EXIT as u32, [42, 0, 0, 0, 0]);
        let tcb = k.tasks().get(id).unwrap();
        assert_eq!(tcb.state, TaskState::Terminated);
        assert_eq!(tcb.return_code, 42);
        assert_eq!(tcb.frame.eax, SYS_EXIT as u32);
        assert_eq!(k.current_task(), Some(TaskId::IDLE));
    }

    #[test]
    fn test_load_rejects_bad_pointers() {
        let mut k = tasking_kernel();
        let shell = load_user(&mut k, "/bin/shell", false);
        let shell_id = k.spawn_from_slot(shell.slot()).unwrap();
        let mut frame = TrapFrame::default();
        run_task(&mut k, &mut frame, shell_id);

        let path = put_str(&mut k, shell.base() + 0x3000, "/bin/clock");
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_LOAD as u32, [path, 0, 0, 0, 0]),
            SysError::InvalidArgument.as_word()
        );
        // descritor fora do slot do chamador: a carga é desfeita
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_LOAD as u32, [path, slot_base(7), 0, 0, 0]),
            SysError::BadAddress.as_word()
        );
        assert_eq!(k.spaces().allocated_count(), 1);
        let missing = put_str(&mut k, shell.base() + 0x3000, "/bin/missing");
        assert_eq!(
            syscall(&mut k, &mut frame, SYS_LOAD as u32, [missing, shell.base() + 0x3100, 0, 0, 0]),
            SysError::NotFound.as_word()
        );
    }
}
