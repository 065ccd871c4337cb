//! # Filesystem / Device Syscalls
//!
//! write, read, open, close, listdir
//!
//! Descritores abaixo de `VFS_MAX_DEVICES` são dispositivos montados; os
//! demais são arquivos abertos por `open` e pertencem à task que abriu.

use alloc::vec;
use alloc::vec::Vec;

use super::abi::SyscallArgs;
use super::error::{SysError, SysResult};
use super::uaccess::{copy_to_user, read_user_bytes, read_user_string, user_range_ok, write_user_word};
use crate::fs::{IoError, Node, OpenMode};
use crate::kernel::{Kernel, Machine};
use crate::sys::types::Word;

/// Bytes de uma entrada de diretório copiada para o userspace.
pub const NODE_SIZE: usize = core::mem::size_of::<Node>();

// === WRAPPERS ===

pub fn sys_write_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_write(k, args.arg1, args.arg2, args.arg3)
}

pub fn sys_read_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_read(k, args.arg1, args.arg2, args.arg3)
}

pub fn sys_open_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_open(k, args.arg1, args.arg2)
}

pub fn sys_close_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_close(k, args.arg1)
}

pub fn sys_listdir_wrapper<M: Machine>(k: &mut Kernel<M>, args: &SyscallArgs) -> SysResult<Word> {
    sys_listdir(k, args.arg1, args.arg2, args.arg3, args.arg4)
}

// === IMPLEMENTAÇÕES ===

/// Escreve `size` bytes de `buf` em `fd`. Devolve quantos foram escritos.
pub fn sys_write<M: Machine>(k: &mut Kernel<M>, fd: Word, size: Word, buf: Word) -> SysResult<Word> {
    let data = read_user_bytes(k, buf, size as usize)?;
    let caller = k.tasks.current();
    let n = k.vfs.write(fd as usize, &data, caller)?;
    Ok(n as Word)
}

/// Lê até `size` bytes de `fd` para `buf`. Devolve quantos foram lidos.
pub fn sys_read<M: Machine>(k: &mut Kernel<M>, fd: Word, size: Word, buf: Word) -> SysResult<Word> {
    let len = size as usize;
    if len != 0 && !user_range_ok(k, buf, len) {
        return Err(SysError::BadAddress);
    }
    let mut data = vec![0u8; len];
    let caller = k.tasks.current();
    let n = k.vfs.read(fd as usize, &mut data, caller)?;
    copy_to_user(k, buf, &data[..n.min(len)])?;
    Ok(n as Word)
}

/// Abre um arquivo normal (ou devolve o índice de um dispositivo).
pub fn sys_open<M: Machine>(k: &mut Kernel<M>, path_ptr: Word, mode: Word) -> SysResult<Word> {
    let mode = u8::try_from(mode)
        .ok()
        .and_then(OpenMode::from_bits)
        .filter(|m| !m.is_empty())
        .ok_or(SysError::InvalidArgument)?;
    let path = read_user_string(k, path_ptr)?;
    let caller = k.tasks.current();
    let fd = k.vfs.open(&path, mode, caller)?;
    crate::ktrace!("(Syscall) sys_open fd=", fd);
    Ok(fd as Word)
}

pub fn sys_close<M: Machine>(k: &mut Kernel<M>, fd: Word) -> SysResult<Word> {
    let caller = k.tasks.current();
    k.vfs.close(fd as usize, caller)?;
    Ok(0)
}

/// Lista um diretório em duas fases.
///
/// 1. `buf == 0`: só a contagem de filhos (também gravada em `count_ptr`).
/// 2. `buf != 0`: copia `count` entradas de `NODE_SIZE` bytes. Buffer menor
///    que `count * NODE_SIZE` dá ENOMEM sem cópia parcial.
///
/// Devolve a contagem nas duas fases.
pub fn sys_listdir<M: Machine>(
    k: &mut Kernel<M>,
    path_ptr: Word,
    buf: Word,
    buf_size: Word,
    count_ptr: Word,
) -> SysResult<Word> {
    let path = read_user_string(k, path_ptr)?;
    let dir = k.vfs.filesystem().find_dir(&path)?;
    if !k.task_assert(dir.is_valid(), "listdir: nó de diretório corrompido") {
        return Err(SysError::InvalidArgument);
    }
    let count = dir.size;

    if buf == 0 {
        if count_ptr != 0 {
            write_user_word(k, count_ptr, count)?;
        }
        return Ok(count);
    }

    let needed = (count as usize)
        .checked_mul(NODE_SIZE)
        .ok_or(SysError::OutOfMemory)?;
    if (buf_size as usize) < needed {
        return Err(SysError::OutOfMemory);
    }

    let nodes = k.vfs.filesystem().list_dir(&path)?;
    // o diretório pode ter mudado entre as duas fases
    if nodes.len() != count as usize {
        return Err(IoError::Device.into());
    }
    let mut out: Vec<u8> = Vec::with_capacity(needed);
    for node in &nodes {
        if !k.task_assert(node.is_valid(), "listdir: entrada corrompida") {
            return Err(SysError::InvalidArgument);
        }
        out.extend_from_slice(node.as_bytes());
    }
    copy_to_user(k, buf, &out)?;
    if count_ptr != 0 {
        write_user_word(k, count_ptr, count)?;
    }
    Ok(count)
}

// =============================================================================
// TESTS
// =============================================================================
