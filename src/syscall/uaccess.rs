//! Acesso a memória de usuário.
//!
//! Único ponto onde ponteiros vindos do userspace são desreferenciados. Com
//! uma task de usuário corrente, o intervalo tem que caber inteiro no slot
//! dela. Em contexto de kernel (sem task de usuário) basta cair num único
//! slot alocado. Em nenhum caso o intervalo pode encostar na guard page,
//! que fica desmapeada no diretório da task.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use super::error::{SysError, SysResult};
use crate::kernel::{Kernel, Machine};
use crate::mm::config::{guard_page, slot_end, slot_of, PAGE_SIZE};
use crate::sys::types::Word;

/// Maior caminho aceito, com o NUL.
pub const MAX_PATH: usize = 256;

/// `[addr, addr + len)` pode ser tocado em nome do chamador?
pub fn user_range_ok<M>(kernel: &Kernel<M>, addr: Word, len: usize) -> bool {
    let Some(end) = (addr as usize).checked_add(len) else {
        return false;
    };
    let Some(slot) = slot_of(addr) else {
        return false;
    };
    let in_bounds = match kernel.tasks.current_tcb().and_then(|t| t.address_space()) {
        Some(space) => space.contains(addr, len),
        None => kernel.spaces.is_allocated(slot) && end <= slot_end(slot) as usize,
    };
    let guard = guard_page(slot) as usize;
    in_bounds && (end <= guard || addr as usize >= guard + PAGE_SIZE as usize)
}

fn user_ptr<M: Machine>(kernel: &Kernel<M>, addr: Word, len: usize) -> SysResult<*mut u8> {
    if !user_range_ok(kernel, addr, len) {
        crate::kwarn!("(Uaccess) Ponteiro de usuário rejeitado: ", addr);
        return Err(SysError::BadAddress);
    }
    kernel.machine.kernel_ptr(addr).ok_or(SysError::BadAddress)
}

/// Copia `dst.len()` bytes de `addr`. Nada é copiado se falhar.
pub fn copy_from_user<M: Machine>(kernel: &Kernel<M>, addr: Word, dst: &mut [u8]) -> SysResult<()> {
    if dst.is_empty() {
        return Ok(());
    }
    let src = user_ptr(kernel, addr, dst.len())?;
    // SAFETY: o intervalo foi validado dentro de um slot, e `kernel_ptr`
    // vale até o fim do slot.
    unsafe { core::ptr::copy_nonoverlapping(src, dst.as_mut_ptr(), dst.len()) };
    Ok(())
}

/// Copia `src` para `addr`. Nada é copiado se falhar.
pub fn copy_to_user<M: Machine>(kernel: &mut Kernel<M>, addr: Word, src: &[u8]) -> SysResult<()> {
    if src.is_empty() {
        return Ok(());
    }
    let dst = user_ptr(kernel, addr, src.len())?;
    // SAFETY: idem `copy_from_user`.
    unsafe { core::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len()) };
    Ok(())
}

/// Lê `len` bytes para um buffer novo (validado antes de alocar).
pub fn read_user_bytes<M: Machine>(kernel: &Kernel<M>, addr: Word, len: usize) -> SysResult<Vec<u8>> {
    if len != 0 && !user_range_ok(kernel, addr, len) {
        crate::kwarn!("(Uaccess) Ponteiro de usuário rejeitado: ", addr);
        return Err(SysError::BadAddress);
    }
    let mut buf = vec![0u8; len];
    copy_from_user(kernel, addr, &mut buf)?;
    Ok(buf)
}

pub fn write_user_word<M: Machine>(kernel: &mut Kernel<M>, addr: Word, value: Word) -> SysResult<()> {
    copy_to_user(kernel, addr, &value.to_ne_bytes())
}

/// String terminada em NUL, até `MAX_PATH` bytes e sem sair do slot.
pub fn read_user_string<M: Machine>(kernel: &Kernel<M>, addr: Word) -> SysResult<String> {
    let slot = slot_of(addr).ok_or(SysError::BadAddress)?;
    // abaixo da guard page a leitura para nela
    let limit = if addr < guard_page(slot) { guard_page(slot) } else { slot_end(slot) };
    let len = ((limit - addr) as usize).min(MAX_PATH);
    let mut buf = [0u8; MAX_PATH];
    copy_from_user(kernel, addr, &mut buf[..len])?;
    let end = buf[..len]
        .iter()
        .position(|&b| b == 0)
        .ok_or(SysError::InvalidArgument)?;
    core::str::from_utf8(&buf[..end])
        .map(String::from)
        .map_err(|_| SysError::InvalidArgument)
}

// =============================================================================
// TESTS
// =============================================================================
