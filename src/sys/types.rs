//! Tipos fundamentais do sistema

/// Palavra de máquina do i386. Registradores, endereços de usuário,
/// argumentos e retorno de syscall.
pub type Word = u32;

/// Converte um ponteiro do kernel para a palavra guardada nos frames.
///
/// Em i386 é a identidade; no backend hosted o endereço é truncado, o que
/// só é usado para comparar faixas de stack alinhadas em 4 KiB.
#[inline]
pub fn addr_word<T>(ptr: *const T) -> Word {
    ptr as usize as Word
}
