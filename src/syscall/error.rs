//! Códigos de Erro do Radiant
//!
//! Erros são devolvidos em EAX como o negativo do código. Ids, estados e
//! endereços de usuário ficam todos abaixo de 0x8000_0000, então um
//! resultado com o bit 31 ligado é sempre erro.

use crate::fs::IoError;
use crate::sched::exec::LoadError;
use crate::sched::table::TaskError;
use crate::sys::types::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SysError {
    /// EPERM: operação não permitida
    PermissionDenied = 0x01,
    /// ENOENT: arquivo ou diretório não existe
    NotFound = 0x02,
    /// ESRCH: task não existe
    NoSuchProcess = 0x03,
    /// EIO: erro do driver
    Io = 0x05,
    /// EBUSY: recurso em uso
    Busy = 0x10,
    /// ENOMEM: sem memória / buffer pequeno demais
    OutOfMemory = 0x12,
    /// ENODEV: dispositivo/descritor inexistente
    NoDevice = 0x13,
    /// EFAULT: ponteiro de usuário inválido
    BadAddress = 0x14,
    /// EINVAL: argumento inválido
    InvalidArgument = 0x16,
    /// EEXIST: já existe
    AlreadyExists = 0x17,
}

impl SysError {
    /// Valor gravado em EAX.
    #[inline]
    pub fn as_word(self) -> Word {
        (self as u32).wrapping_neg()
    }

    /// Decodifica um resultado de syscall; `None` se não for erro.
    pub fn from_word(word: Word) -> Option<Self> {
        match word.wrapping_neg() {
            0x01 => Some(Self::PermissionDenied),
            0x02 => Some(Self::NotFound),
            0x03 => Some(Self::NoSuchProcess),
            0x05 => Some(Self::Io),
            0x10 => Some(Self::Busy),
            0x12 => Some(Self::OutOfMemory),
            0x13 => Some(Self::NoDevice),
            0x14 => Some(Self::BadAddress),
            0x16 => Some(Self::InvalidArgument),
            0x17 => Some(Self::AlreadyExists),
            _ => None,
        }
    }
}

/// Resultado de syscall: Ok(valor) ou Err(SysError)
pub type SysResult<T> = Result<T, SysError>;

/// Valor final de EAX.
pub fn result_to_word(result: SysResult<Word>) -> Word {
    match result {
        Ok(val) => val,
        Err(e) => e.as_word(),
    }
}

impl From<IoError> for SysError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::NotFound => SysError::NotFound,
            IoError::NotADirectory => SysError::InvalidArgument,
            IoError::Unsupported | IoError::BadDescriptor => SysError::NoDevice,
            IoError::PermissionDenied => SysError::PermissionDenied,
            IoError::Busy => SysError::Busy,
            IoError::TableFull => SysError::OutOfMemory,
            IoError::Device => SysError::Io,
        }
    }
}

impl From<TaskError> for SysError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::TableFull | TaskError::OutOfMemory => SysError::OutOfMemory,
            TaskError::NoSuchTask => SysError::NoSuchProcess,
            TaskError::IdleTask | TaskError::TaskingOff => SysError::PermissionDenied,
            TaskError::NotLoaded => SysError::InvalidArgument,
            TaskError::Busy => SysError::Busy,
        }
    }
}

impl From<LoadError> for SysError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::NotFound => SysError::NotFound,
            LoadError::InvalidBinary | LoadError::NotLoaded => SysError::InvalidArgument,
            LoadError::TooLarge | LoadError::NoFreeSlot | LoadError::OutOfMemory => {
                SysError::OutOfMemory
            }
            LoadError::Io => SysError::Io,
            LoadError::Busy => SysError::Busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_negative_words() {
        assert_eq!(SysError::InvalidArgument.as_word(), 0xFFFF_FFEA);
        assert_eq!(SysError::PermissionDenied.as_word() as i32, -1);
        assert_eq!(SysError::from_word(0xFFFF_FFEC), Some(SysError::BadAddress));
        assert_eq!(SysError::from_word(3), None);
        assert_eq!(SysError::from_word(0), None);
    }

    #[test]
    fn test_collaborator_errors_map_to_errno() {
        assert_eq!(SysError::from(IoError::NotFound), SysError::NotFound);
        assert_eq!(SysError::from(TaskError::NoSuchTask), SysError::NoSuchProcess);
        assert_eq!(SysError::from(LoadError::TooLarge), SysError::OutOfMemory);
        assert_eq!(SysError::from(LoadError::Busy), SysError::Busy);
    }
}
