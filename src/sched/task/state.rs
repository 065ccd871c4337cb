//! Estados de task

/// Estado de uma task.
///
/// `Ready -> Running -> {Ready, Blocked, Terminated}`; `Blocked -> Ready`
/// só quando a contagem de sleep chega a zero. `Terminated` é absorvente até
/// a coleta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TaskState {
    Ready = 0,
    Running = 1,
    Blocked = 2,
    Terminated = 3,
}

impl TaskState {
    /// Verifica se pode ser escalonada
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }

    /// Valor devolvido por `get_state`.
    pub const fn as_word(self) -> u32 {
        self as u32
    }
}
