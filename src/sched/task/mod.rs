//! Task management module

pub mod entity;
pub mod id;
pub mod lifecycle;
pub mod state;

pub use entity::{KillReason, TaskKind, Tcb};
pub use id::TaskId;
pub use state::TaskState;
