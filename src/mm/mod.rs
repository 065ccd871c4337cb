//! Memória vista pelo núcleo de processos.
//!
//! Paginação e frames são colaboradores externos (`paging`); aqui ficam o
//! layout dos slots de usuário (`config`) e o heap privado de cada task
//! (`heap`).

pub mod config;
pub mod heap;
pub mod paging;

pub use heap::{HeapRegion, TaskHeap};
pub use paging::{PageDir, Paging, UserMemory};
