//! Sistema de arquivos visto pelo núcleo.
//!
//! O filesystem em si (blocos, nós, alocação) é colaborador externo, acessado
//! pelo trait `vfs::FileSystem`. A `Vfs` junta esse filesystem com os
//! dispositivos montados em `/dev` e a tabela de arquivos abertos usada pelas
//! syscalls de E/S.

pub mod node;
pub mod vfs;

pub use node::{Node, NodeFlags, NODE_MAGIC};
pub use vfs::{CharDevice, FileHandle, FileSystem, Fd, IoError, OpenMode, Vfs};
