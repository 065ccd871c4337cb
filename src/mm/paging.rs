//! Interfaces de paginação consumidas pelo núcleo.
//!
//! Frames, tabelas de página e o mapeamento em si pertencem ao VMM; o
//! núcleo só pede operações em termos de diretórios opacos.

use crate::sys::types::Word;

/// Diretório de páginas (valor de CR3 no i386).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDir(pub Word);

/// Falha do colaborador de paginação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingError {
    OutOfFrames,
}

pub trait Paging {
    /// Diretório do kernel (template de todos os outros).
    fn kernel_dir(&self) -> PageDir;

    /// Novo diretório copiado do template do kernel.
    fn clone_kernel_dir(&mut self) -> Result<PageDir, PagingError>;

    /// Devolve um diretório criado por `clone_kernel_dir`.
    fn release_dir(&mut self, dir: PageDir);

    /// Ativa `dir` (escreve CR3).
    fn switch_dir(&mut self, dir: PageDir);

    /// Aloca um frame físico e mapeia em `virt` (usuário, leitura/escrita).
    fn alloc_frame(&mut self, virt: Word, dir: PageDir) -> Result<(), PagingError>;

    /// Desmapeia `virt` e libera o frame.
    fn free_frame(&mut self, virt: Word, dir: PageDir);

    /// Remove o mapeamento de `virt` sem liberar o frame (guard pages).
    fn unmap_page(&mut self, virt: Word, dir: PageDir);
}

/// Tradução de endereços de usuário para acesso pelo kernel.
///
/// No i386 os slots ficam mapeados em todo diretório e o kernel acessa o
/// endereço virtual diretamente.
pub trait UserMemory {
    /// Ponteiro do kernel para o byte em `addr`, ou `None` se não houver
    /// memória por trás.
    fn kernel_ptr(&self, addr: Word) -> Option<*mut u8>;
}
