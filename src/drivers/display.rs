//! Display e compositor (colaboradores externos).
//!
//! O núcleo só precisa da geometria da tela e de uma forma de entregar ao
//! compositor o buffer de uma task que ficou pronto.

use crate::sched::task::TaskId;

/// Largura fixa da tela usada para validar pedidos de buffer.
pub const SCREEN_WIDTH: u32 = 800;
/// Altura fixa da tela.
pub const SCREEN_HEIGHT: u32 = 600;
/// Bytes por pixel no framebuffer linear.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Cópia da informação de vídeo entregue ao userspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct DisplayInfo {
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub bpp: u32,
    /// Endereço virtual do framebuffer visto pelo userspace.
    pub framebuffer: u32,
}

impl DisplayInfo {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        let words = [self.width, self.height, self.pitch, self.bpp, self.framebuffer];
        for (chunk, w) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&w.to_ne_bytes());
        }
        out
    }
}

pub trait Display {
    fn info(&self) -> DisplayInfo;

    /// Coloca o buffer da task na fila do compositor, na posição (x, y).
    fn queue_buffer(&mut self, task: TaskId, x: u32, y: u32);
}
