//! Utilitários internos do kernel.

pub mod align;
pub mod bitmap;

pub use align::align_up;
pub use bitmap::Bitmap;
