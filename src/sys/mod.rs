//! Definições de sistema compartilhadas por todos os módulos.

pub mod types;

pub use types::Word;
