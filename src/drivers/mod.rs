//! # Drivers usados pelo núcleo
//!
//! | Driver   | Arquivo       | Papel |
//! |----------|---------------|-------|
//! | Serial   | `serial.rs`   | Logs de kernel + dispositivo `/dev/serial` |
//! | Display  | `display.rs`  | Geometria da tela e fila do compositor |

pub mod display;
pub mod serial;
