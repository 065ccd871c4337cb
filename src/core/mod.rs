//! Core Module
//!
//! Infraestrutura de logging do kernel (macros `kinfo!`, `kwarn!`, ...).

pub mod logging;
