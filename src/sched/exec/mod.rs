//! Espaços de endereçamento de processo e o loader de binários.

pub mod loader;
pub mod space;

pub use loader::LoadError;
pub use space::{AddressSpaceDescriptor, BufferFlags, ProcessAddressSpace, SlotEntry, SlotRegistry};
