//! Entrada de diretório, no formato copiado para o userspace.

use bitflags::bitflags;

/// Assinatura de um nó válido.
pub const NODE_MAGIC: u32 = 0xBEEF_F00D;

/// Tamanho máximo do nome, com o NUL.
pub const NODE_NAME_LEN: usize = 32;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const FILE = 0x01;
        const DIR = 0x02;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Node {
    pub magic: u32,
    pub name: [u8; NODE_NAME_LEN],
    pub flags: u8,
    pub mode: u8,
    _reserved: [u8; 2],
    /// Bytes para arquivos, número de filhos para diretórios.
    pub size: u32,
    pub first_block: u32,
}

impl Node {
    pub fn new(name: &str, flags: NodeFlags, size: u32, first_block: u32) -> Self {
        let mut buf = [0u8; NODE_NAME_LEN];
        let len = name.len().min(NODE_NAME_LEN - 1);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            magic: NODE_MAGIC,
            name: buf,
            flags: flags.bits(),
            mode: 0,
            _reserved: [0; 2],
            size,
            first_block,
        }
    }

    pub fn flags(&self) -> NodeFlags {
        NodeFlags::from_bits_truncate(self.flags)
    }

    pub fn is_dir(&self) -> bool {
        self.flags().contains(NodeFlags::DIR)
    }

    pub fn is_valid(&self) -> bool {
        self.magic == NODE_MAGIC
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(NODE_NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("")
    }

    /// Bytes exatos da entrada, como vão para o userspace.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: repr(C) sem padding implícito (o reservado é explícito)
        unsafe {
            core::slice::from_raw_parts(self as *const Self as *const u8, core::mem::size_of::<Self>())
        }
    }
}

const _: () = assert!(core::mem::size_of::<Node>() == 48);
