//! VFS: dispositivos montados + arquivos abertos.
//!
//! Descritores `0..VFS_MAX_DEVICES` são os dispositivos montados, na ordem
//! de montagem. Descritores a partir de `VFS_MAX_DEVICES` são arquivos
//! normais abertos por caminho.

use alloc::boxed::Box;
use alloc::vec::Vec;

use bitflags::bitflags;

use super::node::Node;
use crate::sched::task::TaskId;
use crate::sync::SpinFlag;

/// Máximo de dispositivos montados.
pub const VFS_MAX_DEVICES: usize = 16;

/// Máximo de arquivos normais abertos ao mesmo tempo.
pub const MAX_OPEN_FILES: usize = 32;

/// Descritor de arquivo como visto pelo userspace.
pub type Fd = usize;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenMode: u8 {
        const R = 0x01;
        const W = 0x02;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    NotFound,
    NotADirectory,
    /// Operação não existe para este dispositivo/arquivo
    Unsupported,
    /// Modo de abertura não permite a operação
    PermissionDenied,
    BadDescriptor,
    /// Flag do arquivo ocupada (reentrada)
    Busy,
    TableFull,
    /// Erro do driver, sem retry
    Device,
}

/// Arquivo aberto no filesystem colaborador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle {
    pub node: Node,
    /// Identificador privado do filesystem.
    pub cookie: u32,
}

impl FileHandle {
    /// Tamanho do conteúdo (usado pelo loader como tamanho do binário).
    pub fn size(&self) -> u32 {
        self.node.size
    }
}

/// Filesystem colaborador.
pub trait FileSystem {
    fn open(&mut self, path: &str, mode: OpenMode) -> Result<FileHandle, IoError>;
    fn read(&mut self, file: &FileHandle, offset: u32, buf: &mut [u8]) -> Result<usize, IoError>;
    fn write(&mut self, file: &mut FileHandle, offset: u32, buf: &[u8]) -> Result<usize, IoError>;
    fn close(&mut self, _file: FileHandle) {}
    fn find_dir(&mut self, path: &str) -> Result<Node, IoError>;
    fn list_dir(&mut self, path: &str) -> Result<Vec<Node>, IoError>;
}

/// Dispositivo de caracteres montado em `/dev`.
pub trait CharDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, IoError>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, IoError>;
}

struct Mount {
    path: &'static str,
    dev: Box<dyn CharDevice + Send>,
    mode: OpenMode,
    lock: SpinFlag,
}

struct OpenFile {
    handle: FileHandle,
    mode: OpenMode,
    offset: u32,
    /// Task que abriu; `None` quando aberto em contexto de kernel.
    owner: Option<TaskId>,
    lock: SpinFlag,
}

pub struct Vfs {
    fs: Box<dyn FileSystem + Send>,
    mounts: [Option<Mount>; VFS_MAX_DEVICES],
    files: [Option<OpenFile>; MAX_OPEN_FILES],
}

impl Vfs {
    pub fn new(fs: Box<dyn FileSystem + Send>) -> Self {
        Self {
            fs,
            mounts: core::array::from_fn(|_| None),
            files: core::array::from_fn(|_| None),
        }
    }

    /// Monta um dispositivo no próximo índice livre e devolve o descritor.
    pub fn mount(
        &mut self,
        path: &'static str,
        dev: Box<dyn CharDevice + Send>,
        mode: OpenMode,
    ) -> Result<Fd, IoError> {
        let idx = self
            .mounts
            .iter()
            .position(Option::is_none)
            .ok_or(IoError::TableFull)?;
        self.mounts[idx] = Some(Mount {
            path,
            dev,
            mode,
            lock: SpinFlag::new(),
        });
        crate::kdebug!("(VFS) Dispositivo montado fd=", idx);
        Ok(idx)
    }

    pub fn filesystem(&mut self) -> &mut dyn FileSystem {
        &mut *self.fs
    }

    /// Abre um caminho. Caminhos de dispositivo devolvem o índice da montagem.
    pub fn open(&mut self, path: &str, mode: OpenMode, owner: Option<TaskId>) -> Result<Fd, IoError> {
        if let Some(idx) = self
            .mounts
            .iter()
            .position(|m| m.as_ref().is_some_and(|m| m.path == path))
        {
            let mount_mode = self.mounts[idx].as_ref().map_or(OpenMode::empty(), |m| m.mode);
            if !mount_mode.contains(mode) {
                return Err(IoError::PermissionDenied);
            }
            return Ok(idx);
        }

        let slot = self
            .files
            .iter()
            .position(Option::is_none)
            .ok_or(IoError::TableFull)?;
        let handle = self.fs.open(path, mode)?;
        self.files[slot] = Some(OpenFile {
            handle,
            mode,
            offset: 0,
            owner,
            lock: SpinFlag::new(),
        });
        Ok(VFS_MAX_DEVICES + slot)
    }

    pub fn close(&mut self, fd: Fd, caller: Option<TaskId>) -> Result<(), IoError> {
        if fd < VFS_MAX_DEVICES {
            // Dispositivos não são "abertos"; fechar é no-op.
            return self.mounts[fd].as_ref().map(|_| ()).ok_or(IoError::BadDescriptor);
        }
        let slot = fd - VFS_MAX_DEVICES;
        let entry = self.files.get_mut(slot).ok_or(IoError::BadDescriptor)?;
        match entry {
            Some(file) if Self::may_use(file, caller) => {
                if file.lock.is_held() {
                    return Err(IoError::Busy);
                }
            }
            _ => return Err(IoError::BadDescriptor),
        }
        if let Some(file) = entry.take() {
            self.fs.close(file.handle);
        }
        Ok(())
    }

    pub fn write(&mut self, fd: Fd, buf: &[u8], caller: Option<TaskId>) -> Result<usize, IoError> {
        if fd < VFS_MAX_DEVICES {
            let mount = self.mounts[fd].as_mut().ok_or(IoError::BadDescriptor)?;
            if !mount.mode.contains(OpenMode::W) {
                return Err(IoError::PermissionDenied);
            }
            let _held = mount.lock.try_acquire().ok_or(IoError::Busy)?;
            return mount.dev.write(buf);
        }

        let file = Self::file_mut(&mut self.files, fd, caller)?;
        if !file.mode.contains(OpenMode::W) {
            return Err(IoError::PermissionDenied);
        }
        let _held = file.lock.try_acquire().ok_or(IoError::Busy)?;
        let written = self.fs.write(&mut file.handle, file.offset, buf)?;
        file.offset = file.offset.saturating_add(written as u32);
        Ok(written)
    }

    pub fn read(&mut self, fd: Fd, buf: &mut [u8], caller: Option<TaskId>) -> Result<usize, IoError> {
        if fd < VFS_MAX_DEVICES {
            let mount = self.mounts[fd].as_mut().ok_or(IoError::BadDescriptor)?;
            if !mount.mode.contains(OpenMode::R) {
                return Err(IoError::PermissionDenied);
            }
            let _held = mount.lock.try_acquire().ok_or(IoError::Busy)?;
            return mount.dev.read(buf);
        }

        let file = Self::file_mut(&mut self.files, fd, caller)?;
        if !file.mode.contains(OpenMode::R) {
            return Err(IoError::PermissionDenied);
        }
        let _held = file.lock.try_acquire().ok_or(IoError::Busy)?;
        let read = self.fs.read(&file.handle, file.offset, buf)?;
        file.offset = file.offset.saturating_add(read as u32);
        Ok(read)
    }

    /// Fecha tudo que uma task deixou aberto.
    pub fn release_owner(&mut self, owner: TaskId) {
        for entry in self.files.iter_mut() {
            if entry.as_ref().is_some_and(|f| f.owner == Some(owner)) {
                if let Some(file) = entry.take() {
                    self.fs.close(file.handle);
                }
            }
        }
    }

    pub fn open_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_some()).count()
    }

    fn file_mut(
        files: &mut [Option<OpenFile>; MAX_OPEN_FILES],
        fd: Fd,
        caller: Option<TaskId>,
    ) -> Result<&mut OpenFile, IoError> {
        files
            .get_mut(fd - VFS_MAX_DEVICES)
            .and_then(Option::as_mut)
            .filter(|f| Self::may_use(f, caller))
            .ok_or(IoError::BadDescriptor)
    }

    // Arquivos abertos pelo kernel são de todos; os de uma task, só dela.
    fn may_use(file: &OpenFile, caller: Option<TaskId>) -> bool {
        file.owner.is_none() || file.owner == caller
    }
}

// =============================================================================
// TESTS
// =============================================================================
