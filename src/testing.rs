//! Máquina e filesystem de mentira para os testes de host.
//!
//! `MockMachine` registra tudo o que o núcleo pede ao hardware (diretórios,
//! trocas de CR3, EOIs, esp0, buffers enfileirados) e dá memória real a cada
//! slot carregado. `MemFs` é um filesystem em memória com `/bin` (3 binários)
//! e `/etc`.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::arch::{InterruptController, PrivilegedStack};
use crate::drivers::display::{Display, DisplayInfo, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::fs::{CharDevice, Fd, FileHandle, FileSystem, IoError, Node, NodeFlags, OpenMode};
use crate::kernel::Kernel;
use crate::mm::config::{slot_base, slot_of, SLOT_SIZE};
use crate::mm::paging::PagingError;
use crate::mm::{PageDir, Paging, UserMemory};
use crate::sched::exec::ProcessAddressSpace;
use crate::sched::task::TaskId;
use crate::sys::types::Word;
use crate::trap::{TrapFrame, SYSCALL_VECTOR, TIMER_VECTOR, YIELD_VECTOR};

/// Entrada da task idle.
pub const IDLE_ENTRY: Word = 0x0010_0000;
/// Entrada das tasks de kernel dos testes.
pub const KERNEL_ENTRY: Word = 0x0010_4000;

/// `/bin/hello`
pub const HELLO_BIN: &[u8] = &[
    0xB8, 0x01, 0x00, 0x00, 0x00, // mov eax, 1
    0xBB, 0x00, 0x00, 0x00, 0x00, // mov ebx, 0
    0xCD, 0x7F, // int 0x7F
    0xB8, 0x00, 0x00, 0x00, 0x00, // mov eax, 0
    0xCD, 0x7F, // int 0x7F
    b'h', b'e', b'l', b'l', b'o', b'\n', 0,
];

const KERNEL_DIR: PageDir = PageDir(0x0000_1000);

// =============================================================================
// MÁQUINA
// =============================================================================

pub struct MockMachine {
    /// Diretórios clonados e ainda não devolvidos
    pub live_dirs: Vec<PageDir>,
    /// Todo `switch_dir`, em ordem
    pub switched: Vec<PageDir>,
    /// Último TSS.esp0
    pub esp0: Word,
    /// EOIs enviados (`true` = passou pelo escravo)
    pub eoi: Vec<bool>,
    /// Vetores vistos por handlers de teste
    pub handled: Vec<u8>,
    /// Buffers entregues ao compositor
    pub queued: Vec<(TaskId, u32, u32)>,
    /// Guard pages desmapeadas (endereço, diretório)
    pub unmapped: Vec<(Word, PageDir)>,
    /// Frames restantes; `None` = ilimitado
    pub frame_budget: Option<usize>,
    /// Estado do `MemFs` montado no kernel
    pub fs: Arc<Mutex<Vec<MemFile>>>,
    next_dir: Word,
    mapped: BTreeSet<(Word, Word)>,
    slot_pages: BTreeMap<usize, usize>,
    backing: BTreeMap<usize, *mut [u8]>,
}

impl MockMachine {
    pub fn new(fs: Arc<Mutex<Vec<MemFile>>>) -> Self {
        Self {
            live_dirs: Vec::new(),
            switched: Vec::new(),
            esp0: 0,
            eoi: Vec::new(),
            handled: Vec::new(),
            queued: Vec::new(),
            unmapped: Vec::new(),
            frame_budget: None,
            fs,
            next_dir: 0x0010_0000,
            mapped: BTreeSet::new(),
            slot_pages: BTreeMap::new(),
            backing: BTreeMap::new(),
        }
    }

    /// Páginas mapeadas em qualquer diretório.
    pub fn mapped_pages(&self) -> usize {
        self.mapped.len()
    }

    /// Cópia de `len` bytes de usuário em `addr`.
    pub fn read_user(&self, addr: Word, len: usize) -> Vec<u8> {
        let ptr = self.kernel_ptr(addr).expect("endereço sem memória");
        let mut out = vec![0u8; len];
        // SAFETY: a memória do slot vai até o fim do slot
        unsafe { core::ptr::copy_nonoverlapping(ptr, out.as_mut_ptr(), len) };
        out
    }
}

impl Drop for MockMachine {
    fn drop(&mut self) {
        for (_, raw) in core::mem::take(&mut self.backing) {
            // SAFETY: veio de Box::into_raw em alloc_frame
            drop(unsafe { Box::from_raw(raw) });
        }
    }
}

impl Paging for MockMachine {
    fn kernel_dir(&self) -> PageDir {
        KERNEL_DIR
    }

    fn clone_kernel_dir(&mut self) -> Result<PageDir, PagingError> {
        let dir = PageDir(self.next_dir);
        self.next_dir += 0x1000;
        self.live_dirs.push(dir);
        Ok(dir)
    }

    fn release_dir(&mut self, dir: PageDir) {
        self.live_dirs.retain(|&d| d != dir);
    }

    fn switch_dir(&mut self, dir: PageDir) {
        self.switched.push(dir);
    }

    fn alloc_frame(&mut self, virt: Word, dir: PageDir) -> Result<(), PagingError> {
        if let Some(budget) = self.frame_budget.as_mut() {
            if *budget == 0 {
                return Err(PagingError::OutOfFrames);
            }
            *budget -= 1;
        }
        assert!(self.mapped.insert((dir.0, virt)), "página mapeada duas vezes: {virt:#x}");
        if let Some(slot) = slot_of(virt) {
            *self.slot_pages.entry(slot).or_insert(0) += 1;
            self.backing
                .entry(slot)
                .or_insert_with(|| Box::into_raw(vec![0u8; SLOT_SIZE as usize].into_boxed_slice()));
        }
        Ok(())
    }

    fn free_frame(&mut self, virt: Word, dir: PageDir) {
        if !self.mapped.remove(&(dir.0, virt)) {
            return;
        }
        if let Some(budget) = self.frame_budget.as_mut() {
            *budget += 1;
        }
        let Some(slot) = slot_of(virt) else {
            return;
        };
        let pages = self.slot_pages.entry(slot).or_insert(1);
        *pages -= 1;
        if *pages == 0 {
            self.slot_pages.remove(&slot);
            if let Some(raw) = self.backing.remove(&slot) {
                // SAFETY: veio de Box::into_raw em alloc_frame
                drop(unsafe { Box::from_raw(raw) });
            }
        }
    }

    fn unmap_page(&mut self, virt: Word, dir: PageDir) {
        self.unmapped.push((virt, dir));
    }
}

impl UserMemory for MockMachine {
    fn kernel_ptr(&self, addr: Word) -> Option<*mut u8> {
        let slot = slot_of(addr)?;
        let raw = *self.backing.get(&slot)?;
        let offset = (addr - slot_base(slot)) as usize;
        // SAFETY: offset < SLOT_SIZE, que é o tamanho da alocação
        Some(unsafe { raw.cast::<u8>().add(offset) })
    }
}

impl InterruptController for MockMachine {
    fn end_of_interrupt(&mut self, slave: bool) {
        self.eoi.push(slave);
    }
}

impl PrivilegedStack for MockMachine {
    fn set_kernel_stack(&mut self, top: Word) {
        self.esp0 = top;
    }
}

impl Display for MockMachine {
    fn info(&self) -> DisplayInfo {
        DisplayInfo {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            pitch: SCREEN_WIDTH * 4,
            bpp: 32,
            framebuffer: 0xFD00_0000,
        }
    }

    fn queue_buffer(&mut self, task: TaskId, x: u32, y: u32) {
        self.queued.push((task, x, y));
    }
}

// =============================================================================
// FILESYSTEM
// =============================================================================

pub struct MemFile {
    pub path: String,
    pub node: Node,
    pub data: Vec<u8>,
}

impl MemFile {
    fn file(path: &str, data: Vec<u8>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        Self {
            path: path.into(),
            node: Node::new(name, NodeFlags::FILE, data.len() as u32, 0),
            data,
        }
    }

    fn dir(path: &str, children: u32) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        Self {
            path: path.into(),
            node: Node::new(name, NodeFlags::DIR, children, 0),
            data: Vec::new(),
        }
    }

    fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) => "/",
            Some(i) => &self.path[..i],
            None => "",
        }
    }
}

pub struct MemFs {
    files: Arc<Mutex<Vec<MemFile>>>,
}

impl MemFs {
    pub fn new(files: Arc<Mutex<Vec<MemFile>>>) -> Self {
        Self { files }
    }

    /// `/`, `/bin` (hello, clock, shell) e `/etc` (motd, empty).
    pub fn default_tree() -> Vec<MemFile> {
        vec![
            MemFile::dir("/", 2),
            MemFile::dir("/bin", 3),
            MemFile::file("/bin/hello", HELLO_BIN.to_vec()),
            MemFile::file("/bin/clock", vec![0x90; 0x1800]),
            MemFile::file("/bin/shell", vec![0xF4; 0x2100]),
            MemFile::dir("/etc", 2),
            MemFile::file("/etc/motd", b"bem-vindo\n".to_vec()),
            MemFile::file("/etc/empty", Vec::new()),
        ]
    }
}

impl FileSystem for MemFs {
    fn open(&mut self, path: &str, _mode: OpenMode) -> Result<FileHandle, IoError> {
        let files = self.files.lock();
        let (idx, file) = files
            .iter()
            .enumerate()
            .find(|(_, f)| f.path == path)
            .ok_or(IoError::NotFound)?;
        if file.node.is_dir() {
            return Err(IoError::Unsupported);
        }
        Ok(FileHandle {
            node: file.node,
            cookie: idx as u32,
        })
    }

    fn read(&mut self, file: &FileHandle, offset: u32, buf: &mut [u8]) -> Result<usize, IoError> {
        let files = self.files.lock();
        let data = &files.get(file.cookie as usize).ok_or(IoError::Device)?.data;
        let start = (offset as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write(&mut self, file: &mut FileHandle, offset: u32, buf: &[u8]) -> Result<usize, IoError> {
        let mut files = self.files.lock();
        let entry = files.get_mut(file.cookie as usize).ok_or(IoError::Device)?;
        let end = offset as usize + buf.len();
        if entry.data.len() < end {
            entry.data.resize(end, 0);
        }
        entry.data[offset as usize..end].copy_from_slice(buf);
        entry.node.size = entry.data.len() as u32;
        file.node = entry.node;
        Ok(buf.len())
    }

    fn find_dir(&mut self, path: &str) -> Result<Node, IoError> {
        let files = self.files.lock();
        let file = files
            .iter()
            .find(|f| f.path == path)
            .ok_or(IoError::NotFound)?;
        if !file.node.is_dir() {
            return Err(IoError::NotADirectory);
        }
        Ok(file.node)
    }

    fn list_dir(&mut self, path: &str) -> Result<Vec<Node>, IoError> {
        let files = self.files.lock();
        Ok(files
            .iter()
            .filter(|f| f.path != "/" && f.parent() == path)
            .map(|f| f.node)
            .collect())
    }
}

/// Estraga a assinatura de um nó do `MemFs`.
pub fn corrupt_node(k: &mut Kernel<MockMachine>, path: &str) {
    let mut files = k.machine().fs.lock();
    let file = files.iter_mut().find(|f| f.path == path).expect("caminho existe");
    file.node.magic = 0;
}

// =============================================================================
// CONSOLE
// =============================================================================

struct Console {
    out: Arc<Mutex<Vec<u8>>>,
}

impl CharDevice for Console {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, IoError> {
        Ok(0)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, IoError> {
        self.out.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// Monta `/dev/stdout` e devolve o descritor + o que for escrito nele.
pub fn mount_console(k: &mut Kernel<MockMachine>) -> (Fd, Arc<Mutex<Vec<u8>>>) {
    let out = Arc::new(Mutex::new(Vec::new()));
    let fd = k
        .vfs_mut()
        .mount(
            "/dev/stdout",
            Box::new(Console { out: out.clone() }),
            OpenMode::R | OpenMode::W,
        )
        .expect("mount");
    (fd, out)
}

// =============================================================================
// KERNELS E TRAPS
// =============================================================================

/// Kernel recém-montado, sem tasking.
pub fn boot_kernel() -> Kernel<MockMachine> {
    let files = Arc::new(Mutex::new(MemFs::default_tree()));
    let machine = MockMachine::new(files.clone());
    Kernel::new(machine, Box::new(MemFs::new(files)))
}

/// Kernel com a idle criada e tasking ligado (ainda em contexto de kernel).
pub fn tasking_kernel() -> Kernel<MockMachine> {
    let mut k = boot_kernel();
    k.init_tasking(IDLE_ENTRY).expect("init_tasking");
    k
}

pub fn load_user(k: &mut Kernel<MockMachine>, path: &str, allow_buffer: bool) -> ProcessAddressSpace {
    k.load_process(path, allow_buffer).expect("load_process")
}

/// Escreve `s` + NUL em `addr` direto na memória do slot.
pub fn put_str(k: &mut Kernel<MockMachine>, addr: Word, s: &str) -> Word {
    let ptr = k.machine().kernel_ptr(addr).expect("endereço sem memória");
    // SAFETY: cabe no slot nos testes
    unsafe {
        core::ptr::copy_nonoverlapping(s.as_ptr(), ptr, s.len());
        ptr.add(s.len()).write(0);
    }
    addr
}

fn trap(k: &mut Kernel<MockMachine>, frame: &mut TrapFrame, vector: u8) {
    frame.int_no = vector as Word;
    k.handle_trap(frame).expect("trap fatal");
}

/// Um tick do timer.
pub fn tick(k: &mut Kernel<MockMachine>, frame: &mut TrapFrame) {
    trap(k, frame, TIMER_VECTOR);
}

/// O trap de yield (`int 0x81`).
pub fn yield_now(k: &mut Kernel<MockMachine>, frame: &mut TrapFrame) {
    trap(k, frame, YIELD_VECTOR);
}

/// Tica até `id` ser a task corrente.
pub fn run_task(k: &mut Kernel<MockMachine>, frame: &mut TrapFrame, id: TaskId) {
    for _ in 0..64 {
        if k.current_task() == Some(id) {
            return;
        }
        tick(k, frame);
    }
    panic!("task {id:?} nunca foi escalonada");
}

/// `int 0x7F` com o número em EAX e os argumentos em EBX..EDI. Devolve EAX.
pub fn syscall(k: &mut Kernel<MockMachine>, frame: &mut TrapFrame, num: u32, args: [u32; 5]) -> Word {
    frame.eax = num;
    frame.ebx = args[0];
    frame.ecx = args[1];
    frame.edx = args[2];
    frame.esi = args[3];
    frame.edi = args[4];
    trap(k, frame, SYSCALL_VECTOR);
    frame.eax
}
