//! Heap privado de cada task.
//!
//! A região vai do fim do binário (alinhado a página) até a guard page, ou
//! até o início do buffer de display quando a task pede um. O alocador é o
//! `linked_list_allocator`, com a lista de buracos dentro da própria região.
//! Os blocos vivos ficam registrados do lado do kernel: o `free` nunca lê
//! nada da memória da task.

use alloc::collections::BTreeMap;
use core::alloc::Layout;
use core::mem::size_of;
use core::ptr::NonNull;

use linked_list_allocator::Heap;

use crate::sys::types::Word;

/// Alinhamento de todo bloco entregue ao userspace.
const BLOCK_ALIGN: usize = 8;

/// Menor região que o alocador aceita (um nó da lista de buracos).
const MIN_HEAP: usize = 2 * size_of::<usize>();

pub struct HeapRegion {
    start: Word,
    end: Word,
    /// Diferença entre o ponteiro do kernel e o endereço de usuário.
    bias: usize,
    heap: Heap,
    /// Endereço de usuário -> layout de cada bloco vivo.
    live: BTreeMap<Word, Layout>,
}

// SAFETY: a região pertence a uma única task e só é tocada com a tabela de
// tasks travada.
unsafe impl Send for HeapRegion {}

impl core::fmt::Debug for HeapRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeapRegion")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("used", &self.heap.used())
            .field("blocks", &self.live.len())
            .finish()
    }
}

impl HeapRegion {
    /// Constrói um heap sobre `[start, end)` de usuário.
    ///
    /// # Safety
    ///
    /// `base` deve apontar para a memória de kernel que corresponde a
    /// `start`, válida e exclusiva por `end - start` bytes enquanto a região
    /// existir.
    pub unsafe fn new(start: Word, end: Word, base: *mut u8) -> Option<Self> {
        let size = end.checked_sub(start)? as usize;
        if size < MIN_HEAP + BLOCK_ALIGN {
            return None;
        }
        let mut heap = Heap::empty();
        heap.init(base, size);
        Some(Self {
            start,
            end,
            bias: (base as usize).wrapping_sub(start as usize),
            heap,
            live: BTreeMap::new(),
        })
    }

    pub fn start(&self) -> Word {
        self.start
    }

    pub fn end(&self) -> Word {
        self.end
    }

    pub fn used(&self) -> usize {
        self.heap.used()
    }

    /// Blocos alocados e ainda não liberados.
    pub fn live_blocks(&self) -> usize {
        self.live.len()
    }

    /// Aloca `size` bytes, devolve o endereço de usuário.
    pub fn alloc(&mut self, size: Word) -> Option<Word> {
        let layout = Layout::from_size_align(size as usize, BLOCK_ALIGN).ok()?;
        let block = self.heap.allocate_first_fit(layout).ok()?;
        let addr = self.to_user(block.as_ptr() as usize);
        self.live.insert(addr, layout);
        Some(addr)
    }

    /// Libera um bloco devolvido por `alloc`. Endereços que não são início
    /// de um bloco vivo (já liberados, do meio de um bloco, de fora) são
    /// ignorados.
    pub fn free(&mut self, addr: Word) {
        let Some(layout) = self.live.remove(&addr) else {
            crate::ktrace!("(Heap) free ignorado: ", addr);
            return;
        };
        if let Some(ptr) = NonNull::new(self.to_kernel(addr)) {
            // SAFETY: `ptr` e `layout` são exatamente os de um
            // `allocate_first_fit` que ainda não foi devolvido
            unsafe { self.heap.deallocate(ptr, layout) };
        }
    }

    fn to_user(&self, kernel: usize) -> Word {
        kernel.wrapping_sub(self.bias) as Word
    }

    fn to_kernel(&self, user: Word) -> *mut u8 {
        (user as usize).wrapping_add(self.bias) as *mut u8
    }
}

/// Estado do heap de uma task.
///
/// Tasks com permissão de buffer nascem sem heap: o buffer fica no topo da
/// mesma região e o tamanho só é conhecido no `request_buffer`.
#[derive(Debug, Default)]
pub enum TaskHeap {
    #[default]
    NoHeapYet,
    Heap(HeapRegion),
}

impl TaskHeap {
    pub fn is_ready(&self) -> bool {
        matches!(self, TaskHeap::Heap(_))
    }

    pub fn alloc(&mut self, size: Word) -> Option<Word> {
        match self {
            TaskHeap::NoHeapYet => None,
            TaskHeap::Heap(region) => region.alloc(size),
        }
    }

    pub fn free(&mut self, addr: Word) {
        if let TaskHeap::Heap(region) = self {
            region.free(addr);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const START: Word = 0x4000_2000;

    fn region(size: usize, backing: &mut [u64]) -> HeapRegion {
        let base = backing.as_mut_ptr().cast::<u8>();
        unsafe { HeapRegion::new(START, START + size as Word, base) }.unwrap()
    }

    #[test]
    fn test_alloc_returns_user_addresses_inside_region() {
        let mut backing = vec![0u64; 512];
        let mut heap = region(4096, &mut backing);
        let a = heap.alloc(100).unwrap();
        let b = heap.alloc(100).unwrap();
        assert!(a >= START && a < START + 4096);
        assert_eq!(a % BLOCK_ALIGN as Word, 0);
        assert!(b >= START && b < START + 4096);
        assert_ne!(a, b);
        assert!(heap.used() >= 200);
    }

    #[test]
    fn test_free_makes_space_reusable() {
        let mut backing = vec![0u64; 512];
        let mut heap = region(4096, &mut backing);
        let a = heap.alloc(3000).unwrap();
        assert!(heap.alloc(3000).is_none());
        heap.free(a);
        assert_eq!(heap.used(), 0);
        assert!(heap.alloc(3000).is_some());
    }

    #[test]
    fn test_free_ignores_foreign_addresses() {
        let mut backing = vec![0u64; 512];
        let mut heap = region(4096, &mut backing);
        let a = heap.alloc(64).unwrap();
        heap.free(0x1234);
        heap.free(START + 8192);
        assert!(heap.used() > 0);
        heap.free(a);
        assert_eq!(heap.used(), 0);
    }

    #[test]
    fn test_double_free_is_ignored() {
        let mut backing = vec![0u64; 512];
        let mut heap = region(4096, &mut backing);
        let a = heap.alloc(64).unwrap();
        let b = heap.alloc(64).unwrap();
        heap.free(a);
        heap.free(a);
        assert_eq!(heap.live_blocks(), 1);
        assert_eq!(heap.used(), 64);

        // o buraco de `a` continua utilizável, uma vez só
        let c = heap.alloc(64).unwrap();
        assert_ne!(c, b);
        heap.free(b);
        heap.free(c);
        heap.free(b);
        assert_eq!(heap.used(), 0);
        assert_eq!(heap.live_blocks(), 0);
    }

    #[test]
    fn test_free_ignores_user_written_metadata() {
        let mut backing = vec![0u64; 512];
        let mut heap = region(4096, &mut backing);
        let a = heap.alloc(32).unwrap();
        let b = heap.alloc(32).unwrap();
        // a task pode escrever o que quiser na região, inclusive tamanhos
        // falsos antes e dentro dos blocos
        let ptr = backing.as_mut_ptr().cast::<u32>();
        for block in [a, b] {
            let first = ((block - START) / 4) as usize;
            for i in first..first + 8 {
                unsafe { ptr.add(i).write(0xFFFF_FF00) };
            }
        }
        heap.free(a + 8);
        heap.free(b - 8);
        assert_eq!(heap.live_blocks(), 2);
        assert_eq!(heap.used(), 64);
        heap.free(a);
        heap.free(b);
        assert_eq!(heap.used(), 0);
    }

    #[test]
    fn test_task_heap_without_region() {
        let mut heap = TaskHeap::NoHeapYet;
        assert!(!heap.is_ready());
        assert_eq!(heap.alloc(16), None);
        heap.free(START);
    }

    #[test]
    fn test_region_too_small_is_rejected() {
        let mut backing = vec![0u64; 4];
        let base = backing.as_mut_ptr().cast::<u8>();
        assert!(unsafe { HeapRegion::new(START, START + 8, base) }.is_none());
        assert!(unsafe { HeapRegion::new(START, START - 8, base) }.is_none());
    }
}
