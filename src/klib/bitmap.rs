//! Bitmap de tamanho fixo

/// Bitmap com `WORDS * 64` bits de capacidade, dos quais `len` são válidos.
#[derive(Debug, Clone)]
pub struct Bitmap<const WORDS: usize> {
    data: [u64; WORDS],
    len: usize,
}

impl<const WORDS: usize> Bitmap<WORDS> {
    /// Cria bitmap zerado com `bits` posições válidas
    pub const fn new(bits: usize) -> Self {
        assert!(bits <= WORDS * 64);
        Self {
            data: [0; WORDS],
            len: bits,
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.data[index / 64] |= 1 << (index % 64);
    }

    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.data[index / 64] &= !(1 << (index % 64));
    }

    /// Testa um bit. Fora do range conta como livre.
    pub fn test(&self, index: usize) -> bool {
        index < self.len && (self.data[index / 64] & (1 << (index % 64))) != 0
    }

    /// Encontra primeiro bit livre (0)
    pub fn find_first_zero(&self) -> Option<usize> {
        for (i, &word) in self.data.iter().enumerate() {
            if word != u64::MAX {
                let index = i * 64 + word.trailing_ones() as usize;
                if index < self.len {
                    return Some(index);
                }
            }
        }
        None
    }

    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_zero_skips_full_words() {
        let mut bm: Bitmap<2> = Bitmap::new(128);
        for i in 0..70 {
            bm.set(i);
        }
        assert_eq!(bm.find_first_zero(), Some(70));
        bm.clear(3);
        assert_eq!(bm.find_first_zero(), Some(3));
        assert_eq!(bm.count_ones(), 69);
    }

    #[test]
    fn test_full_bitmap_and_out_of_range() {
        let mut bm: Bitmap<1> = Bitmap::new(4);
        for i in 0..4 {
            bm.set(i);
        }
        assert_eq!(bm.find_first_zero(), None);
        assert!(!bm.test(4));
        assert!(!bm.test(1000));
    }
}
