//! # Alinhamento de endereços de 32 bits

use crate::sys::types::Word;

/// Alinha para cima ao próximo múltiplo de `align` (potência de 2).
///
/// # Exemplo
/// ```ignore
/// assert_eq!(align_up(10, 4), 12);
/// assert_eq!(align_up(16, 4), 16);
/// ```
#[inline(always)]
pub const fn align_up(val: Word, align: Word) -> Word {
    (val + align - 1) & !(align - 1)
}
