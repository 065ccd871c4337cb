// =============================================================================
// SERIAL DRIVER (COM1)
// =============================================================================
//
// Saída dos macros de log e backend do dispositivo `/dev/serial`.
//
// - SEM Mutex: escrita direta na porta, pode ser chamada com IF=0
// - SEM core::fmt: apenas strings e valores em hexadecimal
// - No backend hosted (testes, outros alvos) a saída é descartada
//
// =============================================================================

use crate::fs::vfs::{CharDevice, IoError};

#[cfg(all(target_arch = "x86", not(test)))]
mod hw {
    use crate::arch::x86::port::{inb, outb};

    const COM1_DATA: u16 = 0x3F8;
    const COM1_STATUS: u16 = 0x3FD;

    pub fn init() {
        outb(COM1_DATA + 1, 0x00); // sem IRQs
        outb(COM1_DATA + 3, 0x80); // DLAB
        outb(COM1_DATA, 0x03); // 38400 baud
        outb(COM1_DATA + 1, 0x00);
        outb(COM1_DATA + 3, 0x03); // 8N1
        outb(COM1_DATA + 2, 0xC7); // FIFO
        outb(COM1_DATA + 4, 0x0B);
    }

    #[inline(always)]
    pub fn emit(byte: u8) {
        // Bit 5 do LSR = buffer de transmissão vazio
        while inb(COM1_STATUS) & 0x20 == 0 {
            core::hint::spin_loop();
        }
        outb(COM1_DATA, byte);
    }
}

#[cfg(not(all(target_arch = "x86", not(test))))]
mod hw {
    pub fn init() {}

    #[inline(always)]
    pub fn emit(_byte: u8) {}
}

/// Inicializa a COM1 (38400 baud, 8N1, FIFO). Uma vez, no early-boot.
pub fn init() {
    hw::init();
}

/// Envia um único byte.
#[inline(always)]
pub fn emit(byte: u8) {
    hw::emit(byte);
}

/// Envia uma string.
#[inline(never)]
pub fn emit_str(s: &str) {
    for &b in s.as_bytes() {
        emit(b);
    }
}

/// Envia CRLF.
#[inline(never)]
pub fn emit_nl() {
    emit(b'\r');
    emit(b'\n');
}

/// Envia um u32 em hexadecimal: 0x12345678 (sempre 10 caracteres).
#[inline(never)]
pub fn emit_hex(value: u32) {
    emit(b'0');
    emit(b'x');
    for shift in (0..8).rev() {
        emit(nibble_to_ascii(((value >> (shift * 4)) & 0xF) as u8));
    }
}

#[inline(always)]
const fn nibble_to_ascii(n: u8) -> u8 {
    if n < 10 {
        b'0' + n
    } else {
        b'A' + n - 10
    }
}

/// `/dev/serial`: escrita byte a byte na COM1. Leitura não suportada.
pub struct SerialDevice;

impl CharDevice for SerialDevice {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, IoError> {
        Err(IoError::Unsupported)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, IoError> {
        for &b in buf {
            emit(b);
        }
        Ok(buf.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
