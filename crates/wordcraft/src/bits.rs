//! Bit arithmetic on the 64-bit working register.
//!
//! Every word is packed into and unpacked from a `u64` that is converted to
//! bytes in big-endian order, whatever the word's own width. Bit 0 is the
//! least-significant bit of the register.

/// Width of the working register in bits.
pub const REGISTER_BITS: usize = 64;

/// Width of the working register in bytes.
pub const REGISTER_BYTES: usize = REGISTER_BITS / 8;

/// Returns a mask with the low `length` bits set. Saturates at 64 bits.
pub fn mask(length: usize) -> u64 {
    if length >= REGISTER_BITS {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

/// Left shift that yields 0 instead of overflowing when `n >= 64`.
fn shl(value: u64, n: usize) -> u64 {
    u32::try_from(n)
        .ok()
        .and_then(|n| value.checked_shl(n))
        .unwrap_or(0)
}

/// Right shift that yields 0 instead of overflowing when `n >= 64`.
fn shr(value: u64, n: usize) -> u64 {
    u32::try_from(n)
        .ok()
        .and_then(|n| value.checked_shr(n))
        .unwrap_or(0)
}

/// Truncates `value` to its low `length` bits and moves them up to `offset`.
pub fn place(value: u64, length: usize, offset: usize) -> u64 {
    shl(value & mask(length), offset)
}

/// Reads the `length` bits that start at `offset` in `register`.
pub fn extract(register: u64, length: usize, offset: usize) -> u64 {
    shr(register, offset) & mask(length)
}

/// Builds the 8-byte register buffer from a byte window.
///
/// Windows shorter than 8 bytes are left-padded with zeros so their bytes
/// land in the low-order end; longer windows contribute their first 8 bytes.
pub fn pad_register(bytes: &[u8]) -> [u8; REGISTER_BYTES] {
    let mut buf = [0u8; REGISTER_BYTES];

    if bytes.len() < REGISTER_BYTES {
        buf[REGISTER_BYTES - bytes.len()..].copy_from_slice(bytes);
    } else {
        buf.copy_from_slice(&bytes[..REGISTER_BYTES]);
    }

    buf
}

/// Returns the low-order `len` bytes of the big-endian register.
pub fn low_bytes(register: u64, len: usize) -> Vec<u8> {
    let buf = register.to_be_bytes();
    buf[REGISTER_BYTES - len.min(REGISTER_BYTES)..].to_vec()
}
