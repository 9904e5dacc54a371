//! Nibble-addressed views over byte buffers.
//!
//! Quantized weight rows store two 4-bit values per byte: element `i` lives in
//! the low nibble when `i` is even, the high nibble when odd. The packing tail
//! path and the tests address elements by logical index through these views
//! instead of scattering shift/mask tricks through the tiling logic.

/// Read-only nibble view.
#[derive(Clone, Copy)]
pub struct Nibbles<'a> {
    bytes: &'a [u8],
}

impl<'a> Nibbles<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of addressable nibbles.
    pub fn len(&self) -> usize {
        self.bytes.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 4-bit value at logical index `i`.
    #[inline]
    pub fn get(&self, i: usize) -> u8 {
        let b = self.bytes[i >> 1];
        if i & 1 == 1 {
            b >> 4
        } else {
            b & 0x0f
        }
    }
}

/// Mutable nibble view.
pub struct NibblesMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> NibblesMut<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> u8 {
        let b = self.bytes[i >> 1];
        if i & 1 == 1 {
            b >> 4
        } else {
            b & 0x0f
        }
    }

    /// Store the low 4 bits of `v` at logical index `i`, leaving the other
    /// nibble of the byte untouched.
    #[inline]
    pub fn set(&mut self, i: usize, v: u8) {
        let slot = &mut self.bytes[i >> 1];
        if i & 1 == 1 {
            *slot = (*slot & 0x0f) | (v << 4);
        } else {
            *slot = (*slot & 0xf0) | (v & 0x0f);
        }
    }
}
