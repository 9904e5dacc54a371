//! Parameter validation for the prepack kernels.
//!
//! All stride arithmetic is unsigned and overflow-checked with `checked_mul` /
//! `checked_add`; any dimension combination that would wrap reports a
//! configuration error before the kernel touches a buffer.

use crate::error::{KernelError, KernelResult};

/// The only quantized element width currently supported.
pub const SUPPORTED_BITS: usize = 4;

/// Smallest supported quantization block length.
pub const MIN_BLOCK_LEN: usize = 16;

/// Largest supported quantization block length.
pub const MAX_BLOCK_LEN: usize = 128;

pub fn validate_bits(bits: usize) -> KernelResult<()> {
    if bits != SUPPORTED_BITS {
        return Err(KernelError::Unsupported("only 4-bit quantized weights"));
    }
    Ok(())
}

pub fn validate_block_len(block_len: usize) -> KernelResult<()> {
    if !block_len.is_power_of_two() || block_len < MIN_BLOCK_LEN || block_len > MAX_BLOCK_LEN {
        return Err(KernelError::InvalidConfig(format!(
            "block_len {} must be a power of two in [{}, {}]",
            block_len, MIN_BLOCK_LEN, MAX_BLOCK_LEN
        )));
    }
    Ok(())
}

/// Byte stride of one weight row: `k` rounded up to a multiple of `block_len`,
/// then converted from elements to bytes at `bits` per element.
///
/// For every supported (bits, block_len) the result is a multiple of 8, which
/// the tiled pack path relies on.
pub fn packed_row_bytes(k: usize, bits: usize, block_len: usize) -> KernelResult<usize> {
    validate_bits(bits)?;
    validate_block_len(block_len)?;
    if k == 0 {
        return Err(KernelError::InvalidConfig("k must be > 0".into()));
    }
    let padded = k
        .checked_add(block_len - 1)
        .ok_or_else(|| KernelError::InvalidConfig("k padding overflow".into()))?
        & !(block_len - 1);
    let bit_count = padded
        .checked_mul(bits)
        .ok_or_else(|| KernelError::InvalidConfig("row bit count overflow".into()))?;
    let bytes = bit_count
        .checked_add(7)
        .ok_or_else(|| KernelError::InvalidConfig("row byte count overflow".into()))?
        / 8;
    Ok(bytes)
}

/// Total byte size of a quantized weight buffer, packed or not: `n` rows of
/// [`packed_row_bytes`] each.
pub fn packed_buf_bytes(n: usize, k: usize, bits: usize, block_len: usize) -> KernelResult<usize> {
    if n == 0 {
        return Err(KernelError::InvalidConfig("n must be > 0".into()));
    }
    let ldb = packed_row_bytes(k, bits, block_len)?;
    n.checked_mul(ldb)
        .ok_or_else(|| KernelError::InvalidConfig("buffer size overflow".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_bytes_rounds_k_up_to_block_len() {
        // K padded to the block length before the byte stride is computed.
        assert_eq!(packed_row_bytes(1, 4, 16).unwrap(), 8);
        assert_eq!(packed_row_bytes(15, 4, 16).unwrap(), 8);
        assert_eq!(packed_row_bytes(16, 4, 16).unwrap(), 8);
        assert_eq!(packed_row_bytes(17, 4, 16).unwrap(), 16);
        assert_eq!(packed_row_bytes(31, 4, 16).unwrap(), 16);
        assert_eq!(packed_row_bytes(33, 4, 32).unwrap(), 32);
        assert_eq!(packed_row_bytes(96, 4, 128).unwrap(), 64);
    }

    #[test]
    fn row_bytes_always_tile_aligned() {
        for block_len in [16, 32, 64, 128] {
            for k in 1..512 {
                let ldb = packed_row_bytes(k, 4, block_len).unwrap();
                assert_eq!(ldb % 8, 0, "k={} block_len={}", k, block_len);
            }
        }
    }

    #[test]
    fn rejects_unsupported_bits() {
        assert!(matches!(
            packed_row_bytes(16, 8, 16),
            Err(KernelError::Unsupported(_))
        ));
        assert!(packed_row_bytes(16, 0, 16).is_err());
    }

    #[test]
    fn rejects_bad_block_len() {
        for block_len in [0, 1, 8, 24, 256] {
            assert!(
                packed_row_bytes(16, 4, block_len).is_err(),
                "block_len {}",
                block_len
            );
        }
    }

    #[test]
    fn rejects_zero_dims() {
        assert!(packed_row_bytes(0, 4, 16).is_err());
        assert!(packed_buf_bytes(0, 16, 4, 16).is_err());
    }

    #[test]
    fn reports_overflow_as_config_error() {
        assert!(packed_row_bytes(usize::MAX - 2, 4, 16).is_err());
        assert!(packed_buf_bytes(usize::MAX / 2, usize::MAX / 8, 4, 16).is_err());
    }
}
