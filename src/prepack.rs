//! Weight prepacking for 4-bit block-quantized GEMM.
//!
//! The GEMM kernel reads one element from each of 8 adjacent output columns per
//! vector load, so the weight buffer is rearranged once at load time:
//! - **Full tiles** (8 columns at a time): each group of 8 source rows x 8 row
//!   bytes is stored as its 8x8 byte transpose. The source byte at column
//!   `n + c`, row byte `r + k` lands at column group `n`, byte `(r + k) * 8 + c`.
//! - **Tail** (the remaining `n % 8` columns): packed per column. Within every
//!   16-element sub-block the nibbles of logical elements `i` and `i + 8` are
//!   interleaved into one byte (`low = v(i)`, `high = v(i + 8) << 4`).
//!
//! The layout is a pure function of (n, k, bits, block_len): the packed buffer
//! has exactly the size of the source and every 4-bit value survives the trip.

use crate::error::{KernelError, KernelResult};
use crate::isa::{get_isa_level, IsaLevel};
use crate::nibble::{Nibbles, NibblesMut};
use crate::types::ComputeType;
use crate::validation::{packed_buf_bytes, packed_row_bytes};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// Columns per full tile; one vector load covers one packed byte from each.
pub const TILE_COLS: usize = 8;

/// Bytes per tail sub-block (16 4-bit elements).
const SUB_BLOCK_BYTES: usize = 8;

/// Validated byte size of both the source and the packed weight buffer.
pub fn packed_buf_size(n: usize, k: usize, bits: usize, block_len: usize) -> KernelResult<usize> {
    packed_buf_bytes(n, k, bits, block_len)
}

/// Pack a quantized weight buffer into the tiled layout the GEMM kernel expects.
///
/// `src` holds `n` rows (output columns) of `k` quantized elements in row-major
/// nibble order, `packed_row_bytes(k, bits, block_len)` bytes per row; `dst`
/// receives the rearranged bytes at the same total size. `workspace` is scratch
/// for compute-type variants that need one; no current variant does, and the
/// buffer is ignored when supplied. `src` and `dst` must not overlap.
///
/// Fails fast with no partial output: dimensions, bit width, block length and
/// buffer sizes are validated before the first write.
#[allow(clippy::too_many_arguments)]
pub fn pack_quant_b_data(
    n: usize,
    k: usize,
    bits: usize,
    block_len: usize,
    compute_type: ComputeType,
    src: &[u8],
    dst: &mut [u8],
    workspace: Option<&mut [u8]>,
) -> KernelResult<()> {
    let ldb = validate_args(n, k, bits, block_len, compute_type, src, dst.len(), &workspace)?;
    let full_cols = n - n % TILE_COLS;
    pack_full_tiles(src, dst, full_cols, ldb);
    for col in full_cols..n {
        let row = col * ldb;
        let mut off = 0;
        while off < ldb {
            pack_tail_sub_block(src, dst, row + off);
            off += SUB_BLOCK_BYTES;
        }
    }
    Ok(())
}

/// Inverse of [`pack_quant_b_data`]: recover the row-major nibble layout from a
/// packed buffer. Same validation, same layout contract.
#[allow(clippy::too_many_arguments)]
pub fn unpack_quant_b_data(
    n: usize,
    k: usize,
    bits: usize,
    block_len: usize,
    compute_type: ComputeType,
    src: &[u8],
    dst: &mut [u8],
    workspace: Option<&mut [u8]>,
) -> KernelResult<()> {
    let ldb = validate_args(n, k, bits, block_len, compute_type, src, dst.len(), &workspace)?;
    let full_cols = n - n % TILE_COLS;
    let mut col = 0;
    while col < full_cols {
        let mut off = 0;
        while off < ldb {
            // Transposing an 8x8 tile is its own inverse with src/dst indexing
            // swapped.
            for c in 0..TILE_COLS {
                for r in 0..8 {
                    dst[(col + c) * ldb + off + r] = src[col * ldb + (off + r) * 8 + c];
                }
            }
            off += 8;
        }
        col += TILE_COLS;
    }
    for col in full_cols..n {
        let row = col * ldb;
        let mut off = 0;
        while off < ldb {
            unpack_tail_sub_block(src, dst, row + off);
            off += SUB_BLOCK_BYTES;
        }
    }
    Ok(())
}

fn validate_args(
    n: usize,
    k: usize,
    bits: usize,
    block_len: usize,
    compute_type: ComputeType,
    src: &[u8],
    dst_len: usize,
    workspace: &Option<&mut [u8]>,
) -> KernelResult<usize> {
    let total = packed_buf_bytes(n, k, bits, block_len)?;
    let ldb = packed_row_bytes(k, bits, block_len)?;
    if src.len() < total {
        return Err(KernelError::InvalidConfig(format!(
            "source buffer {} bytes, need {}",
            src.len(),
            total
        )));
    }
    if dst_len < total {
        return Err(KernelError::InvalidConfig(format!(
            "destination buffer {} bytes, need {}",
            dst_len, total
        )));
    }
    if compute_type.requires_workspace() && workspace.is_none() {
        return Err(KernelError::InvalidConfig(format!(
            "compute type {:?} requires a workspace buffer",
            compute_type
        )));
    }
    Ok(ldb)
}

/// Tiled fast path over the first `full_cols` columns (a multiple of 8).
/// Single dispatch point; every variant writes identical bytes.
fn pack_full_tiles(src: &[u8], dst: &mut [u8], full_cols: usize, ldb: usize) {
    if get_isa_level() == IsaLevel::Avx2 {
        #[cfg(target_arch = "x86_64")]
        // Safety: AVX2 availability checked by the dispatch level.
        unsafe {
            pack_full_tiles_sse(src, dst, full_cols, ldb);
            return;
        }
    }
    if get_isa_level() == IsaLevel::Neon {
        #[cfg(target_arch = "aarch64")]
        // Safety: NEON is baseline on aarch64.
        unsafe {
            pack_full_tiles_neon(src, dst, full_cols, ldb);
            return;
        }
    }
    pack_full_tiles_scalar(src, dst, full_cols, ldb);
}

pub(crate) fn pack_full_tiles_scalar(src: &[u8], dst: &mut [u8], full_cols: usize, ldb: usize) {
    let mut col = 0;
    while col < full_cols {
        let mut off = 0;
        while off < ldb {
            for c in 0..TILE_COLS {
                for r in 0..8 {
                    dst[col * ldb + (off + r) * 8 + c] = src[(col + c) * ldb + off + r];
                }
            }
            off += 8;
        }
        col += TILE_COLS;
    }
}

/// 8x8 byte transpose via punpck. The four 16-byte stores cover two transposed
/// rows each; destination rows of one tile are contiguous.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn pack_full_tiles_sse(src: &[u8], dst: &mut [u8], full_cols: usize, ldb: usize) {
    let mut col = 0;
    while col < full_cols {
        let mut off = 0;
        while off < ldb {
            let base = src.as_ptr().add(col * ldb + off);
            let r0 = _mm_loadl_epi64(base as *const __m128i);
            let r1 = _mm_loadl_epi64(base.add(ldb) as *const __m128i);
            let r2 = _mm_loadl_epi64(base.add(2 * ldb) as *const __m128i);
            let r3 = _mm_loadl_epi64(base.add(3 * ldb) as *const __m128i);
            let r4 = _mm_loadl_epi64(base.add(4 * ldb) as *const __m128i);
            let r5 = _mm_loadl_epi64(base.add(5 * ldb) as *const __m128i);
            let r6 = _mm_loadl_epi64(base.add(6 * ldb) as *const __m128i);
            let r7 = _mm_loadl_epi64(base.add(7 * ldb) as *const __m128i);

            let p0 = _mm_unpacklo_epi8(r0, r1);
            let p1 = _mm_unpacklo_epi8(r2, r3);
            let p2 = _mm_unpacklo_epi8(r4, r5);
            let p3 = _mm_unpacklo_epi8(r6, r7);

            let q0 = _mm_unpacklo_epi16(p0, p1);
            let q1 = _mm_unpackhi_epi16(p0, p1);
            let q2 = _mm_unpacklo_epi16(p2, p3);
            let q3 = _mm_unpackhi_epi16(p2, p3);

            let out = dst.as_mut_ptr().add(col * ldb + off * 8);
            _mm_storeu_si128(out as *mut __m128i, _mm_unpacklo_epi32(q0, q2));
            _mm_storeu_si128(out.add(16) as *mut __m128i, _mm_unpackhi_epi32(q0, q2));
            _mm_storeu_si128(out.add(32) as *mut __m128i, _mm_unpacklo_epi32(q1, q3));
            _mm_storeu_si128(out.add(48) as *mut __m128i, _mm_unpackhi_epi32(q1, q3));

            off += 8;
        }
        col += TILE_COLS;
    }
}

/// 8x8 byte transpose via the vtrn ladder (8-bit, 16-bit, then 32-bit lanes).
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn pack_full_tiles_neon(src: &[u8], dst: &mut [u8], full_cols: usize, ldb: usize) {
    let mut col = 0;
    while col < full_cols {
        let mut off = 0;
        while off < ldb {
            let base = src.as_ptr().add(col * ldb + off);
            let r0 = vld1_u8(base);
            let r1 = vld1_u8(base.add(ldb));
            let r2 = vld1_u8(base.add(2 * ldb));
            let r3 = vld1_u8(base.add(3 * ldb));
            let r4 = vld1_u8(base.add(4 * ldb));
            let r5 = vld1_u8(base.add(5 * ldb));
            let r6 = vld1_u8(base.add(6 * ldb));
            let r7 = vld1_u8(base.add(7 * ldb));

            let t0 = vreinterpret_u16_u8(vtrn1_u8(r0, r1));
            let t1 = vreinterpret_u16_u8(vtrn2_u8(r0, r1));
            let t2 = vreinterpret_u16_u8(vtrn1_u8(r2, r3));
            let t3 = vreinterpret_u16_u8(vtrn2_u8(r2, r3));
            let t4 = vreinterpret_u16_u8(vtrn1_u8(r4, r5));
            let t5 = vreinterpret_u16_u8(vtrn2_u8(r4, r5));
            let t6 = vreinterpret_u16_u8(vtrn1_u8(r6, r7));
            let t7 = vreinterpret_u16_u8(vtrn2_u8(r6, r7));

            let s0 = vreinterpret_u32_u16(vtrn1_u16(t0, t2));
            let s1 = vreinterpret_u32_u16(vtrn1_u16(t1, t3));
            let s2 = vreinterpret_u32_u16(vtrn2_u16(t0, t2));
            let s3 = vreinterpret_u32_u16(vtrn2_u16(t1, t3));
            let s4 = vreinterpret_u32_u16(vtrn1_u16(t4, t6));
            let s5 = vreinterpret_u32_u16(vtrn1_u16(t5, t7));
            let s6 = vreinterpret_u32_u16(vtrn2_u16(t4, t6));
            let s7 = vreinterpret_u32_u16(vtrn2_u16(t5, t7));

            let out = dst.as_mut_ptr().add(col * ldb + off * 8);
            vst1_u8(out, vreinterpret_u8_u32(vtrn1_u32(s0, s4)));
            vst1_u8(out.add(8), vreinterpret_u8_u32(vtrn1_u32(s1, s5)));
            vst1_u8(out.add(16), vreinterpret_u8_u32(vtrn1_u32(s2, s6)));
            vst1_u8(out.add(24), vreinterpret_u8_u32(vtrn1_u32(s3, s7)));
            vst1_u8(out.add(32), vreinterpret_u8_u32(vtrn2_u32(s0, s4)));
            vst1_u8(out.add(40), vreinterpret_u8_u32(vtrn2_u32(s1, s5)));
            vst1_u8(out.add(48), vreinterpret_u8_u32(vtrn2_u32(s2, s6)));
            vst1_u8(out.add(56), vreinterpret_u8_u32(vtrn2_u32(s3, s7)));

            off += 8;
        }
        col += TILE_COLS;
    }
}

/// Interleave one 16-element sub-block of a tail column: the nibbles at logical
/// indices `i` and `i + 8` become one destination byte.
#[inline]
fn pack_tail_sub_block(src: &[u8], dst: &mut [u8], base: usize) {
    let sub = Nibbles::new(&src[base..base + SUB_BLOCK_BYTES]);
    for i in 0..8 {
        dst[base + i] = sub.get(i) | (sub.get(i + 8) << 4);
    }
}

#[inline]
fn unpack_tail_sub_block(src: &[u8], dst: &mut [u8], base: usize) {
    let mut sub = NibblesMut::new(&mut dst[base..base + SUB_BLOCK_BYTES]);
    for i in 0..8 {
        let b = src[base + i];
        sub.set(i, b & 0x0f);
        sub.set(i + 8, b >> 4);
    }
}
