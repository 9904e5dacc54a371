//! Bulk fp16 <-> fp32 conversion kernels.
//!
//! Both directions batch with the widest conversion instructions available
//! (F16C on x86_64, `fcvtl`/`fcvtn` on aarch64) and finish the remainder with
//! the scalar bit-manipulation routines below, so every count from 0 upward is
//! valid. The scalar routines are the semantic reference: 1 sign / 5 exponent /
//! 10 mantissa bits, bias 15, round to nearest even, overflow saturating to
//! signed infinity.
//!
//! Encoded infinities and NaNs (pattern & 0x1C00 == 0x1C00) may widen to a
//! representative value rather than a bit-exact reproduction; everything else
//! is bit-exact across scalar and vector paths.

use crate::error::{KernelError, KernelResult};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Widen `count` half-precision bit patterns into single-precision floats.
pub fn cast_f16_to_f32(src: &[u16], dst: &mut [f32], count: usize) -> KernelResult<()> {
    check_count(src.len(), dst.len(), count)?;
    if crate::isa::has_f16c() {
        #[cfg(target_arch = "x86_64")]
        // Safety: F16C availability checked above.
        unsafe {
            cast_f16_to_f32_f16c(src, dst, count);
            return Ok(());
        }
    }
    if crate::isa::get_isa_level() == crate::isa::IsaLevel::Neon {
        #[cfg(target_arch = "aarch64")]
        // Safety: NEON is baseline on aarch64.
        unsafe {
            cast_f16_to_f32_neon(src, dst, count);
            return Ok(());
        }
    }
    cast_f16_to_f32_scalar(src, dst, count);
    Ok(())
}

/// Narrow `count` single-precision floats into half-precision bit patterns.
pub fn cast_f32_to_f16(src: &[f32], dst: &mut [u16], count: usize) -> KernelResult<()> {
    check_count(src.len(), dst.len(), count)?;
    if crate::isa::has_f16c() {
        #[cfg(target_arch = "x86_64")]
        // Safety: F16C availability checked above.
        unsafe {
            cast_f32_to_f16_f16c(src, dst, count);
            return Ok(());
        }
    }
    if crate::isa::get_isa_level() == crate::isa::IsaLevel::Neon {
        #[cfg(target_arch = "aarch64")]
        // Safety: NEON is baseline on aarch64.
        unsafe {
            cast_f32_to_f16_neon(src, dst, count);
            return Ok(());
        }
    }
    cast_f32_to_f16_scalar(src, dst, count);
    Ok(())
}

#[inline]
fn check_count(src_len: usize, dst_len: usize, count: usize) -> KernelResult<()> {
    if src_len < count || dst_len < count {
        return Err(KernelError::InvalidConfig(format!(
            "cast buffers hold {} / {} elements, need {}",
            src_len, dst_len, count
        )));
    }
    Ok(())
}

/// Decode one half-precision bit pattern. Exact for all finite inputs,
/// subnormals included; inf/NaN keep their class (payload shifted into the
/// single-precision mantissa).
#[inline]
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits & 0x8000) << 16;
    let exp = u32::from(bits >> 10) & 0x1f;
    let man = u32::from(bits & 0x03ff);

    let out = if exp == 0x1f {
        sign | 0x7f80_0000 | (man << 13)
    } else if exp == 0 {
        if man == 0 {
            sign
        } else {
            // Subnormal: renormalize into the single-precision exponent range.
            let mut exp32 = 113u32; // 127 - 15 + 1
            let mut man = man;
            while man & 0x0400 == 0 {
                man <<= 1;
                exp32 -= 1;
            }
            sign | (exp32 << 23) | ((man & 0x03ff) << 13)
        }
    } else {
        sign | ((exp + 112) << 23) | (man << 13)
    };
    f32::from_bits(out)
}

/// Encode one single-precision float as a half-precision bit pattern with
/// round-to-nearest-even. Finite values beyond the half range saturate to
/// signed infinity; NaN encodes as a quiet NaN.
#[inline]
pub fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let man = bits & 0x007f_ffff;

    if exp == 0xff {
        return if man == 0 { sign | 0x7c00 } else { sign | 0x7e00 };
    }

    let unbiased = exp - 127;
    if unbiased >= 16 {
        return sign | 0x7c00;
    }
    if unbiased >= -14 {
        // Normal half range. Rounding may carry through the mantissa into the
        // exponent field; a carry out of exponent 30 yields the infinity
        // encoding, which is the saturation the contract asks for.
        let half_exp = (unbiased + 15) as u32;
        let mut out = (half_exp << 10) | (man >> 13);
        let rem = man & 0x1fff;
        if rem > 0x1000 || (rem == 0x1000 && out & 1 == 1) {
            out += 1;
        }
        return sign | out as u16;
    }
    if unbiased >= -25 {
        // Subnormal half range: quantum is 2^-24. Rounding up from the largest
        // subnormal lands on the smallest normal encoding naturally.
        let shift = (-1 - unbiased) as u32; // 14..=24
        let man_full = man | 0x0080_0000;
        let mut out = man_full >> shift;
        let half = 1u32 << (shift - 1);
        let rem = man_full & ((1u32 << shift) - 1);
        if rem > half || (rem == half && out & 1 == 1) {
            out += 1;
        }
        return sign | out as u16;
    }
    // Too small for the smallest subnormal: rounds to signed zero.
    sign
}

pub(crate) fn cast_f16_to_f32_scalar(src: &[u16], dst: &mut [f32], count: usize) {
    for i in 0..count {
        dst[i] = f16_bits_to_f32(src[i]);
    }
}

pub(crate) fn cast_f32_to_f16_scalar(src: &[f32], dst: &mut [u16], count: usize) {
    for i in 0..count {
        dst[i] = f32_to_f16_bits(src[i]);
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "f16c")]
unsafe fn cast_f16_to_f32_f16c(src: &[u16], dst: &mut [f32], count: usize) {
    let mut i = 0usize;
    while i + 8 <= count {
        let h = _mm_loadu_si128(src.as_ptr().add(i) as *const __m128i);
        _mm256_storeu_ps(dst.as_mut_ptr().add(i), _mm256_cvtph_ps(h));
        i += 8;
    }
    while i < count {
        *dst.get_unchecked_mut(i) = f16_bits_to_f32(*src.get_unchecked(i));
        i += 1;
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "f16c")]
unsafe fn cast_f32_to_f16_f16c(src: &[f32], dst: &mut [u16], count: usize) {
    let mut i = 0usize;
    while i + 8 <= count {
        let v = _mm256_loadu_ps(src.as_ptr().add(i));
        let h = _mm256_cvtps_ph::<_MM_FROUND_TO_NEAREST_INT>(v);
        _mm_storeu_si128(dst.as_mut_ptr().add(i) as *mut __m128i, h);
        i += 8;
    }
    while i < count {
        *dst.get_unchecked_mut(i) = f32_to_f16_bits(*src.get_unchecked(i));
        i += 1;
    }
}

// The aarch64 fp16 conversion intrinsics are not stable, so the vector bodies
// use fcvtl/fcvtn directly, the same way the asm GEMM microkernels do. FPCR
// default rounding is round-to-nearest-even, matching the scalar reference.

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn cast_f16_to_f32_neon(src: &[u16], dst: &mut [f32], count: usize) {
    let mut i = 0usize;
    while i + 8 <= count {
        let sptr = src.as_ptr().add(i);
        let dptr = dst.as_mut_ptr().add(i);
        core::arch::asm!(
            "ld1 {{v0.8h}}, [{sptr}]",
            "fcvtl  v1.4s, v0.4h",
            "fcvtl2 v2.4s, v0.8h",
            "st1 {{v1.4s, v2.4s}}, [{dptr}]",
            sptr = in(reg) sptr,
            dptr = in(reg) dptr,
            out("v0") _,
            out("v1") _,
            out("v2") _,
            options(nostack),
        );
        i += 8;
    }
    while i < count {
        *dst.get_unchecked_mut(i) = f16_bits_to_f32(*src.get_unchecked(i));
        i += 1;
    }
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn cast_f32_to_f16_neon(src: &[f32], dst: &mut [u16], count: usize) {
    let mut i = 0usize;
    while i + 8 <= count {
        let sptr = src.as_ptr().add(i);
        let dptr = dst.as_mut_ptr().add(i);
        core::arch::asm!(
            "ld1 {{v0.4s, v1.4s}}, [{sptr}]",
            "fcvtn  v2.4h, v0.4s",
            "fcvtn2 v2.8h, v1.4s",
            "st1 {{v2.8h}}, [{dptr}]",
            sptr = in(reg) sptr,
            dptr = in(reg) dptr,
            out("v0") _,
            out("v1") _,
            out("v2") _,
            options(nostack),
        );
        i += 8;
    }
    while i < count {
        *dst.get_unchecked_mut(i) = f32_to_f16_bits(*src.get_unchecked(i));
        i += 1;
    }
}
