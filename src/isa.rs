//! Runtime ISA detection.
//!
//! Detection gates which code path executes; it must never change observable
//! results. Every SIMD kernel in this crate has a scalar twin with identical
//! pre/postconditions, and the tests hold them to byte equality.

use std::sync::OnceLock;

/// Vector instruction set selected for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsaLevel {
    Scalar,
    Avx2,
    Neon,
}

static ISA_LEVEL: OnceLock<IsaLevel> = OnceLock::new();

/// Detected ISA level, cached after the first call.
pub fn get_isa_level() -> IsaLevel {
    *ISA_LEVEL.get_or_init(|| {
        let level = detect_isa_features();
        log::debug!("qnbit-kernels ISA level: {:?}", level);
        level
    })
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_isa_features() -> IsaLevel {
    if is_x86_feature_detected!("avx2") {
        IsaLevel::Avx2
    } else {
        IsaLevel::Scalar
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_isa_features() -> IsaLevel {
    IsaLevel::Neon
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_isa_features() -> IsaLevel {
    IsaLevel::Scalar
}

/// Whether the F16C conversion instructions are available. Gates the vector
/// path of the fp16 casts on x86_64.
#[inline]
pub fn has_f16c() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("f16c")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}
