//! Shared types for the prepack and cast kernels.

/// Accumulation precision of the GEMM kernel variant that will consume the
/// packed weights.
///
/// The tag selects among tuned kernel variants; it never changes the packed
/// layout, which is a pure function of (n, k, bits, block_len). New variants
/// are expected to grow here over time without touching the layout contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeType {
    /// FP32 accumulation (highest precision).
    Fp32,
    /// FP16 accumulation (fastest on hardware with native fp16 FMA).
    #[default]
    Fp16,
    /// BF16 accumulation.
    Bf16,
    /// INT8 accumulation with per-block rescale in the GEMM kernel.
    Int8,
}

impl ComputeType {
    /// Whether this variant requires a caller-supplied scratch buffer for
    /// packing. No currently supported variant does; the parameter exists so
    /// variants that precompute per-column sums can be added without an API
    /// break.
    pub fn requires_workspace(self) -> bool {
        false
    }
}
