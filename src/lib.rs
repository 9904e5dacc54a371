//! qnbit-kernels: weight prepacking and float cast kernels for block-quantized GEMM.
//!
//! This crate provides the two data-movement kernels that sit on the hot path of
//! quantized inference:
//! - **Prepack**: rearranges an N x K matrix of 4-bit block-quantized weights from
//!   a row-major nibble layout into the tiled layout the GEMM kernel loads with
//!   full vector registers. Packed once per weight matrix, consumed many times.
//! - **Cast**: bulk element-wise fp16 <-> fp32 conversion, bit-exact against a
//!   scalar IEEE half-precision reference (subnormals included).
//!
//! Both kernels are pure functions over caller-owned buffers: no internal state,
//! no locking, no allocation on the fast path. SIMD variants (NEON / SSE / F16C)
//! are selected at a single runtime dispatch point and produce byte-identical
//! results to the scalar reference.
//!
//! # Quick Start
//!
//! ```ignore
//! use qnbit_kernels::{pack_quant_b_data, packed_buf_size, ComputeType};
//!
//! let size = packed_buf_size(n, k, 4, 32)?;
//! let mut packed = vec![0u8; size];
//! pack_quant_b_data(n, k, 4, 32, ComputeType::Fp16, &src, &mut packed, None)?;
//! ```

pub mod cast;
pub mod error;
pub mod isa;
pub mod nibble;
pub mod prepack;
pub mod types;
pub mod validation;

pub use cast::{cast_f16_to_f32, cast_f32_to_f16, f16_bits_to_f32, f32_to_f16_bits};
pub use error::{KernelError, KernelResult};
pub use isa::{get_isa_level, IsaLevel};
pub use nibble::{Nibbles, NibblesMut};
pub use prepack::{pack_quant_b_data, packed_buf_size, unpack_quant_b_data};
pub use types::ComputeType;
pub use validation::packed_row_bytes;
