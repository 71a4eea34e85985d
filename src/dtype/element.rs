//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};

/// Trait for types that can be elements of a dense buffer
///
/// This trait connects Rust's type system to the runtime dtype tag carried
/// by each buffer. `Pod + Zeroable` allow buffers to move elements to and
/// from device memory as raw bytes.
pub trait Element: Copy + Send + Sync + Pod + Zeroable + PartialEq + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;
            }
        )*
    };
}

impl_element! {
    f64 => F64,
    f32 => F32,
    i64 => I64,
    i32 => I32,
    i16 => I16,
    i8 => I8,
    u64 => U64,
    u32 => U32,
    u16 => U16,
    u8 => U8,
}

// Note: bool doesn't implement Pod, so Bool buffers are written as u8.

#[cfg(feature = "f16")]
impl_element! {
    half::f16 => F16,
    half::bf16 => BF16,
}
