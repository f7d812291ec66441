//! Mapping of the cross-compiler's vector type names to the portable backend types.

use core::fmt;

/// Scalar kind of a shader input or uniform, as understood by the GPU backends.
///
/// The discriminants match the `backend.DataType` constants of the generated module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "the backend only knows these kinds")]
pub enum DataType {
    /// 32-bit float components.
    Float = 0,
    /// 32-bit signed integer components.
    Int = 1,
}

impl DataType {
    /// The numeric value of this kind in the generated module.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DataType {
    #[expect(
        clippy::min_ident_chars,
        reason = "It's a core library trait implementation"
    )]
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => f.write_str("float"),
            Self::Int => f.write_str("int"),
        }
    }
}

/// The type name reported by the cross-compiler is not one the backends support.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported input data type: {0}")]
pub struct UnsupportedTypeError(pub String);

/// Translates a cross-compiler type name into its kind and component count.
///
/// Only `float`, `float2`..`float4`, `int` and `int2`..`int4` are accepted.
///
/// # Errors
///
/// Returns [`UnsupportedTypeError`] for any other spelling.
#[inline]
pub fn parse_data_type(name: &str) -> Result<(DataType, u32), UnsupportedTypeError> {
    let (kind, components) = match name {
        "float" => (DataType::Float, 1),
        "float2" => (DataType::Float, 2),
        "float3" => (DataType::Float, 3),
        "float4" => (DataType::Float, 4),
        "int" => (DataType::Int, 1),
        "int2" => (DataType::Int, 2),
        "int3" => (DataType::Int, 3),
        "int4" => (DataType::Int, 4),
        _ => return Err(UnsupportedTypeError(name.to_owned())),
    };
    Ok((kind, components))
}
