//! Fixed-width little-endian scalar codec.
//!
//! Every value stored in a buffer, whether a table field, a vector element or a count or
//! offset header, is a fixed-width little-endian integer or IEEE 754 float. This module
//! provides the single generic code path used for all of them, so the encoder and decoder
//! never carry one function per numeric type.
//!
//! # Architecture
//!
//! - [`Scalar`] ties each Rust numeric type to its [`ElementKind`] and its byte pattern
//! - [`read_le`] and [`read_le_at`] read any [`Scalar`] with bounds checking
//! - [`read_uint_at`] and [`uint_le_bytes`] handle count and offset fields whose width is
//!   only known at runtime
//!
//! ## Supported Types
//! - **Unsigned integers**: `u8`, `u16`, `u32`, `u64`
//! - **Signed integers**: `i8`, `i16`, `i32`, `i64`
//! - **Floating point**: `f32`, `f64`
//!
//! # Usage Examples
//!
//! ```rust
//! use linearbuffers::io::{read_le_at, read_uint_at, uint_le_bytes};
//!
//! let bytes = (-2i16).to_le_bytes();
//! let mut offset = 0;
//! let value: i16 = read_le_at(&bytes, &mut offset)?;
//! assert_eq!(value, -2);
//! assert_eq!(offset, 2);
//!
//! let count = uint_le_bytes(0x0102, 2)?;
//! assert_eq!(&count[..2], &[0x02, 0x01]);
//! assert_eq!(read_uint_at(&count, 0, 2)?, 0x0102);
//! # Ok::<(), linearbuffers::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All functions are pure and operate on borrowed data only.

use strum::{Display, EnumCount, EnumIter};

use crate::{Error, Result};

/// The kind of value stored in a vector or table slot.
///
/// Scalar kinds are stored inline with their natural width. Reference kinds are stored as an
/// absolute offset whose width is the [`crate::OffsetType`] of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    Uint8,
    /// Unsigned 16-bit integer
    Uint16,
    /// Unsigned 32-bit integer
    Uint32,
    /// Unsigned 64-bit integer
    Uint64,
    /// IEEE 754 single precision float
    Float,
    /// IEEE 754 double precision float
    Double,
    /// Reference to a string
    String,
    /// Reference to a table
    Table,
    /// Reference to a vector
    Vector,
}

impl ElementKind {
    /// Inline size of a scalar kind, `None` for reference kinds.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            ElementKind::Int8 | ElementKind::Uint8 => Some(1),
            ElementKind::Int16 | ElementKind::Uint16 => Some(2),
            ElementKind::Int32 | ElementKind::Uint32 | ElementKind::Float => Some(4),
            ElementKind::Int64 | ElementKind::Uint64 | ElementKind::Double => Some(8),
            ElementKind::String | ElementKind::Table | ElementKind::Vector => None,
        }
    }

    /// Returns `true` for kinds stored as an offset to content elsewhere in the buffer.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        self.fixed_size().is_none()
    }
}

/// Numeric types that can be stored as table fields and vector elements.
///
/// Implemented for all fixed-width integers and both float widths. The byte pattern is the
/// native little-endian representation of the value.
pub trait Scalar: Copy + Sized {
    /// The element kind a vector of this type is declared with.
    const KIND: ElementKind;

    /// Byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;

    /// Number of bytes the value occupies on the wire.
    #[must_use]
    fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ElementKind = ElementKind::$kind;
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_scalar!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float,
    f64 => Double,
);

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: Scalar>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing the
/// offset by the number of bytes read.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: Scalar>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = T::size();
    let end = offset.checked_add(type_len).ok_or(Error::OutOfBounds)?;
    if end > data.len() {
        return Err(Error::OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(Error::OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Reads an unsigned integer of `width` bytes (1, 2, 4 or 8) at `offset`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes, or
/// [`crate::Error::InvalidWidth`] for an unsupported width.
pub fn read_uint_at(data: &[u8], offset: usize, width: usize) -> Result<u64> {
    let mut cursor = offset;
    let value = match width {
        1 => u64::from(read_le_at::<u8>(data, &mut cursor)?),
        2 => u64::from(read_le_at::<u16>(data, &mut cursor)?),
        4 => u64::from(read_le_at::<u32>(data, &mut cursor)?),
        8 => read_le_at::<u64>(data, &mut cursor)?,
        _ => return Err(Error::InvalidWidth(u8::try_from(width).unwrap_or(u8::MAX))),
    };

    Ok(value)
}

/// Encodes `value` as a little-endian unsigned integer of `width` bytes.
///
/// The returned array always has eight bytes; only the first `width` bytes are meaningful.
///
/// # Errors
///
/// Returns [`crate::Error::Overflow`] if `value` does not fit into `width` bytes, or
/// [`crate::Error::InvalidWidth`] for an unsupported width.
pub fn uint_le_bytes(value: u64, width: usize) -> Result<[u8; 8]> {
    let max = match width {
        1 => u64::from(u8::MAX),
        2 => u64::from(u16::MAX),
        4 => u64::from(u32::MAX),
        8 => u64::MAX,
        _ => return Err(Error::InvalidWidth(u8::try_from(width).unwrap_or(u8::MAX))),
    };

    if value > max {
        return Err(Error::Overflow { value, width });
    }

    Ok(value.to_le_bytes())
}
