//! Width catalog for count and offset fields.
//!
//! Every container selects two integer widths when it is started: the width of its count
//! field (number of table fields, vector elements or string bytes) and the width of the
//! offset fields that reference variable-length content. Both catalogs provide the same four
//! width classes, but they are independent types so that a count can never be passed where an
//! offset width is expected.
//!
//! # Key Components
//!
//! - [`CountType`] - Width of count fields
//! - [`OffsetType`] - Width of absolute offset references
//!
//! # Naming
//!
//! Width names are parsed case-insensitively, so both `"uint16"` and `"Uint16"` resolve to
//! the same width. Raw codes follow declaration order: `0` is `uint8`, `3` is `uint64`.
//! Unknown names or codes have a size of `0`, which callers must treat as an invalid schema.
//!
//! # Usage Examples
//!
//! ```rust
//! use linearbuffers::{CountType, OffsetType};
//!
//! assert_eq!(CountType::Uint16.size(), 2);
//! assert_eq!(OffsetType::size_of_name("Uint32"), 4);
//! assert_eq!(OffsetType::size_of_name("int32"), 0);
//! assert_eq!(CountType::smallest_for(300), CountType::Uint16);
//! assert_eq!(CountType::default(), CountType::Uint64);
//! ```

use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

macro_rules! width_catalog {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            EnumIter,
            EnumCount,
            EnumString,
            Display,
            IntoStaticStr,
        )]
        #[strum(ascii_case_insensitive, serialize_all = "lowercase")]
        pub enum $name {
            /// 1 byte, values up to `u8::MAX`
            Uint8,
            /// 2 bytes, values up to `u16::MAX`
            Uint16,
            /// 4 bytes, values up to `u32::MAX`
            Uint32,
            /// 8 bytes, values up to `u64::MAX`
            #[default]
            Uint64,
        }

        impl $name {
            /// Number of bytes a field of this width occupies on the wire.
            #[must_use]
            pub const fn size(self) -> usize {
                match self {
                    $name::Uint8 => 1,
                    $name::Uint16 => 2,
                    $name::Uint32 => 4,
                    $name::Uint64 => 8,
                }
            }

            /// Largest value representable in this width.
            #[must_use]
            pub const fn max_value(self) -> u64 {
                match self {
                    $name::Uint8 => u8::MAX as u64,
                    $name::Uint16 => u16::MAX as u64,
                    $name::Uint32 => u32::MAX as u64,
                    $name::Uint64 => u64::MAX,
                }
            }

            /// Returns `true` if `value` can be stored in this width.
            #[must_use]
            pub const fn fits(self, value: u64) -> bool {
                value <= self.max_value()
            }

            /// The narrowest width able to hold `value`.
            #[must_use]
            pub const fn smallest_for(value: u64) -> Self {
                if value <= u8::MAX as u64 {
                    $name::Uint8
                } else if value <= u16::MAX as u64 {
                    $name::Uint16
                } else if value <= u32::MAX as u64 {
                    $name::Uint32
                } else {
                    $name::Uint64
                }
            }

            /// Resolves a raw width code, `None` if the code is unknown.
            #[must_use]
            pub const fn from_raw(raw: u8) -> Option<Self> {
                match raw {
                    0 => Some($name::Uint8),
                    1 => Some($name::Uint16),
                    2 => Some($name::Uint32),
                    3 => Some($name::Uint64),
                    _ => None,
                }
            }

            /// The raw width code of this width.
            #[must_use]
            pub const fn to_raw(self) -> u8 {
                self as u8
            }

            /// Byte width of a raw width code, `0` if the code is unknown.
            #[must_use]
            pub const fn size_of_raw(raw: u8) -> usize {
                match Self::from_raw(raw) {
                    Some(width) => width.size(),
                    None => 0,
                }
            }

            /// Byte width of a width name such as `"uint16"` or `"Uint16"`, `0` if unknown.
            #[must_use]
            pub fn size_of_name(name: &str) -> usize {
                name.parse::<Self>().map_or(0, Self::size)
            }
        }

        impl TryFrom<u8> for $name {
            type Error = Error;

            fn try_from(raw: u8) -> Result<Self> {
                Self::from_raw(raw).ok_or(Error::InvalidWidth(raw))
            }
        }
    };
}

width_catalog!(
    /// Width of the count field of a table, vector or string.
    ///
    /// For tables the count holds the number of declared fields, for vectors the number of
    /// elements and for strings the number of UTF-8 bytes.
    CountType
);

width_catalog!(
    /// Width of an absolute offset referencing a string, table or vector.
    OffsetType
);
