//! Zero-copy reader for encoded buffers.
//!
//! The decoder is the exact inverse of the [`crate::Encoder`] layout. It borrows the buffer
//! and resolves tables, vectors and strings on demand; nothing is copied or validated ahead
//! of time beyond the header of the container being opened.
//!
//! # Key Components
//!
//! - [`TableView`] - Presence bitmap and fixed area of one table
//! - [`VectorView`] - Count and elements of one vector
//! - [`read_string`] - A length-prefixed UTF-8 string
//!
//! # Widths
//!
//! The wire format is positional and carries no type information: a reader must be told the
//! same [`crate::CountType`] and [`crate::OffsetType`] the encoder used. Nested containers
//! reached through a view are read with the widths of that view, and strings referenced from
//! a container use its count type.
//!
//! # Usage Examples
//!
//! ```rust
//! use linearbuffers::{decoder::TableView, CountType, Encoder, OffsetType};
//!
//! let mut encoder = Encoder::new();
//! encoder.table_start(CountType::Uint8, OffsetType::Uint16, 2, 6)?;
//! encoder.table_set::<u32>(0, 0, 42)?;
//! encoder.table_create_string(1, 4, "name")?;
//! encoder.table_end()?;
//!
//! let buffer = encoder.linearized()?;
//! let table = TableView::new(buffer, 0, 2, CountType::Uint8, OffsetType::Uint16)?;
//! assert_eq!(table.field::<u32>(0, 0)?, Some(42));
//! assert_eq!(table.string(1, 4)?, Some("name"));
//! # Ok::<(), linearbuffers::Error>(())
//! ```

mod table;
mod vector;

pub use table::TableView;
pub use vector::VectorView;

use crate::{io::read_uint_at, utils::to_usize, CountType, Error, Result};

/// Reads the string whose length field starts at `offset`.
///
/// # Errors
///
/// - [`Error::OutOfBounds`] if the string extends past the buffer
/// - [`Error::Malformed`] if the content is not valid UTF-8
pub fn read_string(buffer: &[u8], offset: u64, count_type: CountType) -> Result<&str> {
    let start = to_usize(offset)?;
    let length = to_usize(read_uint_at(buffer, start, count_type.size())?)?;

    let content = start + count_type.size();
    let end = content.checked_add(length).ok_or(Error::OutOfBounds)?;
    let bytes = buffer.get(content..end).ok_or(Error::OutOfBounds)?;

    std::str::from_utf8(bytes)
        .map_err(|error| malformed_error!("string at {} is not valid UTF-8: {}", offset, error))
}
