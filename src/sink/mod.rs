//! Growable output sinks receiving the encoder's byte-level operations.
//!
//! The encoder never touches output memory directly. Every mutation is expressed as one of
//! three [`SinkOp`]s and handed to a [`Sink`] synchronously:
//!
//! - [`SinkOp::Reserve`] zero-fills a range and extends the logical length to cover it
//! - [`SinkOp::Write`] copies bytes into an already reserved range
//! - [`SinkOp::Truncate`] shrinks the logical length when a container is cancelled
//!
//! # Architecture
//!
//! The encoder always reserves the full footprint of a container before writing into any
//! part of it, so a sink only ever sees writes into bytes it has already reserved. Physical
//! storage grows in whole pages of [`PAGE_SIZE`] bytes (or a configured page size) and is
//! never shrunk by a truncate.
//!
//! # Key Components
//!
//! - [`Sink`] - Trait implemented by every output backend
//! - [`SinkOp`] - Tagged operation passed to a sink
//! - [`MemorySink`] - Default page-grown in-process buffer
//! - [`MappedSink`] - Memory-mapped output file
//! - [`CallbackSink`] - Adapter for a raw [`EmitFunction`] and its context
//! - [`ConfiguredSink`] - Sink selected by [`crate::EncoderOptions`]
//!
//! # Callback Contract
//!
//! Hosts that consume the encoded bytes themselves provide an [`EmitFunction`]. It receives
//! the three operations in their sentinel-encoded form and returns `0` on success:
//!
//! | `buffer` | `length` | operation |
//! |---|---|---|
//! | any | `< 0` | truncate the logical length to `offset + length` |
//! | `None` | `>= 0` | zero-fill `length` bytes at `offset` |
//! | `Some` | `>= 0` | copy `length` bytes of `buffer` to `offset` |
//!
//! [`SinkOp::from_raw`] and [`SinkOp::to_raw`] translate between both forms.
//!
//! # Usage Examples
//!
//! ```rust
//! use linearbuffers::sink::{MemorySink, Sink, SinkOp};
//!
//! let mut sink = MemorySink::new();
//! sink.emit(SinkOp::Reserve { offset: 0, length: 4 })?;
//! sink.emit(SinkOp::Write { offset: 1, bytes: &[0xAA, 0xBB] })?;
//! assert_eq!(sink.linearized(), Some(&[0x00, 0xAA, 0xBB, 0x00][..]));
//!
//! sink.emit(SinkOp::Truncate { offset: 4, length: -3 })?;
//! assert_eq!(sink.len(), 1);
//! # Ok::<(), linearbuffers::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! Sinks are owned by exactly one encoder and mutated through `&mut self`; no internal
//! locking is performed.

mod callback;
mod mapped;
mod memory;

pub use callback::CallbackSink;
pub use mapped::MappedSink;
pub use memory::MemorySink;

use crate::{Error, Result};

/// Default physical growth granularity of the page-grown sinks.
pub const PAGE_SIZE: usize = 4096;

/// Raw sink callback: `(context, offset, buffer, length) -> status`.
///
/// A status of `0` reports success, any other value aborts the operation that triggered the
/// callback with [`Error::SinkFailed`]. See the [module documentation](self) for how
/// `buffer` and `length` select the operation.
pub type EmitFunction<C> = fn(&mut C, u64, Option<&[u8]>, i64) -> i32;

/// A single byte-level mutation of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOp<'a> {
    /// Zero-fill `length` bytes at `offset` and extend the logical length to cover them.
    Reserve {
        /// First byte of the reserved range
        offset: u64,
        /// Number of bytes to reserve
        length: u64,
    },
    /// Copy `bytes` into the reserved range starting at `offset`.
    Write {
        /// First byte to overwrite
        offset: u64,
        /// The data to copy
        bytes: &'a [u8],
    },
    /// Set the logical length to `offset + length`, with `length <= 0`.
    Truncate {
        /// Logical length before the truncate
        offset: u64,
        /// Non-positive length delta
        length: i64,
    },
}

impl<'a> SinkOp<'a> {
    /// Decodes the sentinel-encoded arguments of an [`EmitFunction`] call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `buffer` holds fewer than `length` bytes.
    pub fn from_raw(offset: u64, buffer: Option<&'a [u8]>, length: i64) -> Result<Self> {
        if length < 0 {
            return Ok(SinkOp::Truncate { offset, length });
        }

        let length = length.unsigned_abs();
        match buffer {
            None => Ok(SinkOp::Reserve { offset, length }),
            Some(buffer) => {
                let count = usize::try_from(length).map_err(|_| Error::OutOfBounds)?;
                let bytes = buffer.get(..count).ok_or(Error::OutOfBounds)?;
                Ok(SinkOp::Write { offset, bytes })
            }
        }
    }

    /// Encodes this operation as the `(offset, buffer, length)` arguments of an
    /// [`EmitFunction`] call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if a length does not fit into `i64`, and
    /// [`Error::InvalidTruncate`] for a truncate with a positive length.
    pub fn to_raw(&self) -> Result<(u64, Option<&'a [u8]>, i64)> {
        match *self {
            SinkOp::Reserve { offset, length } => {
                let length = i64::try_from(length).map_err(|_| Error::Overflow {
                    value: length,
                    width: 8,
                })?;
                Ok((offset, None, length))
            }
            SinkOp::Write { offset, bytes } => {
                let length = i64::try_from(bytes.len()).map_err(|_| Error::Overflow {
                    value: bytes.len() as u64,
                    width: 8,
                })?;
                Ok((offset, Some(bytes), length))
            }
            SinkOp::Truncate { offset, length } => {
                if length > 0 {
                    return Err(Error::InvalidTruncate { offset, length });
                }
                Ok((offset, None, length))
            }
        }
    }

    /// Logical length of a sink of length `extent` after applying this operation.
    ///
    /// This validates the operation without performing it, and is shared by all sink
    /// implementations so that they agree on the reservation discipline.
    ///
    /// # Errors
    ///
    /// - [`Error::UnreservedWrite`] if a write touches bytes beyond `extent`
    /// - [`Error::InvalidTruncate`] if a truncate targets a negative length, grows the sink
    ///   or carries a positive length
    /// - [`Error::Overflow`] if a reservation end does not fit into `u64`
    pub fn extent_after(&self, extent: u64) -> Result<u64> {
        match *self {
            SinkOp::Reserve { offset, length } => {
                let end = offset.checked_add(length).ok_or(Error::Overflow {
                    value: offset,
                    width: 8,
                })?;
                Ok(extent.max(end))
            }
            SinkOp::Write { offset, bytes } => {
                let length = bytes.len() as u64;
                match offset.checked_add(length) {
                    Some(end) if end <= extent => Ok(extent),
                    _ => Err(Error::UnreservedWrite {
                        offset,
                        length,
                        extent,
                    }),
                }
            }
            SinkOp::Truncate { offset, length } => {
                let target = i128::from(offset) + i128::from(length);
                if length > 0 || target < 0 || target > i128::from(extent) {
                    return Err(Error::InvalidTruncate { offset, length });
                }
                u64::try_from(target).map_err(|_| Error::InvalidTruncate { offset, length })
            }
        }
    }
}

/// Destination of the encoder's output.
///
/// Implementations receive every reserve, write and truncate synchronously and must apply
/// it before returning. Validation of the reservation discipline is available through
/// [`SinkOp::extent_after`].
pub trait Sink {
    /// Applies a single operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation violates the reservation discipline or the
    /// backing storage fails.
    fn emit(&mut self, op: SinkOp<'_>) -> Result<()>;

    /// Current logical length in bytes.
    fn len(&self) -> u64;

    /// Returns `true` if nothing has been reserved yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The logical content as one contiguous slice, if the sink keeps it in memory.
    fn linearized(&self) -> Option<&[u8]> {
        None
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn emit(&mut self, op: SinkOp<'_>) -> Result<()> {
        (**self).emit(op)
    }

    fn len(&self) -> u64 {
        (**self).len()
    }

    fn linearized(&self) -> Option<&[u8]> {
        (**self).linearized()
    }
}

/// The sink selected by a set of [`crate::EncoderOptions`].
///
/// Options without an emit function produce the default [`MemorySink`]; options with a
/// function produce a [`CallbackSink`] around the configured context.
#[derive(Debug)]
pub enum ConfiguredSink<C> {
    /// Default in-process buffer
    Memory(MemorySink),
    /// Host-provided callback
    Callback(CallbackSink<C>),
}

impl<C> ConfiguredSink<C> {
    /// The callback context, if this sink forwards to a callback.
    #[must_use]
    pub fn context(&self) -> Option<&C> {
        match self {
            ConfiguredSink::Memory(_) => None,
            ConfiguredSink::Callback(callback) => Some(callback.context()),
        }
    }

    /// Consumes the sink and returns the callback context, if any.
    #[must_use]
    pub fn into_context(self) -> Option<C> {
        match self {
            ConfiguredSink::Memory(_) => None,
            ConfiguredSink::Callback(callback) => Some(callback.into_context()),
        }
    }
}

impl<C> Sink for ConfiguredSink<C> {
    fn emit(&mut self, op: SinkOp<'_>) -> Result<()> {
        match self {
            ConfiguredSink::Memory(sink) => sink.emit(op),
            ConfiguredSink::Callback(sink) => sink.emit(op),
        }
    }

    fn len(&self) -> u64 {
        match self {
            ConfiguredSink::Memory(sink) => sink.len(),
            ConfiguredSink::Callback(sink) => sink.len(),
        }
    }

    fn linearized(&self) -> Option<&[u8]> {
        match self {
            ConfiguredSink::Memory(sink) => sink.linearized(),
            ConfiguredSink::Callback(sink) => sink.linearized(),
        }
    }
}
