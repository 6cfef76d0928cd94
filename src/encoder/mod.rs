//! Incremental, append-only buffer encoder.
//!
//! The [`Encoder`] builds a buffer by appending containers to a [`Sink`] and tracking where
//! each container's header, presence bitmap and fixed area live. It never materializes a tree
//! of objects: every value is written to its final position as soon as it is known.
//!
//! # Architecture
//!
//! The encoder owns three pieces of state:
//!
//! - **Frame stack** - one record per open table or vector, last opened first closed
//! - **Append cursor** - absolute offset of the next reservation
//! - **Sink** - receives every reserve, write and truncate
//!
//! Starting a container reserves its whole known footprint at the cursor. Field writes and
//! pushes apply to the frame on top of the stack only. Ending a container flushes its
//! header and pops it; cancelling truncates the sink back to the container's start and
//! restores the cursor to exactly that value.
//!
//! ## Layout Rules
//!
//! | Container | Bytes |
//! |---|---|
//! | Table | `count ‖ bitmap(ceil(fields / 8)) ‖ fixed area` |
//! | Vector | `count ‖ element₀ ‖ … ‖ elementₙ₋₁` |
//! | String | `length ‖ utf-8 bytes` |
//!
//! All integers are little-endian. References to strings, tables and vectors are absolute
//! offsets from the start of the buffer, stored in the container's [`OffsetType`].
//!
//! ## Ordering
//!
//! Content is appended strictly forward. A reference can only be stored once the referenced
//! content is finished, so children are built after their parent table has been started
//! (they land behind its fixed area) and before the reference to them is set. The elements
//! of a vector must stay contiguous: while a vector is on top of the stack no other container
//! or string can be started. String elements pushed into a vector are appended after the
//! vector's elements when the vector ends.
//!
//! # Key Components
//!
//! - [`Encoder`] - The construction protocol
//! - [`Handle`] - Position and size of a finished container or string
//! - [`EncoderOptions`] - Sink configuration
//! - [`FrameKind`] - Kind of an open container, reported in errors
//!
//! # Usage Examples
//!
//! ```rust
//! use linearbuffers::{CountType, Encoder, OffsetType};
//!
//! let mut encoder = Encoder::new();
//! encoder.table_start(CountType::Uint8, OffsetType::Uint32, 3, 10)?;
//! encoder.table_set::<u16>(0, 0, 0x1234)?;
//! encoder.table_create_string(2, 6, "hi")?;
//! let root = encoder.table_end()?;
//!
//! assert_eq!(root.offset, 0);
//! assert_eq!(root.size, 1 + 1 + 10);
//! assert_eq!(
//!     encoder.linearized()?,
//!     &[3, 0b101, 0x34, 0x12, 0, 0, 0, 0, 12, 0, 0, 0, 2, b'h', b'i'][..]
//! );
//! # Ok::<(), linearbuffers::Error>(())
//! ```
//!
//! # Error Handling
//!
//! Every operation returns a [`crate::Result`]. A failed operation leaves the frame stack
//! intact, so the caller can cancel the open containers to get back to a clean state, or
//! drop the encoder.
//!
//! # Thread Safety
//!
//! An encoder is a single-threaded session object; it is `Send` when its sink is, but
//! performs no internal synchronization.

mod frame;
mod options;
mod string;
mod table;
mod vector;

pub use frame::FrameKind;
pub use options::EncoderOptions;

use log::debug;

use crate::{
    io::uint_le_bytes,
    sink::{ConfiguredSink, MemorySink, Sink, SinkOp},
    utils::checked_add,
    Error, OffsetType, Result,
};
use frame::{Frame, FrameBody};

/// Position and size of a finished container or string.
///
/// Returned by every `*_end` and `*_create` operation and passed back to the encoder to store
/// a reference to the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Absolute offset of the content's count field
    pub offset: u64,
    /// Number of bytes of the content's own footprint
    pub size: u64,
}

impl Handle {
    /// Offset one past the content's own footprint.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// Append-only encoder driving a [`Sink`].
///
/// See the [module documentation](self) for the layout and ordering rules.
pub struct Encoder<S: Sink = MemorySink> {
    sink: S,
    frames: Vec<Frame>,
    cursor: u64,
}

impl Encoder<MemorySink> {
    /// Creates an encoder writing into a fresh [`MemorySink`].
    #[must_use]
    pub fn new() -> Self {
        Encoder::with_sink(MemorySink::new())
    }
}

impl Default for Encoder<MemorySink> {
    fn default() -> Self {
        Encoder::new()
    }
}

impl<C: Default> Encoder<ConfiguredSink<C>> {
    /// Creates an encoder with the sink described by `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options are inconsistent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linearbuffers::{Encoder, EncoderOptions};
    ///
    /// let options: EncoderOptions = EncoderOptions::new().with_page_size(256);
    /// let encoder = Encoder::with_options(options)?;
    /// assert_eq!(encoder.offset(), 0);
    /// # Ok::<(), linearbuffers::Error>(())
    /// ```
    pub fn with_options(options: EncoderOptions<C>) -> Result<Self> {
        Ok(Encoder::with_sink(options.into_sink()?))
    }

    /// Discards all state and continues with the sink described by `options`.
    ///
    /// On error the encoder is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options are inconsistent.
    pub fn reset_with(&mut self, options: EncoderOptions<C>) -> Result<()> {
        let sink = options.into_sink()?;
        self.sink = sink;
        self.frames.clear();
        self.cursor = self.sink.len();
        Ok(())
    }
}

impl<S: Sink> Encoder<S> {
    /// Creates an encoder appending to `sink` after its current content.
    pub fn with_sink(sink: S) -> Self {
        let cursor = sink.len();
        Encoder {
            sink,
            frames: Vec::new(),
            cursor,
        }
    }

    /// Truncates the sink to zero and drops all open containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the truncate.
    pub fn reset(&mut self) -> Result<()> {
        self.rollback(0)?;
        self.frames.clear();
        Ok(())
    }

    /// The encoded buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::OpenFrames`] while containers are still open
    /// - [`Error::NotSupported`] if the sink does not keep the output in memory
    pub fn linearized(&self) -> Result<&[u8]> {
        if !self.frames.is_empty() {
            return Err(Error::OpenFrames(self.frames.len()));
        }
        self.sink.linearized().ok_or(Error::NotSupported)
    }

    /// Consumes the encoder and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// The sink receiving the output.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The append cursor: offset at which the next content will be placed.
    pub fn offset(&self) -> u64 {
        self.cursor
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Kind of the innermost open container.
    pub fn current(&self) -> Option<FrameKind> {
        self.frames.last().map(Frame::kind)
    }

    fn top(&self) -> Result<&Frame> {
        self.frames.last().ok_or(Error::EmptyStack)
    }

    fn top_mut(&mut self) -> Result<&mut Frame> {
        self.frames.last_mut().ok_or(Error::EmptyStack)
    }

    fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Fails while a vector is being built; its elements must stay contiguous.
    fn ensure_appendable(&self) -> Result<()> {
        match self.frames.last() {
            Some(frame) if matches!(frame.body, FrameBody::Vector(_)) => {
                Err(Error::VectorInProgress)
            }
            _ => Ok(()),
        }
    }

    /// Reserves `length` zeroed bytes at the cursor and returns their offset.
    fn reserve(&mut self, length: u64) -> Result<u64> {
        let start = self.cursor;
        let end = checked_add(start, length)?;
        self.sink.emit(SinkOp::Reserve {
            offset: start,
            length,
        })?;
        self.cursor = end;
        Ok(start)
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.sink.emit(SinkOp::Write { offset, bytes })
    }

    /// Writes `value` as a little-endian integer of `width` bytes.
    fn write_uint(&mut self, offset: u64, value: u64, width: usize) -> Result<()> {
        let bytes = uint_le_bytes(value, width)?;
        self.write(offset, &bytes[..width])
    }

    /// Stores a reference to `handle` as an offset of `offset_type` at `position`.
    fn write_reference(
        &mut self,
        position: u64,
        handle: Handle,
        offset_type: OffsetType,
    ) -> Result<()> {
        self.write_uint(position, handle.offset, offset_type.size())
    }

    /// A reference must point at finished content.
    fn check_handle(&self, handle: Handle) -> Result<()> {
        match handle.offset.checked_add(handle.size) {
            Some(end) if end <= self.cursor => Ok(()),
            _ => Err(Error::InvalidHandle {
                offset: handle.offset,
                size: handle.size,
                extent: self.cursor,
            }),
        }
    }

    /// Truncates the sink back to `start` and moves the cursor there.
    fn rollback(&mut self, start: u64) -> Result<()> {
        let length = self.cursor.saturating_sub(start);
        let delta = i64::try_from(length).map_err(|_| Error::Overflow {
            value: length,
            width: 8,
        })?;

        self.sink.emit(SinkOp::Truncate {
            offset: self.cursor,
            length: -delta,
        })?;

        debug!("rolled back {} bytes to offset {}", length, start);
        self.cursor = start;
        Ok(())
    }
}

impl<S: Sink> std::fmt::Debug for Encoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("cursor", &self.cursor)
            .field("frames", &self.frames)
            .field("sink_len", &self.sink.len())
            .finish()
    }
}
