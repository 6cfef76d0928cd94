use log::{debug, trace};

use super::{Sink, SinkOp, PAGE_SIZE};
use crate::{
    utils::{round_up, to_usize},
    Error, Result,
};

/// In-process sink backed by a single page-grown buffer.
///
/// Physical capacity is always a multiple of the page size and only ever grows; a truncate
/// lowers the logical length but keeps the storage for the next reservation.
#[derive(Debug, Clone)]
pub struct MemorySink {
    /// Physical storage, its length is the capacity
    data: Vec<u8>,
    /// Logical length
    len: usize,
    page_size: usize,
    grow_events: usize,
}

impl MemorySink {
    /// Create an empty sink growing in pages of [`PAGE_SIZE`] bytes
    #[must_use]
    pub fn new() -> MemorySink {
        MemorySink {
            data: Vec::new(),
            len: 0,
            page_size: PAGE_SIZE,
            grow_events: 0,
        }
    }

    /// Create an empty sink growing in pages of `page_size` bytes
    ///
    /// ## Arguments
    /// * 'page_size' - Growth granularity, must be a power of two
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if `page_size` is zero or not a power of two.
    pub fn with_page_size(page_size: usize) -> Result<MemorySink> {
        if !page_size.is_power_of_two() {
            return Err(Error::InvalidOptions(format!(
                "page size {page_size} is not a power of two"
            )));
        }

        Ok(MemorySink {
            page_size,
            ..MemorySink::new()
        })
    }

    /// Physical capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Growth granularity in bytes
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of times the physical storage was enlarged
    #[must_use]
    pub fn grow_events(&self) -> usize {
        self.grow_events
    }

    /// The logical content
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Consumes the sink and returns the logical content
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.truncate(self.len);
        self.data
    }

    /// Applies a raw, sentinel-encoded operation; usable as an
    /// [`EmitFunction`](super::EmitFunction) with the sink as its context.
    ///
    /// Returns `0` on success and `-1` if the operation was rejected.
    pub fn emit_raw(sink: &mut MemorySink, offset: u64, buffer: Option<&[u8]>, length: i64) -> i32 {
        let result = SinkOp::from_raw(offset, buffer, length).and_then(|op| sink.emit(op));
        match result {
            Ok(()) => 0,
            Err(error) => {
                debug!("memory sink rejected operation at {offset}: {error}");
                -1
            }
        }
    }

    fn ensure_capacity(&mut self, end: usize) -> Result<()> {
        if end <= self.data.len() {
            return Ok(());
        }

        let capacity = round_up(end, self.page_size)?;
        trace!(
            "memory sink grows from {} to {} bytes",
            self.data.len(),
            capacity
        );

        self.data.resize(capacity, 0);
        self.grow_events += 1;
        Ok(())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        MemorySink::new()
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, op: SinkOp<'_>) -> Result<()> {
        let extent = to_usize(op.extent_after(self.len as u64)?)?;

        match op {
            SinkOp::Reserve { offset, length } => {
                self.ensure_capacity(extent)?;
                // Bytes past the logical length may hold cancelled content
                let start = to_usize(offset)?.min(self.len);
                let end = (to_usize(offset)? + to_usize(length)?).max(start);
                self.data[start..end].fill(0);
            }
            SinkOp::Write { offset, bytes } => {
                let start = to_usize(offset)?;
                self.data[start..start + bytes.len()].copy_from_slice(bytes);
            }
            SinkOp::Truncate { .. } => {}
        }

        self.len = extent;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.len as u64
    }

    fn linearized(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}
