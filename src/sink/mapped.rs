//! Memory-mapped file sink.
//!
//! [`MappedSink`] writes the encoded buffer straight into a file on disk through a writable
//! memory mapping. The file is grown in whole pages, re-mapped after each growth, and trimmed
//! to the logical length when the sink is finalized.
//!
//! # Lifecycle
//!
//! 1. [`MappedSink::create`] creates (or truncates) the target file
//! 2. The encoder emits its operations; the file grows page by page
//! 3. [`MappedSink::finalize`] flushes the mapping and trims the file
//!
//! A sink dropped without being finalized removes its file, so an aborted encode never
//! leaves a partial output behind.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use linearbuffers::{sink::MappedSink, CountType, Encoder};
//!
//! let sink = MappedSink::create("message.bin")?;
//! let mut encoder = Encoder::with_sink(sink);
//! encoder.string_create(CountType::Uint32, "hello")?;
//! encoder.into_sink().finalize()?;
//! # Ok::<(), linearbuffers::Error>(())
//! ```

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use log::trace;
use memmap2::{MmapMut, MmapOptions};

use super::{Sink, SinkOp, PAGE_SIZE};
use crate::{
    utils::{round_up, to_usize},
    Result,
};

/// File-backed sink using a writable memory mapping.
#[derive(Debug)]
pub struct MappedSink {
    /// Handle of the output file
    file: File,
    /// Current mapping, `None` while the file is empty
    mmap: Option<MmapMut>,
    /// Location of the output file
    target_path: PathBuf,
    /// Logical length
    len: usize,
    page_size: usize,
    /// Whether the file has been trimmed and flushed
    finalized: bool,
}

impl MappedSink {
    /// Creates the output file at `target_path`, truncating any existing content.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be created.
    pub fn create<P: AsRef<Path>>(target_path: P) -> Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target_path)?;

        Ok(Self {
            file,
            mmap: None,
            target_path,
            len: 0,
            page_size: PAGE_SIZE,
            finalized: false,
        })
    }

    /// Physical size of the file in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.mmap.as_ref().map_or(0, |mmap| mmap.len())
    }

    /// Location of the output file.
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Flushes outstanding writes of the mapping to the file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(mmap) = &self.mmap {
            mmap.flush()?;
        }
        Ok(())
    }

    /// Flushes the mapping, trims the file to the logical length and keeps it on disk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if flushing or resizing the file fails.
    pub fn finalize(mut self) -> Result<PathBuf> {
        self.flush()?;
        self.mmap = None;

        self.file.set_len(self.len as u64)?;
        self.file.sync_all()?;

        self.finalized = true;
        Ok(self.target_path.clone())
    }

    fn ensure_capacity(&mut self, end: usize) -> Result<()> {
        let current = self.capacity();
        if end <= current {
            return Ok(());
        }

        let capacity = round_up(end, self.page_size)?;
        trace!(
            "mapped sink {} grows from {} to {} bytes",
            self.target_path.display(),
            current,
            capacity
        );

        // The mapping must be released before the file can be resized on all platforms
        self.flush()?;
        self.mmap = None;
        self.file.set_len(capacity as u64)?;

        // SAFETY: the file is exclusively owned by this sink for its whole lifetime
        let mmap = unsafe { MmapOptions::new().map_mut(&self.file)? };
        self.mmap = Some(mmap);
        Ok(())
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.mmap.as_deref_mut().unwrap_or_default()
    }
}

impl Sink for MappedSink {
    fn emit(&mut self, op: SinkOp<'_>) -> Result<()> {
        let extent = to_usize(op.extent_after(self.len as u64)?)?;

        match op {
            SinkOp::Reserve { offset, length } => {
                self.ensure_capacity(extent)?;
                let start = to_usize(offset)?.min(self.len);
                let end = (to_usize(offset)? + to_usize(length)?).max(start);
                self.bytes_mut()[start..end].fill(0);
            }
            SinkOp::Write { offset, bytes } => {
                let start = to_usize(offset)?;
                self.bytes_mut()[start..start + bytes.len()].copy_from_slice(bytes);
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
        match &self.mmap {
            Some(mmap) => Some(&mmap[..self.len]),
            None => Some(&[]),
        }
    }
}

impl Drop for MappedSink {
    fn drop(&mut self) {
        if !self.finalized {
            self.mmap = None;
            let _ = std::fs::remove_file(&self.target_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs::File, io::Read};
    use tempfile::tempdir;

    #[test]
    fn test_creation() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        let sink = MappedSink::create(&target_path).unwrap();
        assert_eq!(sink.len(), 0);
        assert_eq!(sink.capacity(), 0);
        assert_eq!(sink.linearized(), Some(&[][..]));
        assert!(target_path.exists());
    }

    #[test]
    fn test_grows_in_pages() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        let mut sink = MappedSink::create(&target_path).unwrap();
        sink.emit(SinkOp::Reserve {
            offset: 0,
            length: 100,
        })
        .unwrap();
        assert_eq!(sink.capacity(), PAGE_SIZE);

        sink.emit(SinkOp::Write {
            offset: 96,
            bytes: &[1, 2, 3, 4],
        })
        .unwrap();
        sink.emit(SinkOp::Reserve {
            offset: 100,
            length: PAGE_SIZE as u64,
        })
        .unwrap();
        assert_eq!(sink.capacity(), 2 * PAGE_SIZE);

        let data = sink.linearized().unwrap();
        assert_eq!(data.len(), 100 + PAGE_SIZE);
        assert_eq!(&data[96..100], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_finalization() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        {
            let mut sink = MappedSink::create(&target_path).unwrap();
            sink.emit(SinkOp::Reserve {
                offset: 0,
                length: 16,
            })
            .unwrap();
            sink.emit(SinkOp::Write {
                offset: 0,
                bytes: b"Test content",
            })
            .unwrap();
            sink.emit(SinkOp::Truncate {
                offset: 16,
                length: -4,
            })
            .unwrap();
            let path = sink.finalize().unwrap();
            assert_eq!(path, target_path);
        }

        let mut file = File::open(&target_path).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();

        assert_eq!(contents, b"Test content");
    }

    #[test]
    fn test_drop_removes_file() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        {
            let mut sink = MappedSink::create(&target_path).unwrap();
            sink.emit(SinkOp::Reserve {
                offset: 0,
                length: 8,
            })
            .unwrap();
        }

        assert!(!target_path.exists());
    }

    #[test]
    fn test_bounds_checking() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        let mut sink = MappedSink::create(&target_path).unwrap();
        sink.emit(SinkOp::Reserve {
            offset: 0,
            length: 10,
        })
        .unwrap();

        assert!(sink
            .emit(SinkOp::Write {
                offset: 8,
                bytes: b"too long"
            })
            .is_err());
    }

    #[test]
    fn test_reserve_inside_extent() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        let mut sink = MappedSink::create(&target_path).unwrap();
        sink.emit(SinkOp::Reserve {
            offset: 0,
            length: 8,
        })
        .unwrap();
        sink.emit(SinkOp::Write {
            offset: 0,
            bytes: &[0xFF; 8],
        })
        .unwrap();
        sink.emit(SinkOp::Reserve {
            offset: 2,
            length: 2,
        })
        .unwrap();

        assert_eq!(sink.len(), 8);
        assert_eq!(
            sink.linearized().unwrap(),
            &[0xFF, 0xFF, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }
}
