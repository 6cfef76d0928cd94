//! Vector construction.
//!
//! A vector is started with only its count field reserved; each push appends one element
//! directly behind the previous one. Scalar elements are stored inline. String, table and
//! vector elements are stored as offsets of the vector's [`OffsetType`]:
//!
//! - tables and vectors must be finished before the vector is started, and are pushed by
//!   [`Handle`]
//! - strings are pushed by value; a zeroed slot is reserved immediately and the string
//!   content is appended behind the vector's elements when the vector ends
//!
//! ```text
//! vector of 2 strings, count uint8, offset uint8, starting at 0:
//! [2][3][5][1 'a'][2 'b' 'c']
//!     |  |   ^        ^
//!     |  +---|--------+
//!     +------+
//! ```

use std::mem;

use log::{debug, warn};

use super::{
    frame::{element_size, Frame, FrameBody, VectorFrame},
    Encoder, FrameKind, Handle,
};
use crate::{io::ElementKind, io::Scalar, sink::Sink, CountType, Error, OffsetType, Result};

impl<S: Sink> Encoder<S> {
    /// Starts a vector of `kind` elements.
    ///
    /// # Errors
    ///
    /// [`Error::VectorInProgress`] if another vector is being built, or any sink error.
    pub fn vector_start(
        &mut self,
        kind: ElementKind,
        count_type: CountType,
        offset_type: OffsetType,
    ) -> Result<()> {
        self.ensure_appendable()?;

        let start = self.reserve(count_type.size() as u64)?;
        self.push_frame(Frame {
            start,
            count_type,
            offset_type,
            body: FrameBody::Vector(VectorFrame {
                element: kind,
                count: 0,
                pending: Vec::new(),
            }),
        });

        debug!(
            "vector of {kind} started at {start}, depth {}",
            self.depth()
        );
        Ok(())
    }

    /// Appends a scalar element to the innermost vector.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyStack`] or [`Error::FrameMismatch`] if no vector is on top
    /// - [`Error::ElementMismatch`] if the vector holds another element kind
    /// - [`Error::Overflow`] if the element count no longer fits the count type
    pub fn vector_push<T: Scalar>(&mut self, value: T) -> Result<()> {
        self.next_element(T::KIND)?;

        let position = self.reserve(T::size() as u64)?;
        self.write(position, value.to_le_bytes().as_ref())?;
        self.bump_count()
    }

    /// Appends a string element to the innermost vector.
    ///
    /// The element slot is reserved now; the string itself is appended, with the vector's
    /// count type, when the vector ends.
    ///
    /// # Errors
    ///
    /// As [`Encoder::vector_push`], plus [`Error::Overflow`] if the string is longer than the
    /// count type allows.
    pub fn vector_push_string(&mut self, value: &str) -> Result<()> {
        let (count_type, offset_type) = self.next_element(ElementKind::String)?;
        if !count_type.fits(value.len() as u64) {
            return Err(Error::Overflow {
                value: value.len() as u64,
                width: count_type.size(),
            });
        }

        let slot = self.reserve(offset_type.size() as u64)?;
        if let FrameBody::Vector(vector) = &mut self.top_mut()?.body {
            vector.pending.push((slot, value.to_owned()));
        }
        self.bump_count()
    }

    /// Appends a reference to a finished table.
    ///
    /// # Errors
    ///
    /// As [`Encoder::vector_push`], plus [`Error::InvalidHandle`] if the table is not finished.
    pub fn vector_push_table(&mut self, table: Handle) -> Result<()> {
        self.push_reference(ElementKind::Table, table)
    }

    /// Appends a reference to a finished vector.
    ///
    /// # Errors
    ///
    /// As [`Encoder::vector_push`], plus [`Error::InvalidHandle`] if the vector is not finished.
    pub fn vector_push_vector(&mut self, vector: Handle) -> Result<()> {
        self.push_reference(ElementKind::Vector, vector)
    }

    /// Writes the element count of the innermost vector, appends pending strings and closes it.
    ///
    /// The returned handle covers the count field and the elements; string content appended
    /// behind them is not part of it.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyStack`], [`Error::FrameMismatch`] or [`Error::ElementMismatch`] if no
    /// vector of `kind` is on top, [`Error::Overflow`] if a pending string or its offset does
    /// not fit the vector's widths, or any sink error. On error the vector stays open with its
    /// pending strings, and nothing behind its elements is kept.
    pub fn vector_end(&mut self, kind: ElementKind) -> Result<Handle> {
        let (start, count_type, offset_type, count) = {
            let (frame, vector) = self.top_vector(kind)?;
            (frame.start, frame.count_type, frame.offset_type, vector.count)
        };
        let footprint = self.offset() - start;

        let pending = match &mut self.top_mut()?.body {
            FrameBody::Vector(vector) => mem::take(&mut vector.pending),
            FrameBody::Table(_) => Vec::new(),
        };
        if let Err(error) = self.append_pending(count_type, offset_type, &pending) {
            if let FrameBody::Vector(vector) = &mut self.top_mut()?.body {
                vector.pending = pending;
            }
            self.rollback(start + footprint)?;
            return Err(error);
        }

        self.write_uint(start, count, count_type.size())?;
        self.pop_frame();

        debug!(
            "vector of {kind} ended at {start}: {count} elements, depth {}",
            self.depth()
        );
        Ok(Handle {
            offset: start,
            size: footprint,
        })
    }

    /// Appends the deferred string elements behind the vector and fills their slots.
    ///
    /// Every length and offset is checked before the first string is appended.
    fn append_pending(
        &mut self,
        count_type: CountType,
        offset_type: OffsetType,
        pending: &[(u64, String)],
    ) -> Result<()> {
        let mut next = self.offset();
        for (_, value) in pending {
            let length = value.len() as u64;
            if !count_type.fits(length) {
                return Err(Error::Overflow {
                    value: length,
                    width: count_type.size(),
                });
            }
            if !offset_type.fits(next) {
                return Err(Error::Overflow {
                    value: next,
                    width: offset_type.size(),
                });
            }
            next = next
                .saturating_add(count_type.size() as u64)
                .saturating_add(length);
        }

        for (slot, value) in pending {
            let string = self.append_string(count_type, value)?;
            self.write_reference(*slot, string, offset_type)?;
        }
        Ok(())
    }

    /// Discards the innermost vector and everything appended after its start.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyStack`], [`Error::FrameMismatch`] or [`Error::ElementMismatch`] if no
    /// vector of `kind` is on top, or any sink error. On error the vector stays open.
    pub fn vector_cancel(&mut self, kind: ElementKind) -> Result<()> {
        let start = self.top_vector(kind)?.0.start;
        self.rollback(start)?;
        self.pop_frame();

        debug!(
            "vector of {kind} cancelled at {start}, depth {}",
            self.depth()
        );
        Ok(())
    }

    /// Builds a complete vector of scalars in one call.
    ///
    /// On failure the partially built vector is cancelled.
    ///
    /// # Errors
    ///
    /// See [`Encoder::vector_start`], [`Encoder::vector_push`] and [`Encoder::vector_end`].
    pub fn vector_create<T: Scalar>(
        &mut self,
        count_type: CountType,
        offset_type: OffsetType,
        values: &[T],
    ) -> Result<Handle> {
        self.create_with(T::KIND, count_type, offset_type, |encoder| {
            values
                .iter()
                .try_for_each(|&value| encoder.vector_push(value))
        })
    }

    /// Builds a complete vector of strings in one call.
    ///
    /// # Errors
    ///
    /// See [`Encoder::vector_create`] and [`Encoder::vector_push_string`].
    pub fn vector_create_string<V: AsRef<str>>(
        &mut self,
        count_type: CountType,
        offset_type: OffsetType,
        values: &[V],
    ) -> Result<Handle> {
        self.create_with(ElementKind::String, count_type, offset_type, |encoder| {
            values
                .iter()
                .try_for_each(|value| encoder.vector_push_string(value.as_ref()))
        })
    }

    /// Builds a complete vector of table references in one call.
    ///
    /// # Errors
    ///
    /// See [`Encoder::vector_create`] and [`Encoder::vector_push_table`].
    pub fn vector_create_table(
        &mut self,
        count_type: CountType,
        offset_type: OffsetType,
        tables: &[Handle],
    ) -> Result<Handle> {
        self.create_with(ElementKind::Table, count_type, offset_type, |encoder| {
            tables
                .iter()
                .try_for_each(|&table| encoder.vector_push_table(table))
        })
    }

    /// Builds a complete vector of vector references in one call.
    ///
    /// # Errors
    ///
    /// See [`Encoder::vector_create`] and [`Encoder::vector_push_vector`].
    pub fn vector_create_vector(
        &mut self,
        count_type: CountType,
        offset_type: OffsetType,
        vectors: &[Handle],
    ) -> Result<Handle> {
        self.create_with(ElementKind::Vector, count_type, offset_type, |encoder| {
            vectors
                .iter()
                .try_for_each(|&vector| encoder.vector_push_vector(vector))
        })
    }

    fn create_with<F>(
        &mut self,
        kind: ElementKind,
        count_type: CountType,
        offset_type: OffsetType,
        fill: F,
    ) -> Result<Handle>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.vector_start(kind, count_type, offset_type)?;

        let depth = self.depth();
        match fill(self).and_then(|()| self.vector_end(kind)) {
            Ok(handle) => Ok(handle),
            Err(error) => {
                warn!("rolling back vector of {kind}: {error}");
                if self.depth() == depth {
                    if let Err(cancel) = self.vector_cancel(kind) {
                        warn!("vector of {kind} could not be rolled back: {cancel}");
                    }
                }
                Err(error)
            }
        }
    }

    fn top_vector(&self, kind: ElementKind) -> Result<(&Frame, &VectorFrame)> {
        let frame = self.top()?;
        match &frame.body {
            FrameBody::Vector(vector) if vector.element == kind => Ok((frame, vector)),
            FrameBody::Vector(vector) => Err(Error::ElementMismatch {
                expected: kind,
                found: vector.element,
            }),
            FrameBody::Table(_) => Err(Error::FrameMismatch {
                expected: FrameKind::Vector,
                found: FrameKind::Table,
            }),
        }
    }

    /// Validates a push of `kind` and returns the vector's widths.
    fn next_element(&self, kind: ElementKind) -> Result<(CountType, OffsetType)> {
        let (frame, vector) = self.top_vector(kind)?;
        let count = vector.count.saturating_add(1);
        if !frame.count_type.fits(count) {
            return Err(Error::Overflow {
                value: count,
                width: frame.count_type.size(),
            });
        }
        Ok((frame.count_type, frame.offset_type))
    }

    fn bump_count(&mut self) -> Result<()> {
        if let FrameBody::Vector(vector) = &mut self.top_mut()?.body {
            vector.count += 1;
        }
        Ok(())
    }

    fn push_reference(&mut self, kind: ElementKind, handle: Handle) -> Result<()> {
        let (_, offset_type) = self.next_element(kind)?;
        self.check_handle(handle)?;
        if !offset_type.fits(handle.offset) {
            return Err(Error::Overflow {
                value: handle.offset,
                width: offset_type.size(),
            });
        }

        let slot = self.reserve(element_size(kind, offset_type))?;
        self.write_reference(slot, handle, offset_type)?;
        self.bump_count()
    }
}
