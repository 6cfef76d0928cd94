//! Table construction.

use log::debug;

use super::{
    frame::{Frame, FrameBody, TableFrame},
    Encoder, FrameKind, Handle,
};
use crate::{
    io::Scalar,
    sink::Sink,
    utils::{bitmap_bytes, checked_add, to_usize, BitSet},
    CountType, Error, OffsetType, Result,
};

/// Geometry of the innermost open table, copied out so the sink can be borrowed mutably.
struct TableSlot {
    position: u64,
    count_type: CountType,
    offset_type: OffsetType,
}

impl<S: Sink> Encoder<S> {
    /// Starts a table with `fields` declared fields and a fixed area of `size` bytes.
    ///
    /// Reserves `count + ceil(fields / 8) + size` zeroed bytes at the append cursor; unset
    /// fields therefore read back as zero.
    ///
    /// # Errors
    ///
    /// - [`Error::VectorInProgress`] if a vector is being built
    /// - [`Error::Overflow`] if `fields` does not fit `count_type`
    /// - any sink error
    pub fn table_start(
        &mut self,
        count_type: CountType,
        offset_type: OffsetType,
        fields: u64,
        size: u64,
    ) -> Result<()> {
        self.ensure_appendable()?;
        if !count_type.fits(fields) {
            return Err(Error::Overflow {
                value: fields,
                width: count_type.size(),
            });
        }

        let header = checked_add(count_type.size() as u64, bitmap_bytes(fields))?;
        let footprint = checked_add(header, size)?;
        let bitmap = BitSet::new(to_usize(fields)?);

        let start = self.reserve(footprint)?;
        self.push_frame(Frame {
            start,
            count_type,
            offset_type,
            body: FrameBody::Table(TableFrame {
                fields,
                size,
                bitmap,
            }),
        });

        debug!(
            "table started at {start}: {fields} fields, {size} bytes fixed area, depth {}",
            self.depth()
        );
        Ok(())
    }

    /// Sets scalar field `field` stored at `offset` within the fixed area.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyStack`] or [`Error::FrameMismatch`] if no table is on top
    /// - [`Error::FieldOutOfRange`] if `field` is not below the declared field count
    /// - [`Error::OffsetOutOfRange`] if the value does not fit into the fixed area
    pub fn table_set<T: Scalar>(&mut self, field: u64, offset: u64, value: T) -> Result<()> {
        let slot = self.table_slot(field, offset, T::size() as u64)?;
        self.write(slot.position, value.to_le_bytes().as_ref())?;
        self.mark_present(field)
    }

    /// Sets field `field` to reference a finished string.
    ///
    /// # Errors
    ///
    /// As [`Encoder::table_set`], plus [`Error::InvalidHandle`] if the string is not finished
    /// and [`Error::Overflow`] if its offset does not fit the table's offset type.
    pub fn table_set_string(&mut self, field: u64, offset: u64, string: Handle) -> Result<()> {
        self.table_set_reference(field, offset, string)
    }

    /// Sets field `field` to reference a finished table.
    ///
    /// # Errors
    ///
    /// See [`Encoder::table_set_string`].
    pub fn table_set_table(&mut self, field: u64, offset: u64, table: Handle) -> Result<()> {
        self.table_set_reference(field, offset, table)
    }

    /// Sets field `field` to reference a finished vector.
    ///
    /// # Errors
    ///
    /// See [`Encoder::table_set_string`].
    pub fn table_set_vector(&mut self, field: u64, offset: u64, vector: Handle) -> Result<()> {
        self.table_set_reference(field, offset, vector)
    }

    /// Appends `value` as a string with the table's count type and references it from
    /// field `field`.
    ///
    /// # Errors
    ///
    /// See [`Encoder::table_set_string`]. The field and the string's offset are validated
    /// before anything is appended.
    pub fn table_create_string(&mut self, field: u64, offset: u64, value: &str) -> Result<Handle> {
        let slot = self.reference_slot(field, offset)?;
        self.check_next_reference(&slot)?;

        let string = self.append_string(slot.count_type, value)?;
        self.table_set_reference(field, offset, string)?;
        Ok(string)
    }

    /// Appends `values` as a vector with the table's offset type and references it from
    /// field `field`.
    ///
    /// # Errors
    ///
    /// See [`Encoder::table_set_string`] and [`Encoder::vector_create`]. The field and the
    /// vector's offset are validated before anything is appended.
    pub fn table_create_vector<T: Scalar>(
        &mut self,
        field: u64,
        offset: u64,
        count_type: CountType,
        values: &[T],
    ) -> Result<Handle> {
        let slot = self.reference_slot(field, offset)?;
        self.check_next_reference(&slot)?;

        let vector = self.vector_create(count_type, slot.offset_type, values)?;
        self.table_set_reference(field, offset, vector)?;
        Ok(vector)
    }

    /// Flushes the count and presence bitmap of the innermost table and closes it.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyStack`] or [`Error::FrameMismatch`] if no table is on top, or any sink
    /// error. On error the table stays open.
    pub fn table_end(&mut self) -> Result<Handle> {
        let (start, count_type, fields, size, bitmap) = {
            let (frame, table) = self.top_table()?;
            (
                frame.start,
                frame.count_type,
                table.fields,
                table.size,
                table.bitmap.as_bytes().to_vec(),
            )
        };

        let count_size = count_type.size();
        self.write_uint(start, fields, count_size)?;
        if !bitmap.is_empty() {
            self.write(start + count_size as u64, &bitmap)?;
        }
        self.pop_frame();

        let handle = Handle {
            offset: start,
            size: count_size as u64 + bitmap.len() as u64 + size,
        };
        debug!(
            "table ended at {start}: {} bytes, depth {}",
            handle.size,
            self.depth()
        );
        Ok(handle)
    }

    /// Discards the innermost table and everything appended after its start.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyStack`] or [`Error::FrameMismatch`] if no table is on top, or any sink
    /// error. On error the table stays open.
    pub fn table_cancel(&mut self) -> Result<()> {
        let start = self.top_table()?.0.start;
        self.rollback(start)?;
        self.pop_frame();

        debug!("table cancelled at {start}, depth {}", self.depth());
        Ok(())
    }

    fn top_table(&self) -> Result<(&Frame, &TableFrame)> {
        let frame = self.top()?;
        match &frame.body {
            FrameBody::Table(table) => Ok((frame, table)),
            FrameBody::Vector(_) => Err(Error::FrameMismatch {
                expected: FrameKind::Table,
                found: FrameKind::Vector,
            }),
        }
    }

    /// Validates a field write of `width` bytes and returns its absolute position.
    fn table_slot(&self, field: u64, offset: u64, width: u64) -> Result<TableSlot> {
        let (frame, table) = self.top_table()?;
        if field >= table.fields {
            return Err(Error::FieldOutOfRange {
                index: field,
                fields: table.fields,
            });
        }

        match offset.checked_add(width) {
            Some(end) if end <= table.size => {}
            _ => {
                return Err(Error::OffsetOutOfRange {
                    offset,
                    width,
                    size: table.size,
                })
            }
        }

        let position = checked_add(frame.start, table.header_size(frame.count_type))?;
        Ok(TableSlot {
            position: checked_add(position, offset)?,
            count_type: frame.count_type,
            offset_type: frame.offset_type,
        })
    }

    /// Validates a reference field, which is as wide as the table's offset type.
    fn reference_slot(&self, field: u64, offset: u64) -> Result<TableSlot> {
        let width = self.top_table()?.0.offset_type.size() as u64;
        self.table_slot(field, offset, width)
    }

    /// Content appended next starts at the cursor; its offset must fit the slot.
    fn check_next_reference(&self, slot: &TableSlot) -> Result<()> {
        let next = self.offset();
        if slot.offset_type.fits(next) {
            Ok(())
        } else {
            Err(Error::Overflow {
                value: next,
                width: slot.offset_type.size(),
            })
        }
    }

    fn table_set_reference(&mut self, field: u64, offset: u64, handle: Handle) -> Result<()> {
        let slot = self.reference_slot(field, offset)?;
        self.check_handle(handle)?;

        self.write_reference(slot.position, handle, slot.offset_type)?;
        self.mark_present(field)
    }

    fn mark_present(&mut self, field: u64) -> Result<()> {
        let index = to_usize(field)?;
        match &mut self.top_mut()?.body {
            FrameBody::Table(table) => {
                table.bitmap.insert(index);
                Ok(())
            }
            FrameBody::Vector(_) => Err(Error::FrameMismatch {
                expected: FrameKind::Table,
                found: FrameKind::Vector,
            }),
        }
    }
}
