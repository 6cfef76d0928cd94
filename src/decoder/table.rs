use super::{read_string, VectorView};
use crate::{
    io::{read_le_at, read_uint_at, ElementKind, Scalar},
    utils::{bitmap_bytes, to_usize, BitSet},
    CountType, Error, OffsetType, Result,
};

/// Read access to one encoded table.
///
/// Fields are addressed the same way they were written: by field index for presence, and by
/// byte offset within the fixed area for the value.
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    data: &'a [u8],
    offset: usize,
    fields: u64,
    count_type: CountType,
    offset_type: OffsetType,
    bitmap: &'a [u8],
    /// Absolute position of the fixed area
    area: usize,
}

impl<'a> TableView<'a> {
    /// Opens the table starting at `offset`, declared with `fields` fields.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfBounds`] if the header extends past the buffer
    /// - [`Error::Malformed`] if the stored field count differs from `fields`
    pub fn new(
        data: &'a [u8],
        offset: u64,
        fields: u64,
        count_type: CountType,
        offset_type: OffsetType,
    ) -> Result<Self> {
        let start = to_usize(offset)?;
        let count = read_uint_at(data, start, count_type.size())?;
        if count != fields {
            return Err(malformed_error!(
                "table at {} declares {} fields, expected {}",
                offset,
                count,
                fields
            ));
        }

        let bitmap_start = start + count_type.size();
        let area = bitmap_start
            .checked_add(to_usize(bitmap_bytes(fields))?)
            .ok_or(Error::OutOfBounds)?;
        let bitmap = data.get(bitmap_start..area).ok_or(Error::OutOfBounds)?;

        Ok(TableView {
            data,
            offset: start,
            fields,
            count_type,
            offset_type,
            bitmap,
            area,
        })
    }

    /// Absolute offset of the table.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The declared field count stored in the header.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.fields
    }

    /// Returns `true` if field `field` was set by the encoder.
    #[must_use]
    pub fn is_present(&self, field: u64) -> bool {
        if field >= self.fields {
            return false;
        }
        let Ok(index) = usize::try_from(field) else {
            return false;
        };
        self.bitmap[index / 8] & (1 << (index % 8)) != 0
    }

    /// All fields set by the encoder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the field count exceeds the address space.
    pub fn present_fields(&self) -> Result<BitSet> {
        BitSet::from_bytes(self.bitmap, to_usize(self.fields)?).ok_or(Error::OutOfBounds)
    }

    /// Raw value at `offset` within the fixed area, zero if the field was never set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the value extends past the buffer.
    pub fn get<T: Scalar>(&self, offset: u64) -> Result<T> {
        let mut position = self.position(offset)?;
        read_le_at(self.data, &mut position)
    }

    /// Value of field `field` at `offset`, `None` if the field was never set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the value extends past the buffer.
    pub fn field<T: Scalar>(&self, field: u64, offset: u64) -> Result<Option<T>> {
        if !self.is_present(field) {
            return Ok(None);
        }
        self.get(offset).map(Some)
    }

    /// String referenced by field `field`, `None` if the field was never set.
    ///
    /// # Errors
    ///
    /// See [`read_string`].
    pub fn string(&self, field: u64, offset: u64) -> Result<Option<&'a str>> {
        match self.reference(field, offset)? {
            Some(target) => read_string(self.data, target, self.count_type).map(Some),
            None => Ok(None),
        }
    }

    /// Table with `fields` fields referenced by field `field`.
    ///
    /// # Errors
    ///
    /// See [`TableView::new`].
    pub fn table(&self, field: u64, offset: u64, fields: u64) -> Result<Option<TableView<'a>>> {
        match self.reference(field, offset)? {
            Some(target) => TableView::new(
                self.data,
                target,
                fields,
                self.count_type,
                self.offset_type,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    /// Vector of `kind` elements referenced by field `field`.
    ///
    /// # Errors
    ///
    /// See [`VectorView::new`].
    pub fn vector(
        &self,
        field: u64,
        offset: u64,
        kind: ElementKind,
    ) -> Result<Option<VectorView<'a>>> {
        match self.reference(field, offset)? {
            Some(target) => VectorView::new(
                self.data,
                target,
                kind,
                self.count_type,
                self.offset_type,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn position(&self, offset: u64) -> Result<usize> {
        self.area
            .checked_add(to_usize(offset)?)
            .ok_or(Error::OutOfBounds)
    }

    /// Absolute target of a reference field; unset references are never followed.
    fn reference(&self, field: u64, offset: u64) -> Result<Option<u64>> {
        if !self.is_present(field) {
            return Ok(None);
        }
        read_uint_at(self.data, self.position(offset)?, self.offset_type.size()).map(Some)
    }
}
