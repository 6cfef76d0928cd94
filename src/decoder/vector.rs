use super::{read_string, TableView};
use crate::{
    io::{read_le_at, read_uint_at, ElementKind, Scalar},
    utils::to_usize,
    CountType, Error, OffsetType, Result,
};

/// Read access to one encoded vector.
#[derive(Debug, Clone, Copy)]
pub struct VectorView<'a> {
    data: &'a [u8],
    offset: usize,
    kind: ElementKind,
    count_type: CountType,
    offset_type: OffsetType,
    len: usize,
    /// Absolute position of the first element
    elements: usize,
    element_size: usize,
}

impl<'a> VectorView<'a> {
    /// Opens the vector of `kind` elements starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the count or the elements extend past the buffer.
    pub fn new(
        data: &'a [u8],
        offset: u64,
        kind: ElementKind,
        count_type: CountType,
        offset_type: OffsetType,
    ) -> Result<Self> {
        let start = to_usize(offset)?;
        let len = to_usize(read_uint_at(data, start, count_type.size())?)?;
        let element_size = kind.fixed_size().unwrap_or(offset_type.size());

        let elements = start + count_type.size();
        let end = len
            .checked_mul(element_size)
            .and_then(|size| size.checked_add(elements))
            .ok_or(Error::OutOfBounds)?;
        if end > data.len() {
            return Err(Error::OutOfBounds);
        }

        Ok(VectorView {
            data,
            offset: start,
            kind,
            count_type,
            offset_type,
            len,
            elements,
            element_size,
        })
    }

    /// Absolute offset of the vector.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Element kind the view was opened with.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Scalar element `index`.
    ///
    /// # Errors
    ///
    /// - [`Error::ElementMismatch`] if `T` is not the vector's element kind
    /// - [`Error::OutOfBounds`] if `index` is not below the element count
    pub fn get<T: Scalar>(&self, index: usize) -> Result<T> {
        let mut position = self.position(T::KIND, index)?;
        read_le_at(self.data, &mut position)
    }

    /// String element `index`.
    ///
    /// # Errors
    ///
    /// As [`VectorView::get`], plus the errors of [`read_string`].
    pub fn string(&self, index: usize) -> Result<&'a str> {
        let target = self.reference(ElementKind::String, index)?;
        read_string(self.data, target, self.count_type)
    }

    /// Table element `index`, declared with `fields` fields.
    ///
    /// # Errors
    ///
    /// As [`VectorView::get`], plus the errors of [`TableView::new`].
    pub fn table(&self, index: usize, fields: u64) -> Result<TableView<'a>> {
        let target = self.reference(ElementKind::Table, index)?;
        TableView::new(
            self.data,
            target,
            fields,
            self.count_type,
            self.offset_type,
        )
    }

    /// Vector element `index`, holding `kind` elements.
    ///
    /// # Errors
    ///
    /// As [`VectorView::get`], plus the errors of [`VectorView::new`].
    pub fn vector(&self, index: usize, kind: ElementKind) -> Result<VectorView<'a>> {
        let target = self.reference(ElementKind::Vector, index)?;
        VectorView::new(self.data, target, kind, self.count_type, self.offset_type)
    }

    /// Iterates over all scalar elements.
    pub fn iter<T: Scalar>(&self) -> impl Iterator<Item = Result<T>> + '_ {
        (0..self.len).map(move |index| self.get(index))
    }

    /// Iterates over all string elements.
    pub fn strings(&self) -> impl Iterator<Item = Result<&'a str>> + '_ {
        (0..self.len).map(move |index| self.string(index))
    }

    fn position(&self, kind: ElementKind, index: usize) -> Result<usize> {
        if kind != self.kind {
            return Err(Error::ElementMismatch {
                expected: kind,
                found: self.kind,
            });
        }
        if index >= self.len {
            return Err(Error::OutOfBounds);
        }
        Ok(self.elements + index * self.element_size)
    }

    fn reference(&self, kind: ElementKind, index: usize) -> Result<u64> {
        let position = self.position(kind, index)?;
        read_uint_at(self.data, position, self.offset_type.size())
    }
}
