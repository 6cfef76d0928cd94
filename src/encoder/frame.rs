use strum::{Display, EnumCount, EnumIter};

use crate::{
    io::ElementKind,
    utils::{bitmap_bytes, BitSet},
    CountType, OffsetType,
};

/// The kind of an open container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FrameKind {
    /// A table with a presence bitmap and a fixed area
    Table,
    /// A vector of homogeneous elements
    Vector,
}

/// One open container on the encoder's stack.
#[derive(Debug)]
pub(crate) struct Frame {
    /// Absolute offset of the container's count field
    pub start: u64,
    pub count_type: CountType,
    pub offset_type: OffsetType,
    pub body: FrameBody,
}

#[derive(Debug)]
pub(crate) enum FrameBody {
    Table(TableFrame),
    Vector(VectorFrame),
}

#[derive(Debug)]
pub(crate) struct TableFrame {
    /// Declared field count, stored as the table's count
    pub fields: u64,
    /// Size of the fixed area in bytes
    pub size: u64,
    /// Presence bits, flushed at `table_end`
    pub bitmap: BitSet,
}

#[derive(Debug)]
pub(crate) struct VectorFrame {
    pub element: ElementKind,
    /// Elements pushed so far
    pub count: u64,
    /// String elements whose content is appended at `vector_end`, as (slot offset, content)
    pub pending: Vec<(u64, String)>,
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self.body {
            FrameBody::Table(_) => FrameKind::Table,
            FrameBody::Vector(_) => FrameKind::Vector,
        }
    }
}

impl TableFrame {
    /// Bytes between the start of the table and its fixed area.
    pub fn header_size(&self, count_type: CountType) -> u64 {
        count_type.size() as u64 + bitmap_bytes(self.fields)
    }
}

/// Width of one element of a vector of `kind`.
pub(crate) fn element_size(kind: ElementKind, offset_type: OffsetType) -> u64 {
    kind.fixed_size().unwrap_or(offset_type.size()) as u64
}
