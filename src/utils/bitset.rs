//! Presence bitmap for table fields.
//!
//! Every table carries one bit per declared field, packed least significant bit first into
//! `ceil(fields / 8)` bytes. The encoder accumulates the bits in memory while fields are
//! being set and flushes the raw bytes into the table header when the table ends; the
//! decoder wraps the same bytes to answer presence queries.
//!
//! # Layout
//!
//! Bit `i` lives in byte `i / 8` at position `i % 8`:
//!
//! ```text
//! field:  7 6 5 4 3 2 1 0 | 15 14 13 12 11 10 9 8
//! byte:   [      0       ] [         1          ]
//! ```
//!
//! # Example
//!
//! ```rust
//! use linearbuffers::utils::BitSet;
//!
//! let mut set = BitSet::new(10);
//! set.insert(0);
//! set.insert(9);
//!
//! assert!(set.contains(9));
//! assert_eq!(set.as_bytes(), &[0x01, 0x02]);
//! ```

/// A fixed-capacity bit set stored as little-endian bit order bytes.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSet {
    /// The bits, one byte per eight fields.
    bytes: Vec<u8>,
    /// The number of addressable bits.
    len: usize,
}

impl BitSet {
    /// Creates a new empty bit set able to hold `capacity` bits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity.div_ceil(8)],
            len: capacity,
        }
    }

    /// Wraps an existing bitmap of `capacity` bits.
    ///
    /// Returns `None` if `bytes` is shorter than `ceil(capacity / 8)`. Extra trailing bytes
    /// are ignored.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], capacity: usize) -> Option<Self> {
        let needed = capacity.div_ceil(8);
        if bytes.len() < needed {
            return None;
        }

        Some(Self {
            bytes: bytes[..needed].to_vec(),
            len: capacity,
        })
    }

    /// Returns the capacity of this bit set.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn insert(&mut self, index: usize) {
        assert!(index < self.len, "index out of bounds");
        self.bytes[index / 8] |= 1u8 << (index % 8);
    }

    /// Returns `true` if the bit at the given index is set.
    ///
    /// Indices beyond the capacity are reported as absent.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        (self.bytes[index / 8] & (1u8 << (index % 8))) != 0
    }

    /// Returns the number of bits set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Clears all bits.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Returns the packed bitmap as written to the wire.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns an iterator over the indices of all set bits, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&index| self.contains(index))
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
