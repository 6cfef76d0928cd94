//! Checked arithmetic used by the layout computations.

use crate::Result;

/// Converts a wire offset or length to `usize` for indexing, returning an error if the value
/// does not fit the address space of the host.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if `value` exceeds `usize::MAX`.
pub fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| crate::Error::OutOfBounds)
}

/// Number of bytes of the presence bitmap of a table with `fields` declared fields.
#[must_use]
pub const fn bitmap_bytes(fields: u64) -> u64 {
    fields.div_ceil(8)
}

/// Adds two layout quantities, failing instead of wrapping.
///
/// # Errors
///
/// Returns a [`crate::Error::Malformed`] error if the sum exceeds `u64::MAX`.
pub fn checked_add(lhs: u64, rhs: u64) -> Result<u64> {
    lhs.checked_add(rhs)
        .ok_or_else(|| malformed_error!("layout size {lhs} + {rhs} overflows u64"))
}

/// Rounds `value` up to the next multiple of `multiple`.
///
/// # Errors
///
/// Returns a [`crate::Error::Malformed`] error if `multiple` is zero or the rounded value
/// overflows.
///
/// # Examples
///
/// ```rust,ignore
/// use linearbuffers::utils::round_up;
///
/// assert_eq!(round_up(1, 4096)?, 4096);
/// assert_eq!(round_up(4096, 4096)?, 4096);
/// assert_eq!(round_up(4097, 4096)?, 8192);
/// # Ok::<(), linearbuffers::Error>(())
/// ```
pub fn round_up(value: usize, multiple: usize) -> Result<usize> {
    if multiple == 0 {
        return Err(malformed_error!("cannot round {value} to a multiple of zero"));
    }

    value
        .checked_next_multiple_of(multiple)
        .ok_or_else(|| malformed_error!("rounding {value} up to {multiple} overflows"))
}
