use log::trace;

use super::{Encoder, Handle};
use crate::{sink::Sink, utils::checked_add, CountType, Error, Result};

impl<S: Sink> Encoder<S> {
    /// Appends `value` as `length ‖ utf-8 bytes` and returns its handle.
    ///
    /// Strings carry no presence bitmap. The handle is stored into a parent with
    /// [`Encoder::table_set_string`].
    ///
    /// # Errors
    ///
    /// - [`Error::VectorInProgress`] if a vector is being built
    /// - [`Error::Overflow`] if the byte length does not fit `count_type`
    /// - any sink error
    pub fn string_create(&mut self, count_type: CountType, value: &str) -> Result<Handle> {
        self.ensure_appendable()?;
        self.append_string(count_type, value)
    }

    /// Appends a string without checking the frame stack.
    pub(super) fn append_string(&mut self, count_type: CountType, value: &str) -> Result<Handle> {
        let length = value.len() as u64;
        if !count_type.fits(length) {
            return Err(Error::Overflow {
                value: length,
                width: count_type.size(),
            });
        }

        let count_size = count_type.size();
        let size = checked_add(count_size as u64, length)?;
        let start = self.reserve(size)?;

        self.write_uint(start, length, count_size)?;
        if !value.is_empty() {
            self.write(start + count_size as u64, value.as_bytes())?;
        }

        trace!("string of {length} bytes at {start}");
        Ok(Handle {
            offset: start,
            size,
        })
    }
}
