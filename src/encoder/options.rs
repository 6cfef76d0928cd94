//! Encoder configuration.
//!
//! [`EncoderOptions`] selects the sink an encoder writes to. Every entry is optional and
//! independent; an empty set of options yields the default in-process [`MemorySink`] growing
//! in pages of [`PAGE_SIZE`] bytes.
//!
//! | Entry | Effect |
//! |---|---|
//! | `emit_function` | forward every operation to this callback |
//! | `emit_context` | context passed to the callback, `C::default()` when absent |
//! | `page_size` | growth granularity of the default sink |
//!
//! # Usage Examples
//!
//! ```rust
//! use linearbuffers::{sink::MemorySink, Encoder, EncoderOptions};
//!
//! fn count_bytes(total: &mut u64, _offset: u64, buffer: Option<&[u8]>, length: i64) -> i32 {
//!     if buffer.is_some() {
//!         *total += length as u64;
//!     }
//!     0
//! }
//!
//! let options = EncoderOptions::new().with_emit_function(count_bytes);
//! let mut encoder = Encoder::with_options(options)?;
//! encoder.string_create(linearbuffers::CountType::Uint8, "abc")?;
//! assert_eq!(encoder.into_sink().into_context(), Some(4));
//! # Ok::<(), linearbuffers::Error>(())
//! ```

use crate::{
    sink::{CallbackSink, ConfiguredSink, EmitFunction, MemorySink, PAGE_SIZE},
    Error, Result,
};

/// Sink configuration of an [`crate::Encoder`].
pub struct EncoderOptions<C = MemorySink> {
    /// Callback receiving the raw sink operations
    pub emit_function: Option<EmitFunction<C>>,
    /// Context passed to `emit_function`
    pub emit_context: Option<C>,
    /// Page size of the default sink, a power of two
    pub page_size: Option<usize>,
}

impl<C> Default for EncoderOptions<C> {
    fn default() -> Self {
        Self {
            emit_function: None,
            emit_context: None,
            page_size: None,
        }
    }
}

impl<C> EncoderOptions<C> {
    /// Options with every entry unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards every operation to `function`.
    #[must_use]
    pub fn with_emit_function(mut self, function: EmitFunction<C>) -> Self {
        self.emit_function = Some(function);
        self
    }

    /// Passes `context` to the emit function.
    #[must_use]
    pub fn with_emit_context(mut self, context: C) -> Self {
        self.emit_context = Some(context);
        self
    }

    /// Grows the default sink in pages of `page_size` bytes.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Checks that the entries are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if
    /// - a context is given without an emit function
    /// - a page size is given together with an emit function
    /// - the page size is zero or not a power of two
    pub fn validate(&self) -> Result<()> {
        if self.emit_function.is_none() && self.emit_context.is_some() {
            return Err(Error::InvalidOptions(
                "emit context given without an emit function".to_string(),
            ));
        }

        if let Some(page_size) = self.page_size {
            if self.emit_function.is_some() {
                return Err(Error::InvalidOptions(
                    "page size only applies to the default sink".to_string(),
                ));
            }
            if !page_size.is_power_of_two() {
                return Err(Error::InvalidOptions(format!(
                    "page size {page_size} is not a power of two"
                )));
            }
        }

        Ok(())
    }

    /// Validates the options and builds the sink they describe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options are inconsistent.
    pub fn into_sink(self) -> Result<ConfiguredSink<C>>
    where
        C: Default,
    {
        self.validate()?;

        match self.emit_function {
            Some(function) => Ok(ConfiguredSink::Callback(CallbackSink::new(
                function,
                self.emit_context.unwrap_or_default(),
            ))),
            None => {
                let sink = MemorySink::with_page_size(self.page_size.unwrap_or(PAGE_SIZE))?;
                Ok(ConfiguredSink::Memory(sink))
            }
        }
    }
}

impl<C> std::fmt::Debug for EncoderOptions<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderOptions")
            .field("emit_function", &self.emit_function.is_some())
            .field("emit_context", &self.emit_context.is_some())
            .field("page_size", &self.page_size)
            .finish()
    }
}
