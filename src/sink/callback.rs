use super::{EmitFunction, Sink, SinkOp};
use crate::{Error, Result};

/// Sink forwarding every operation to a host callback.
///
/// The adapter validates each operation against the logical length it tracks before the
/// callback runs, so a host never observes a write into unreserved bytes. A nonzero status
/// returned by the callback aborts the operation with [`Error::SinkFailed`] and leaves the
/// tracked length unchanged.
pub struct CallbackSink<C> {
    function: EmitFunction<C>,
    context: C,
    len: u64,
}

impl<C> CallbackSink<C> {
    /// Create a new callback sink
    ///
    /// ## Arguments
    /// * 'function' - The callback receiving the raw operations
    /// * 'context' - State passed to every invocation of `function`
    pub fn new(function: EmitFunction<C>, context: C) -> Self {
        CallbackSink {
            function,
            context,
            len: 0,
        }
    }

    /// The callback context
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the callback context
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Consumes the sink and returns the callback context
    pub fn into_context(self) -> C {
        self.context
    }
}

impl<C> std::fmt::Debug for CallbackSink<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSink")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl<C> Sink for CallbackSink<C> {
    fn emit(&mut self, op: SinkOp<'_>) -> Result<()> {
        let extent = op.extent_after(self.len)?;
        let (offset, buffer, length) = op.to_raw()?;

        let status = (self.function)(&mut self.context, offset, buffer, length);
        if status != 0 {
            return Err(Error::SinkFailed(status));
        }

        self.len = extent;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.len
    }
}
