use thiserror::Error;

use crate::{encoder::FrameKind, io::ElementKind};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into three groups that mirror how a failure should be handled by the
/// caller.
///
/// # Error Categories
///
/// ## Logic Errors
/// Programmer or schema-binding mistakes. They abort the current encode; the caller can
/// cancel the open containers to get a clean encoder back, but must not retry the call.
/// - [`Error::EmptyStack`] - Operation needs an open container but none is open
/// - [`Error::FrameMismatch`] - Table operation on a vector frame or vice versa
/// - [`Error::ElementMismatch`] - Vector operation for another element kind
/// - [`Error::FieldOutOfRange`] - Field index not below the declared field count
/// - [`Error::OffsetOutOfRange`] - Field bytes do not fit into the fixed area
/// - [`Error::VectorInProgress`] - Content appended while a vector is being built
/// - [`Error::OpenFrames`] - Output requested while containers are still open
/// - [`Error::InvalidHandle`] - Reference to content that does not exist yet
/// - [`Error::Overflow`] - Count or offset does not fit its selected width
/// - [`Error::UnreservedWrite`] - Sink write outside any reserved range
/// - [`Error::InvalidTruncate`] - Sink truncate to a negative or growing length
/// - [`Error::InvalidWidth`] - Unknown raw width code
/// - [`Error::InvalidOptions`] - Inconsistent [`crate::EncoderOptions`]
///
/// ## Sink Errors
/// - [`Error::SinkFailed`] - A sink callback reported a nonzero status
/// - [`Error::FileError`] - I/O failure of the file-backed sink
/// - [`Error::NotSupported`] - The sink cannot hand out a contiguous buffer
///
/// ## Decoding Errors
/// - [`Error::OutOfBounds`] - Read beyond the end of the buffer
/// - [`Error::Malformed`] - Buffer content violates the wire format
///
/// # Examples
///
/// ```rust
/// use linearbuffers::{CountType, Encoder, Error, OffsetType};
///
/// let mut encoder = Encoder::new();
/// encoder.table_start(CountType::Uint8, OffsetType::Uint32, 2, 4)?;
///
/// match encoder.table_set::<u16>(5, 0, 1) {
///     Err(Error::FieldOutOfRange { index, fields }) => {
///         assert_eq!((index, fields), (5, 2));
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// # Ok::<(), linearbuffers::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Logic errors
    /// An operation required an open container, but the frame stack is empty.
    #[error("logic error: no container is open")]
    EmptyStack,

    /// The container on top of the stack is of the wrong kind for the operation.
    ///
    /// Raised for example when `table_set` is called while a vector is being built.
    #[error("logic error: expected an open {expected}, found {found}")]
    FrameMismatch {
        /// The container kind the operation works on
        expected: FrameKind,
        /// The container kind currently on top of the stack
        found: FrameKind,
    },

    /// The open vector holds elements of another kind than the operation.
    #[error("logic error: expected a vector of {expected}, found a vector of {found}")]
    ElementMismatch {
        /// The element kind the operation works on
        expected: ElementKind,
        /// The element kind of the vector on top of the stack
        found: ElementKind,
    },

    /// A field index is not below the number of fields declared at `table_start`.
    #[error("logic error: field {index} is out of range for a table of {fields} fields")]
    FieldOutOfRange {
        /// The offending field index
        index: u64,
        /// The declared field count of the open table
        fields: u64,
    },

    /// The bytes of a field would extend past the fixed area of the open table.
    #[error("logic error: {width} bytes at offset {offset} exceed the fixed area of {size} bytes")]
    OffsetOutOfRange {
        /// Byte offset of the field inside the fixed area
        offset: u64,
        /// Width of the value being written
        width: u64,
        /// Size of the fixed area declared at `table_start`
        size: u64,
    },

    /// Content was about to be appended while a vector is under construction.
    ///
    /// The elements of a vector are laid out contiguously, so nothing else can be appended
    /// to the sink until the vector is ended or cancelled.
    #[error("logic error: a vector is under construction, its elements must stay contiguous")]
    VectorInProgress,

    /// The encoded output was requested while containers are still open.
    ///
    /// The associated value is the number of open containers.
    #[error("logic error: {0} container(s) are still open")]
    OpenFrames(usize),

    /// A reference points at content that has not been finished yet.
    #[error("logic error: handle {offset}+{size} lies beyond the encoded extent {extent}")]
    InvalidHandle {
        /// Start offset stored in the handle
        offset: u64,
        /// Size stored in the handle
        size: u64,
        /// Current append cursor of the encoder
        extent: u64,
    },

    /// A count or offset value does not fit into its selected width.
    #[error("logic error: value {value} does not fit into {width} byte(s)")]
    Overflow {
        /// The value that had to be stored
        value: u64,
        /// The selected width in bytes
        width: usize,
    },

    /// A sink write touched bytes that were never reserved.
    #[error("logic error: write of {length} bytes at {offset} exceeds the reserved extent {extent}")]
    UnreservedWrite {
        /// Start offset of the write
        offset: u64,
        /// Number of bytes written
        length: u64,
        /// Logical length of the sink
        extent: u64,
    },

    /// A sink truncate would produce a negative length or grow the sink.
    #[error("logic error: truncate by {length} at {offset} is invalid")]
    InvalidTruncate {
        /// Offset passed with the truncate
        offset: u64,
        /// Non-positive length passed with the truncate
        length: i64,
    },

    /// A raw width code is not one of the known count or offset types.
    #[error("logic error: {0} is not a valid width code")]
    InvalidWidth(u8),

    /// The encoder options are inconsistent.
    #[error("invalid encoder options - {0}")]
    InvalidOptions(String),

    // Sink errors
    /// A sink callback returned a nonzero status.
    #[error("sink failed with status {0}")]
    SinkFailed(i32),

    /// File I/O error of the file-backed sink.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The sink does not keep the encoded bytes in one contiguous buffer.
    #[error("The sink does not support linearized output")]
    NotSupported,

    // Decoding errors
    /// An out of bound access was attempted while reading a buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The buffer content does not follow the wire format.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}

impl Error {
    /// Returns `true` for errors caused by misuse of the construction protocol.
    ///
    /// Logic errors indicate a bug in the caller or the generated schema bindings; they
    /// are never caused by the data being encoded or by the sink.
    #[must_use]
    pub fn is_logic_error(&self) -> bool {
        matches!(
            self,
            Error::EmptyStack
                | Error::FrameMismatch { .. }
                | Error::ElementMismatch { .. }
                | Error::FieldOutOfRange { .. }
                | Error::OffsetOutOfRange { .. }
                | Error::VectorInProgress
                | Error::OpenFrames(_)
                | Error::InvalidHandle { .. }
                | Error::Overflow { .. }
                | Error::UnreservedWrite { .. }
                | Error::InvalidTruncate { .. }
                | Error::InvalidWidth(_)
                | Error::InvalidOptions(_)
        )
    }
}
