//! # linearbuffers Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the linearbuffers library. Import this module to get quick access to everything
//! needed to encode and decode buffers.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all linearbuffers operations
pub use crate::Error;

/// The result type used throughout linearbuffers
pub use crate::Result;

// ================================================================================================
// Encoding
// ================================================================================================

/// The encoder, the handles it returns and its configuration
pub use crate::encoder::{Encoder, EncoderOptions, FrameKind, Handle};

/// Count and offset widths
pub use crate::width::{CountType, OffsetType};

/// Scalar codec
pub use crate::io::{ElementKind, Scalar};

// ================================================================================================
// Sinks
// ================================================================================================

/// Sink trait, operations and implementations
pub use crate::sink::{
    CallbackSink, ConfiguredSink, EmitFunction, MappedSink, MemorySink, Sink, SinkOp,
};

// ================================================================================================
// Decoding
// ================================================================================================

/// Zero-copy views
pub use crate::decoder::{read_string, TableView, VectorView};
