// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'sink/mapped.rs' uses mmap to map the output file into memory

//! # linearbuffers
//!
//! A flat, positional binary message format and the incremental encoder that builds it.
//! Structured records (tables of optional scalar fields, vectors, strings and nested tables)
//! are serialized directly into a growable sink through an append-only construction protocol,
//! without building an intermediate tree of objects. The result can be read back in place,
//! without parsing or copying.
//!
//! ## Features
//!
//! - **📦 Append-only encoding** - Every value is written once, at its final position
//! - **⚡ Zero-copy decoding** - Views borrow the buffer and follow absolute offsets
//! - **🔧 Pluggable sinks** - In-memory, memory-mapped file, or a host callback
//! - **🛡️ Checked protocol** - Misuse of the construction protocol is reported as a typed error
//! - **↩️ Cancellation** - Any open container can be rolled back to its exact start
//!
//! ## Quick Start
//!
//! ```rust
//! use linearbuffers::prelude::*;
//!
//! // table { id: u32 @0, name: string @4, scores: [u16] @8 }
//! let mut encoder = Encoder::new();
//! encoder.table_start(CountType::Uint8, OffsetType::Uint32, 3, 12)?;
//! encoder.table_set::<u32>(0, 0, 7)?;
//! encoder.table_create_string(1, 4, "seven")?;
//! encoder.table_create_vector::<u16>(2, 8, CountType::Uint8, &[1, 2, 3])?;
//! let root = encoder.table_end()?;
//!
//! let buffer = encoder.linearized()?;
//! let table = TableView::new(buffer, root.offset, 3, CountType::Uint8, OffsetType::Uint32)?;
//! assert_eq!(table.field::<u32>(0, 0)?, Some(7));
//! assert_eq!(table.string(1, 4)?, Some("seven"));
//!
//! let scores = table.vector(2, 8, ElementKind::Uint16)?.ok_or(Error::OutOfBounds)?;
//! assert_eq!(scores.iter::<u16>().collect::<Result<Vec<_>>>()?, vec![1, 2, 3]);
//! # Ok::<(), linearbuffers::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `linearbuffers` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`encoder`] - The construction protocol: frame stack, tables, vectors, strings
//! - [`sink`] - Growable output sinks and the raw callback contract
//! - [`decoder`] - Zero-copy views over encoded buffers
//! - [`width`] - Count and offset width catalog
//! - [`io`] - Fixed-width little-endian scalar codec
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### Wire Format
//!
//! All integers are little-endian with a width of 1, 2, 4 or 8 bytes, selected per container:
//!
//! - **Table**: `count ‖ bitmap(ceil(fields / 8)) ‖ fixed area`
//! - **Vector**: `count ‖ element₀ ‖ … ‖ elementₙ₋₁`
//! - **String**: `length ‖ utf-8 bytes`
//!
//! References are absolute offsets from the start of the buffer. Bit `i` of a table's
//! bitmap is set iff field `i` was written; unset scalar fields read as zero.
//!
//! Table and vector elements of a vector are finished before the vector starts and precede
//! it. String elements of a vector are appended behind its last element when it ends.
//!
//! ### Logging
//!
//! The crate logs through the [`log`] facade: container lifecycle at `debug`, sink growth at
//! `trace`, and rolled back convenience operations at `warn`. No logger is installed.
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! ```
#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use linearbuffers::prelude::*;
///
/// let mut encoder = Encoder::new();
/// let handle = encoder.string_create(CountType::Uint8, "hello")?;
/// assert_eq!(read_string(encoder.linearized()?, handle.offset, CountType::Uint8)?, "hello");
/// # Ok::<(), linearbuffers::Error>(())
/// ```
pub mod prelude;

pub mod decoder;
pub mod encoder;
pub mod io;
pub mod sink;
pub mod utils;
pub mod width;

/// `linearbuffers` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `linearbuffers` Error type
///
/// The main error type for all operations in this crate. Separates protocol misuse (logic
/// errors), sink failures and malformed input to the decoder.
///
/// # Examples
///
/// ```rust
/// use linearbuffers::{Encoder, Error};
///
/// let mut encoder = Encoder::new();
/// match encoder.table_end() {
///     Err(Error::EmptyStack) => println!("no table is open"),
///     Err(e) if e.is_logic_error() => println!("protocol misuse: {}", e),
///     Err(e) => println!("Error: {}", e),
///     Ok(handle) => println!("table at {}", handle.offset),
/// }
/// ```
pub use error::Error;

/// The encoder and its companions.
///
/// See [`encoder::Encoder`] for the construction protocol.
pub use encoder::{Encoder, EncoderOptions, FrameKind, Handle};

/// Element kinds and the scalar codec trait.
pub use io::{ElementKind, Scalar};

/// Count and offset widths.
pub use width::{CountType, OffsetType};
