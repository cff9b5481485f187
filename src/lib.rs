//! Blockpack - Declarative Fixed-Layout Binary Record Codec
//!
//! Blockpack turns an ordered list of typed field declarations into
//! bidirectional binary serialization: reading a stream of bytes into a
//! populated record, and writing a populated record back into bytes,
//! under a chosen byte-order convention.
//!
//! Each field carries a compact format specifier: an element-type code,
//! an optional repeat count, and optionally a `{placeholder}` naming an
//! earlier field whose decoded value supplies the count at runtime.
//!
//! # Quick Start
//!
//! ```rust
//! use blockpack::{Convention, Layout, Record, Value};
//! use std::io::Cursor;
//!
//! // A tiny length-prefixed message frame
//! let layout = Layout::builder()
//!     .field("magic", "4s")
//!     .field("version", "H")
//!     .field("length", "B")
//!     .field("payload", "{length}s")
//!     .build()?;
//!
//! // Encode a record big-endian
//! let record = Record::new(vec![
//!     Value::from(b"BLKP"),
//!     Value::Uint(1),
//!     Value::Uint(5),
//!     Value::from(b"hello"),
//! ]);
//! let mut wire = Vec::new();
//! layout.encode(&record, &mut wire, Convention::BigEndian)?;
//! assert_eq!(wire, b"BLKP\x00\x01\x05hello");
//!
//! // Decode it back
//! let back = layout.decode(&mut Cursor::new(&wire), Convention::BigEndian)?;
//! assert_eq!(back, record);
//! # Ok::<(), blockpack::CodecError>(())
//! ```
//!
//! # Format Specifiers
//!
//! A specifier is `PLACEHOLDER* COUNT? TYPECODE REPEAT*`:
//!
//! - `"H"` - one unsigned 16-bit integer
//! - `"3H"` - three of them (decodes to a [`Value::Array`])
//! - `"HHH"` - the same three (a count and a repeat are mutually
//!   exclusive; `"2HH"` is rejected)
//! - `"6s"` - a 6-byte string, NUL-padded on write, NUL-trimmed on read
//! - `"{length}s"` - a string whose width is the decoded value of the
//!   earlier `length` field
//!
//! The full type-code catalogue lives on [`ElemType`]. Platform
//! ambiguous codes (`l`, `L`, `n`, `N`, `P`) canonicalize to fixed
//! widths before anything touches the wire.
//!
//! # Conventions
//!
//! Decode and encode take a [`Convention`] per call: `native`,
//! `native-standard`, `little-endian`, `big-endian`, or `network`
//! (big-endian). The convenience methods `decode_le`, `encode_be`, and
//! friends cover the common cases.
//!
//! # Concurrency
//!
//! A [`Layout`] is immutable after construction and freely shared
//! across threads; each decode/encode call keeps all its working state
//! on the stack, so concurrent calls on distinct streams need no
//! synchronization.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Byte-order / alignment conventions
pub mod convention;
/// Error types for codec operations
pub mod error;
/// Record layout declarations and the field-by-field codec
pub mod layout;
mod pack;
/// Format-specifier parsing and resolution
pub mod spec;
/// Tagged field values
pub mod value;

pub use crate::convention::{ByteOrder, Convention};
pub use crate::error::{CodecError, Result};
pub use crate::layout::{FieldDef, Layout, LayoutBuilder, Record};
pub use crate::spec::{ElemType, ResolvedSpec, POINTER_WIDTH};
pub use crate::value::Value;

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
