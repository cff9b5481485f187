//! Record layout declaration and the field-by-field codec
//!
//! A [`Layout`] is an ordered list of named fields, each carrying a
//! format specifier, built once at registration time through
//! [`LayoutBuilder`]. Decoding walks the declarations in order against
//! a byte stream and produces a [`Record`]; encoding walks the same
//! declarations and writes a record back out. Field order is
//! significant both ways: a `{placeholder}` may only reference a field
//! declared strictly earlier, because its value must already be in the
//! running value map when the current field is resolved.
//!
//! ```rust
//! use blockpack::{Layout, Record, Value};
//! use std::io::Cursor;
//!
//! let layout = Layout::builder()
//!     .field("length", "B")
//!     .field("payload", "{length}s")
//!     .build()?;
//!
//! let record = Record::new(vec![Value::Uint(5), Value::from(b"hello")]);
//! let mut out = Vec::new();
//! layout.encode_le(&record, &mut out)?;
//! assert_eq!(out, b"\x05hello");
//!
//! let back = layout.decode_le(&mut Cursor::new(&out))?;
//! assert_eq!(back, record);
//! # Ok::<(), blockpack::CodecError>(())
//! ```

use std::io::{Read, Write};

use crate::convention::{ByteOrder, Convention};
use crate::error::{CodecError, Result};
use crate::pack::{pack_scalar, unpack_scalar};
use crate::spec::{resolve, ElemType, ResolvedSpec};
use crate::value::Value;

/// Maximum payload length a `p` string's one-byte prefix can express
const PASCAL_MAX: usize = 0xFF;

/// One field declaration: a unique name and a format specifier
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    /// Name, unique within the layout, referenced by `{name}` placeholders
    pub name: String,
    /// Format specifier template (e.g. `"4s"`, `"{length}s"`, `"HHH"`)
    pub spec: String,
}

impl FieldDef {
    /// Create a field declaration
    pub fn new(name: impl Into<String>, spec: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            spec: spec.into(),
        }
    }
}

/// Builder for a [`Layout`]
///
/// Collects field declarations in order; [`LayoutBuilder::build`]
/// validates them (non-empty layout, unique non-empty names).
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    fields: Vec<FieldDef>,
}

impl LayoutBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        LayoutBuilder { fields: Vec::new() }
    }

    /// Append a field declaration
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<String>) -> Self {
        self.fields.push(FieldDef::new(name, spec));
        self
    }

    /// Validate the declarations and produce the layout
    pub fn build(self) -> Result<Layout> {
        Layout::new(self.fields)
    }
}

/// An ordered, immutable record type declaration
///
/// Built once, then shared freely: layouts are read-only after
/// construction and safe to use from concurrent decode/encode calls on
/// distinct streams without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<FieldDef>,
}

/// An ordered, fixed-arity tuple of field values
///
/// Constructed fresh by [`Layout::decode`]; supplied by the caller to
/// [`Layout::encode`]. Values sit in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Create a record from values in declaration order
    pub fn new(values: Vec<Value>) -> Self {
        Record { values }
    }

    /// All field values in declaration order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a declaration index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of field values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record carries no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the record, yielding its values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Record::new(values)
    }
}

impl std::ops::Index<usize> for Record {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl Layout {
    /// Start building a layout field by field
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::new()
    }

    /// Build a layout from a declaration list
    ///
    /// Fails with [`CodecError::EmptyLayout`] for an empty list and
    /// [`CodecError::DuplicateField`] when two fields share a name.
    /// Specifier grammar and placeholder references are checked per
    /// call, not here, because placeholder values only exist during a
    /// decode or encode pass.
    pub fn new(fields: Vec<FieldDef>) -> Result<Self> {
        if fields.is_empty() {
            return Err(CodecError::EmptyLayout);
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CodecError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Layout { fields })
    }

    /// The field declarations in order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; layouts cannot be empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declaration index of a field name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Decode one record from `reader` under `convention`
    ///
    /// Fields are visited in declaration order. Each field's specifier
    /// is resolved against the values decoded so far, exactly its byte
    /// count is read, and the bytes are unpacked. A short read fails
    /// with [`CodecError::TruncatedStream`]; no partial record is ever
    /// returned.
    pub fn decode<R: Read>(&self, reader: &mut R, convention: Convention) -> Result<Record> {
        let order = convention.byte_order();
        let mut values: Vec<Value> = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            // `values` holds exactly the fields visited so far, so an
            // index at or past its length is a forward reference.
            let resolved = resolve(&field.spec, &field.name, |name: &str| {
                self.field_index(name).and_then(|i| values.get(i))
            })?;

            let buf = read_field(reader, resolved.byte_count)?;
            if buf.len() != resolved.byte_count {
                return Err(CodecError::TruncatedStream {
                    field: field.name.clone(),
                    expected: resolved.byte_count,
                    actual: buf.len(),
                });
            }

            values.push(decode_field(&resolved, &buf, order));
        }

        Ok(Record::new(values))
    }

    /// Encode `record` to `writer` under `convention`
    ///
    /// Fields are visited in declaration order; a field's specifier is
    /// resolved against the values already written, so a length
    /// reference must name an earlier field. A field that resolves to
    /// count 0 writes nothing but still enters the value map as an
    /// empty sequence.
    pub fn encode<W: Write>(
        &self,
        record: &Record,
        writer: &mut W,
        convention: Convention,
    ) -> Result<()> {
        if record.len() != self.fields.len() {
            return Err(CodecError::ArityMismatch {
                expected: self.fields.len(),
                actual: record.len(),
            });
        }

        let order = convention.byte_order();
        let mut visited: Vec<Value> = Vec::with_capacity(self.fields.len());
        let mut out = Vec::new();

        for (index, field) in self.fields.iter().enumerate() {
            let resolved = resolve(&field.spec, &field.name, |name: &str| {
                self.field_index(name).and_then(|i| visited.get(i))
            })?;

            if resolved.count == 0 {
                visited.push(empty_value(resolved.elem));
                continue;
            }

            out.clear();
            encode_field(&resolved, &record.values[index], order, &mut out).map_err(|detail| {
                CodecError::Packing {
                    field: field.name.clone(),
                    format: resolved.computed.clone(),
                    detail,
                }
            })?;
            writer.write_all(&out)?;

            visited.push(record.values[index].clone());
        }

        Ok(())
    }

    /// Decode under the platform's native convention
    pub fn decode_native<R: Read>(&self, reader: &mut R) -> Result<Record> {
        self.decode(reader, Convention::Native)
    }

    /// Decode under native byte order without padding
    pub fn decode_native_standard<R: Read>(&self, reader: &mut R) -> Result<Record> {
        self.decode(reader, Convention::NativeStandard)
    }

    /// Decode little-endian
    pub fn decode_le<R: Read>(&self, reader: &mut R) -> Result<Record> {
        self.decode(reader, Convention::LittleEndian)
    }

    /// Decode big-endian
    pub fn decode_be<R: Read>(&self, reader: &mut R) -> Result<Record> {
        self.decode(reader, Convention::BigEndian)
    }

    /// Decode in network byte order (big-endian)
    pub fn decode_network<R: Read>(&self, reader: &mut R) -> Result<Record> {
        self.decode(reader, Convention::Network)
    }

    /// Encode under the platform's native convention
    pub fn encode_native<W: Write>(&self, record: &Record, writer: &mut W) -> Result<()> {
        self.encode(record, writer, Convention::Native)
    }

    /// Encode under native byte order without padding
    pub fn encode_native_standard<W: Write>(&self, record: &Record, writer: &mut W) -> Result<()> {
        self.encode(record, writer, Convention::NativeStandard)
    }

    /// Encode little-endian
    pub fn encode_le<W: Write>(&self, record: &Record, writer: &mut W) -> Result<()> {
        self.encode(record, writer, Convention::LittleEndian)
    }

    /// Encode big-endian
    pub fn encode_be<W: Write>(&self, record: &Record, writer: &mut W) -> Result<()> {
        self.encode(record, writer, Convention::BigEndian)
    }

    /// Encode in network byte order (big-endian)
    pub fn encode_network<W: Write>(&self, record: &Record, writer: &mut W) -> Result<()> {
        self.encode(record, writer, Convention::Network)
    }
}

/// Read up to `want` bytes, stopping at end of stream. Allocation
/// tracks what the stream actually delivers, so a count resolved from
/// untrusted input cannot reserve more memory than the stream holds.
fn read_field<R: Read>(reader: &mut R, want: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(want as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Post-process one field's raw bytes into its value
fn decode_field(resolved: &ResolvedSpec, buf: &[u8], order: ByteOrder) -> Value {
    match resolved.elem {
        ElemType::Str => {
            let end = buf
                .iter()
                .rposition(|&b| b != 0)
                .map_or(0, |last| last + 1);
            Value::Bytes(buf[..end].to_vec())
        }
        ElemType::PascalStr => {
            if buf.is_empty() {
                return Value::Bytes(Vec::new());
            }
            // Prefix byte is consumed and never part of the payload.
            let take = (buf[0] as usize).min(buf.len() - 1);
            Value::Bytes(buf[1..1 + take].to_vec())
        }
        elem if resolved.count == 1 => unpack_scalar(elem, buf, order),
        elem => Value::Array(
            buf.chunks_exact(elem.width())
                .map(|chunk| unpack_scalar(elem, chunk, order))
                .collect(),
        ),
    }
}

/// Pack one field's value, honoring the string truncation and padding
/// rules: `s` pads or truncates to the declared width, `p` clamps its
/// declared width to the 255-byte prefix limit, vectors truncate to the
/// declared count.
fn encode_field(
    resolved: &ResolvedSpec,
    value: &Value,
    order: ByteOrder,
    out: &mut Vec<u8>,
) -> std::result::Result<(), String> {
    match resolved.elem {
        ElemType::Str => {
            let bytes = value
                .as_bytes()
                .ok_or_else(|| format!("expected a byte string, got {:?}", value))?;
            let take = bytes.len().min(resolved.count);
            out.extend_from_slice(&bytes[..take]);
            out.resize(resolved.count, 0);
        }
        ElemType::PascalStr => {
            let bytes = value
                .as_bytes()
                .ok_or_else(|| format!("expected a byte string, got {:?}", value))?;
            let total = resolved.count.min(PASCAL_MAX);
            let capacity = total - 1;
            let take = bytes.len().min(capacity);
            out.push(take as u8);
            out.extend_from_slice(&bytes[..take]);
            out.resize(total, 0);
        }
        elem if resolved.count == 1 => pack_scalar(elem, value, order, out)?,
        elem => {
            let items = value
                .as_array()
                .ok_or_else(|| format!("expected a sequence, got {:?}", value))?;
            if items.len() < resolved.count {
                return Err(format!(
                    "expected {} elements, got {}",
                    resolved.count,
                    items.len()
                ));
            }
            for item in &items[..resolved.count] {
                pack_scalar(elem, item, order, out)?;
            }
        }
    }
    Ok(())
}

/// The value recorded for a field that resolved to count 0
fn empty_value(elem: ElemType) -> Value {
    if elem.is_string() {
        Value::Bytes(Vec::new())
    } else {
        Value::Array(Vec::new())
    }
}
