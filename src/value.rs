//! Tagged field values
//!
//! A decoded record is an ordered list of [`Value`]s, one per declared
//! field. The same type feeds the encode path. Scalars decode to the
//! bare variant, repeated elements to [`Value::Array`], and both string
//! element types to [`Value::Bytes`].

/// A single field value inside a record
///
/// Signed and unsigned integers are kept apart so that every catalogue
/// width round-trips without sign surprises: `q` values live in `Int`,
/// `Q` values in `Uint`, and so on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Signed integer (element codes `b`, `h`, `i`, `l`, `q`, `n`)
    Int(i64),
    /// Unsigned integer (element codes `B`, `H`, `I`, `L`, `Q`, `N`, `P`)
    Uint(u64),
    /// Floating point (element codes `f`, `d`)
    Float(f64),
    /// Boolean (element code `?`)
    Bool(bool),
    /// Byte string (element codes `c`, `s`, `p`)
    Bytes(Vec<u8>),
    /// Repeated elements (any non-string code with count != 1)
    Array(Vec<Value>),
}

impl Value {
    /// Signed integer content, if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned integer content, if this is a `Uint`
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Float content, if this is a `Float`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean content, if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Byte string content, if this is a `Bytes`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Element slice, if this is an `Array`
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(v: &[u8; N]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}
