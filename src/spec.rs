//! Format-specifier resolution
//!
//! A field's format specifier combines optional `{name}` placeholders,
//! an optional decimal count, one element-type character, and an
//! optional repeat suffix of that same character. This module turns one
//! specifier into a concrete byte layout for the current call:
//!
//! ```text
//! "{length}s"  +  { length: 5 }   ->   5 bytes, 5 elements, type 's'
//! "3H"                            ->   6 bytes, 3 elements, type 'H'
//! "HHH"                           ->   6 bytes, 3 elements, type 'H'
//! ```
//!
//! Placeholders are substituted textually against the values decoded or
//! encoded so far, then the computed string is parsed with an explicit
//! tokenizer. A count and a repeat suffix are mutually exclusive.
//!
//! The grammar and the type-code catalogue are a wire-compatibility
//! contract; see the table on [`ElemType`].

use crate::error::{CodecError, Result};
use crate::value::Value;

/// Pointer width of the target, in bytes
///
/// The `n`, `N`, and `P` codes resolve through this once, so their wire
/// width is fixed for the lifetime of the process.
pub const POINTER_WIDTH: usize = std::mem::size_of::<usize>();

/// Canonical element type, one per catalogue code
///
/// | code | width | decoded as |
/// |------|-------|------------|
/// | `c` | 1 | 1-byte string |
/// | `b` / `B` | 1 | signed / unsigned integer |
/// | `?` | 1 | boolean |
/// | `s` | count | raw byte string, NUL-trimmed on decode |
/// | `p` | count | length-prefixed byte string, max 255 payload bytes |
/// | `h` / `H` | 2 | signed / unsigned integer |
/// | `i` / `I` | 4 | signed / unsigned integer |
/// | `l` / `L` | canonicalized to `i` / `I` | signed / unsigned integer |
/// | `q` / `Q` | 8 | signed / unsigned integer |
/// | `n` / `N` | pointer width | signed / unsigned integer |
/// | `f` / `d` | 4 / 8 | float |
/// | `P` | pointer width | unsigned integer |
///
/// `l` and `L` vary across platforms in C, and `n`/`N`/`P` follow the
/// pointer width, so all five are rewritten to their fixed-width
/// equivalents before any byte-count math or packing. That variability
/// never reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemType {
    /// Single byte decoded as a 1-byte string (`c`)
    Char,
    /// Signed 8-bit integer (`b`)
    I8,
    /// Unsigned 8-bit integer (`B`)
    U8,
    /// Boolean (`?`)
    Bool,
    /// Raw byte string (`s`)
    Str,
    /// Length-prefixed byte string (`p`)
    PascalStr,
    /// Signed 16-bit integer (`h`)
    I16,
    /// Unsigned 16-bit integer (`H`)
    U16,
    /// Signed 32-bit integer (`i`, and `l` canonicalized)
    I32,
    /// Unsigned 32-bit integer (`I`, and `L` canonicalized)
    U32,
    /// Signed 64-bit integer (`q`, and `n` on 64-bit targets)
    I64,
    /// Unsigned 64-bit integer (`Q`, and `N`/`P` on 64-bit targets)
    U64,
    /// 32-bit float (`f`)
    F32,
    /// 64-bit float (`d`)
    F64,
}

impl ElemType {
    /// Look up a catalogue character, canonicalizing platform-ambiguous
    /// widths. Returns `None` for characters outside the catalogue.
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'c' => ElemType::Char,
            'b' => ElemType::I8,
            'B' => ElemType::U8,
            '?' => ElemType::Bool,
            's' => ElemType::Str,
            'p' => ElemType::PascalStr,
            'h' => ElemType::I16,
            'H' => ElemType::U16,
            'i' | 'l' => ElemType::I32,
            'I' | 'L' => ElemType::U32,
            'q' => ElemType::I64,
            'Q' => ElemType::U64,
            'n' => {
                if POINTER_WIDTH == 8 {
                    ElemType::I64
                } else {
                    ElemType::I32
                }
            }
            'N' | 'P' => {
                if POINTER_WIDTH == 8 {
                    ElemType::U64
                } else {
                    ElemType::U32
                }
            }
            'f' => ElemType::F32,
            'd' => ElemType::F64,
            _ => return None,
        })
    }

    /// The canonical catalogue character for this type
    pub const fn code(self) -> char {
        match self {
            ElemType::Char => 'c',
            ElemType::I8 => 'b',
            ElemType::U8 => 'B',
            ElemType::Bool => '?',
            ElemType::Str => 's',
            ElemType::PascalStr => 'p',
            ElemType::I16 => 'h',
            ElemType::U16 => 'H',
            ElemType::I32 => 'i',
            ElemType::U32 => 'I',
            ElemType::I64 => 'q',
            ElemType::U64 => 'Q',
            ElemType::F32 => 'f',
            ElemType::F64 => 'd',
        }
    }

    /// Width of one element in bytes
    ///
    /// String elements are one byte each; their total width comes from
    /// the count (the `p` count includes its one length-prefix byte).
    pub const fn width(self) -> usize {
        match self {
            ElemType::Char
            | ElemType::I8
            | ElemType::U8
            | ElemType::Bool
            | ElemType::Str
            | ElemType::PascalStr => 1,
            ElemType::I16 | ElemType::U16 => 2,
            ElemType::I32 | ElemType::U32 | ElemType::F32 => 4,
            ElemType::I64 | ElemType::U64 | ElemType::F64 => 8,
        }
    }

    /// Whether this is one of the two string element types
    pub const fn is_string(self) -> bool {
        matches!(self, ElemType::Str | ElemType::PascalStr)
    }
}

/// Byte layout of one field for one decode or encode call
///
/// Invariant: `byte_count == count * elem.width()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpec {
    /// Total bytes this field occupies on the wire
    pub byte_count: usize,
    /// Effective element count (0 is legal and occupies no bytes)
    pub count: usize,
    /// Canonical element type
    pub elem: ElemType,
    /// The specifier after placeholder substitution
    pub computed: String,
}

/// Resolve one field's format specifier against prior field values
///
/// `prior` looks up an already-visited field by name; it must return
/// `None` for the current field and everything declared after it.
///
/// Fails with [`CodecError::UnresolvedReference`] when a placeholder
/// misses, [`CodecError::InvalidReferenceType`] when the referenced
/// value is not an integer, [`CodecError::CountAndRepeat`] when both
/// counting styles appear, and [`CodecError::InvalidSpecifier`] for
/// everything else the grammar rejects.
pub fn resolve<'v>(
    spec: &str,
    field: &str,
    prior: impl Fn(&str) -> Option<&'v Value>,
) -> Result<ResolvedSpec> {
    let (computed, substituted) = substitute(spec, field, &prior)?;

    let invalid = || CodecError::InvalidSpecifier {
        field: field.to_string(),
        spec: spec.to_string(),
        computed: substituted.then(|| computed.clone()),
    };

    // Grammar: COUNT? TYPECODE TYPECODE*  (repeats must echo the head)
    let digits_end = computed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(computed.len());
    let (digits, tail) = computed.split_at(digits_end);

    let mut tail_chars = tail.chars();
    let type_code = tail_chars.next().ok_or_else(invalid)?;
    let elem = ElemType::from_code(type_code).ok_or_else(invalid)?;

    let repeat = tail_chars.as_str();
    if !repeat.chars().all(|c| c == type_code) {
        return Err(invalid());
    }
    let repeat_len = repeat.len();

    let count = if repeat_len > 0 {
        if !digits.is_empty() {
            let leading: usize = digits.parse().map_err(|_| invalid())?;
            return Err(CodecError::CountAndRepeat {
                field: field.to_string(),
                spec: spec.to_string(),
                suggested: format!("{}{}", leading + repeat_len, type_code),
            });
        }
        repeat_len + 1
    } else if digits.is_empty() {
        1
    } else {
        digits.parse().map_err(|_| invalid())?
    };

    let byte_count = count.checked_mul(elem.width()).ok_or_else(invalid)?;

    Ok(ResolvedSpec {
        byte_count,
        count,
        elem,
        computed,
    })
}

/// Substitute every `{name}` placeholder with the decimal rendering of
/// the named prior value. Returns the computed string and whether any
/// substitution happened. Malformed braces are left in place for the
/// grammar to reject.
fn substitute<'v>(
    spec: &str,
    field: &str,
    prior: &impl Fn(&str) -> Option<&'v Value>,
) -> Result<(String, bool)> {
    if !spec.contains('{') {
        return Ok((spec.to_string(), false));
    }

    let mut out = String::with_capacity(spec.len());
    let mut substituted = false;
    let mut rest = spec;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if close > 0 => {
                let name = &after[..close];
                let value = prior(name).ok_or_else(|| CodecError::UnresolvedReference {
                    field: field.to_string(),
                    reference: name.to_string(),
                })?;
                out.push_str(&render_count(value, field, name)?);
                substituted = true;
                rest = &after[close + 1..];
            }
            _ => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    Ok((out, substituted))
}

/// Decimal rendering of an integer-kind value for use as a count
fn render_count(value: &Value, field: &str, reference: &str) -> Result<String> {
    match value {
        Value::Int(v) => Ok(v.to_string()),
        Value::Uint(v) => Ok(v.to_string()),
        _ => Err(CodecError::InvalidReferenceType {
            field: field.to_string(),
            reference: reference.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve_plain(spec: &str) -> Result<ResolvedSpec> {
        resolve(spec, "sut", |_| None)
    }

    fn resolve_with(spec: &str, values: &HashMap<String, Value>) -> Result<ResolvedSpec> {
        resolve(spec, "sut", |name: &str| values.get(name))
    }

    #[test]
    fn test_bare_type_code() {
        let r = resolve_plain("H").unwrap();
        assert_eq!(r.count, 1);
        assert_eq!(r.byte_count, 2);
        assert_eq!(r.elem, ElemType::U16);
        assert_eq!(r.computed, "H");
    }

    #[test]
    fn test_count_and_repeat_equivalence() {
        let counted = resolve_plain("3H").unwrap();
        let repeated = resolve_plain("HHH").unwrap();
        assert_eq!(counted.byte_count, 6);
        assert_eq!(counted.count, 3);
        assert_eq!(counted.elem, ElemType::U16);
        assert_eq!(repeated.byte_count, counted.byte_count);
        assert_eq!(repeated.count, counted.count);
        assert_eq!(repeated.elem, counted.elem);
    }

    #[test]
    fn test_zero_count() {
        let r = resolve_plain("0H").unwrap();
        assert_eq!(r.count, 0);
        assert_eq!(r.byte_count, 0);
    }

    #[test]
    fn test_mixed_count_and_repeat_rejected() {
        let err = resolve_plain("2HH").unwrap_err();
        match err {
            CodecError::CountAndRepeat { suggested, .. } => assert_eq!(suggested, "3H"),
            other => panic!("expected CountAndRepeat, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_repeat_rejected() {
        assert!(matches!(
            resolve_plain("HB"),
            Err(CodecError::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let err = resolve_plain("2Z").unwrap_err();
        match err {
            CodecError::InvalidSpecifier { spec, computed, .. } => {
                assert_eq!(spec, "2Z");
                assert_eq!(computed, None);
            }
            other => panic!("expected InvalidSpecifier, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_digits_only_rejected() {
        assert!(matches!(
            resolve_plain(""),
            Err(CodecError::InvalidSpecifier { .. })
        ));
        assert!(matches!(
            resolve_plain("12"),
            Err(CodecError::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn test_canonicalization() {
        assert_eq!(resolve_plain("l").unwrap().elem, ElemType::I32);
        assert_eq!(resolve_plain("L").unwrap().elem, ElemType::U32);
        assert_eq!(resolve_plain("l").unwrap().byte_count, 4);

        let expected = if POINTER_WIDTH == 8 {
            (ElemType::I64, ElemType::U64)
        } else {
            (ElemType::I32, ElemType::U32)
        };
        assert_eq!(resolve_plain("n").unwrap().elem, expected.0);
        assert_eq!(resolve_plain("N").unwrap().elem, expected.1);
        assert_eq!(resolve_plain("P").unwrap().elem, expected.1);
        assert_eq!(resolve_plain("n").unwrap().byte_count, POINTER_WIDTH);
    }

    #[test]
    fn test_placeholder_substitution() {
        let mut values = HashMap::new();
        values.insert("length".to_string(), Value::Uint(5));
        let r = resolve_with("{length}s", &values).unwrap();
        assert_eq!(r.count, 5);
        assert_eq!(r.byte_count, 5);
        assert_eq!(r.elem, ElemType::Str);
        assert_eq!(r.computed, "5s");
    }

    #[test]
    fn test_multiple_placeholders_concatenate_textually() {
        let mut values = HashMap::new();
        values.insert("hi".to_string(), Value::Uint(1));
        values.insert("lo".to_string(), Value::Uint(2));
        let r = resolve_with("{hi}{lo}B", &values).unwrap();
        assert_eq!(r.computed, "12B");
        assert_eq!(r.count, 12);
    }

    #[test]
    fn test_unresolved_placeholder() {
        let err = resolve_plain("{length}s").unwrap_err();
        match err {
            CodecError::UnresolvedReference { field, reference } => {
                assert_eq!(field, "sut");
                assert_eq!(reference, "length");
            }
            other => panic!("expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_non_integer_placeholder_rejected() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), Value::Bytes(b"ab".to_vec()));
        assert!(matches!(
            resolve_with("{name}s", &values),
            Err(CodecError::InvalidReferenceType { .. })
        ));

        values.insert("flag".to_string(), Value::Bool(true));
        assert!(matches!(
            resolve_with("{flag}s", &values),
            Err(CodecError::InvalidReferenceType { .. })
        ));
    }

    #[test]
    fn test_bad_substitution_reports_computed_string() {
        let mut values = HashMap::new();
        values.insert("length".to_string(), Value::Uint(2));
        let err = resolve_with("{length}Z", &values).unwrap_err();
        match err {
            CodecError::InvalidSpecifier { spec, computed, .. } => {
                assert_eq!(spec, "{length}Z");
                assert_eq!(computed.as_deref(), Some("2Z"));
            }
            other => panic!("expected InvalidSpecifier, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_placeholder_fails_grammar() {
        let mut values = HashMap::new();
        values.insert("length".to_string(), Value::Int(-5));
        assert!(matches!(
            resolve_with("{length}s", &values),
            Err(CodecError::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn test_unterminated_brace_fails_grammar() {
        assert!(matches!(
            resolve_plain("{length"),
            Err(CodecError::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn test_pascal_count_includes_prefix_byte() {
        let r = resolve_plain("6p").unwrap();
        assert_eq!(r.byte_count, 6);
        assert_eq!(r.count, 6);
        assert_eq!(r.elem, ElemType::PascalStr);
    }
}
