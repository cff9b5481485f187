//! Per-element pack/unpack primitives
//!
//! Converts a single element between its [`Value`] form and its wire
//! bytes under a [`ByteOrder`]. Range failures report the offending
//! value as a bare detail string; the record codec wraps them with the
//! field name and resolved format.
//!
//! String elements (`s`, `p`) span the whole field and are handled by
//! the record codec, not here.

use crate::convention::ByteOrder;
use crate::spec::ElemType;
use crate::value::Value;

macro_rules! put_num {
    ($value:expr, $order:expr, $out:expr) => {
        match $order {
            ByteOrder::Little => $out.extend_from_slice(&$value.to_le_bytes()),
            ByteOrder::Big => $out.extend_from_slice(&$value.to_be_bytes()),
        }
    };
}

macro_rules! take_num {
    ($ty:ty, $bytes:expr, $order:expr) => {{
        let mut raw = [0u8; std::mem::size_of::<$ty>()];
        raw.copy_from_slice($bytes);
        match $order {
            ByteOrder::Little => <$ty>::from_le_bytes(raw),
            ByteOrder::Big => <$ty>::from_be_bytes(raw),
        }
    }};
}

/// Append one element's wire bytes to `out`
pub fn pack_scalar(
    elem: ElemType,
    value: &Value,
    order: ByteOrder,
    out: &mut Vec<u8>,
) -> Result<(), String> {
    match elem {
        ElemType::Char => {
            let bytes = value
                .as_bytes()
                .ok_or_else(|| format!("expected a 1-byte string, got {:?}", value))?;
            if bytes.len() != 1 {
                return Err(format!(
                    "expected a 1-byte string, got {} bytes",
                    bytes.len()
                ));
            }
            out.push(bytes[0]);
        }
        ElemType::I8 => out.push(checked_int::<i8>(value, "b")? as u8),
        ElemType::U8 => out.push(checked_uint::<u8>(value, "B")?),
        ElemType::Bool => {
            let flag = value
                .as_bool()
                .ok_or_else(|| format!("expected a boolean, got {:?}", value))?;
            out.push(flag as u8);
        }
        ElemType::I16 => put_num!(checked_int::<i16>(value, "h")?, order, out),
        ElemType::U16 => put_num!(checked_uint::<u16>(value, "H")?, order, out),
        ElemType::I32 => put_num!(checked_int::<i32>(value, "i")?, order, out),
        ElemType::U32 => put_num!(checked_uint::<u32>(value, "I")?, order, out),
        ElemType::I64 => put_num!(checked_int::<i64>(value, "q")?, order, out),
        ElemType::U64 => put_num!(checked_uint::<u64>(value, "Q")?, order, out),
        ElemType::F32 => put_num!(float_of(value)? as f32, order, out),
        ElemType::F64 => put_num!(float_of(value)?, order, out),
        ElemType::Str | ElemType::PascalStr => {
            return Err("string elements are packed by the record codec".to_string())
        }
    }
    Ok(())
}

/// Decode one element from exactly `elem.width()` bytes
///
/// Infallible: the record codec hands over a slice of the exact width,
/// and every bit pattern decodes to a value (booleans decode any
/// nonzero byte as true).
pub fn unpack_scalar(elem: ElemType, bytes: &[u8], order: ByteOrder) -> Value {
    debug_assert_eq!(bytes.len(), elem.width());
    match elem {
        ElemType::Char => Value::Bytes(vec![bytes[0]]),
        ElemType::I8 => Value::Int(bytes[0] as i8 as i64),
        ElemType::U8 => Value::Uint(bytes[0] as u64),
        ElemType::Bool => Value::Bool(bytes[0] != 0),
        ElemType::I16 => Value::Int(take_num!(i16, bytes, order) as i64),
        ElemType::U16 => Value::Uint(take_num!(u16, bytes, order) as u64),
        ElemType::I32 => Value::Int(take_num!(i32, bytes, order) as i64),
        ElemType::U32 => Value::Uint(take_num!(u32, bytes, order) as u64),
        ElemType::I64 => Value::Int(take_num!(i64, bytes, order)),
        ElemType::U64 => Value::Uint(take_num!(u64, bytes, order)),
        ElemType::F32 => Value::Float(take_num!(f32, bytes, order) as f64),
        ElemType::F64 => Value::Float(take_num!(f64, bytes, order)),
        ElemType::Str | ElemType::PascalStr => {
            unreachable!("string elements are unpacked by the record codec")
        }
    }
}

/// Narrow an integer value to a signed width, accepting both `Int` and
/// in-range `Uint` inputs
fn checked_int<T>(value: &Value, code: &str) -> Result<T, String>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    match value {
        Value::Int(v) => {
            T::try_from(*v).map_err(|_| format!("value {} out of range for '{}'", v, code))
        }
        Value::Uint(v) => {
            T::try_from(*v).map_err(|_| format!("value {} out of range for '{}'", v, code))
        }
        other => Err(format!("expected an integer, got {:?}", other)),
    }
}

/// Narrow an integer value to an unsigned width, accepting both `Uint`
/// and non-negative `Int` inputs
fn checked_uint<T>(value: &Value, code: &str) -> Result<T, String>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    match value {
        Value::Uint(v) => {
            T::try_from(*v).map_err(|_| format!("value {} out of range for '{}'", v, code))
        }
        Value::Int(v) => {
            T::try_from(*v).map_err(|_| format!("value {} out of range for '{}'", v, code))
        }
        other => Err(format!("expected an integer, got {:?}", other)),
    }
}

fn float_of(value: &Value) -> Result<f64, String> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Int(v) => Ok(*v as f64),
        Value::Uint(v) => Ok(*v as f64),
        other => Err(format!("expected a float, got {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(elem: ElemType, value: &Value, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::new();
        pack_scalar(elem, value, order, &mut out).unwrap();
        out
    }

    #[test]
    fn test_u16_byte_order() {
        assert_eq!(
            packed(ElemType::U16, &Value::Uint(512), ByteOrder::Little),
            [0x00, 0x02]
        );
        assert_eq!(
            packed(ElemType::U16, &Value::Uint(512), ByteOrder::Big),
            [0x02, 0x00]
        );
    }

    #[test]
    fn test_signed_round_trip() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let bytes = packed(ElemType::I32, &Value::Int(-123456), order);
            assert_eq!(unpack_scalar(ElemType::I32, &bytes, order), Value::Int(-123456));
        }
    }

    #[test]
    fn test_range_overflow_rejected() {
        let mut out = Vec::new();
        let err = pack_scalar(ElemType::I8, &Value::Int(300), ByteOrder::Little, &mut out)
            .unwrap_err();
        assert!(err.contains("300"), "detail should carry the value: {}", err);

        let err = pack_scalar(
            ElemType::U16,
            &Value::Int(-1),
            ByteOrder::Little,
            &mut out,
        )
        .unwrap_err();
        assert!(err.contains("-1"));
    }

    #[test]
    fn test_uint_accepted_for_signed_width() {
        assert_eq!(
            packed(ElemType::I16, &Value::Uint(100), ByteOrder::Big),
            packed(ElemType::I16, &Value::Int(100), ByteOrder::Big)
        );
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut out = Vec::new();
        assert!(
            pack_scalar(ElemType::U32, &Value::Bool(true), ByteOrder::Little, &mut out).is_err()
        );
        assert!(pack_scalar(
            ElemType::Bool,
            &Value::Uint(1),
            ByteOrder::Little,
            &mut out
        )
        .is_err());
    }

    #[test]
    fn test_bool_decodes_nonzero_as_true() {
        assert_eq!(
            unpack_scalar(ElemType::Bool, &[0x02], ByteOrder::Little),
            Value::Bool(true)
        );
        assert_eq!(
            unpack_scalar(ElemType::Bool, &[0x00], ByteOrder::Little),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_char_is_one_byte_string() {
        assert_eq!(
            packed(ElemType::Char, &Value::Bytes(b"a".to_vec()), ByteOrder::Big),
            [b'a']
        );
        assert_eq!(
            unpack_scalar(ElemType::Char, &[b'z'], ByteOrder::Big),
            Value::Bytes(vec![b'z'])
        );

        let mut out = Vec::new();
        assert!(pack_scalar(
            ElemType::Char,
            &Value::Bytes(b"ab".to_vec()),
            ByteOrder::Big,
            &mut out
        )
        .is_err());
    }

    #[test]
    fn test_float_round_trip() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let bytes = packed(ElemType::F64, &Value::Float(-1.25), order);
            assert_eq!(
                unpack_scalar(ElemType::F64, &bytes, order),
                Value::Float(-1.25)
            );

            let bytes = packed(ElemType::F32, &Value::Float(3.5), order);
            assert_eq!(unpack_scalar(ElemType::F32, &bytes, order), Value::Float(3.5));
        }
    }

    #[test]
    fn test_integer_accepted_for_float_width() {
        assert_eq!(
            packed(ElemType::F64, &Value::Int(3), ByteOrder::Little),
            packed(ElemType::F64, &Value::Float(3.0), ByteOrder::Little)
        );
    }
}
