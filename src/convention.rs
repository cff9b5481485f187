//! Byte-order / alignment conventions
//!
//! A convention is selected per decode or encode call, never stored on
//! the layout; the same layout may be decoded under different
//! conventions in different calls. Element widths are fixed after
//! canonicalization (see [`crate::spec::ElemType`]), so within one
//! homogeneous field the native modes differ from the standard modes
//! only in byte order.

/// Byte-order / alignment mode for one decode or encode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Convention {
    /// Platform byte order, platform alignment rules
    Native,
    /// Platform byte order, no padding
    NativeStandard,
    /// Little-endian, no padding
    LittleEndian,
    /// Big-endian, no padding
    BigEndian,
    /// Network byte order (identical to big-endian)
    Network,
}

/// Concrete byte order a convention resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl Convention {
    /// The byte order this convention applies to multi-byte elements
    pub const fn byte_order(self) -> ByteOrder {
        match self {
            Convention::Native | Convention::NativeStandard => {
                #[cfg(target_endian = "little")]
                {
                    ByteOrder::Little
                }
                #[cfg(target_endian = "big")]
                {
                    ByteOrder::Big
                }
            }
            Convention::LittleEndian => ByteOrder::Little,
            Convention::BigEndian | Convention::Network => ByteOrder::Big,
        }
    }

    /// The readable name used in layout definitions and diagnostics
    pub const fn as_str(self) -> &'static str {
        match self {
            Convention::Native => "native",
            Convention::NativeStandard => "native-standard",
            Convention::LittleEndian => "little-endian",
            Convention::BigEndian => "big-endian",
            Convention::Network => "network",
        }
    }
}

impl std::fmt::Display for Convention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_orders() {
        assert_eq!(Convention::LittleEndian.byte_order(), ByteOrder::Little);
        assert_eq!(Convention::BigEndian.byte_order(), ByteOrder::Big);
    }

    #[test]
    fn test_network_is_big_endian() {
        assert_eq!(
            Convention::Network.byte_order(),
            Convention::BigEndian.byte_order()
        );
    }

    #[test]
    fn test_native_matches_target() {
        let expected = if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        assert_eq!(Convention::Native.byte_order(), expected);
        assert_eq!(Convention::NativeStandard.byte_order(), expected);
    }

    #[test]
    fn test_names() {
        assert_eq!(Convention::NativeStandard.as_str(), "native-standard");
        assert_eq!(Convention::Network.to_string(), "network");
    }
}
