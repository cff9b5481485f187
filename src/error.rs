//! Error types for the blockpack codec
use std::fmt;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Main error type for decode, encode, and layout construction
///
/// Every failure aborts the current decode or encode call; nothing is
/// retried internally. Variants carry enough context (field name, spec
/// text, byte counts) to diagnose a failure without re-running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A placeholder referenced a field that has not been decoded or
    /// encoded yet. Forward references look identical to unknown names
    /// because values are populated strictly in declaration order.
    UnresolvedReference {
        /// Field whose specifier contains the placeholder
        field: String,
        /// Name the placeholder referenced
        reference: String,
    },

    /// A placeholder referenced a prior field whose value is not an
    /// integer, so it cannot be rendered as a count.
    InvalidReferenceType {
        /// Field whose specifier contains the placeholder
        field: String,
        /// Name of the referenced non-integer field
        reference: String,
    },

    /// A format specifier failed the grammar after substitution
    InvalidSpecifier {
        /// Field with the bad specifier
        field: String,
        /// The specifier as declared (before substitution)
        spec: String,
        /// The specifier after substitution, when substitution occurred
        computed: Option<String>,
    },

    /// A specifier mixed a leading count with a repeat suffix
    CountAndRepeat {
        /// Field with the bad specifier
        field: String,
        /// The offending specifier
        spec: String,
        /// The single equivalent count form
        suggested: String,
    },

    /// The stream ended before a field's full byte count was read
    TruncatedStream {
        /// Field being decoded when the stream ran out
        field: String,
        /// Bytes the resolved specifier required
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// The element packer rejected a value (range overflow, wrong value
    /// kind, or too few vector elements)
    Packing {
        /// Field being packed or unpacked
        field: String,
        /// The resolved format for that field
        format: String,
        /// What the packer rejected, including the offending value
        detail: String,
    },

    /// A record was supplied with the wrong number of field values
    ArityMismatch {
        /// Fields the layout declares
        expected: usize,
        /// Values the record carries
        actual: usize,
    },

    /// Two fields in one layout share a name
    DuplicateField {
        /// The repeated field name
        name: String,
    },

    /// A layout was built with no fields at all
    EmptyLayout,

    /// Stream I/O failure
    Io(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnresolvedReference { field, reference } => write!(
                f,
                "unknown value '{}' for field '{}'; the referenced field must be declared before the current field",
                reference, field
            ),
            CodecError::InvalidReferenceType { field, reference } => write!(
                f,
                "field '{}' referenced by '{}' does not hold an integer value",
                reference, field
            ),
            CodecError::InvalidSpecifier {
                field,
                spec,
                computed,
            } => {
                write!(f, "field '{}' has an invalid specifier: '{}'", field, spec)?;
                if let Some(computed) = computed {
                    write!(f, " (computed: '{}')", computed)?;
                }
                Ok(())
            }
            CodecError::CountAndRepeat {
                field,
                spec,
                suggested,
            } => write!(
                f,
                "field '{}' mixes a count and a repeat in '{}'; write this as '{}' instead",
                field, spec, suggested
            ),
            CodecError::TruncatedStream {
                field,
                expected,
                actual,
            } => write!(
                f,
                "truncated stream while reading field '{}': needed {} bytes, got {}",
                field, expected, actual
            ),
            CodecError::Packing {
                field,
                format,
                detail,
            } => write!(
                f,
                "packing failed for field '{}' (format '{}'): {}",
                field, format, detail
            ),
            CodecError::ArityMismatch { expected, actual } => write!(
                f,
                "record has {} values but the layout declares {} fields",
                actual, expected
            ),
            CodecError::DuplicateField { name } => {
                write!(f, "duplicate field name '{}' in layout", name)
            }
            CodecError::EmptyLayout => write!(f, "layout declares no fields"),
            CodecError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Io(err.to_string())
    }
}
