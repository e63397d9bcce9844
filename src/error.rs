//! Error types: configuration errors (caught before any data moves) and
//! value errors (abort a single encode/decode with no partial output).

/// Schema/configuration failures. These are fatal to the affected message
/// definition and always name the message or field involved.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "message [{message}] will not fit within specified size: requested {requested_bytes} \
         bytes ({requested_bits} body bits), layout needs {used_bits} body bits. \
         remove fields, tighten bounds, or increase the allowed size"
    )]
    Oversize {
        message: String,
        requested_bytes: usize,
        requested_bits: usize,
        used_bits: usize,
    },

    #[error("{setter} not supported by field [{field}] of kind {kind}")]
    UnsupportedSetter {
        field: String,
        kind: &'static str,
        setter: &'static str,
    },

    #[error("unknown field kind: {0}")]
    UnknownFieldKind(String),

    #[error("message [{0}] already preprocessed")]
    AlreadyPreprocessed(String),

    #[error("invalid bounds on field [{field}]: min {min} exceeds max {max}")]
    InvalidBounds { field: String, min: f64, max: f64 },

    #[error("field [{field}]: {reason}")]
    BadFieldConfig { field: String, reason: String },

    #[error("schema parse error: {0}")]
    Parse(String),
}

/// Per-operation failures during encode or decode.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("message [{0}] has not been preprocessed")]
    NotPreprocessed(String),

    #[error("value {value} out of range for field [{field}]")]
    OutOfRange { field: String, value: String },

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("frame too short: {got} bytes, header needs {need}")]
    ShortFrame { got: usize, need: usize },

    #[error("field [{field}]: {reason}")]
    BadValue { field: String, reason: String },
}
