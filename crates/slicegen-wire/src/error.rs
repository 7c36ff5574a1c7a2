//! Errors raised while encoding or decoding.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: String,
        found: &'static str,
    },

    #[error("missing required member `{0}`")]
    MissingMember(String),

    #[error("instance {0} is not in the graph")]
    UnknownInstance(u32),

    #[error("{0} has no wire encoding")]
    Unencodable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer: needed {needed} bytes at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("enumerator value {value} is out of range for `{type_id}`")]
    EnumOutOfRange { type_id: String, value: i32 },

    #[error("negative size {0}")]
    NegativeSize(i32),

    #[error("invalid UTF-8 in string at offset {0}")]
    InvalidString(usize),

    #[error("slice of `{type_id}` overruns its declared size")]
    TruncatedSlice { type_id: String },

    #[error("no known type in slices starting with `{0}`")]
    NoKnownType(String),

    #[error("expected instance of `{expected}`, found `{found}`")]
    UnexpectedType { expected: String, found: String },

    #[error("reference to instance {0} was never resolved")]
    UnresolvedReference(i32),

    #[error("optional tag {tag} has format {found}, expected {expected}")]
    UnexpectedFormat {
        tag: i32,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid optional format code {0}")]
    InvalidFormat(u8),

    #[error("unknown user exception `{0}`")]
    UnknownUserException(String),

    #[error("encapsulation size {size} does not match {actual} remaining bytes")]
    EncapsulationSize { size: usize, actual: usize },

    #[error("unsupported encoding {major}.{minor}")]
    UnsupportedEncoding { major: u8, minor: u8 },
}
