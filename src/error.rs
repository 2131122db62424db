use thiserror::Error;

/// Errors produced while compiling a codec, encoding, or decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not canonical bencode.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    /// The wire value has a different shape than the destination.
    #[error("cannot decode {found} into {expected}{} (offset {offset})", in_field(.field))]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        offset: usize,
        field: Option<String>,
    },

    /// A well-formed integer does not fit the destination type.
    #[error("integer {value} overflows {target}")]
    Overflow { value: String, target: &'static str },

    /// A fixed-size destination received a different number of bytes or elements.
    #[error("length mismatch: expected {expected}, found {actual} (offset {offset})")]
    LengthMismatch {
        expected: usize,
        actual: usize,
        offset: usize,
    },

    /// The type cannot be represented in bencode. Raised when its codec is compiled.
    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: String,
    },

    /// An absent `Option` was encoded somewhere it cannot be omitted.
    #[error("bencode has no nil value, cannot encode absent {type_name}")]
    NilPointer { type_name: &'static str },

    /// The value references itself.
    #[error("encountered a reference cycle via {type_name}")]
    Cycle { type_name: &'static str },

    /// Encoding nested deeper than the traversal limit.
    #[error("exceeded max nesting depth {depth} while encoding")]
    DepthExceeded { depth: usize },

    /// A `RefCell` was mutably borrowed while being encoded.
    #[error("{type_name} is mutably borrowed")]
    Borrowed { type_name: &'static str },

    /// Raised by a user-supplied encode or decode procedure.
    #[error("{message}{}{}", at_offset(.offset), in_field(.field))]
    Custom {
        message: String,
        offset: Option<usize>,
        field: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

fn in_field(field: &Option<String>) -> String {
    match field {
        Some(path) => format!(" in field {}", path),
        None => String::new(),
    }
}

fn at_offset(offset: &Option<usize>) -> String {
    match offset {
        Some(offset) => format!(" (offset {})", offset),
        None => String::new(),
    }
}

impl Error {
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Error::Syntax {
            message: message.into(),
            offset,
        }
    }

    /// Error for user codecs to return from `encode_self` / `decode_self`.
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom {
            message: message.into(),
            offset: None,
            field: None,
        }
    }

    pub fn unsupported<T: ?Sized>(reason: impl Into<String>) -> Self {
        Error::UnsupportedType {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    pub(crate) fn eof(offset: usize) -> Self {
        Error::syntax("unexpected end of input", offset)
    }

    pub(crate) fn mismatch(expected: &'static str, found: &'static str, offset: usize) -> Self {
        Error::TypeMismatch {
            expected,
            found,
            offset,
            field: None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    /// Byte offset into the input the error refers to, when there is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Syntax { offset, .. }
            | Error::TypeMismatch { offset, .. }
            | Error::LengthMismatch { offset, .. } => Some(*offset),
            Error::Custom { offset, .. } => *offset,
            _ => None,
        }
    }

    /// Record path of the field being decoded, when known.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::TypeMismatch { field, .. } | Error::Custom { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Attaches a record field path unless a deeper one is already present.
    pub(crate) fn in_field(mut self, path: impl FnOnce() -> String) -> Self {
        if let Error::TypeMismatch { field, .. } | Error::Custom { field, .. } = &mut self {
            if field.is_none() {
                *field = Some(path());
            }
        }
        self
    }

    /// Attaches the input offset to a user codec error that has none.
    pub(crate) fn at(mut self, at: usize) -> Self {
        if let Error::Custom { offset, .. } = &mut self {
            if offset.is_none() {
                *offset = Some(at);
            }
        }
        self
    }
}
