use std::{
    error::Error,
    fmt::{self, Display},
};

/// An error that may occur while converting between the protobuf and JSON
/// representations of a message.
#[derive(Debug, PartialEq)]
pub struct FormatError {
    kind: Box<FormatErrorKind>,
}

impl FormatError {
    pub(crate) fn new(kind: FormatErrorKind) -> Self {
        FormatError {
            kind: Box::new(kind),
        }
    }
}

impl From<FormatErrorKind> for FormatError {
    fn from(kind: FormatErrorKind) -> Self {
        FormatError::new(kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FormatErrorKind {
    InvalidJson {
        error: String,
    },
    ExpectedObject {
        message_name: String,
    },
    ExpectedList {
        field_name: String,
    },
    ExpectedMap {
        field_name: String,
    },
    InvalidValue {
        expected: &'static str,
        value: String,
    },
    ValueOutOfRange {
        expected: &'static str,
        value: String,
    },
    InvalidBase64 {
        error: String,
    },
    EnumValueNotFound {
        value_name: String,
        enum_name: String,
    },
    EnumNumberNotFound {
        number: i32,
        enum_name: String,
    },
    InvalidMapKey {
        expected: &'static str,
        key: String,
    },
    UnknownFieldName {
        field_name: String,
        message_name: String,
    },
    MessageNotFound {
        message_name: String,
    },
    MissingTypeUrl,
    InvalidTypeUrl {
        type_url: String,
    },
    MissingAnyValue {
        type_url: String,
    },
    InvalidDuration {
        value: String,
    },
    DurationOutOfRange,
    InvalidTimestamp {
        value: String,
    },
    TimestampOutOfRange,
    InvalidFieldMask {
        path: String,
    },
    NonFiniteNumber,
    MissingValueField {
        message_name: String,
    },
    Decode {
        error: String,
    },
}

impl Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatErrorKind::InvalidJson { error } => write!(f, "invalid JSON: {}", error),
            FormatErrorKind::ExpectedObject { message_name } => {
                write!(f, "expected a JSON object for message '{}'", message_name)
            }
            FormatErrorKind::ExpectedList { field_name } => {
                write!(f, "expected a JSON array for repeated field '{}'", field_name)
            }
            FormatErrorKind::ExpectedMap { field_name } => {
                write!(f, "expected a JSON object for map field '{}'", field_name)
            }
            FormatErrorKind::InvalidValue { expected, value } => {
                write!(f, "expected {}, but found '{}'", expected, value)
            }
            FormatErrorKind::ValueOutOfRange { expected, value } => {
                write!(f, "expected {}, but the value '{}' is out of range", expected, value)
            }
            FormatErrorKind::InvalidBase64 { error } => write!(f, "invalid base64: {}", error),
            FormatErrorKind::EnumValueNotFound { value_name, enum_name } => {
                write!(f, "value '{}' was not found for enum '{}'", value_name, enum_name)
            }
            FormatErrorKind::EnumNumberNotFound { number, enum_name } => {
                write!(f, "number {} was not found for enum '{}'", number, enum_name)
            }
            FormatErrorKind::InvalidMapKey { expected, key } => {
                write!(f, "expected map key to be {}, but found '{}'", expected, key)
            }
            FormatErrorKind::UnknownFieldName { field_name, message_name } => {
                write!(f, "field '{}' not found for message '{}'", field_name, message_name)
            }
            FormatErrorKind::MessageNotFound { message_name } => {
                write!(f, "message type '{}' not found", message_name)
            }
            FormatErrorKind::MissingTypeUrl => write!(f, "expected '@type' field"),
            FormatErrorKind::InvalidTypeUrl { type_url } => {
                write!(f, "unsupported type url '{}'", type_url)
            }
            FormatErrorKind::MissingAnyValue { type_url } => {
                write!(f, "expected 'value' field for well-known type '{}'", type_url)
            }
            FormatErrorKind::InvalidDuration { value } => {
                write!(f, "invalid duration string '{}'", value)
            }
            FormatErrorKind::DurationOutOfRange => write!(f, "duration out of range"),
            FormatErrorKind::InvalidTimestamp { value } => {
                write!(f, "invalid timestamp string '{}'", value)
            }
            FormatErrorKind::TimestampOutOfRange => write!(f, "timestamp out of range"),
            FormatErrorKind::InvalidFieldMask { path } => {
                write!(f, "cannot roundtrip field mask path '{}' through camelCase", path)
            }
            FormatErrorKind::NonFiniteNumber => {
                write!(f, "cannot represent non-finite double in google.protobuf.Value")
            }
            FormatErrorKind::MissingValueField { message_name } => {
                write!(f, "message '{}' has no field numbered 1", message_name)
            }
            FormatErrorKind::Decode { error } => write!(f, "error decoding message: {}", error),
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl Error for FormatError {}
