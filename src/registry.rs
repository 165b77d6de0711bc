use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use prost_reflect::{DescriptorPool, DynamicMessage, EnumDescriptor, MessageDescriptor};
use serde_json::Value as JsonValue;

use crate::{
    error::{FormatError, FormatErrorKind},
    parse::Parser,
    print::Printer,
    wkt,
};

/// Writes a message with a custom JSON form.
pub type MessageWriteFn = fn(&Printer, &DynamicMessage) -> Result<JsonValue, FormatError>;
/// Reads a message with a custom JSON form.
pub type MessageReadFn =
    fn(&Parser, &MessageDescriptor, &JsonValue) -> Result<DynamicMessage, FormatError>;
/// Writes an enum value with a custom JSON form.
pub type EnumWriteFn = fn(&Printer, &EnumDescriptor, i32) -> Result<JsonValue, FormatError>;
/// Reads an enum value with a custom JSON form.
pub type EnumReadFn = fn(&Parser, &EnumDescriptor, &JsonValue) -> Result<i32, FormatError>;

/// A custom JSON form for a message type: a writer, a reader, and whether the
/// reader understands a bare JSON `null` (otherwise `null` means "field
/// absent").
#[derive(Debug, Clone, Copy)]
pub struct MessageFormat {
    write: MessageWriteFn,
    read: MessageReadFn,
    accepts_null: bool,
}

impl MessageFormat {
    /// Creates a format from a writer/reader pair.
    pub const fn new(write: MessageWriteFn, read: MessageReadFn) -> Self {
        MessageFormat {
            write,
            read,
            accepts_null: false,
        }
    }

    /// Marks the reader as accepting a bare JSON `null`.
    pub const fn accepting_null(mut self) -> Self {
        self.accepts_null = true;
        self
    }

    pub(crate) fn write(
        &self,
        printer: &Printer,
        message: &DynamicMessage,
    ) -> Result<JsonValue, FormatError> {
        (self.write)(printer, message)
    }

    pub(crate) fn read(
        &self,
        parser: &Parser,
        desc: &MessageDescriptor,
        json: &JsonValue,
    ) -> Result<DynamicMessage, FormatError> {
        (self.read)(parser, desc, json)
    }

    pub(crate) fn accepts_null(&self) -> bool {
        self.accepts_null
    }
}

/// A custom JSON form for an enum type.
#[derive(Debug, Clone, Copy)]
pub struct EnumFormat {
    write: EnumWriteFn,
    read: EnumReadFn,
    accepts_null: bool,
}

impl EnumFormat {
    /// Creates a format from a writer/reader pair.
    pub const fn new(write: EnumWriteFn, read: EnumReadFn) -> Self {
        EnumFormat {
            write,
            read,
            accepts_null: false,
        }
    }

    /// Marks the reader as accepting a bare JSON `null`.
    pub const fn accepting_null(mut self) -> Self {
        self.accepts_null = true;
        self
    }

    pub(crate) fn write(
        &self,
        printer: &Printer,
        desc: &EnumDescriptor,
        number: i32,
    ) -> Result<JsonValue, FormatError> {
        (self.write)(printer, desc, number)
    }

    pub(crate) fn read(
        &self,
        parser: &Parser,
        desc: &EnumDescriptor,
        json: &JsonValue,
    ) -> Result<i32, FormatError> {
        (self.read)(parser, desc, json)
    }

    pub(crate) fn accepts_null(&self) -> bool {
        self.accepts_null
    }
}

/// A table of custom JSON forms, keyed by the full name of the message or enum
/// type they apply to.
///
/// The registry is an immutable value: [`register_message`][Self::register_message]
/// and [`register_enum`][Self::register_enum] return a new registry, leaving
/// the original untouched, so a shared baseline registry is safe to reuse and
/// extend from multiple threads.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    messages: Arc<HashMap<String, MessageFormat>>,
    enums: Arc<HashMap<String, EnumFormat>>,
}

static WELL_KNOWN: Lazy<FormatRegistry> = Lazy::new(wkt::well_known_registry);

impl FormatRegistry {
    /// Creates a registry pre-populated with the well-known type formats
    /// (`Duration`, `Timestamp`, `FieldMask`, the primitive wrappers,
    /// `Struct`/`Value`/`ListValue`, `NullValue` and `Any`).
    pub fn new() -> Self {
        WELL_KNOWN.clone()
    }

    /// Creates a registry with no formats registered.
    pub fn empty() -> Self {
        FormatRegistry {
            messages: Arc::new(HashMap::new()),
            enums: Arc::new(HashMap::new()),
        }
    }

    pub(crate) fn from_parts(
        messages: HashMap<String, MessageFormat>,
        enums: HashMap<String, EnumFormat>,
    ) -> Self {
        FormatRegistry {
            messages: Arc::new(messages),
            enums: Arc::new(enums),
        }
    }

    /// Returns a new registry which additionally maps the message type named
    /// `full_name` to `format`.
    pub fn register_message(&self, full_name: impl Into<String>, format: MessageFormat) -> Self {
        let mut messages = (*self.messages).clone();
        messages.insert(full_name.into(), format);
        FormatRegistry {
            messages: Arc::new(messages),
            enums: Arc::clone(&self.enums),
        }
    }

    /// Returns a new registry which additionally maps the enum type named
    /// `full_name` to `format`.
    pub fn register_enum(&self, full_name: impl Into<String>, format: EnumFormat) -> Self {
        let mut enums = (*self.enums).clone();
        enums.insert(full_name.into(), format);
        FormatRegistry {
            messages: Arc::clone(&self.messages),
            enums: Arc::new(enums),
        }
    }

    /// Looks up the format registered for the message type named `full_name`.
    pub fn message_format(&self, full_name: &str) -> Option<&MessageFormat> {
        self.messages.get(full_name)
    }

    /// Looks up the format registered for the enum type named `full_name`.
    pub fn enum_format(&self, full_name: &str) -> Option<&EnumFormat> {
        self.enums.get(full_name)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        FormatRegistry::new()
    }
}

/// Maps fully-qualified protobuf type names to message descriptors, used to
/// resolve the payload type of a `google.protobuf.Any` from its type URL.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    messages: Arc<HashMap<String, MessageDescriptor>>,
}

impl TypeRegistry {
    /// Creates an empty type registry.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns a new registry which additionally contains `desc`, keyed by its
    /// full name.
    pub fn with_message(&self, desc: MessageDescriptor) -> Self {
        let mut messages = (*self.messages).clone();
        messages.insert(desc.full_name().to_owned(), desc);
        TypeRegistry {
            messages: Arc::new(messages),
        }
    }

    /// Returns a new registry which additionally contains every message type
    /// in `pool`.
    pub fn with_pool(&self, pool: &DescriptorPool) -> Self {
        let mut messages = (*self.messages).clone();
        for desc in pool.all_messages() {
            messages.insert(desc.full_name().to_owned(), desc);
        }
        TypeRegistry {
            messages: Arc::new(messages),
        }
    }

    /// Looks up a message descriptor by full name.
    pub fn get(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }

    /// Resolves a type URL of the form `prefix/full.Name` against this
    /// registry, falling back to `pool` (the descriptor pool the enclosing
    /// `Any` was defined in).
    pub(crate) fn resolve(
        &self,
        pool: &DescriptorPool,
        type_url: &str,
    ) -> Result<MessageDescriptor, FormatError> {
        let (_, name) = type_url.rsplit_once('/').ok_or(FormatErrorKind::InvalidTypeUrl {
            type_url: type_url.to_owned(),
        })?;

        if let Some(desc) = self.messages.get(name) {
            return Ok(desc.clone());
        }
        pool.get_message_by_name(name)
            .ok_or_else(|| {
                FormatErrorKind::MessageNotFound {
                    message_name: name.to_owned(),
                }
                .into()
            })
    }
}
