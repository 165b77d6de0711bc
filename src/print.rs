use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, ReflectMessage, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{
    error::FormatError,
    registry::{FormatRegistry, TypeRegistry},
    scalar,
};

/// Serializes [`DynamicMessage`]s to the canonical JSON encoding.
///
/// A printer is immutable once built and may be shared freely between threads;
/// each call to [`to_json`][Self::to_json] or [`print`][Self::print] uses only
/// local state.
#[derive(Debug, Clone)]
pub struct Printer {
    include_default_value_fields: bool,
    preserve_proto_field_names: bool,
    format_long_as_number: bool,
    format_enum_as_number: bool,
    registry: FormatRegistry,
    type_registry: TypeRegistry,
}

impl Printer {
    /// Creates a printer with the default options, chosen to conform to the
    /// canonical JSON mapping.
    pub fn new() -> Self {
        Printer {
            include_default_value_fields: false,
            preserve_proto_field_names: false,
            format_long_as_number: false,
            format_enum_as_number: false,
            registry: FormatRegistry::new(),
            type_registry: TypeRegistry::new(),
        }
    }

    /// Whether to emit fields holding their default value (zero-valued proto3
    /// scalars, empty repeated fields and maps).
    ///
    /// Fields that track presence (messages, oneof members and explicit
    /// optionals) are only emitted when populated regardless of this option.
    ///
    /// The default value is `false`.
    pub fn include_default_value_fields(mut self, yes: bool) -> Self {
        self.include_default_value_fields = yes;
        self
    }

    /// Whether to key fields by their proto name instead of their
    /// lowerCamelCase JSON name.
    ///
    /// The default value is `false`.
    pub fn preserve_proto_field_names(mut self, yes: bool) -> Self {
        self.preserve_proto_field_names = yes;
        self
    }

    /// Whether to emit 64-bit integers as JSON numbers.
    ///
    /// The canonical mapping quotes 64-bit integers as decimal strings so that
    /// values which cannot be represented exactly by a double survive
    /// consumers that read JSON numbers as doubles. Parsing accepts both
    /// forms either way.
    ///
    /// The default value is `false`.
    pub fn format_long_as_number(mut self, yes: bool) -> Self {
        self.format_long_as_number = yes;
        self
    }

    /// Whether to emit enum values as their number instead of their name.
    ///
    /// The default value is `false`.
    pub fn format_enum_as_number(mut self, yes: bool) -> Self {
        self.format_enum_as_number = yes;
        self
    }

    /// Replaces the format registry consulted for custom JSON forms.
    pub fn format_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the type registry used to resolve `google.protobuf.Any`
    /// payload types.
    pub fn type_registry(mut self, registry: TypeRegistry) -> Self {
        self.type_registry = registry;
        self
    }

    /// Serializes `message` to a compact JSON string.
    pub fn print(&self, message: &DynamicMessage) -> Result<String, FormatError> {
        Ok(self.to_json(message)?.to_string())
    }

    /// Serializes `message` to a JSON value tree.
    pub fn to_json(&self, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
        let desc = message.descriptor();
        if let Some(format) = self.registry.message_format(desc.full_name()) {
            return format.write(self, message);
        }

        let mut object = JsonMap::new();
        for field_desc in desc.fields() {
            self.serialize_field(&mut object, message, &field_desc)?;
        }
        Ok(JsonValue::Object(object))
    }

    fn serialize_field(
        &self,
        object: &mut JsonMap<String, JsonValue>,
        message: &DynamicMessage,
        field_desc: &FieldDescriptor,
    ) -> Result<(), FormatError> {
        let name = if self.preserve_proto_field_names {
            field_desc.name()
        } else {
            field_desc.json_name()
        };

        if message.has_field(field_desc) {
            let value = message.get_field(field_desc);
            object.insert(name.to_owned(), self.encode_field(value.as_ref(), field_desc)?);
        } else if self.include_default_value_fields && !field_desc.supports_presence() {
            // Presence-tracking fields (messages, oneof members, explicit
            // optionals) stay omitted when unset; an absent message has no
            // finite JSON form for self-referential types.
            let default = Value::default_value_for_field(field_desc);
            object.insert(name.to_owned(), self.encode_field(&default, field_desc)?);
        }
        Ok(())
    }

    fn encode_field(
        &self,
        value: &Value,
        field_desc: &FieldDescriptor,
    ) -> Result<JsonValue, FormatError> {
        match value {
            Value::List(values) => {
                let kind = field_desc.kind();
                let mut list = Vec::with_capacity(values.len());
                for value in values {
                    list.push(self.encode_single(value, &kind)?);
                }
                Ok(JsonValue::Array(list))
            }
            Value::Map(entries) => {
                let entry_desc = match field_desc.kind() {
                    Kind::Message(message) if message.is_map_entry() => message,
                    kind => panic!(
                        "mismatch between value {:?} and field type {:?}",
                        value, kind
                    ),
                };
                let value_kind = entry_desc.map_entry_value_field().kind();

                let mut object = JsonMap::new();
                for (key, entry_value) in entries {
                    object.insert(
                        scalar::encode_map_key(key),
                        self.encode_single(entry_value, &value_kind)?,
                    );
                }
                Ok(JsonValue::Object(object))
            }
            _ => self.encode_single(value, &field_desc.kind()),
        }
    }

    fn encode_single(&self, value: &Value, kind: &Kind) -> Result<JsonValue, FormatError> {
        match (value, kind) {
            (Value::Message(message), _) => self.to_json(message),
            (Value::EnumNumber(number), Kind::Enum(enum_desc)) => {
                if let Some(format) = self.registry.enum_format(enum_desc.full_name()) {
                    format.write(self, enum_desc, *number)
                } else {
                    Ok(scalar::encode_enum(enum_desc, *number, self.format_enum_as_number))
                }
            }
            _ => Ok(scalar::encode_scalar(value, self.format_long_as_number)),
        }
    }

    pub(crate) fn formats(&self) -> &FormatRegistry {
        &self.registry
    }

    pub(crate) fn types(&self) -> &TypeRegistry {
        &self.type_registry
    }

    pub(crate) fn long_as_number(&self) -> bool {
        self.format_long_as_number
    }
}

impl Default for Printer {
    fn default() -> Self {
        Printer::new()
    }
}
