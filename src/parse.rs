use std::collections::HashMap;

use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MessageDescriptor, Value};
use serde_json::Value as JsonValue;

use crate::{
    error::{FormatError, FormatErrorKind},
    registry::{FormatRegistry, TypeRegistry},
    scalar,
};

/// Materializes [`DynamicMessage`]s from the canonical JSON encoding.
///
/// A parser is immutable once built and may be shared freely between threads.
#[derive(Debug, Clone)]
pub struct Parser {
    preserve_proto_field_names: bool,
    deny_unknown_fields: bool,
    registry: FormatRegistry,
    type_registry: TypeRegistry,
}

impl Parser {
    /// Creates a parser with the default options, chosen to conform to the
    /// canonical JSON mapping.
    pub fn new() -> Self {
        Parser {
            preserve_proto_field_names: false,
            deny_unknown_fields: false,
            registry: FormatRegistry::new(),
            type_registry: TypeRegistry::new(),
        }
    }

    /// Whether to resolve JSON keys by proto field name only. By default keys
    /// are matched against the JSON name first and the proto name second, as
    /// the canonical mapping requires parsers to accept both.
    ///
    /// The default value is `false`.
    pub fn preserve_proto_field_names(mut self, yes: bool) -> Self {
        self.preserve_proto_field_names = yes;
        self
    }

    /// Whether to error on JSON keys that match no field of the target
    /// message. By default unknown keys are skipped for forward
    /// compatibility.
    ///
    /// The default value is `false`.
    pub fn deny_unknown_fields(mut self, yes: bool) -> Self {
        self.deny_unknown_fields = yes;
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

    /// Parses an instance of the message type described by `desc` from a JSON
    /// string.
    pub fn from_json_str(
        &self,
        desc: &MessageDescriptor,
        json: &str,
    ) -> Result<DynamicMessage, FormatError> {
        let value: JsonValue = serde_json::from_str(json).map_err(|err| {
            FormatErrorKind::InvalidJson {
                error: err.to_string(),
            }
        })?;
        self.from_json(desc, &value)
    }

    /// Parses an instance of the message type described by `desc` from a JSON
    /// value tree.
    pub fn from_json(
        &self,
        desc: &MessageDescriptor,
        json: &JsonValue,
    ) -> Result<DynamicMessage, FormatError> {
        if let Some(format) = self.registry.message_format(desc.full_name()) {
            return format.read(self, desc, json);
        }

        let object = match json {
            JsonValue::Object(object) => object,
            _ => {
                return Err(FormatErrorKind::ExpectedObject {
                    message_name: desc.full_name().to_owned(),
                }
                .into())
            }
        };

        let mut message = DynamicMessage::new(desc.clone());
        for (key, value) in object {
            let field_desc = match self.field_for_key(desc, key) {
                Some(field_desc) => field_desc,
                None if self.deny_unknown_fields => {
                    return Err(FormatErrorKind::UnknownFieldName {
                        field_name: key.clone(),
                        message_name: desc.full_name().to_owned(),
                    }
                    .into())
                }
                None => continue,
            };

            if value.is_null() && !self.accepts_null(&field_desc) {
                continue;
            }

            let decoded = self.parse_field(&field_desc, value)?;
            message.set_field(&field_desc, decoded);
        }
        Ok(message)
    }

    fn field_for_key(&self, desc: &MessageDescriptor, key: &str) -> Option<FieldDescriptor> {
        if self.preserve_proto_field_names {
            desc.get_field_by_name(key)
        } else {
            desc.get_field_by_json_name(key)
                .or_else(|| desc.get_field_by_name(key))
        }
    }

    /// A JSON `null` means "field absent" unless the field's singular type has
    /// a registered null-aware format (`google.protobuf.Value`,
    /// `google.protobuf.NullValue`).
    fn accepts_null(&self, field_desc: &FieldDescriptor) -> bool {
        if field_desc.is_list() || field_desc.is_map() {
            return false;
        }
        match field_desc.kind() {
            Kind::Message(message_desc) => self
                .registry
                .message_format(message_desc.full_name())
                .map_or(false, |format| format.accepts_null()),
            Kind::Enum(enum_desc) => self
                .registry
                .enum_format(enum_desc.full_name())
                .map_or(false, |format| format.accepts_null()),
            _ => false,
        }
    }

    fn parse_field(
        &self,
        field_desc: &FieldDescriptor,
        json: &JsonValue,
    ) -> Result<Value, FormatError> {
        if field_desc.is_list() {
            let values = match json {
                JsonValue::Array(values) => values,
                _ => {
                    return Err(FormatErrorKind::ExpectedList {
                        field_name: field_desc.full_name().to_owned(),
                    }
                    .into())
                }
            };
            let kind = field_desc.kind();
            let mut list = Vec::with_capacity(values.len());
            for value in values {
                list.push(self.parse_single(&kind, value)?);
            }
            Ok(Value::List(list))
        } else if field_desc.is_map() {
            let object = match json {
                JsonValue::Object(object) => object,
                _ => {
                    return Err(FormatErrorKind::ExpectedMap {
                        field_name: field_desc.full_name().to_owned(),
                    }
                    .into())
                }
            };
            let entry_desc = match field_desc.kind() {
                Kind::Message(message) if message.is_map_entry() => message,
                _ => unreachable!("map fields always have a map entry type"),
            };
            let key_kind = entry_desc.map_entry_key_field().kind();
            let value_kind = entry_desc.map_entry_value_field().kind();

            let mut entries = HashMap::with_capacity(object.len());
            for (key, value) in object {
                let map_key = scalar::decode_map_key(&key_kind, key)?;
                entries.insert(map_key, self.parse_single(&value_kind, value)?);
            }
            Ok(Value::Map(entries))
        } else {
            self.parse_single(&field_desc.kind(), json)
        }
    }

    fn parse_single(&self, kind: &Kind, json: &JsonValue) -> Result<Value, FormatError> {
        match kind {
            Kind::Message(message_desc) => {
                self.from_json(message_desc, json).map(Value::Message)
            }
            Kind::Enum(enum_desc) => {
                if let Some(format) = self.registry.enum_format(enum_desc.full_name()) {
                    format.read(self, enum_desc, json).map(Value::EnumNumber)
                } else {
                    scalar::decode_enum(enum_desc, json).map(Value::EnumNumber)
                }
            }
            _ => scalar::decode_scalar(kind, json),
        }
    }

    pub(crate) fn formats(&self) -> &FormatRegistry {
        &self.registry
    }

    pub(crate) fn types(&self) -> &TypeRegistry {
        &self.type_registry
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}
