//! This crate converts protobuf messages to and from the [canonical JSON
//! encoding](https://developers.google.com/protocol-buffers/docs/proto3#json),
//! driven entirely by message descriptors: any [`DynamicMessage`] can be
//! printed or parsed without generated code.
//!
//! The main entry points into the API of this crate are:
//! - [`Printer`] walks a message reflectively and produces a
//!   [`serde_json::Value`] tree or a compact string, applying the proto3
//!   default-omission, oneof, map and repeated rules.
//! - [`Parser`] materializes a [`DynamicMessage`] from a JSON tree or string
//!   against a target [`MessageDescriptor`][prost_reflect::MessageDescriptor].
//! - [`FormatRegistry`] intercepts specific message and enum types with custom
//!   writer/reader pairs; the default registry carries the bespoke forms of
//!   the `google.protobuf` well-known types.
//! - [`TypeRegistry`] resolves `google.protobuf.Any` type URLs to descriptors.
//!
//! Printers and parsers are immutable after construction and safe to share
//! across threads.
//!
//! # Example
//!
//! ```
//! use prost_reflect::{DescriptorPool, DynamicMessage, Value};
//! use prost_types::{
//!     field_descriptor_proto::{Label, Type},
//!     DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
//! };
//!
//! let file = FileDescriptorProto {
//!     name: Some("greeting.proto".to_owned()),
//!     package: Some("example".to_owned()),
//!     syntax: Some("proto3".to_owned()),
//!     message_type: vec![DescriptorProto {
//!         name: Some("Greeting".to_owned()),
//!         field: vec![FieldDescriptorProto {
//!             name: Some("message_text".to_owned()),
//!             number: Some(1),
//!             label: Some(Label::Optional as i32),
//!             r#type: Some(Type::String as i32),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let mut pool = DescriptorPool::new();
//! pool.add_file_descriptor_proto(file).unwrap();
//! let desc = pool.get_message_by_name("example.Greeting").unwrap();
//!
//! let mut message = DynamicMessage::new(desc.clone());
//! message.set_field_by_name("message_text", Value::String("hello".to_owned()));
//!
//! assert_eq!(proto_json::print(&message).unwrap(), r#"{"messageText":"hello"}"#);
//!
//! let parsed = proto_json::from_json_str(&desc, r#"{"messageText":"hello"}"#).unwrap();
//! assert_eq!(parsed, message);
//! ```
#![warn(missing_debug_implementations, missing_docs)]

mod case;
mod error;
mod parse;
mod print;
mod registry;
mod scalar;
mod wkt;

use prost_reflect::{DynamicMessage, MessageDescriptor};

pub use self::error::FormatError;
pub use self::parse::Parser;
pub use self::print::Printer;
pub use self::registry::{
    EnumFormat, EnumReadFn, EnumWriteFn, FormatRegistry, MessageFormat, MessageReadFn,
    MessageWriteFn, TypeRegistry,
};

/// Serializes `message` to a compact JSON string using the default printer
/// options.
pub fn print(message: &DynamicMessage) -> Result<String, FormatError> {
    Printer::new().print(message)
}

/// Serializes `message` to a JSON value tree using the default printer
/// options.
pub fn to_json(message: &DynamicMessage) -> Result<serde_json::Value, FormatError> {
    Printer::new().to_json(message)
}

/// Parses an instance of the message type described by `desc` from a JSON
/// value tree using the default parser options.
pub fn from_json(
    desc: &MessageDescriptor,
    json: &serde_json::Value,
) -> Result<DynamicMessage, FormatError> {
    Parser::new().from_json(desc, json)
}

/// Parses an instance of the message type described by `desc` from a JSON
/// string using the default parser options.
pub fn from_json_str(desc: &MessageDescriptor, json: &str) -> Result<DynamicMessage, FormatError> {
    Parser::new().from_json_str(desc, json)
}
