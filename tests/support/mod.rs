//! Shared descriptor pool for the integration tests.
//!
//! The pool is built programmatically from `FileDescriptorProto` values layered
//! on top of [`DescriptorPool::global`], which bundles the `google.protobuf`
//! well-known types, so the tests need no protoc invocation.
#![allow(dead_code)]

use once_cell::sync::Lazy;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, ReflectMessage};
use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, OneofDescriptorProto,
};

static POOL: Lazy<DescriptorPool> = Lazy::new(|| {
    let mut pool = DescriptorPool::global();
    pool.add_file_descriptor_proto(test_file()).unwrap();
    pool
});

pub fn test_pool() -> DescriptorPool {
    POOL.clone()
}

pub fn message_descriptor(name: &str) -> MessageDescriptor {
    POOL.get_message_by_name(name)
        .unwrap_or_else(|| panic!("message '{}' not found", name))
}

pub fn dynamic(name: &str) -> DynamicMessage {
    DynamicMessage::new(message_descriptor(name))
}

/// Compares two messages field by field. `get_field` yields the default value
/// for unpopulated fields, so messages built by different paths (explicit
/// `set_field` vs. parsing) compare equal whenever they are reflectively
/// indistinguishable.
pub fn assert_eq_message(actual: &DynamicMessage, expected: &DynamicMessage) {
    assert_eq!(actual.descriptor(), expected.descriptor());
    for field in actual.descriptor().fields() {
        assert_eq!(
            actual.has_field(&field),
            expected.has_field(&field),
            "presence mismatch for field '{}'",
            field.full_name()
        );
        assert_eq!(
            actual.get_field(&field),
            expected.get_field(&field),
            "value mismatch for field '{}'",
            field.full_name()
        );
    }
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn message(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_owned()),
        ..Default::default()
    }
}

fn enumeration(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Enum as i32),
        type_name: Some(type_name.to_owned()),
        ..Default::default()
    }
}

fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

fn in_oneof(mut field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    field.oneof_index = Some(index);
    field
}

fn map_entry(
    name: &str,
    key: FieldDescriptorProto,
    value: FieldDescriptorProto,
) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        field: vec![key, value],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn test_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("test.proto".to_owned()),
        package: Some("test".to_owned()),
        syntax: Some("proto3".to_owned()),
        dependency: vec![
            "google/protobuf/any.proto".to_owned(),
            "google/protobuf/duration.proto".to_owned(),
            "google/protobuf/field_mask.proto".to_owned(),
            "google/protobuf/struct.proto".to_owned(),
            "google/protobuf/timestamp.proto".to_owned(),
            "google/protobuf/wrappers.proto".to_owned(),
        ],
        message_type: vec![
            scalars(),
            scalar_arrays(),
            complex_type(),
            well_known_types(),
            message_with_oneof(),
            point(),
            message_with_any(),
            tree(),
        ],
        enum_type: vec![EnumDescriptorProto {
            name: Some("MyEnum".to_owned()),
            value: vec![
                enum_value("DEFAULT", 0),
                enum_value("FOO", 1),
                enum_value("BAR", 2),
                enum_value("BAZ", 3),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn enum_value(name: &str, number: i32) -> EnumValueDescriptorProto {
    EnumValueDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        ..Default::default()
    }
}

fn scalars() -> DescriptorProto {
    DescriptorProto {
        name: Some("Scalars".to_owned()),
        field: vec![
            scalar("double", 1, Type::Double),
            scalar("float", 2, Type::Float),
            scalar("int32", 3, Type::Int32),
            scalar("int64", 4, Type::Int64),
            scalar("uint32", 5, Type::Uint32),
            scalar("uint64", 6, Type::Uint64),
            scalar("sint32", 7, Type::Sint32),
            scalar("sint64", 8, Type::Sint64),
            scalar("fixed32", 9, Type::Fixed32),
            scalar("fixed64", 10, Type::Fixed64),
            scalar("sfixed32", 11, Type::Sfixed32),
            scalar("sfixed64", 12, Type::Sfixed64),
            scalar("bool", 13, Type::Bool),
            scalar("string", 14, Type::String),
            scalar("bytes", 15, Type::Bytes),
        ],
        ..Default::default()
    }
}

fn scalar_arrays() -> DescriptorProto {
    DescriptorProto {
        name: Some("ScalarArrays".to_owned()),
        field: vec![
            repeated(scalar("double", 1, Type::Double)),
            repeated(scalar("int32", 2, Type::Int32)),
            repeated(scalar("int64", 3, Type::Int64)),
            repeated(scalar("string", 4, Type::String)),
            repeated(scalar("bytes", 5, Type::Bytes)),
        ],
        ..Default::default()
    }
}

fn complex_type() -> DescriptorProto {
    DescriptorProto {
        name: Some("ComplexType".to_owned()),
        field: vec![
            repeated(message("string_map", 1, ".test.ComplexType.StringMapEntry")),
            repeated(message("int_map", 2, ".test.ComplexType.IntMapEntry")),
            repeated(message("int_str_map", 3, ".test.ComplexType.IntStrMapEntry")),
            message("nested", 4, ".test.Scalars"),
            repeated(enumeration("my_enum", 5, ".test.MyEnum")),
        ],
        nested_type: vec![
            map_entry(
                "StringMapEntry",
                scalar("key", 1, Type::String),
                message("value", 2, ".test.Scalars"),
            ),
            map_entry(
                "IntMapEntry",
                scalar("key", 1, Type::Int32),
                message("value", 2, ".test.Scalars"),
            ),
            map_entry(
                "IntStrMapEntry",
                scalar("key", 1, Type::Int32),
                scalar("value", 2, Type::String),
            ),
        ],
        ..Default::default()
    }
}

fn well_known_types() -> DescriptorProto {
    DescriptorProto {
        name: Some("WellKnownTypes".to_owned()),
        field: vec![
            message("timestamp", 1, ".google.protobuf.Timestamp"),
            message("duration", 2, ".google.protobuf.Duration"),
            message("struct", 3, ".google.protobuf.Struct"),
            message("double", 4, ".google.protobuf.DoubleValue"),
            message("float", 5, ".google.protobuf.FloatValue"),
            message("int32", 6, ".google.protobuf.Int32Value"),
            message("int64", 7, ".google.protobuf.Int64Value"),
            message("uint32", 8, ".google.protobuf.UInt32Value"),
            message("uint64", 9, ".google.protobuf.UInt64Value"),
            message("bool", 10, ".google.protobuf.BoolValue"),
            message("string", 11, ".google.protobuf.StringValue"),
            message("bytes", 12, ".google.protobuf.BytesValue"),
            message("mask", 13, ".google.protobuf.FieldMask"),
            message("list", 14, ".google.protobuf.ListValue"),
            message("value", 15, ".google.protobuf.Value"),
            enumeration("null", 16, ".google.protobuf.NullValue"),
        ],
        ..Default::default()
    }
}

fn message_with_oneof() -> DescriptorProto {
    DescriptorProto {
        name: Some("MessageWithOneof".to_owned()),
        field: vec![
            in_oneof(scalar("a", 1, Type::Int32), 0),
            in_oneof(scalar("b", 2, Type::String), 0),
            in_oneof(message("point", 3, ".test.Point"), 0),
        ],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("value".to_owned()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn point() -> DescriptorProto {
    DescriptorProto {
        name: Some("Point".to_owned()),
        field: vec![
            scalar("x", 1, Type::Int32),
            scalar("y", 2, Type::Int32),
            scalar("name", 3, Type::String),
        ],
        ..Default::default()
    }
}

fn message_with_any() -> DescriptorProto {
    DescriptorProto {
        name: Some("MessageWithAny".to_owned()),
        field: vec![message("any", 1, ".google.protobuf.Any")],
        ..Default::default()
    }
}

fn tree() -> DescriptorProto {
    DescriptorProto {
        name: Some("Tree".to_owned()),
        field: vec![
            scalar("value", 1, Type::Int32),
            message("child", 2, ".test.Tree"),
        ],
        ..Default::default()
    }
}
