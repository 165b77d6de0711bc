//! JSON forms for the `google.protobuf` well-known types.
//!
//! Each formatter transcodes the reflected message to its `prost-types`
//! counterpart and converts that, mirroring the bespoke representations the
//! canonical mapping assigns to these types: `Duration`/`Timestamp`/`FieldMask`
//! as strings, the primitive wrappers as their bare scalar, `Struct`/`Value`/
//! `ListValue` as plain JSON, `NullValue` as `null`, and `Any` as an object
//! with a `@type` key.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use prost::Message;
use prost_reflect::{DynamicMessage, EnumDescriptor, MessageDescriptor, ReflectMessage};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{
    case::{camel_case_to_snake_case, snake_case_to_camel_case},
    error::{FormatError, FormatErrorKind},
    parse::Parser,
    print::Printer,
    registry::{EnumFormat, FormatRegistry, MessageFormat},
    scalar,
};

const MAX_DURATION_SECONDS: u64 = 315_576_000_000;
const MAX_NANOS: u32 = 999_999_999;

const MIN_TIMESTAMP_SECONDS: i64 = -62_135_596_800;
const MAX_TIMESTAMP_SECONDS: i64 = 253_402_300_799;

const WRAPPER_TYPES: &[&str] = &[
    "google.protobuf.DoubleValue",
    "google.protobuf.FloatValue",
    "google.protobuf.Int32Value",
    "google.protobuf.Int64Value",
    "google.protobuf.UInt32Value",
    "google.protobuf.UInt64Value",
    "google.protobuf.BoolValue",
    "google.protobuf.StringValue",
    "google.protobuf.BytesValue",
];

pub(crate) fn well_known_registry() -> FormatRegistry {
    let mut messages = HashMap::new();
    messages.insert(
        "google.protobuf.Any".to_owned(),
        MessageFormat::new(write_any, read_any),
    );
    messages.insert(
        "google.protobuf.Timestamp".to_owned(),
        MessageFormat::new(write_timestamp, read_timestamp),
    );
    messages.insert(
        "google.protobuf.Duration".to_owned(),
        MessageFormat::new(write_duration, read_duration),
    );
    messages.insert(
        "google.protobuf.FieldMask".to_owned(),
        MessageFormat::new(write_field_mask, read_field_mask),
    );
    messages.insert(
        "google.protobuf.Struct".to_owned(),
        MessageFormat::new(write_struct, read_struct),
    );
    messages.insert(
        "google.protobuf.ListValue".to_owned(),
        MessageFormat::new(write_list, read_list),
    );
    messages.insert(
        "google.protobuf.Value".to_owned(),
        MessageFormat::new(write_value, read_value).accepting_null(),
    );
    for name in WRAPPER_TYPES {
        messages.insert(
            (*name).to_owned(),
            MessageFormat::new(write_wrapper, read_wrapper),
        );
    }

    let mut enums = HashMap::new();
    enums.insert(
        "google.protobuf.NullValue".to_owned(),
        EnumFormat::new(write_null_value, read_null_value).accepting_null(),
    );

    FormatRegistry::from_parts(messages, enums)
}

fn transcode<T>(message: &DynamicMessage) -> Result<T, FormatError>
where
    T: Message + Default,
{
    message.transcode_to().map_err(|err| {
        FormatErrorKind::Decode {
            error: err.to_string(),
        }
        .into()
    })
}

fn make_dynamic<T>(desc: &MessageDescriptor, message: &T) -> Result<DynamicMessage, FormatError>
where
    T: Message,
{
    let mut dynamic = DynamicMessage::new(desc.clone());
    dynamic.transcode_from(message).map_err(|err| {
        FormatError::new(FormatErrorKind::Decode {
            error: err.to_string(),
        })
    })?;
    Ok(dynamic)
}

fn write_any(printer: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let any: prost_types::Any = transcode(message)?;
    let desc = message.descriptor();

    let payload_desc = printer.types().resolve(desc.parent_pool(), &any.type_url)?;
    let payload = DynamicMessage::decode(payload_desc.clone(), any.value.as_slice())
        .map_err(|err| {
            FormatError::new(FormatErrorKind::Decode {
                error: err.to_string(),
            })
        })?;

    let mut object = JsonMap::new();
    object.insert("@type".to_owned(), JsonValue::String(any.type_url.clone()));

    if printer.formats().message_format(payload_desc.full_name()).is_some() {
        object.insert("value".to_owned(), printer.to_json(&payload)?);
    } else {
        match printer.to_json(&payload)? {
            JsonValue::Object(fields) => object.extend(fields),
            _ => unreachable!("messages without a registered format serialize to objects"),
        }
    }
    Ok(JsonValue::Object(object))
}

fn read_any(
    parser: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    let object = match json {
        JsonValue::Object(object) => object,
        _ => {
            return Err(FormatErrorKind::ExpectedObject {
                message_name: desc.full_name().to_owned(),
            }
            .into())
        }
    };

    let type_url = match object.get("@type") {
        Some(JsonValue::String(type_url)) => type_url,
        _ => return Err(FormatErrorKind::MissingTypeUrl.into()),
    };

    let payload_desc = parser.types().resolve(desc.parent_pool(), type_url)?;

    let payload = if parser.formats().message_format(payload_desc.full_name()).is_some() {
        let value = object.get("value").ok_or_else(|| {
            FormatError::new(FormatErrorKind::MissingAnyValue {
                type_url: type_url.clone(),
            })
        })?;
        parser.from_json(&payload_desc, value)?
    } else {
        let mut fields = object.clone();
        fields.remove("@type");
        parser.from_json(&payload_desc, &JsonValue::Object(fields))?
    };

    let any = prost_types::Any {
        type_url: type_url.clone(),
        value: payload.encode_to_vec(),
    };
    make_dynamic(desc, &any)
}

fn write_duration(_: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let duration: prost_types::Duration = transcode(message)?;
    format_duration(duration.seconds, duration.nanos).map(JsonValue::String)
}

fn read_duration(
    _: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    let value = match json {
        JsonValue::String(value) => value,
        _ => {
            return Err(FormatErrorKind::InvalidValue {
                expected: "a duration string",
                value: json.to_string(),
            }
            .into())
        }
    };
    make_dynamic(desc, &parse_duration(value)?)
}

fn format_duration(seconds: i64, nanos: i32) -> Result<String, FormatError> {
    if seconds.unsigned_abs() > MAX_DURATION_SECONDS
        || nanos.unsigned_abs() > MAX_NANOS
        || (seconds > 0 && nanos < 0)
        || (seconds < 0 && nanos > 0)
    {
        return Err(FormatErrorKind::DurationOutOfRange.into());
    }

    let mut result = String::new();
    if seconds < 0 || nanos < 0 {
        result.push('-');
    }
    result.push_str(&seconds.unsigned_abs().to_string());
    push_fraction(&mut result, nanos.unsigned_abs());
    result.push('s');
    Ok(result)
}

fn parse_duration(value: &str) -> Result<prost_types::Duration, FormatError> {
    let invalid = || {
        FormatError::new(FormatErrorKind::InvalidDuration {
            value: value.to_owned(),
        })
    };

    let raw = value.strip_suffix('s').ok_or_else(invalid)?;
    let (negative, raw) = match raw.strip_prefix('-') {
        Some(raw) => (true, raw),
        None => (false, raw),
    };

    let (seconds, nanos) = match raw.split_once('.') {
        Some((seconds_str, nanos_str)) => {
            let seconds: u64 = seconds_str.parse().map_err(|_| invalid())?;
            let nanos = match nanos_str.len() {
                0 => 0,
                len @ 1..=9 => {
                    let mut nanos: u32 = nanos_str.parse().map_err(|_| invalid())?;
                    for _ in 0..9 - len {
                        nanos *= 10;
                    }
                    nanos
                }
                _ => return Err(invalid()),
            };
            (seconds, nanos)
        }
        None => (raw.parse().map_err(|_| invalid())?, 0),
    };

    if seconds > MAX_DURATION_SECONDS {
        return Err(FormatErrorKind::DurationOutOfRange.into());
    }

    if negative {
        Ok(prost_types::Duration {
            seconds: -(seconds as i64),
            nanos: -(nanos as i32),
        })
    } else {
        Ok(prost_types::Duration {
            seconds: seconds as i64,
            nanos: nanos as i32,
        })
    }
}

fn write_timestamp(_: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let timestamp: prost_types::Timestamp = transcode(message)?;
    format_timestamp(timestamp.seconds, timestamp.nanos).map(JsonValue::String)
}

fn read_timestamp(
    _: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    let value = match json {
        JsonValue::String(value) => value,
        _ => {
            return Err(FormatErrorKind::InvalidValue {
                expected: "an RFC 3339 timestamp string",
                value: json.to_string(),
            }
            .into())
        }
    };
    make_dynamic(desc, &parse_timestamp(value)?)
}

fn format_timestamp(seconds: i64, nanos: i32) -> Result<String, FormatError> {
    if !(MIN_TIMESTAMP_SECONDS..=MAX_TIMESTAMP_SECONDS).contains(&seconds)
        || !(0..=MAX_NANOS as i32).contains(&nanos)
    {
        return Err(FormatErrorKind::TimestampOutOfRange.into());
    }

    let datetime = DateTime::from_timestamp(seconds, nanos as u32)
        .ok_or(FormatErrorKind::TimestampOutOfRange)?;

    let mut result = datetime.format("%Y-%m-%dT%H:%M:%S").to_string();
    push_fraction(&mut result, nanos as u32);
    result.push('Z');
    Ok(result)
}

fn parse_timestamp(value: &str) -> Result<prost_types::Timestamp, FormatError> {
    let datetime = DateTime::parse_from_rfc3339(value).map_err(|_| {
        FormatError::new(FormatErrorKind::InvalidTimestamp {
            value: value.to_owned(),
        })
    })?;
    let utc: DateTime<Utc> = datetime.into();

    let timestamp = prost_types::Timestamp {
        seconds: utc.timestamp(),
        nanos: utc.timestamp_subsec_nanos() as i32,
    };
    if !(MIN_TIMESTAMP_SECONDS..=MAX_TIMESTAMP_SECONDS).contains(&timestamp.seconds)
        || !(0..=MAX_NANOS as i32).contains(&timestamp.nanos)
    {
        return Err(FormatErrorKind::TimestampOutOfRange.into());
    }
    Ok(timestamp)
}

/// Appends the fractional second part for `nanos`, trimmed to 3, 6 or 9
/// digits.
fn push_fraction(out: &mut String, nanos: u32) {
    if nanos == 0 {
        return;
    }
    out.push('.');
    if nanos % 1_000_000 == 0 {
        out.push_str(&format!("{:03}", nanos / 1_000_000));
    } else if nanos % 1_000 == 0 {
        out.push_str(&format!("{:06}", nanos / 1_000));
    } else {
        out.push_str(&format!("{:09}", nanos));
    }
}

fn write_field_mask(_: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let mask: prost_types::FieldMask = transcode(message)?;

    let mut result = String::new();
    for path in &mask.paths {
        if !result.is_empty() {
            result.push(',');
        }
        for (index, part) in path.split('.').enumerate() {
            if index > 0 {
                result.push('.');
            }
            snake_case_to_camel_case(&mut result, part).map_err(|()| {
                FormatError::new(FormatErrorKind::InvalidFieldMask { path: path.clone() })
            })?;
        }
    }
    Ok(JsonValue::String(result))
}

fn read_field_mask(
    _: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    let value = match json {
        JsonValue::String(value) => value,
        _ => {
            return Err(FormatErrorKind::InvalidValue {
                expected: "a field mask string",
                value: json.to_string(),
            }
            .into())
        }
    };

    let mut paths = Vec::new();
    for path in value.split(',').filter(|path| !path.is_empty()) {
        let mut result = String::new();
        for (index, part) in path.split('.').enumerate() {
            if index > 0 {
                result.push('.');
            }
            camel_case_to_snake_case(&mut result, part).map_err(|()| {
                FormatError::new(FormatErrorKind::InvalidFieldMask {
                    path: path.to_owned(),
                })
            })?;
        }
        paths.push(result);
    }
    make_dynamic(desc, &prost_types::FieldMask { paths })
}

fn write_wrapper(printer: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let desc = message.descriptor();
    let field_desc = desc.get_field(1).ok_or_else(|| {
        FormatError::new(FormatErrorKind::MissingValueField {
            message_name: desc.full_name().to_owned(),
        })
    })?;
    let value = message.get_field(&field_desc);
    Ok(scalar::encode_scalar(value.as_ref(), printer.long_as_number()))
}

fn read_wrapper(
    _: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    let field_desc = desc.get_field(1).ok_or_else(|| {
        FormatError::new(FormatErrorKind::MissingValueField {
            message_name: desc.full_name().to_owned(),
        })
    })?;
    let value = scalar::decode_scalar(&field_desc.kind(), json)?;

    let mut message = DynamicMessage::new(desc.clone());
    message.set_field(&field_desc, value);
    Ok(message)
}

fn write_value(_: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let value: prost_types::Value = transcode(message)?;
    json_from_value(&value)
}

fn read_value(
    _: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    make_dynamic(desc, &value_from_json(json))
}

fn write_struct(_: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let value: prost_types::Struct = transcode(message)?;
    json_from_struct(&value)
}

fn read_struct(
    _: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    let object = match json {
        JsonValue::Object(object) => object,
        _ => {
            return Err(FormatErrorKind::ExpectedObject {
                message_name: desc.full_name().to_owned(),
            }
            .into())
        }
    };
    make_dynamic(desc, &struct_from_json(object))
}

fn write_list(_: &Printer, message: &DynamicMessage) -> Result<JsonValue, FormatError> {
    let value: prost_types::ListValue = transcode(message)?;
    json_from_list(&value)
}

fn read_list(
    _: &Parser,
    desc: &MessageDescriptor,
    json: &JsonValue,
) -> Result<DynamicMessage, FormatError> {
    let values = match json {
        JsonValue::Array(values) => values,
        _ => {
            return Err(FormatErrorKind::InvalidValue {
                expected: "a list",
                value: json.to_string(),
            }
            .into())
        }
    };
    make_dynamic(desc, &list_from_json(values))
}

fn json_from_value(value: &prost_types::Value) -> Result<JsonValue, FormatError> {
    use prost_types::value::Kind;

    match &value.kind {
        None | Some(Kind::NullValue(_)) => Ok(JsonValue::Null),
        Some(Kind::BoolValue(value)) => Ok(JsonValue::Bool(*value)),
        Some(Kind::NumberValue(value)) => {
            if !value.is_finite() {
                return Err(FormatErrorKind::NonFiniteNumber.into());
            }
            Ok(scalar::encode_double(*value))
        }
        Some(Kind::StringValue(value)) => Ok(JsonValue::String(value.clone())),
        Some(Kind::ListValue(value)) => json_from_list(value),
        Some(Kind::StructValue(value)) => json_from_struct(value),
    }
}

fn json_from_struct(value: &prost_types::Struct) -> Result<JsonValue, FormatError> {
    let mut object = JsonMap::new();
    for (key, value) in &value.fields {
        object.insert(key.clone(), json_from_value(value)?);
    }
    Ok(JsonValue::Object(object))
}

fn json_from_list(value: &prost_types::ListValue) -> Result<JsonValue, FormatError> {
    let mut list = Vec::with_capacity(value.values.len());
    for value in &value.values {
        list.push(json_from_value(value)?);
    }
    Ok(JsonValue::Array(list))
}

fn value_from_json(json: &JsonValue) -> prost_types::Value {
    use prost_types::value::Kind;

    let kind = match json {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(value) => Kind::BoolValue(*value),
        JsonValue::Number(number) => Kind::NumberValue(number.as_f64().unwrap_or_default()),
        JsonValue::String(value) => Kind::StringValue(value.clone()),
        JsonValue::Array(values) => Kind::ListValue(list_from_json(values)),
        JsonValue::Object(object) => Kind::StructValue(struct_from_json(object)),
    };
    prost_types::Value { kind: Some(kind) }
}

fn struct_from_json(object: &JsonMap<String, JsonValue>) -> prost_types::Struct {
    let mut fields = BTreeMap::new();
    for (key, value) in object {
        fields.insert(key.clone(), value_from_json(value));
    }
    prost_types::Struct { fields }
}

fn list_from_json(values: &[JsonValue]) -> prost_types::ListValue {
    prost_types::ListValue {
        values: values.iter().map(value_from_json).collect(),
    }
}

fn write_null_value(_: &Printer, _: &EnumDescriptor, _: i32) -> Result<JsonValue, FormatError> {
    Ok(JsonValue::Null)
}

fn read_null_value(
    _: &Parser,
    desc: &EnumDescriptor,
    json: &JsonValue,
) -> Result<i32, FormatError> {
    match json {
        JsonValue::Null => Ok(0),
        _ => scalar::decode_enum(desc, json),
    }
}
