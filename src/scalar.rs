//! JSON conversions for the scalar protobuf types.
//!
//! Encoding is driven by the [`Value`] variant alone since the variant pins the
//! wire representation; decoding is driven by the field's [`Kind`] and accepts
//! the permissive inputs allowed by the canonical JSON mapping (numbers or
//! decimal strings for the integral types, the reserved `"NaN"`/`"Infinity"`/
//! `"-Infinity"` spellings for floats).

use base64::{
    prelude::{BASE64_STANDARD, BASE64_URL_SAFE},
    DecodeError, Engine,
};
use prost_reflect::{EnumDescriptor, Kind, MapKey, Value};
use serde_json::{Number, Value as JsonValue};

use crate::error::{FormatError, FormatErrorKind};

const EXPECTED_I32: &str = "a 32-bit signed integer or decimal string";
const EXPECTED_I64: &str = "a 64-bit signed integer or decimal string";
const EXPECTED_U32: &str = "a 32-bit unsigned integer or decimal string";
const EXPECTED_U64: &str = "a 64-bit unsigned integer or decimal string";
const EXPECTED_F32: &str = "a 32-bit floating point value";
const EXPECTED_F64: &str = "a 64-bit floating point value";
const EXPECTED_BOOL: &str = "a boolean";
const EXPECTED_STRING: &str = "a string";
const EXPECTED_BYTES: &str = "a base64-encoded string";
const EXPECTED_ENUM: &str = "a string or integer";

pub(crate) fn encode_scalar(value: &Value, long_as_number: bool) -> JsonValue {
    match value {
        Value::Bool(value) => JsonValue::Bool(*value),
        Value::I32(value) => JsonValue::from(*value),
        Value::U32(value) => JsonValue::from(*value),
        Value::I64(value) => {
            if long_as_number {
                JsonValue::from(*value)
            } else {
                JsonValue::String(value.to_string())
            }
        }
        Value::U64(value) => {
            if long_as_number {
                JsonValue::from(*value)
            } else {
                JsonValue::String(value.to_string())
            }
        }
        Value::F32(value) => encode_double(f64::from(*value)),
        Value::F64(value) => encode_double(*value),
        Value::String(value) => JsonValue::String(value.clone()),
        Value::Bytes(value) => JsonValue::String(BASE64_STANDARD.encode(value)),
        _ => panic!("non-scalar value {:?} passed to the scalar encoder", value),
    }
}

pub(crate) fn encode_double(value: f64) -> JsonValue {
    if value == f64::INFINITY {
        JsonValue::String("Infinity".to_owned())
    } else if value == f64::NEG_INFINITY {
        JsonValue::String("-Infinity".to_owned())
    } else if value.is_nan() {
        JsonValue::String("NaN".to_owned())
    } else {
        match Number::from_f64(value) {
            Some(number) => JsonValue::Number(number),
            // Unreachable: the value is finite.
            None => JsonValue::Null,
        }
    }
}

pub(crate) fn decode_scalar(kind: &Kind, json: &JsonValue) -> Result<Value, FormatError> {
    match kind {
        Kind::Double => decode_f64(json).map(Value::F64),
        Kind::Float => decode_f32(json).map(Value::F32),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => decode_i32(json).map(Value::I32),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => decode_i64(json).map(Value::I64),
        Kind::Uint32 | Kind::Fixed32 => decode_u32(json).map(Value::U32),
        Kind::Uint64 | Kind::Fixed64 => decode_u64(json).map(Value::U64),
        Kind::Bool => match json {
            JsonValue::Bool(value) => Ok(Value::Bool(*value)),
            _ => Err(invalid(EXPECTED_BOOL, json)),
        },
        Kind::String => match json {
            JsonValue::String(value) => Ok(Value::String(value.clone())),
            _ => Err(invalid(EXPECTED_STRING, json)),
        },
        Kind::Bytes => decode_bytes(json),
        _ => panic!("non-scalar kind passed to the scalar decoder"),
    }
}

fn decode_i32(json: &JsonValue) -> Result<i32, FormatError> {
    match json {
        JsonValue::Number(number) => {
            if let Some(value) = number.as_i64() {
                value
                    .try_into()
                    .map_err(|_| out_of_range(EXPECTED_I32, json))
            } else if let Some(value) = number.as_u64() {
                value
                    .try_into()
                    .map_err(|_| out_of_range(EXPECTED_I32, json))
            } else {
                let value = integral(number, EXPECTED_I32, json)?;
                if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
                    return Err(out_of_range(EXPECTED_I32, json));
                }
                Ok(value as i32)
            }
        }
        JsonValue::String(value) => value.parse().map_err(|_| invalid(EXPECTED_I32, json)),
        _ => Err(invalid(EXPECTED_I32, json)),
    }
}

fn decode_u32(json: &JsonValue) -> Result<u32, FormatError> {
    match json {
        JsonValue::Number(number) => {
            if let Some(value) = number.as_u64() {
                value
                    .try_into()
                    .map_err(|_| out_of_range(EXPECTED_U32, json))
            } else if let Some(value) = number.as_i64() {
                value
                    .try_into()
                    .map_err(|_| out_of_range(EXPECTED_U32, json))
            } else {
                let value = integral(number, EXPECTED_U32, json)?;
                if value < 0.0 || value > f64::from(u32::MAX) {
                    return Err(out_of_range(EXPECTED_U32, json));
                }
                Ok(value as u32)
            }
        }
        JsonValue::String(value) => value.parse().map_err(|_| invalid(EXPECTED_U32, json)),
        _ => Err(invalid(EXPECTED_U32, json)),
    }
}

fn decode_i64(json: &JsonValue) -> Result<i64, FormatError> {
    match json {
        JsonValue::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(value)
            } else if let Some(value) = number.as_u64() {
                value
                    .try_into()
                    .map_err(|_| out_of_range(EXPECTED_I64, json))
            } else {
                let value = integral(number, EXPECTED_I64, json)?;
                if value < i64::MIN as f64 || value > i64::MAX as f64 {
                    return Err(out_of_range(EXPECTED_I64, json));
                }
                Ok(value as i64)
            }
        }
        JsonValue::String(value) => value.parse().map_err(|_| invalid(EXPECTED_I64, json)),
        _ => Err(invalid(EXPECTED_I64, json)),
    }
}

fn decode_u64(json: &JsonValue) -> Result<u64, FormatError> {
    match json {
        JsonValue::Number(number) => {
            if let Some(value) = number.as_u64() {
                Ok(value)
            } else if let Some(value) = number.as_i64() {
                value
                    .try_into()
                    .map_err(|_| out_of_range(EXPECTED_U64, json))
            } else {
                let value = integral(number, EXPECTED_U64, json)?;
                if value < 0.0 || value > u64::MAX as f64 {
                    return Err(out_of_range(EXPECTED_U64, json));
                }
                Ok(value as u64)
            }
        }
        JsonValue::String(value) => value.parse().map_err(|_| invalid(EXPECTED_U64, json)),
        _ => Err(invalid(EXPECTED_U64, json)),
    }
}

fn decode_f64(json: &JsonValue) -> Result<f64, FormatError> {
    match json {
        JsonValue::Number(number) => match number.as_f64() {
            Some(value) => Ok(value),
            None => Err(invalid(EXPECTED_F64, json)),
        },
        JsonValue::String(value) => parse_float_string(value, EXPECTED_F64, json),
        _ => Err(invalid(EXPECTED_F64, json)),
    }
}

fn decode_f32(json: &JsonValue) -> Result<f32, FormatError> {
    match json {
        JsonValue::Number(number) => match number.as_f64() {
            Some(value) => {
                if value < f64::from(f32::MIN) || value > f64::from(f32::MAX) {
                    Err(out_of_range(EXPECTED_F32, json))
                } else {
                    Ok(value as f32)
                }
            }
            None => Err(invalid(EXPECTED_F32, json)),
        },
        JsonValue::String(value) => {
            let value = parse_float_string(value, EXPECTED_F32, json)?;
            if value.is_finite() && (value < f64::from(f32::MIN) || value > f64::from(f32::MAX)) {
                return Err(out_of_range(EXPECTED_F32, json));
            }
            Ok(value as f32)
        }
        _ => Err(invalid(EXPECTED_F32, json)),
    }
}

/// Parses a string-form float, accepting the three reserved spellings. A value
/// that overflows to an infinity is rejected rather than silently saturated.
fn parse_float_string(value: &str, expected: &'static str, json: &JsonValue) -> Result<f64, FormatError> {
    match value {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => {
            let parsed: f64 = value.parse().map_err(|_| invalid(expected, json))?;
            if !parsed.is_finite() {
                return Err(out_of_range(expected, json));
            }
            Ok(parsed)
        }
    }
}

fn decode_bytes(json: &JsonValue) -> Result<Value, FormatError> {
    let value = match json {
        JsonValue::String(value) => value,
        _ => return Err(invalid(EXPECTED_BYTES, json)),
    };

    match BASE64_STANDARD.decode(value) {
        Ok(buf) => Ok(Value::Bytes(buf.into())),
        Err(DecodeError::InvalidByte(_, b'-')) | Err(DecodeError::InvalidByte(_, b'_')) => {
            match BASE64_URL_SAFE.decode(value) {
                Ok(buf) => Ok(Value::Bytes(buf.into())),
                Err(err) => Err(FormatErrorKind::InvalidBase64 {
                    error: err.to_string(),
                }
                .into()),
            }
        }
        Err(err) => Err(FormatErrorKind::InvalidBase64 {
            error: err.to_string(),
        }
        .into()),
    }
}

pub(crate) fn encode_enum(desc: &EnumDescriptor, number: i32, as_number: bool) -> JsonValue {
    if as_number {
        return JsonValue::from(number);
    }
    match desc.get_value(number) {
        Some(value) => JsonValue::String(value.name().to_owned()),
        None => JsonValue::from(number),
    }
}

pub(crate) fn decode_enum(desc: &EnumDescriptor, json: &JsonValue) -> Result<i32, FormatError> {
    match json {
        JsonValue::String(value) => match desc.get_value_by_name(value) {
            Some(enum_value) => Ok(enum_value.number()),
            None => Err(FormatErrorKind::EnumValueNotFound {
                value_name: value.clone(),
                enum_name: desc.full_name().to_owned(),
            }
            .into()),
        },
        JsonValue::Number(_) => {
            let number = decode_i32(json)?;
            match desc.get_value(number) {
                Some(_) => Ok(number),
                None => Err(FormatErrorKind::EnumNumberNotFound {
                    number,
                    enum_name: desc.full_name().to_owned(),
                }
                .into()),
            }
        }
        _ => Err(invalid(EXPECTED_ENUM, json)),
    }
}

pub(crate) fn encode_map_key(key: &MapKey) -> String {
    match key {
        MapKey::Bool(value) => value.to_string(),
        MapKey::I32(value) => value.to_string(),
        MapKey::I64(value) => value.to_string(),
        MapKey::U32(value) => value.to_string(),
        MapKey::U64(value) => value.to_string(),
        MapKey::String(value) => value.clone(),
    }
}

pub(crate) fn decode_map_key(kind: &Kind, key: &str) -> Result<MapKey, FormatError> {
    match kind {
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            key.parse().map(MapKey::I32).map_err(|_| map_key_error(EXPECTED_I32, key))
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            key.parse().map(MapKey::I64).map_err(|_| map_key_error(EXPECTED_I64, key))
        }
        Kind::Uint32 | Kind::Fixed32 => {
            key.parse().map(MapKey::U32).map_err(|_| map_key_error(EXPECTED_U32, key))
        }
        Kind::Uint64 | Kind::Fixed64 => {
            key.parse().map(MapKey::U64).map_err(|_| map_key_error(EXPECTED_U64, key))
        }
        Kind::Bool => key.parse().map(MapKey::Bool).map_err(|_| map_key_error(EXPECTED_BOOL, key)),
        Kind::String => Ok(MapKey::String(key.to_owned())),
        _ => unreachable!("invalid type for map key"),
    }
}

/// Requires the JSON number to have no fractional part before it may be
/// narrowed to an integral type.
fn integral(number: &Number, expected: &'static str, json: &JsonValue) -> Result<f64, FormatError> {
    let value = match number.as_f64() {
        Some(value) => value,
        None => return Err(invalid(expected, json)),
    };
    if value.fract() != 0.0 {
        return Err(invalid(expected, json));
    }
    Ok(value)
}

fn invalid(expected: &'static str, json: &JsonValue) -> FormatError {
    FormatErrorKind::InvalidValue {
        expected,
        value: json.to_string(),
    }
    .into()
}

fn out_of_range(expected: &'static str, json: &JsonValue) -> FormatError {
    FormatErrorKind::ValueOutOfRange {
        expected,
        value: json.to_string(),
    }
    .into()
}

fn map_key_error(expected: &'static str, key: &str) -> FormatError {
    FormatErrorKind::InvalidMapKey {
        expected,
        key: key.to_owned(),
    }
    .into()
}
