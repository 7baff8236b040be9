//! JSON interchange for documents, using relaxed Extended JSON.
//!
//! # Example
//!
//! ```
//! use bdoc::json::{from_json, to_json};
//!
//! let doc = from_json(r#"{"name": "alice", "age": 30}"#).unwrap();
//! assert_eq!(to_json(&doc).unwrap(), r#"{"name":"alice","age":30}"#);
//! ```
//!
//! # Mapping
//!
//! | Kind         | JSON                                                   |
//! |--------------|--------------------------------------------------------|
//! | `null`       | null                                                   |
//! | `bool`       | true/false                                             |
//! | `int32`      | integer (parsed back when it fits i32)                 |
//! | `int64`      | integer outside i32, else `{"$numberLong": "<n>"}`   |
//! | `double`     | number with a fraction or exponent                     |
//! | `string`     | string                                                 |
//! | `document`   | object, keys in document order                         |
//! | `array`      | array                                                  |
//! | `binary`     | `{"$binary": {"base64": .., "subType": "hh"}}`         |
//! | `object_id`  | `{"$oid": "<24 hex>"}`                                 |
//! | `datetime`   | `{"$date": {"$numberLong": "<millis>"}}`               |
//! | `regex`      | `{"$regularExpression": {"pattern": .., "options": ..}}` |
//! | `javascript` | `{"$code": ..}`                                        |
//! | `timestamp`  | `{"$timestamp": {"t": .., "i": ..}}`                   |
//! | `decimal128` | `{"$numberDecimalBytes": "<32 hex>"}`                  |
//! | `min_key`    | `{"$minKey": 1}`                                       |
//! | `max_key`    | `{"$maxKey": 1}`                                       |
//!
//! `$numberInt`, `$numberLong` and `$numberDouble` wrappers are accepted on
//! input. An object is read as a marker only when it has exactly one key and
//! that key is a known marker; anything else is a plain document.

use base64::Engine;
use serde_json::{Map, Value as JsonValue, json};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::primitive::{Binary, DateTime, Decimal128, ObjectId, Primitive, Regex, Timestamp};

/// Parse a JSON object or array into a document.
///
/// # Errors
///
/// Returns `Error::JsonParse` if the text is not JSON, the top level is not
/// an object or array, or an Extended JSON marker is malformed.
/// Returns `Error::InvalidCString` if a key contains a NUL byte.
pub fn from_json(json: &str) -> Result<Document> {
    let value: JsonValue =
        serde_json::from_str(json).map_err(|e| Error::JsonParse(e.to_string()))?;
    from_json_value(&value)
}

/// Convert a parsed JSON object or array into a document.
///
/// # Errors
///
/// Same as [`from_json`].
pub fn from_json_value(value: &JsonValue) -> Result<Document> {
    match value {
        JsonValue::Object(map) => object_to_document(map),
        JsonValue::Array(items) => array_to_document(items),
        other => Err(Error::JsonParse(format!(
            "top-level value must be an object or array, found {other}"
        ))),
    }
}

/// Serialize a document to a compact JSON string.
///
/// # Errors
///
/// Returns `Error::NonFiniteFloat` if a double is NaN or infinite.
/// Returns `Error::JsonSerialize` if JSON serialization fails.
pub fn to_json(doc: &Document) -> Result<String> {
    let value = to_json_value(doc)?;
    serde_json::to_string(&value).map_err(|e| Error::JsonSerialize(e.to_string()))
}

/// Convert a document to a JSON object, or to an array for array documents.
///
/// # Errors
///
/// Returns `Error::NonFiniteFloat` if a double is NaN or infinite.
pub fn to_json_value(doc: &Document) -> Result<JsonValue> {
    if doc.is_array() && !doc.is_empty() {
        array_to_json(doc)
    } else {
        document_to_json(doc)
    }
}

// --- to_json helpers ---

fn document_to_json(doc: &Document) -> Result<JsonValue> {
    let mut obj = Map::new();
    for pair in doc {
        obj.insert(pair.key, primitive_to_json(&pair.value)?);
    }
    Ok(JsonValue::Object(obj))
}

fn array_to_json(doc: &Document) -> Result<JsonValue> {
    doc.values()
        .map(|value| primitive_to_json(&value))
        .collect::<Result<Vec<_>>>()
        .map(JsonValue::Array)
}

/// Convert a single primitive to its relaxed Extended JSON form.
///
/// # Errors
///
/// Returns `Error::NonFiniteFloat` if a double is NaN or infinite.
pub fn primitive_to_json(value: &Primitive) -> Result<JsonValue> {
    Ok(match value {
        Primitive::Double(f) => {
            let num = serde_json::Number::from_f64(*f).ok_or(Error::NonFiniteFloat(*f))?;
            JsonValue::Number(num)
        }
        Primitive::String(s) => JsonValue::String(s.clone()),
        Primitive::Document(doc) => document_to_json(doc)?,
        Primitive::Array(doc) => array_to_json(doc)?,
        Primitive::Binary(bin) => json!({
            "$binary": {
                "base64": base64::engine::general_purpose::STANDARD.encode(&bin.bytes),
                "subType": format!("{:02x}", bin.subtype),
            }
        }),
        Primitive::ObjectId(oid) => json!({ "$oid": oid.to_hex() }),
        Primitive::Bool(b) => JsonValue::Bool(*b),
        Primitive::DateTime(dt) => {
            json!({ "$date": { "$numberLong": dt.timestamp_millis().to_string() } })
        }
        Primitive::Null => JsonValue::Null,
        Primitive::Regex(re) => json!({
            "$regularExpression": { "pattern": re.pattern, "options": re.options }
        }),
        Primitive::JavaScript(code) => json!({ "$code": code }),
        Primitive::Int32(n) => JsonValue::from(*n),
        Primitive::Timestamp(ts) => json!({ "$timestamp": { "t": ts.time, "i": ts.increment } }),
        Primitive::Int64(n) if i32::try_from(*n).is_ok() => {
            json!({ "$numberLong": n.to_string() })
        }
        Primitive::Int64(n) => JsonValue::from(*n),
        Primitive::Decimal128(d) => json!({ "$numberDecimalBytes": hex::encode(d.bytes()) }),
        Primitive::MinKey => json!({ "$minKey": 1 }),
        Primitive::MaxKey => json!({ "$maxKey": 1 }),
    })
}

// --- from_json helpers ---

fn object_to_document(map: &Map<String, JsonValue>) -> Result<Document> {
    let mut doc = Document::new();
    for (key, value) in map {
        doc.try_insert(key, json_to_primitive(value)?)?;
    }
    Ok(doc)
}

fn array_to_document(items: &[JsonValue]) -> Result<Document> {
    let mut doc = Document::new();
    for (ordinal, item) in items.iter().enumerate() {
        doc.try_insert(&ordinal.to_string(), json_to_primitive(item)?)?;
    }
    Ok(doc)
}

/// Convert a JSON value to a primitive, honoring Extended JSON markers.
///
/// # Errors
///
/// Returns `Error::JsonParse` if a marker object is malformed.
pub fn json_to_primitive(value: &JsonValue) -> Result<Primitive> {
    match value {
        JsonValue::Null => Ok(Primitive::Null),
        JsonValue::Bool(b) => Ok(Primitive::Bool(*b)),
        JsonValue::Number(n) => Ok(number_to_primitive(n)),
        JsonValue::String(s) => Ok(Primitive::String(s.clone())),
        JsonValue::Array(items) => array_to_document(items).map(Primitive::Array),
        JsonValue::Object(map) => match extended_to_primitive(map)? {
            Some(primitive) => Ok(primitive),
            None => object_to_document(map).map(Primitive::Document),
        },
    }
}

fn number_to_primitive(n: &serde_json::Number) -> Primitive {
    if let Some(i) = n.as_i64() {
        i32::try_from(i).map_or(Primitive::Int64(i), Primitive::Int32)
    } else {
        // u64 above i64::MAX, or a float
        Primitive::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn invalid(marker: &str, value: &JsonValue) -> Error {
    Error::JsonParse(format!("invalid {marker} value: {value}"))
}

/// Recognize a single-key marker object. `Ok(None)` means a plain object.
fn extended_to_primitive(map: &Map<String, JsonValue>) -> Result<Option<Primitive>> {
    let mut entries = map.iter();
    let (Some((marker, value)), None) = (entries.next(), entries.next()) else {
        return Ok(None);
    };

    let primitive = match marker.as_str() {
        "$oid" => value
            .as_str()
            .and_then(ObjectId::parse_hex)
            .map(Primitive::ObjectId),
        "$date" => parse_date(value).map(Primitive::DateTime),
        "$binary" => parse_binary(value).map(Primitive::Binary),
        "$timestamp" => parse_timestamp(value).map(Primitive::Timestamp),
        "$regularExpression" => parse_regex(value).map(Primitive::Regex),
        "$code" => value.as_str().map(|s| Primitive::JavaScript(s.to_string())),
        "$numberDecimalBytes" => value
            .as_str()
            .and_then(|s| hex::decode(s).ok())
            .and_then(|bytes| <[u8; 16]>::try_from(bytes).ok())
            .map(|bytes| Primitive::Decimal128(Decimal128::from_bytes(bytes))),
        "$numberInt" => value
            .as_str()
            .and_then(|s| s.parse().ok())
            .map(Primitive::Int32),
        "$numberLong" => value
            .as_str()
            .and_then(|s| s.parse().ok())
            .map(Primitive::Int64),
        "$numberDouble" => value.as_str().and_then(parse_double).map(Primitive::Double),
        "$minKey" => (value.as_i64() == Some(1)).then_some(Primitive::MinKey),
        "$maxKey" => (value.as_i64() == Some(1)).then_some(Primitive::MaxKey),
        _ => return Ok(None),
    };

    primitive.map(Some).ok_or_else(|| invalid(marker, value))
}

fn parse_date(value: &JsonValue) -> Option<DateTime> {
    match value {
        JsonValue::Number(n) => n.as_i64().map(DateTime::from_millis),
        JsonValue::Object(inner) => inner
            .get("$numberLong")
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse().ok())
            .map(DateTime::from_millis),
        #[cfg(feature = "chrono")]
        JsonValue::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| DateTime::from(dt.with_timezone(&chrono::Utc))),
        _ => None,
    }
}

fn parse_binary(value: &JsonValue) -> Option<Binary> {
    let bytes = value.get("base64")?.as_str()?;
    let subtype = value.get("subType")?.as_str()?;
    Some(Binary {
        subtype: u8::from_str_radix(subtype, 16).ok()?,
        bytes: base64::engine::general_purpose::STANDARD
            .decode(bytes)
            .ok()?,
    })
}

fn parse_timestamp(value: &JsonValue) -> Option<Timestamp> {
    let time = value.get("t")?.as_u64()?;
    let increment = value.get("i")?.as_u64()?;
    Some(Timestamp {
        time: u32::try_from(time).ok()?,
        increment: u32::try_from(increment).ok()?,
    })
}

fn parse_regex(value: &JsonValue) -> Option<Regex> {
    let cstring = |field: &str| {
        value
            .get(field)?
            .as_str()
            .filter(|s| !s.contains('\0'))
            .map(str::to_string)
    };
    Some(Regex {
        pattern: cstring("pattern")?,
        options: cstring("options")?,
    })
}

fn parse_double(s: &str) -> Option<f64> {
    match s {
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => s.parse().ok(),
    }
}
