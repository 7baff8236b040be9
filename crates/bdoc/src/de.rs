//! serde decode hook.
//!
//! Decoding a [`Document`] first asks the deserializer for the private
//! document marker. This crate's own [`PrimitiveDeserializer`] answers with
//! the raw bytes of an already-built document. Compact deserializers are
//! asked for the bytes they were given by the matching encode hook. Any other
//! deserializer falls back to heuristic decode: each value of the incoming
//! map is buffered as a [`serde_json::Value`] and probed, in order, as
//!
//! 1. null
//! 2. string
//! 3. platform integer (`i64`)
//! 4. 32-bit integer
//! 5. double
//! 6. boolean
//!
//! taking the first that succeeds. Nested maps and sequences are tried last
//! and decode recursively. A value that matches none of them fails with
//! [`Error::UnsupportedShape`].

use std::fmt;

use serde::de::value::StringDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::{Deserialize, forward_to_deserialize_any};
use serde_json::Value as JsonValue;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::iter::DocumentPairIterator;
use crate::primitive::{Binary, Kind, Primitive};
use crate::ser::{DOCUMENT_MARKER, PRIMITIVE_MARKER};

/// Deserialize a `T` from a [`Primitive`].
///
/// # Errors
///
/// Returns an error if the primitive's shape does not fit `T`.
pub fn from_primitive<T: DeserializeOwned>(value: Primitive) -> Result<T> {
    T::deserialize(PrimitiveDeserializer::new(value))
}

/// Deserialize a `T` from a [`Document`].
///
/// # Errors
///
/// Returns an error if the document's shape does not fit `T`.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    from_primitive(Primitive::Document(doc))
}

// --- Heuristic decode ---

/// A single value of a foreign container, probed one candidate type at a time.
pub trait ValueProbe {
    fn probe_null(&self) -> bool;
    fn probe_string(&self) -> Option<String>;
    fn probe_platform_int(&self) -> Option<i64>;
    fn probe_int32(&self) -> Option<i32>;
    fn probe_double(&self) -> Option<f64>;
    fn probe_bool(&self) -> Option<bool>;

    /// Nested container, decoded recursively. Tried after all scalars.
    fn probe_nested(&self) -> Option<Result<Primitive>> {
        None
    }
}

/// Decode the value under `key` by probing candidate types in fixed order.
///
/// # Errors
///
/// Returns `Error::UnsupportedShape` if no candidate matches.
pub fn heuristic_decode<P: ValueProbe + ?Sized>(key: &str, probe: &P) -> Result<Primitive> {
    if probe.probe_null() {
        return Ok(Primitive::Null);
    }
    if let Some(s) = probe.probe_string() {
        return Ok(Primitive::String(s));
    }
    if let Some(n) = probe.probe_platform_int() {
        return Ok(Primitive::Int64(n));
    }
    if let Some(n) = probe.probe_int32() {
        return Ok(Primitive::Int32(n));
    }
    if let Some(n) = probe.probe_double() {
        return Ok(Primitive::Double(n));
    }
    if let Some(b) = probe.probe_bool() {
        return Ok(Primitive::Bool(b));
    }
    probe.probe_nested().unwrap_or_else(|| {
        tracing::debug!(key, "heuristic decode exhausted all candidate types");
        Err(Error::UnsupportedShape {
            key: key.to_string(),
        })
    })
}

impl ValueProbe for JsonValue {
    fn probe_null(&self) -> bool {
        self.is_null()
    }

    fn probe_string(&self) -> Option<String> {
        self.as_str().map(str::to_string)
    }

    fn probe_platform_int(&self) -> Option<i64> {
        self.as_i64()
    }

    fn probe_int32(&self) -> Option<i32> {
        self.as_i64().and_then(|n| i32::try_from(n).ok())
    }

    fn probe_double(&self) -> Option<f64> {
        self.as_f64()
    }

    fn probe_bool(&self) -> Option<bool> {
        self.as_bool()
    }

    fn probe_nested(&self) -> Option<Result<Primitive>> {
        match self {
            JsonValue::Object(map) => Some(heuristic_document(map).map(Primitive::Document)),
            JsonValue::Array(items) => Some(heuristic_array(items).map(Primitive::Array)),
            _ => None,
        }
    }
}

/// Heuristically decode every entry of a JSON object, keeping its order.
///
/// # Errors
///
/// Returns `Error::UnsupportedShape` for the first undecodable value and
/// `Error::InvalidCString` for a key containing a NUL byte.
pub fn heuristic_document(map: &serde_json::Map<String, JsonValue>) -> Result<Document> {
    let mut doc = Document::new();
    for (key, value) in map {
        doc.try_insert(key, heuristic_decode(key, value)?)?;
    }
    Ok(doc)
}

fn heuristic_array(items: &[JsonValue]) -> Result<Document> {
    let mut doc = Document::new();
    for (ordinal, value) in items.iter().enumerate() {
        let key = ordinal.to_string();
        let value = heuristic_decode(&key, value)?;
        doc.try_insert(&key, value)?;
    }
    Ok(doc)
}

// --- Deserialize impls ---

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DOCUMENT_MARKER, DocumentVisitor)
    }
}

/// Accepts raw bytes, or unwraps the marker newtype.
struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a document")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Document, E> {
        Document::from_bytes(v.to_vec()).map_err(E::custom)
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Document, E> {
        Document::from_bytes(v).map_err(E::custom)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Document, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(GenericDocumentVisitor)
        } else {
            deserializer.deserialize_byte_buf(DocumentVisitor)
        }
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Document, A::Error> {
        GenericDocumentVisitor.visit_map(map)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> std::result::Result<Document, A::Error> {
        GenericDocumentVisitor.visit_seq(seq)
    }
}

/// Builds a document from a foreign map or sequence via heuristic decode.
struct GenericDocumentVisitor;

impl<'de> Visitor<'de> for GenericDocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map or a sequence")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Document, A::Error> {
        let mut doc = Document::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: JsonValue = map.next_value()?;
            let value = heuristic_decode(&key, &value).map_err(de::Error::custom)?;
            doc.try_insert(&key, value).map_err(de::Error::custom)?;
        }
        Ok(doc)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Document, A::Error> {
        let mut doc = Document::new();
        let mut ordinal = 0usize;
        while let Some(value) = seq.next_element::<JsonValue>()? {
            let key = ordinal.to_string();
            let value = heuristic_decode(&key, &value).map_err(de::Error::custom)?;
            doc.try_insert(&key, value).map_err(de::Error::custom)?;
            ordinal += 1;
        }
        Ok(doc)
    }
}

impl<'de> Deserialize<'de> for Primitive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(PRIMITIVE_MARKER, PrimitiveVisitor)
    }
}

/// Accepts a wrapper document's bytes, or unwraps the marker newtype.
struct PrimitiveVisitor;

impl PrimitiveVisitor {
    fn unwrap_bytes<E: de::Error>(bytes: Vec<u8>) -> std::result::Result<Primitive, E> {
        let wrapper = Document::from_bytes(bytes).map_err(E::custom)?;
        wrapper
            .values()
            .next()
            .ok_or_else(|| E::custom("empty primitive wrapper"))
    }
}

impl<'de> Visitor<'de> for PrimitiveVisitor {
    type Value = Primitive;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a primitive value")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Primitive, E> {
        Self::unwrap_bytes(v.to_vec())
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Primitive, E> {
        Self::unwrap_bytes(v)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Primitive, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(GenericPrimitiveVisitor)
        } else {
            deserializer.deserialize_byte_buf(PrimitiveVisitor)
        }
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Primitive, E> {
        GenericPrimitiveVisitor.visit_bool(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Primitive, E> {
        GenericPrimitiveVisitor.visit_i64(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Primitive, E> {
        GenericPrimitiveVisitor.visit_u64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Primitive, E> {
        GenericPrimitiveVisitor.visit_f64(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Primitive, E> {
        GenericPrimitiveVisitor.visit_str(v)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Null)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Primitive, A::Error> {
        GenericPrimitiveVisitor.visit_map(map)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> std::result::Result<Primitive, A::Error> {
        GenericPrimitiveVisitor.visit_seq(seq)
    }
}

/// Maps the foreign deserializer's own value types onto primitives.
struct GenericPrimitiveVisitor;

impl<'de> Visitor<'de> for GenericPrimitiveVisitor {
    type Value = Primitive;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a primitive value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Int64(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Primitive, E> {
        i64::try_from(v)
            .map(Primitive::Int64)
            .map_err(|_| E::custom(format!("{v} does not fit in int64")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Primitive, E> {
        Ok(Primitive::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Primitive, E> {
        Ok(Primitive::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Binary(Binary::generic(v)))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Primitive, E> {
        Ok(Primitive::Null)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Primitive, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Primitive, A::Error> {
        GenericDocumentVisitor.visit_map(map).map(Primitive::Document)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> std::result::Result<Primitive, A::Error> {
        GenericDocumentVisitor.visit_seq(seq).map(Primitive::Array)
    }
}

// --- Format-aware deserializer ---

/// Deserializer reading from a [`Primitive`]. This is the format-aware
/// implementation that answers the private markers with raw bytes.
#[derive(Debug, Clone)]
pub struct PrimitiveDeserializer {
    value: Primitive,
}

impl PrimitiveDeserializer {
    #[must_use]
    pub fn new(value: Primitive) -> Self {
        Self { value }
    }
}

impl<'de> Deserializer<'de> for PrimitiveDeserializer {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Primitive::Double(n) => visitor.visit_f64(n),
            Primitive::String(s) | Primitive::JavaScript(s) => visitor.visit_string(s),
            Primitive::Document(doc) => visitor.visit_map(DocumentAccess::new(doc)),
            Primitive::Array(doc) => visitor.visit_seq(ArrayAccess::new(doc)),
            Primitive::Binary(bin) => visitor.visit_byte_buf(bin.bytes),
            Primitive::ObjectId(oid) => visitor.visit_string(oid.to_hex()),
            Primitive::Bool(b) => visitor.visit_bool(b),
            Primitive::DateTime(dt) => visitor.visit_i64(dt.timestamp_millis()),
            Primitive::Null | Primitive::MinKey | Primitive::MaxKey => visitor.visit_unit(),
            Primitive::Regex(re) => visitor.visit_string(format!("/{}/{}", re.pattern, re.options)),
            Primitive::Int32(n) => visitor.visit_i32(n),
            Primitive::Timestamp(ts) => visitor.visit_u64(ts.to_u64()),
            Primitive::Int64(n) => visitor.visit_i64(n),
            Primitive::Decimal128(d) => visitor.visit_bytes(&d.bytes()),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Primitive::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        if name == DOCUMENT_MARKER {
            return match self.value {
                Primitive::Document(doc) | Primitive::Array(doc) => {
                    visitor.visit_byte_buf(doc.into_bytes())
                }
                other => Err(Error::TypeMismatch {
                    expected: Kind::Document,
                    found: other.kind(),
                }),
            };
        }
        if name == PRIMITIVE_MARKER {
            let mut wrapper = Document::new();
            wrapper.try_insert("", self.value)?;
            return visitor.visit_byte_buf(wrapper.into_bytes());
        }
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Primitive::String(variant) => {
                visitor.visit_enum(StringDeserializer::<Error>::new(variant))
            }
            Primitive::Document(doc) => {
                let mut pairs = doc.iter();
                match (pairs.next(), pairs.next()) {
                    (Some(pair), None) => visitor.visit_enum(VariantAccessor {
                        variant: pair.key,
                        value: pair.value,
                    }),
                    _ => Err(Error::Message(
                        "enum document must hold exactly one key".to_string(),
                    )),
                }
            }
            other => Err(Error::Message(format!(
                "expected string or document for enum, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

/// Map access over a document's pairs.
struct DocumentAccess {
    pairs: DocumentPairIterator,
    value: Option<Primitive>,
}

impl DocumentAccess {
    fn new(doc: Document) -> Self {
        Self {
            pairs: DocumentPairIterator::new(doc),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for DocumentAccess {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(pair) = self.pairs.next() else {
            return Ok(None);
        };
        self.value = Some(pair.value);
        seed.deserialize(StringDeserializer::<Error>::new(pair.key))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self
            .value
            .take()
            .ok_or_else(|| Error::Message("value requested before key".to_string()))?;
        seed.deserialize(PrimitiveDeserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.pairs.len())
    }
}

/// Sequence access over an array document's values.
struct ArrayAccess {
    pairs: DocumentPairIterator,
}

impl ArrayAccess {
    fn new(doc: Document) -> Self {
        Self {
            pairs: DocumentPairIterator::new(doc),
        }
    }
}

impl<'de> SeqAccess<'de> for ArrayAccess {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        self.pairs
            .next()
            .map(|pair| seed.deserialize(PrimitiveDeserializer::new(pair.value)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.pairs.len())
    }
}

/// Enum held as `{variant: value}`.
struct VariantAccessor {
    variant: String,
    value: Primitive,
}

impl<'de> EnumAccess<'de> for VariantAccessor {
    type Error = Error;
    type Variant = PrimitiveDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(StringDeserializer::<Error>::new(self.variant))?;
        Ok((variant, PrimitiveDeserializer::new(self.value)))
    }
}

impl<'de> VariantAccess<'de> for PrimitiveDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Primitive::Null => Ok(()),
            other => Err(Error::TypeMismatch {
                expected: Kind::Null,
                found: other.kind(),
            }),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_any(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_any(visitor)
    }
}
