//! Lazily traversed, in-place mutable binary documents in the BSON layout.
//!
//! A [`Document`] owns its encoded bytes and never builds a parsed tree:
//! lookups scan the element list, and mutations splice bytes in place.
//! Clones share storage until one of them is written.
//!
//! ```
//! use bdoc::{Document, Primitive};
//!
//! let mut doc = Document::new();
//! doc.insert("name", "amy");
//! doc.insert("age", 30i32);
//!
//! let snapshot = doc.clone();
//! doc.insert("age", 31i32);
//!
//! assert_eq!(doc.get("age"), Some(Primitive::Int32(31)));
//! assert_eq!(snapshot.get("age"), Some(Primitive::Int32(30)));
//! ```

pub mod convert;
pub mod de;
pub mod document;
pub mod encode;
pub mod error;
pub mod index;
pub mod iter;
pub mod json;
pub mod primitive;
pub mod ser;
pub mod slice;
pub(crate) mod storage;
pub mod tag;
pub mod value;

pub use convert::{PrimitiveConvertible, PrimitiveRepresentable};
pub use de::{PrimitiveDeserializer, ValueProbe, from_document, from_primitive, heuristic_decode};
pub use document::Document;
pub use error::{Error, Result};
pub use index::DocumentIndex;
pub use iter::{DocumentPair, DocumentPairIterator};
pub use json::{from_json, to_json};
pub use primitive::{
    Binary, DateTime, Decimal128, Kind, MaxKey, MinKey, Null, ObjectId, Primitive, Regex,
    Timestamp,
};
pub use ser::{PrimitiveSerializer, to_document, to_primitive};
pub use slice::DocumentSlice;
pub use tag::Tag;
