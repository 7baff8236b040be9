//! Byte-backed ordered document.
//!
//! A [`Document`] never builds a parsed tree. Reads scan the element list
//! starting right after the 4-byte length header; writes splice bytes in
//! place and rewrite the header.
//!
//! ```text
//! document := int32 total_len | element* | 0x00
//! element  := tag | key cstring | value
//! ```
//!
//! Positions are ordinals, not byte offsets, so every random access is a
//! linear scan from the header. Use [`Document::iter`] for a full pass.

use std::fmt;
use std::ops::Range;

use crate::convert::{PrimitiveConvertible, PrimitiveRepresentable};
use crate::encode::{check_element, encode_element, value_bytes};
use crate::error::{Error, Result};
use crate::index::DocumentIndex;
use crate::iter::{DocumentPair, DocumentPairIterator};
use crate::primitive::Primitive;
use crate::slice::DocumentSlice;
use crate::storage::ByteStorage;
use crate::tag::{Tag, TERMINATOR, read_len_le};
use crate::value::{self, find_nul};

/// Size of the int32 length header.
pub const HEADER_LEN: usize = 4;

/// Size of an empty document: header plus terminator.
pub const MIN_DOCUMENT_LEN: usize = HEADER_LEN + 1;

/// Deepest nesting accepted by [`Document::from_bytes`]. The outer document
/// is depth 0.
pub const MAX_DEPTH: usize = 100;

/// Ordered key/value document kept in its serialized form.
///
/// Clones are cheap and share the buffer until one of them is mutated.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Document {
    storage: ByteStorage,
}

/// Byte positions of one element.
#[derive(Debug, Clone, Copy)]
struct Element {
    /// Offset of the tag byte.
    start: usize,
    /// Offset of the first value byte.
    value_start: usize,
    /// Offset one past the last value byte.
    end: usize,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = Vec::with_capacity(MIN_DOCUMENT_LEN);
        bytes.extend_from_slice(&(MIN_DOCUMENT_LEN as i32).to_le_bytes());
        bytes.push(TERMINATOR);
        Self::from_validated(bytes)
    }

    /// Wrap raw bytes after validating them, nested documents included.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error (`DocumentTooSmall`, `LengthMismatch`,
    /// `MissingTerminator`, `UnknownTag`, `TruncatedValue`, `InvalidUtf8`,
    /// `MaxDepthExceeded`) describing the first problem found.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if let Err(e) = validate(&bytes, 0, 0) {
            tracing::debug!(error = %e, len = bytes.len(), "rejected malformed document");
            return Err(e);
        }
        Ok(Self::from_validated(bytes))
    }

    /// Wrap bytes already known to form a valid document.
    pub(crate) fn from_validated(bytes: Vec<u8>) -> Self {
        Self {
            storage: ByteStorage::new(bytes),
        }
    }

    /// Build an array document from values, keyed `"0"`, `"1"`, ...
    pub fn array<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: PrimitiveRepresentable,
    {
        let mut doc = Self::new();
        for value in values {
            doc.push(value);
        }
        doc
    }

    /// Get the underlying bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    /// Consume the document and return its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.storage.into_vec()
    }

    /// Total encoded size in bytes, header and terminator included.
    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.storage.len()
    }

    // --- Pair boundary scanning ---

    /// Advance `offset` past one whole element.
    ///
    /// Returns false, leaving `offset` untouched, at the terminator or when
    /// the element cannot be parsed.
    pub fn skip_one_pair(&self, offset: &mut usize) -> bool {
        let mut cursor = *offset;
        let Some(tag) = self.skip_key(&mut cursor) else {
            return false;
        };
        let Some(len) = self.value_length(tag, cursor) else {
            return false;
        };
        *offset = cursor + len;
        true
    }

    /// Advance `offset` past the tag and key of one element, leaving it on
    /// the first value byte. Returns the element's tag.
    pub fn skip_key(&self, offset: &mut usize) -> Option<Tag> {
        let tag = Tag::from_byte(self.storage.get(*offset)?)?;
        let key_end = self.storage.find_terminator(*offset + 1)?;
        *offset = key_end + 1;
        Some(tag)
    }

    /// Number of elements. Scans the whole document on every call.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut offset = HEADER_LEN;
        let mut n = 0;
        while self.skip_one_pair(&mut offset) {
            n += 1;
        }
        n
    }

    /// True if the document has no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.get(HEADER_LEN) == Some(TERMINATOR)
    }

    // --- Value decode dispatch ---

    /// Decode the value starting at `offset`.
    #[must_use]
    pub fn decode_value(&self, tag: Tag, offset: usize) -> Option<Primitive> {
        value::decode_value(self.as_bytes(), tag, offset)
    }

    /// Byte span of the value starting at `offset`.
    #[must_use]
    pub fn value_length(&self, tag: Tag, offset: usize) -> Option<usize> {
        value::value_length(self.as_bytes(), tag, offset)
    }

    /// Key of the element whose tag byte is at `offset`.
    fn read_key(&self, offset: usize) -> Option<&str> {
        let key_end = self.storage.find_terminator(offset + 1)?;
        std::str::from_utf8(self.storage.get_range(offset + 1..key_end)?).ok()
    }

    /// Decode the element at `offset`, returning it with the offset of the next one.
    pub(crate) fn read_pair(&self, offset: usize) -> Option<(String, Primitive, usize)> {
        let key = self.read_key(offset)?.to_string();
        let mut cursor = offset;
        let tag = self.skip_key(&mut cursor)?;
        let value = self.decode_value(tag, cursor)?;
        let len = self.value_length(tag, cursor)?;
        Some((key, value, cursor + len))
    }

    fn element_at(&self, offset: usize) -> Option<Element> {
        let mut value_start = offset;
        let tag = self.skip_key(&mut value_start)?;
        let len = self.value_length(tag, value_start)?;
        Some(Element {
            start: offset,
            value_start,
            end: value_start + len,
        })
    }

    /// Byte offset of the element at `ordinal`, or of the terminator when
    /// `ordinal == count()`. `None` past that.
    pub(crate) fn offset_of(&self, ordinal: usize) -> Option<usize> {
        let mut offset = HEADER_LEN;
        for _ in 0..ordinal {
            if !self.skip_one_pair(&mut offset) {
                return None;
            }
        }
        Some(offset)
    }

    fn locate(&self, key: &str) -> Option<Element> {
        let mut offset = HEADER_LEN;
        loop {
            let element = self.element_at(offset)?;
            if self.read_key(offset)? == key {
                return Some(element);
            }
            offset = element.end;
        }
    }

    /// Element at a live ordinal. Panics otherwise.
    fn element_at_ordinal(&self, ordinal: usize) -> Element {
        self.offset_of(ordinal)
            .and_then(|offset| self.element_at(offset))
            .unwrap_or_else(|| {
                panic!(
                    "document index {ordinal} out of bounds (count={})",
                    self.count()
                )
            })
    }

    // --- Ordinal access ---

    /// Key at `ordinal`, if there is an element there.
    #[must_use]
    pub fn key_at(&self, ordinal: usize) -> Option<String> {
        let offset = self.offset_of(ordinal)?;
        self.element_at(offset)?;
        self.read_key(offset).map(str::to_string)
    }

    /// Index of the first element.
    #[must_use]
    pub fn start_index(&self) -> DocumentIndex {
        DocumentIndex::new(0)
    }

    /// Index one past the last element.
    #[must_use]
    pub fn end_index(&self) -> DocumentIndex {
        DocumentIndex::new(self.count())
    }

    #[must_use]
    pub fn index_after(&self, index: DocumentIndex) -> DocumentIndex {
        DocumentIndex::new(index.ordinal() + 1)
    }

    /// # Panics
    ///
    /// Panics if `index` is the start index.
    #[must_use]
    pub fn index_before(&self, index: DocumentIndex) -> DocumentIndex {
        let ordinal = index
            .ordinal()
            .checked_sub(1)
            .unwrap_or_else(|| panic!("no index before the start index"));
        DocumentIndex::new(ordinal)
    }

    /// Read the pair at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below `count()`. An index obtained before an
    /// insertion or removal may refer to a different pair, or to none.
    #[must_use]
    pub fn pair_at(&self, index: DocumentIndex) -> DocumentPair {
        let element = self.element_at_ordinal(index.ordinal());
        self.read_pair(element.start)
            .map(|(key, value, _)| DocumentPair::new(index, key, value))
            .unwrap_or_else(|| panic!("undecodable element at index {index}"))
    }

    /// Write the pair at `index`.
    ///
    /// With the existing key the value is replaced in place. With a different
    /// key the old element is removed and the new one appended at the end.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below `count()`.
    pub fn set_pair_at<V: PrimitiveRepresentable>(
        &mut self,
        index: DocumentIndex,
        key: &str,
        value: V,
    ) {
        let element = self.element_at_ordinal(index.ordinal());
        if self.read_key(element.start) == Some(key) {
            self.replace_value(element, &value.to_primitive());
        } else {
            self.remove_element(element);
            self.insert(key, value);
        }
    }

    // --- Key access ---

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Primitive> {
        let element = self.locate(key)?;
        let tag = Tag::from_byte(self.storage.get(element.start)?)?;
        self.decode_value(tag, element.value_start)
    }

    /// Value stored under `key`, converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeMismatch` if the value is missing or of another kind.
    pub fn get_as<T: PrimitiveConvertible>(&self, key: &str) -> Result<T> {
        T::from_primitive(self.get(key).as_ref())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.locate(key).is_some()
    }

    /// Set `key` to `value`: replace in place if present, append otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `key`, or a regex pattern or option string in `value`,
    /// contains a NUL byte. Use [`try_insert`](Self::try_insert) for keys and
    /// values that come from decoded input.
    pub fn insert<V: PrimitiveRepresentable>(&mut self, key: &str, value: V) {
        let value = value.to_primitive();
        match self.locate(key) {
            Some(element) => self.replace_value(element, &value),
            None => self.append_element(key, &value),
        }
    }

    /// Like [`insert`](Self::insert), but rejects NUL bytes instead of
    /// panicking. The document is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCString` if `key`, or a regex pattern or option
    /// string in `value`, contains a NUL byte.
    pub fn try_insert<V: PrimitiveRepresentable>(&mut self, key: &str, value: V) -> Result<()> {
        let value = value.to_primitive();
        check_element(key, &value)?;
        self.insert(key, value);
        Ok(())
    }

    /// Set `key`, or remove it when `value` is `None`.
    pub fn assign(&mut self, key: &str, value: Option<Primitive>) {
        match value {
            Some(value) => self.insert(key, value),
            None => {
                self.remove(key);
            }
        }
    }

    /// Remove `key`, returning its value. No-op if absent.
    pub fn remove(&mut self, key: &str) -> Option<Primitive> {
        let element = self.locate(key)?;
        let tag = Tag::from_byte(self.storage.get(element.start)?)?;
        let value = self.decode_value(tag, element.value_start);
        self.remove_element(element);
        value
    }

    /// Append `value` under the next ordinal key.
    pub fn push<V: PrimitiveRepresentable>(&mut self, value: V) {
        let key = self.count().to_string();
        self.append_element(&key, &value.to_primitive());
    }

    /// True iff the keys are exactly `"0"`, `"1"`, ... in order.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.keys()
            .enumerate()
            .all(|(ordinal, key)| key == ordinal.to_string())
    }

    // --- Traversal ---

    /// Keys in order, without decoding values.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let mut offset = HEADER_LEN;
        std::iter::from_fn(move || {
            let start = offset;
            if !self.skip_one_pair(&mut offset) {
                return None;
            }
            self.read_key(start)
        })
    }

    /// Values in order.
    pub fn values(&self) -> impl Iterator<Item = Primitive> {
        self.iter().map(|pair| pair.value)
    }

    /// Snapshot iterator over all pairs.
    #[must_use]
    pub fn iter(&self) -> DocumentPairIterator {
        DocumentPairIterator::new(self.clone())
    }

    // --- Ranges ---

    /// View of the ordinals in `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is reversed or extends past `count()`.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> DocumentSlice<'_> {
        self.check_range(&range);
        DocumentSlice::new(self, range)
    }

    /// Remove the ordinals in `range`, then assign every pair of
    /// `replacement` by key. Replacement pairs end up at the end of the
    /// document, not in the vacated range.
    ///
    /// # Panics
    ///
    /// Panics if `range` is reversed or extends past `count()`.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &DocumentSlice<'_>) {
        self.check_range(&range);
        tracing::trace!(
            start = range.start,
            end = range.end,
            replacement = replacement.len(),
            "replacing document range"
        );
        for ordinal in range.rev() {
            let element = self.element_at_ordinal(ordinal);
            self.remove_element(element);
        }
        for pair in replacement.iter() {
            self.insert(&pair.key, pair.value);
        }
    }

    /// Raw element bytes between two ordinals.
    pub(crate) fn element_bytes(&self, range: Range<usize>) -> &[u8] {
        let start = self.offset_of(range.start);
        let end = self.offset_of(range.end);
        match (start, end) {
            (Some(start), Some(end)) => &self.as_bytes()[start..end],
            _ => panic!("document range {range:?} out of bounds (count={})", self.count()),
        }
    }

    fn check_range(&self, range: &Range<usize>) {
        let count = self.count();
        assert!(
            range.start <= range.end && range.end <= count,
            "document range {range:?} out of bounds (count={count})"
        );
    }

    // --- Splicing ---

    fn replace_value(&mut self, element: Element, value: &Primitive) {
        let bytes = value_bytes(value);
        tracing::trace!(
            offset = element.start,
            old_len = element.end - element.value_start,
            new_len = bytes.len(),
            "replacing value in place"
        );
        self.storage.write(element.start, &[value.tag().raw()]);
        self.storage.splice(element.value_start..element.end, &bytes);
        self.write_len_header();
    }

    fn append_element(&mut self, key: &str, value: &Primitive) {
        let bytes = encode_element(key, value);
        let at = self.byte_len() - 1;
        tracing::trace!(offset = at, len = bytes.len(), key, "appending element");
        self.storage.splice(at..at, &bytes);
        self.write_len_header();
    }

    fn remove_element(&mut self, element: Element) {
        tracing::trace!(offset = element.start, len = element.end - element.start, "removing element");
        self.storage.splice(element.start..element.end, &[]);
        self.write_len_header();
    }

    fn write_len_header(&mut self) {
        let len = self.storage.len() as i32;
        self.storage.write(0, &len.to_le_bytes());
    }
}

/// Check that `bytes` is one complete, well-formed document.
///
/// `base` is the document's offset in its outermost buffer, for error messages.
/// `depth` is its nesting depth.
fn validate(bytes: &[u8], base: usize, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::MaxDepthExceeded { max: MAX_DEPTH });
    }
    if bytes.len() < MIN_DOCUMENT_LEN {
        return Err(Error::DocumentTooSmall { len: bytes.len() });
    }
    let declared = read_len_le(bytes, 0).unwrap_or(0);
    if declared != bytes.len() {
        return Err(Error::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }
    if bytes[bytes.len() - 1] != TERMINATOR {
        return Err(Error::MissingTerminator);
    }

    let last = bytes.len() - 1;
    let mut offset = HEADER_LEN;
    while offset < last {
        let raw = bytes[offset];
        let tag = Tag::from_byte(raw).ok_or(Error::UnknownTag {
            tag: raw,
            offset: base + offset,
        })?;
        let key_end = find_nul(bytes, offset + 1)
            .filter(|&end| end < last)
            .ok_or(Error::TruncatedValue { offset: base + offset })?;
        std::str::from_utf8(&bytes[offset + 1..key_end])
            .map_err(|_| Error::InvalidUtf8 { offset: base + offset + 1 })?;

        let value_start = key_end + 1;
        let len = value::value_length(bytes, tag, value_start)
            .filter(|&len| value_start + len <= last)
            .ok_or(Error::TruncatedValue { offset: base + value_start })?;
        let value_bytes = &bytes[value_start..value_start + len];
        match tag {
            Tag::Document | Tag::Array => validate(value_bytes, base + value_start, depth + 1)?,
            _ => {
                value::decode_value(bytes, tag, value_start).ok_or_else(|| match tag {
                    Tag::String | Tag::JavaScript | Tag::Regex => Error::InvalidUtf8 {
                        offset: base + value_start,
                    },
                    _ => Error::TruncatedValue {
                        offset: base + value_start,
                    },
                })?;
            }
        }
        offset = value_start + len;
    }
    Ok(())
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|pair| (pair.key, pair.value)))
            .finish()
    }
}

impl TryFrom<Vec<u8>> for Document {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl<K: AsRef<str>, V: PrimitiveRepresentable> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Self::new();
        doc.extend(iter);
        doc
    }
}

impl<K: AsRef<str>, V: PrimitiveRepresentable> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.as_ref(), value);
        }
    }
}

impl IntoIterator for &Document {
    type Item = DocumentPair;
    type IntoIter = DocumentPairIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Document {
    type Item = DocumentPair;
    type IntoIter = DocumentPairIterator;

    fn into_iter(self) -> Self::IntoIter {
        DocumentPairIterator::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.insert("a", 1i32);
        doc.insert("b", "x");
        doc
    }

    fn pairs(doc: &Document) -> Vec<(String, Primitive)> {
        doc.iter().map(|p| (p.key, p.value)).collect()
    }

    #[test]
    fn test_empty_document_bytes() {
        let doc = Document::new();
        assert_eq!(doc.as_bytes(), &[0x05, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(doc.count(), 0);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_insert_layout() {
        let mut doc = Document::new();
        doc.insert("a", 1i32);
        assert_eq!(
            doc.as_bytes(),
            &[
                0x0C, 0x00, 0x00, 0x00, // total length 12
                0x10, b'a', 0x00, // int32 "a"
                0x01, 0x00, 0x00, 0x00, // 1
                0x00, // terminator
            ]
        );
    }

    #[test]
    fn test_skip_one_pair_stops_at_terminator() {
        let doc = sample();
        let mut offset = HEADER_LEN;
        assert!(doc.skip_one_pair(&mut offset));
        assert!(doc.skip_one_pair(&mut offset));
        let end = offset;
        assert!(!doc.skip_one_pair(&mut offset));
        assert_eq!(offset, end);
        assert_eq!(offset, doc.byte_len() - 1);
    }

    #[test]
    fn test_skip_key_lands_on_value() {
        let doc = sample();
        let mut offset = HEADER_LEN;
        assert_eq!(doc.skip_key(&mut offset), Some(Tag::Int32));
        assert_eq!(doc.decode_value(Tag::Int32, offset), Some(Primitive::Int32(1)));
    }

    #[test]
    fn test_key_at_and_pair_at() {
        let doc = sample();
        assert_eq!(doc.key_at(0).as_deref(), Some("a"));
        assert_eq!(doc.key_at(1).as_deref(), Some("b"));
        assert_eq!(doc.key_at(2), None);

        let pair = doc.pair_at(DocumentIndex::new(1));
        assert_eq!(pair.index.ordinal(), 1);
        assert_eq!(pair.key, "b");
        assert_eq!(pair.value, Primitive::String("x".into()));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_pair_at_past_end_panics() {
        let doc = sample();
        let _ = doc.pair_at(DocumentIndex::new(2));
    }

    #[test]
    fn test_update_in_place_keeps_position() {
        let mut doc = sample();
        doc.insert("a", "longer value");
        assert_eq!(doc.key_at(0).as_deref(), Some("a"));
        assert_eq!(doc.get("a"), Some(Primitive::String("longer value".into())));
        assert_eq!(doc.get("b"), Some(Primitive::String("x".into())));
        assert_eq!(doc.byte_len(), read_len_le(doc.as_bytes(), 0).unwrap());
    }

    #[test]
    fn test_set_pair_same_key() {
        let mut doc = sample();
        doc.set_pair_at(DocumentIndex::new(0), "a", 2i32);
        assert_eq!(
            pairs(&doc),
            vec![
                ("a".to_string(), Primitive::Int32(2)),
                ("b".to_string(), Primitive::String("x".into())),
            ]
        );
    }

    #[test]
    fn test_set_pair_new_key_moves_to_end() {
        let mut doc = sample();
        doc.set_pair_at(DocumentIndex::new(0), "c", 2i32);
        assert_eq!(
            pairs(&doc),
            vec![
                ("b".to_string(), Primitive::String("x".into())),
                ("c".to_string(), Primitive::Int32(2)),
            ]
        );
    }

    #[test]
    fn test_assign_none_removes_and_reassign_appends() {
        let mut doc = sample();
        doc.assign("a", None);
        assert!(!doc.contains_key("a"));
        doc.assign("missing", None);
        doc.assign("a", Some(Primitive::Int32(9)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(doc.get("a"), Some(Primitive::Int32(9)));
    }

    #[test]
    fn test_remove_returns_value() {
        let mut doc = sample();
        assert_eq!(doc.remove("b"), Some(Primitive::String("x".into())));
        assert_eq!(doc.remove("b"), None);
        assert_eq!(doc.count(), 1);
    }

    #[test]
    fn test_replace_range() {
        let mut doc = Document::new();
        doc.insert("a", 1i32);
        doc.insert("b", 2i32);
        doc.insert("c", 3i32);

        let replacement: Document = [("b", 9i32)].into_iter().collect();
        doc.replace_range(0..2, &replacement.slice(0..1));
        assert_eq!(
            pairs(&doc),
            vec![
                ("c".to_string(), Primitive::Int32(3)),
                ("b".to_string(), Primitive::Int32(9)),
            ]
        );
    }

    #[test]
    fn test_is_array() {
        assert!(Document::new().is_array());
        assert!(Document::array([1i32, 2, 3]).is_array());

        let mut doc = Document::new();
        doc.insert("1", 1i32);
        assert!(!doc.is_array());

        let mut doc = Document::new();
        doc.insert("0", 1i32);
        doc.insert("2", 1i32);
        assert!(!doc.is_array());

        let mut doc = Document::new();
        doc.insert("00", 1i32);
        assert!(!doc.is_array());
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let original = sample();
        let mut copy = original.clone();
        copy.insert("c", true);
        assert_eq!(original.count(), 2);
        assert_eq!(copy.count(), 3);
    }

    #[test]
    fn test_from_bytes_validation() {
        assert!(matches!(
            Document::from_bytes(vec![0x04, 0, 0, 0]),
            Err(Error::DocumentTooSmall { len: 4 })
        ));
        assert!(matches!(
            Document::from_bytes(vec![0x06, 0, 0, 0, 0]),
            Err(Error::LengthMismatch {
                declared: 6,
                actual: 5
            })
        ));
        assert!(matches!(
            Document::from_bytes(vec![0x05, 0, 0, 0, 1]),
            Err(Error::MissingTerminator)
        ));
        // undefined (0x06) is not supported
        assert!(matches!(
            Document::from_bytes(vec![0x08, 0, 0, 0, 0x06, b'a', 0, 0]),
            Err(Error::UnknownTag { tag: 0x06, offset: 4 })
        ));
        // int32 with only 2 value bytes
        assert!(matches!(
            Document::from_bytes(vec![0x0A, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0]),
            Err(Error::TruncatedValue { .. })
        ));
        // round trip of a valid document
        let doc = sample();
        let parsed = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_from_bytes_validates_nested() {
        let mut inner = Document::new();
        inner.insert("x", 1i32);
        let mut outer = Document::new();
        outer.insert("inner", inner);

        let mut bytes = outer.into_bytes();
        // corrupt the nested int32 tag
        let pos = bytes.iter().position(|&b| b == b'x').unwrap() - 1;
        bytes[pos] = 0x0E;
        assert!(matches!(
            Document::from_bytes(bytes),
            Err(Error::UnknownTag { tag: 0x0E, .. })
        ));
    }

    fn nested(levels: usize) -> Document {
        let mut doc = Document::new();
        for _ in 0..levels {
            let mut outer = Document::new();
            outer.insert("", doc);
            doc = outer;
        }
        doc
    }

    #[test]
    fn test_from_bytes_depth_limit() {
        let deepest = nested(MAX_DEPTH).into_bytes();
        assert!(Document::from_bytes(deepest).is_ok());

        let too_deep = nested(MAX_DEPTH + 1).into_bytes();
        assert_eq!(
            Document::from_bytes(too_deep),
            Err(Error::MaxDepthExceeded { max: MAX_DEPTH })
        );
    }

    #[test]
    fn test_try_insert_rejects_nul_key() {
        let mut doc = sample();
        let before = doc.clone();
        assert_eq!(
            doc.try_insert("a\0b", 1i32),
            Err(Error::InvalidCString {
                value: "a\0b".into()
            })
        );
        assert_eq!(doc, before);
        assert_eq!(doc.try_insert("c", 1i32), Ok(()));
        assert_eq!(doc.get("c"), Some(Primitive::Int32(1)));
    }

    #[test]
    fn test_debug_format() {
        let doc = sample();
        assert_eq!(format!("{doc:?}"), r#"{"a": Int32(1), "b": String("x")}"#);
    }
}
