//! Bounded ordinal views over a document.

use std::ops::Range;

use crate::document::{Document, HEADER_LEN};
use crate::iter::DocumentPairIterator;
use crate::tag::TERMINATOR;

/// Half-open ordinal range `[start, end)` of a parent document.
///
/// The view borrows the parent; nothing is copied until
/// [`to_document`](DocumentSlice::to_document) is called.
#[derive(Debug, Clone)]
pub struct DocumentSlice<'a> {
    document: &'a Document,
    range: Range<usize>,
}

impl<'a> DocumentSlice<'a> {
    /// The range must already be checked against the document.
    pub(crate) fn new(document: &'a Document, range: Range<usize>) -> Self {
        Self { document, range }
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.range.start
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.range.end
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Document this view is taken from.
    #[must_use]
    pub fn parent(&self) -> &'a Document {
        self.document
    }

    /// Pairs in the range. Indices are ordinals of the parent.
    #[must_use]
    pub fn iter(&self) -> DocumentPairIterator {
        DocumentPairIterator::bounded(self.document.clone(), self.range.start, self.range.end)
    }

    /// Keys in the range.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.document
            .keys()
            .skip(self.range.start)
            .take(self.range.len())
    }

    /// Copy the range out into a standalone document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let elements = self.document.element_bytes(self.range.clone());
        let len = HEADER_LEN + elements.len() + 1;
        let mut bytes = Vec::with_capacity(len);
        bytes.extend_from_slice(&(len as i32).to_le_bytes());
        bytes.extend_from_slice(elements);
        bytes.push(TERMINATOR);
        Document::from_validated(bytes)
    }
}

impl<'a> From<&'a Document> for DocumentSlice<'a> {
    /// View of the whole document.
    fn from(document: &'a Document) -> Self {
        Self::new(document, 0..document.count())
    }
}

impl IntoIterator for &DocumentSlice<'_> {
    type Item = crate::iter::DocumentPair;
    type IntoIter = DocumentPairIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Primitive;

    fn abc() -> Document {
        [("a", 1i32), ("b", 2i32), ("c", 3i32)].into_iter().collect()
    }

    #[test]
    fn test_slice_reads_range() {
        let doc = abc();
        let slice = doc.slice(1..3);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.keys().collect::<Vec<_>>(), vec!["b", "c"]);

        let sub = slice.to_document();
        assert_eq!(sub.count(), 2);
        assert_eq!(sub.get("b"), Some(Primitive::Int32(2)));
        assert_eq!(sub.get("a"), None);
        assert_eq!(sub, Document::from_bytes(sub.as_bytes().to_vec()).unwrap());
    }

    #[test]
    fn test_empty_slice() {
        let doc = abc();
        let slice = doc.slice(3..3);
        assert!(slice.is_empty());
        assert_eq!(slice.iter().count(), 0);
        assert_eq!(slice.to_document(), Document::new());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_slice_past_end_panics() {
        let doc = abc();
        let _ = doc.slice(2..4);
    }

    #[test]
    fn test_whole_document_slice() {
        let doc = abc();
        let slice = DocumentSlice::from(&doc);
        assert_eq!(slice.to_document(), doc);
    }

    #[test]
    fn test_replace_range_with_existing_key() {
        let mut doc = abc();
        let replacement: Document = [("c", 30i32), ("d", 4i32)].into_iter().collect();
        doc.replace_range(0..1, &DocumentSlice::from(&replacement));
        // "c" is updated where it stands, "d" appended
        let pairs: Vec<_> = doc.iter().map(|p| (p.key, p.value)).collect();
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), Primitive::Int32(2)),
                ("c".to_string(), Primitive::Int32(30)),
                ("d".to_string(), Primitive::Int32(4)),
            ]
        );
    }
}
