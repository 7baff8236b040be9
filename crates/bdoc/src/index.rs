//! Ordinal position of a pair within a document.

use std::fmt;

/// Position of a pair, counted in pairs from the start of the document.
///
/// An index is not tied to a byte offset and is never revalidated: after an
/// insertion or removal at or before its ordinal it may name another pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DocumentIndex(usize);

impl DocumentIndex {
    #[inline]
    #[must_use]
    pub const fn new(ordinal: usize) -> Self {
        Self(ordinal)
    }

    #[inline]
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self.0
    }
}

impl From<usize> for DocumentIndex {
    fn from(ordinal: usize) -> Self {
        Self(ordinal)
    }
}

impl From<DocumentIndex> for usize {
    fn from(index: DocumentIndex) -> Self {
        index.0
    }
}

impl fmt::Display for DocumentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_compares_by_ordinal() {
        assert!(DocumentIndex::new(1) < DocumentIndex::new(2));
        assert_eq!(DocumentIndex::from(3), DocumentIndex::new(3));
        assert_eq!(usize::from(DocumentIndex::new(4)), 4);
    }

    #[test]
    fn test_index_navigation() {
        let doc = Document::array(["a", "b"]);
        let start = doc.start_index();
        let end = doc.end_index();
        assert_eq!(start.ordinal(), 0);
        assert_eq!(end.ordinal(), 2);
        assert_eq!(doc.index_after(start).ordinal(), 1);
        assert_eq!(doc.index_before(end).ordinal(), 1);
    }

    #[test]
    #[should_panic(expected = "start index")]
    fn test_index_before_start_panics() {
        let doc = Document::new();
        let _ = doc.index_before(doc.start_index());
    }
}
