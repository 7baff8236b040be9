//! Sequential pair traversal.
//!
//! [`DocumentPairIterator`] walks the element list once, keeping a running
//! byte offset, so a full pass costs O(n) instead of the O(n^2) of repeated
//! [`Document::pair_at`] calls.

use std::iter::FusedIterator;

use crate::document::{Document, HEADER_LEN};
use crate::index::DocumentIndex;
use crate::primitive::Primitive;

/// One decoded pair, detached from the document it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPair {
    pub index: DocumentIndex,
    pub key: String,
    pub value: Primitive,
}

impl DocumentPair {
    #[must_use]
    pub fn new(index: DocumentIndex, key: String, value: Primitive) -> Self {
        Self { index, key, value }
    }
}

/// Iterator over a snapshot of a document.
///
/// The iterator holds its own clone of the document and captures the pair
/// count when created; mutating the original afterwards has no effect on it.
/// Once drained it keeps returning `None`.
#[derive(Debug, Clone)]
pub struct DocumentPairIterator {
    document: Document,
    /// Ordinal at which iteration stops.
    count: usize,
    ordinal: usize,
    offset: usize,
}

impl DocumentPairIterator {
    #[must_use]
    pub fn new(document: Document) -> Self {
        let count = document.count();
        Self {
            document,
            count,
            ordinal: 0,
            offset: HEADER_LEN,
        }
    }

    /// Iterate ordinals `start..end` only. The range must be in bounds.
    pub(crate) fn bounded(document: Document, start: usize, end: usize) -> Self {
        let offset = document.offset_of(start).unwrap_or(HEADER_LEN);
        Self {
            document,
            count: end,
            ordinal: start,
            offset,
        }
    }

    /// True once every captured pair has been returned.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.ordinal >= self.count
    }
}

impl Iterator for DocumentPairIterator {
    type Item = DocumentPair;

    fn next(&mut self) -> Option<DocumentPair> {
        if self.is_drained() {
            return None;
        }
        let Some((key, value, next_offset)) = self.document.read_pair(self.offset) else {
            // unreachable for validated documents; stop rather than loop
            self.ordinal = self.count;
            return None;
        };
        let pair = DocumentPair::new(DocumentIndex::new(self.ordinal), key, value);
        self.offset = next_offset;
        self.ordinal += 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.ordinal);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DocumentPairIterator {}

impl FusedIterator for DocumentPairIterator {}
