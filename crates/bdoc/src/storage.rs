//! Shared, copy-on-write byte storage backing a document.

use std::ops::Range;
use std::sync::Arc;

use crate::value::find_nul;

/// Growable byte buffer with value semantics.
///
/// Clones share one allocation. The first mutation through a clone that is
/// not the sole owner copies the bytes, so readers of other clones never see it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteStorage {
    bytes: Arc<Vec<u8>>,
}

impl ByteStorage {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Byte at `offset`, if in bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    /// Bytes in `range`, if in bounds.
    #[inline]
    #[must_use]
    pub fn get_range(&self, range: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(range)
    }

    /// Offset of the first NUL byte at or after `from`.
    #[must_use]
    pub fn find_terminator(&self, from: usize) -> Option<usize> {
        find_nul(&self.bytes, from)
    }

    /// True when another clone still shares this buffer.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.bytes) > 1
    }

    /// Overwrite bytes starting at `offset`. Panics if out of bounds.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        self.make_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Replace `range` with `bytes`, shifting the tail as needed.
    pub fn splice(&mut self, range: Range<usize>, bytes: &[u8]) {
        self.make_mut().splice(range, bytes.iter().copied());
    }

    /// Consume the storage, cloning only if still shared.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        Arc::unwrap_or_clone(self.bytes)
    }

    fn make_mut(&mut self) -> &mut Vec<u8> {
        if self.is_shared() {
            tracing::trace!(len = self.bytes.len(), "privatizing shared document buffer");
        }
        Arc::make_mut(&mut self.bytes)
    }
}

impl std::fmt::Debug for ByteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStorage")
            .field("len", &self.bytes.len())
            .field("shared", &self.is_shared())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_terminator() {
        let storage = ByteStorage::new(b"ab\0cd\0".to_vec());
        assert_eq!(storage.find_terminator(0), Some(2));
        assert_eq!(storage.find_terminator(2), Some(2));
        assert_eq!(storage.find_terminator(3), Some(5));
        assert_eq!(storage.find_terminator(6), None);
        assert_eq!(storage.find_terminator(10), None);
    }

    #[test]
    fn test_clone_on_write() {
        let original = ByteStorage::new(vec![1, 2, 3]);
        let mut copy = original.clone();
        assert!(original.is_shared());

        copy.write(0, &[9]);
        assert_eq!(original.as_slice(), &[1, 2, 3]);
        assert_eq!(copy.as_slice(), &[9, 2, 3]);
        assert!(!original.is_shared());
    }

    #[test]
    fn test_splice() {
        let mut storage = ByteStorage::new(vec![1, 2, 3, 4]);
        storage.splice(1..3, &[7, 7, 7]);
        assert_eq!(storage.as_slice(), &[1, 7, 7, 7, 4]);
        storage.splice(0..2, &[]);
        assert_eq!(storage.as_slice(), &[7, 7, 4]);
    }
}
