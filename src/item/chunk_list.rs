use crate::item::types::{Chunk, Item};
use std::sync::Arc;

/// Append-only list of candidates grouped into chunks.
///
/// All chunks but the last are full. [`ChunkList::snapshot`] hands out shared
/// chunks; appending to a partially filled chunk that is also held by a
/// snapshot copies it first, so snapshots never change under a scan.
#[derive(Debug, Default)]
pub struct ChunkList {
    chunks: Vec<Arc<Chunk>>,
    count: usize,
}

impl ChunkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, assigning it the next item index
    pub fn push(&mut self, text: impl Into<String>) {
        let item = Item::new(self.count as u32, text);
        self.count += 1;

        match self.chunks.last_mut() {
            Some(last) if !last.is_full() => Arc::make_mut(last).push(item),
            _ => {
                let mut chunk = Chunk::new();
                chunk.push(item);
                self.chunks.push(Arc::new(chunk));
            }
        }
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    /// Shared view of the current chunks
    pub fn snapshot(&self) -> Vec<Arc<Chunk>> {
        self.chunks.clone()
    }

    /// Drop every item (a reload); callers should also clear result caches
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.count = 0;
    }
}

impl<S: Into<String>> Extend<S> for ChunkList {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for text in iter {
            self.push(text);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ChunkList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = ChunkList::new();
        list.extend(iter);
        list
    }
}
