use crate::utils::tokenizer::{Projection, Token};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Number of items in a full chunk
pub const CHUNK_SIZE: usize = 100;

/// Process-unique chunk identifier, the result cache's chunk key
pub type ChunkId = u64;

static NEXT_CHUNK_ID: AtomicU64 = AtomicU64::new(0);

/// A matched span in char coordinates of the original line.
///
/// Inverted terms that are satisfied contribute a zero-length placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Offset {
    pub start: u32,
    pub end: u32,
    /// Trimmed length of the field the match was found in
    pub trim_length: u32,
}

impl Offset {
    /// Positions past `u32::MAX` saturate
    pub fn new(start: usize, end: usize, trim_length: usize) -> Self {
        let clamp = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        Self {
            start: clamp(start),
            end: clamp(end),
            trim_length: clamp(trim_length),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.start == self.end
    }
}

/// Ranking slot, left unset by matching and filled by whoever sorts results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Rank {
    pub score: u32,
    pub index: u32,
}

#[derive(Debug)]
struct ItemData {
    text: String,
    chars: Box<[char]>,
    index: u32,
    /// Projected fields, reused while patterns keep the same projection
    fields: Mutex<Option<FieldMemo>>,
}

#[derive(Debug)]
struct FieldMemo {
    projection: Arc<Projection>,
    tokens: Arc<[Token]>,
}

/// One candidate line.
///
/// Cloning is cheap: the text and the field memo are shared, only the
/// offsets belong to the clone. Matched items are clones of the input item
/// carrying fresh offsets.
#[derive(Debug, Clone)]
pub struct Item {
    data: Arc<ItemData>,
    offsets: Vec<Offset>,
    pub rank: Option<Rank>,
}

impl Item {
    pub fn new(index: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self {
            data: Arc::new(ItemData {
                text,
                chars,
                index,
                fields: Mutex::new(None),
            }),
            offsets: Vec::new(),
            rank: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.data.text
    }

    pub fn chars(&self) -> &[char] {
        &self.data.chars
    }

    /// Stable position of the item in the input
    pub fn index(&self) -> u32 {
        self.data.index
    }

    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// True if both items are views of the same candidate line
    pub fn same_candidate(&self, other: &Item) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Fields of the item under `projection`.
    ///
    /// The last projection's tokens are kept; a different projection
    /// recomputes and replaces them. The memo is shared by every copy of
    /// the item and guarded by its own lock.
    pub(crate) fn fields(&self, projection: &Arc<Projection>) -> Arc<[Token]> {
        let mut memo = self
            .data
            .fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = memo.as_ref()
            && (Arc::ptr_eq(&cached.projection, projection) || *cached.projection == **projection)
        {
            return Arc::clone(&cached.tokens);
        }

        let tokens: Arc<[Token]> = projection.apply(&self.data.text, &self.data.chars).into();
        *memo = Some(FieldMemo {
            projection: Arc::clone(projection),
            tokens: Arc::clone(&tokens),
        });
        tokens
    }

    /// Copy sharing the candidate, with `offsets` sorted by position
    pub(crate) fn with_offsets(&self, mut offsets: Vec<Offset>) -> Item {
        offsets.sort_unstable();
        Item {
            data: Arc::clone(&self.data),
            offsets,
            rank: None,
        }
    }
}

/// A batch of items, the unit of parallel scanning and of result caching.
///
/// Cloning keeps the id: a clone is the same chunk as far as the cache is
/// concerned. Only full chunks are ever cached, and a full chunk never
/// changes.
#[derive(Debug, Clone)]
pub struct Chunk {
    id: ChunkId,
    items: Vec<Item>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::from_items(Vec::with_capacity(CHUNK_SIZE))
    }

    /// Wrap existing items; callers keep the batch at or below [`CHUNK_SIZE`]
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            id: NEXT_CHUNK_ID.fetch_add(1, Ordering::Relaxed),
            items,
        }
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= CHUNK_SIZE
    }

    pub(crate) fn push(&mut self, item: Item) {
        self.items.push(item);
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}
