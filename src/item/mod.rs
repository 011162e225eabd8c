//! Candidate storage: items, chunks and the append-only chunk list.

pub mod chunk_list;
pub mod types;

pub use chunk_list::ChunkList;
pub use types::{CHUNK_SIZE, Chunk, ChunkId, Item, Offset, Rank};
