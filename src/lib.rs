//! # FZM - Fuzzy-Finder Matching Core
//!
//! FZM decides which candidate lines match an incrementally typed query,
//! where they match, and caches per-chunk results so every keystroke
//! re-filters a narrowed set instead of rescanning everything.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`query`] - Extended query grammar, compiled patterns, evaluation
//! - [`item`] - Candidate items, fixed-size chunks, the chunk list
//! - [`cache`] - Pattern memo table and chunk result cache
//! - [`session`] - Options plus caches, cached and parallel chunk matching
//! - [`output`] - Result formatting (highlighted or JSON lines)
//! - [`utils`] - Character matchers and field tokenization
//!
//! ## Quick Start
//!
//! ```no_run
//! use fzm::item::ChunkList;
//! use fzm::query::MatchOptions;
//! use fzm::session::Session;
//!
//! let list: ChunkList = ["src/main.rs", "src/lib.rs", "README.md"].into_iter().collect();
//! let session = Session::new(MatchOptions::default());
//!
//! // Each keystroke builds (or reuses) a pattern and rescans
//! for query in ["s", "sr", "src", "src rs$"] {
//!     let pattern = session.build_pattern(query);
//!     let matches = session.scan(&pattern, list.chunks());
//!     println!("{}: {} matches", query, matches.len());
//! }
//! ```
//!
//! ## Query Syntax
//!
//! `foo` fuzzy, `'foo` exact, `^foo` prefix, `foo$` suffix, `^foo$` equal,
//! `!foo` inverted, `a | b` either. Space-separated groups must all match.

pub mod cache;
pub mod item;
pub mod output;
pub mod query;
pub mod session;
pub mod utils;

pub use item::{Chunk, ChunkList, Item, Offset};
pub use query::{CaseMode, MatchOptions, Pattern};
pub use session::Session;
