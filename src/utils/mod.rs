//! Utility functions shared by the matching pipeline.
//!
//! ## Modules
//!
//! - [`algo`] - Character matchers (fuzzy, exact, prefix, suffix, equal)
//! - [`tokenizer`] - Field splitting and `--nth` projection
//!
//! ## Key Functions
//!
//! ```no_run
//! use fzm::utils::{Delimiter, fuzzy_match, split_nth, tokenize, transform};
//!
//! let line = "src/main.rs:42:fn main()";
//! let chars: Vec<char> = line.chars().collect();
//!
//! // Keep only the third ':'-separated field
//! let tokens = tokenize(line, &chars, &Delimiter::parse(":"));
//! let fields = transform(&chars, &tokens, &split_nth("3").unwrap());
//!
//! // Match inside it; offsets are relative to the field
//! let pattern: Vec<char> = "fmn".chars().collect();
//! let span = fuzzy_match(false, true, fields[0].text(&chars), &pattern);
//! ```

pub mod algo;
pub mod tokenizer;

pub use algo::*;
pub use tokenizer::*;
