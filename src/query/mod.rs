pub mod matcher;
pub mod parser;
pub mod pattern;

pub use parser::{CaseMode, MatchKind, Term, TermSet, parse_terms};
pub use pattern::{MatchFn, MatchOptions, Matchers, Pattern};
