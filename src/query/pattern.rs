use crate::query::parser::{CaseMode, MatchKind, TermSet, parse_terms};
use crate::utils::algo;
use crate::utils::tokenizer::{Delimiter, FieldRange, Projection};
use std::fmt;
use std::sync::Arc;

/// Matcher contract: `(case_sensitive, forward, text, pattern)` to the
/// matched char span within `text`
pub type MatchFn = fn(bool, bool, &[char], &[char]) -> Option<(usize, usize)>;

/// One matcher per [`MatchKind`]
#[derive(Clone, Copy)]
pub struct Matchers {
    pub fuzzy: MatchFn,
    pub exact: MatchFn,
    pub prefix: MatchFn,
    pub suffix: MatchFn,
    pub equal: MatchFn,
}

impl Matchers {
    #[inline]
    pub fn get(&self, kind: MatchKind) -> MatchFn {
        match kind {
            MatchKind::Fuzzy => self.fuzzy,
            MatchKind::Exact => self.exact,
            MatchKind::Prefix => self.prefix,
            MatchKind::Suffix => self.suffix,
            MatchKind::Equal => self.equal,
        }
    }
}

impl Default for Matchers {
    fn default() -> Self {
        Self {
            fuzzy: algo::fuzzy_match,
            exact: algo::exact_match_naive,
            prefix: algo::prefix_match,
            suffix: algo::suffix_match,
            equal: algo::equal_match,
        }
    }
}

impl fmt::Debug for Matchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matchers").finish_non_exhaustive()
    }
}

/// Search mode settings shared by every pattern of a session
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Default term kind is fuzzy (otherwise exact)
    pub fuzzy: bool,
    /// Parse the extended grammar (otherwise the query is one literal term)
    pub extended: bool,
    pub case: CaseMode,
    /// Tie-break direction passed to matchers
    pub forward: bool,
    /// Field selection; empty matches against the whole line
    pub nth: Vec<FieldRange>,
    pub delimiter: Delimiter,
    pub matchers: Matchers,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            fuzzy: true,
            extended: true,
            case: CaseMode::Smart,
            forward: true,
            nth: Vec::new(),
            delimiter: Delimiter::Awk,
            matchers: Matchers::default(),
        }
    }
}

/// Compiled query.
///
/// Build through [`Session::build_pattern`](crate::session::Session::build_pattern)
/// to share one instance per query text.
#[derive(Debug)]
pub struct Pattern {
    pub(crate) fuzzy: bool,
    pub(crate) extended: bool,
    pub(crate) case_sensitive: bool,
    pub(crate) forward: bool,
    /// Normalized query (lowercased in basic mode when case-insensitive)
    pub(crate) query: String,
    pub(crate) text: Vec<char>,
    pub(crate) term_sets: Vec<TermSet>,
    pub(crate) cacheable: bool,
    pub(crate) projection: Arc<Projection>,
    pub(crate) matchers: Matchers,
}

impl Pattern {
    /// Memo key for a raw query: extended queries ignore surrounding whitespace
    pub fn normalize(extended: bool, query: &str) -> &str {
        if extended { query.trim() } else { query }
    }

    /// Compile a query without memoization
    pub fn new(options: &MatchOptions, query: &str) -> Self {
        let mut query = Self::normalize(options.extended, query).to_string();
        let mut case_sensitive = true;
        let mut cacheable = true;
        let mut term_sets = Vec::new();

        if options.extended {
            term_sets = parse_terms(options.fuzzy, options.case, &query);
            // OR groups and negations do not narrow monotonically
            cacheable = term_sets
                .iter()
                .all(|set| set.len() == 1 && !set[0].inverted);
        } else {
            case_sensitive = options.case.is_case_sensitive(&query);
            if !case_sensitive {
                query = algo::fold_text(&query);
            }
        }

        Self {
            fuzzy: options.fuzzy,
            extended: options.extended,
            case_sensitive,
            forward: options.forward,
            text: query.chars().collect(),
            query,
            term_sets,
            cacheable,
            projection: Arc::new(Projection::new(
                options.nth.clone(),
                options.delimiter.clone(),
            )),
            matchers: options.matchers,
        }
    }

    /// True if the pattern selects every item
    pub fn is_empty(&self) -> bool {
        if self.extended {
            self.term_sets.is_empty()
        } else {
            self.text.is_empty()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    /// Case sensitivity of a basic-mode pattern; extended terms carry their own
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn term_sets(&self) -> &[TermSet] {
        &self.term_sets
    }

    /// Whether results may be reused from the cached results of a shorter query
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    /// Result cache key.
    ///
    /// Basic mode uses the query itself. Extended mode joins the typed text
    /// of the singleton, non-inverted groups.
    pub fn cache_key(&self) -> String {
        if !self.extended {
            return self.query.clone();
        }
        self.term_sets
            .iter()
            .filter(|set| set.len() == 1 && !set[0].inverted)
            .map(|set| set[0].orig_text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extended(query: &str) -> Pattern {
        Pattern::new(&MatchOptions::default(), query)
    }

    fn basic(case: CaseMode, query: &str) -> Pattern {
        let options = MatchOptions {
            extended: false,
            case,
            ..MatchOptions::default()
        };
        Pattern::new(&options, query)
    }

    #[test]
    fn test_cacheable() {
        assert!(extended("foo").is_cacheable());
        assert!(extended("foo ^bar baz$ 'qux").is_cacheable());
        assert!(!extended("foo | bar").is_cacheable());
        assert!(!extended("foo !bar").is_cacheable());
        assert!(!extended("!foo").is_cacheable());
        assert!(extended("").is_cacheable());
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(extended("  ^foo   bar$ ").cache_key(), "^foo bar$");
        assert_eq!(extended("Foo").cache_key(), "Foo");
        // Non-singleton and inverted groups are left out
        assert_eq!(extended("a | b c !d e").cache_key(), "c e");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(Pattern::normalize(true, "  foo  "), "foo");
        assert_eq!(Pattern::normalize(false, "  foo  "), "  foo  ");
    }

    #[test]
    fn test_basic_mode() {
        let pattern = basic(CaseMode::Smart, "Foo Bar");
        assert!(pattern.is_case_sensitive());
        assert!(pattern.term_sets().is_empty());
        assert_eq!(pattern.as_str(), "Foo Bar");
        assert_eq!(pattern.cache_key(), "Foo Bar");

        let pattern = basic(CaseMode::Smart, "foo bar");
        assert!(!pattern.is_case_sensitive());

        let pattern = basic(CaseMode::Ignore, "FOO ");
        assert!(!pattern.is_case_sensitive());
        assert_eq!(pattern.as_str(), "foo ");
        assert!(pattern.is_cacheable());

        // Folded char by char, like candidate text
        let pattern = basic(CaseMode::Ignore, "İSTANBUL");
        assert_eq!(pattern.as_str(), "istanbul");
    }

    #[test]
    fn test_is_empty() {
        assert!(extended("").is_empty());
        assert!(extended("  !  ^ ").is_empty());
        assert!(!extended("a").is_empty());
        assert!(basic(CaseMode::Smart, "").is_empty());
        assert!(!basic(CaseMode::Smart, " ").is_empty());
    }

    #[test]
    fn test_matchers_dispatch() {
        let matchers = Matchers::default();
        let text: Vec<char> = "foobar".chars().collect();
        let pattern: Vec<char> = "bar".chars().collect();
        assert_eq!((matchers.get(MatchKind::Suffix))(false, true, &text, &pattern), Some((3, 6)));
        assert_eq!((matchers.get(MatchKind::Prefix))(false, true, &text, &pattern), None);
        assert_eq!((matchers.get(MatchKind::Exact))(false, true, &text, &pattern), Some((3, 6)));
    }
}
