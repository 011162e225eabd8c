//! Extended query grammar.
//!
//! | Token      | Meaning                                  |
//! |------------|------------------------------------------|
//! | `text`     | default kind (fuzzy, or exact with `-e`) |
//! | `'text`    | flips the default kind                   |
//! | `^text`    | prefix match                             |
//! | `text$`    | suffix match                             |
//! | `^text$`   | whole-field equality                     |
//! | `!text`    | inverted: must not match                 |
//! | `a \| b`   | either term satisfies the group          |
//!
//! Whitespace-separated groups are ANDed together. Tokens left empty after
//! stripping their modifiers are dropped.

use crate::utils::algo::fold_text;

/// How case sensitivity is decided for a query or term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    /// Always case-sensitive
    Respect,
    /// Always case-insensitive
    Ignore,
    /// Case-sensitive only if the text contains an uppercase char
    #[default]
    Smart,
}

impl CaseMode {
    pub fn is_case_sensitive(self, text: &str) -> bool {
        match self {
            CaseMode::Respect => true,
            CaseMode::Ignore => false,
            CaseMode::Smart => text.chars().any(char::is_uppercase),
        }
    }
}

/// Kind of comparison a term performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Fuzzy,
    Exact,
    Prefix,
    Suffix,
    Equal,
}

/// One atomic match instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub kind: MatchKind,
    pub inverted: bool,
    pub case_sensitive: bool,
    /// Text to match, lowercased when case-insensitive, modifiers stripped
    pub text: Vec<char>,
    /// Token as typed, used to build result cache keys
    pub orig_text: String,
}

/// Alternatives of which the first satisfied one wins (logical OR)
pub type TermSet = Vec<Term>;

/// Parse an extended query into AND-ed groups of OR-ed terms.
///
/// `a | b c` yields `[[a, b], [c]]`.
pub fn parse_terms(fuzzy: bool, case: CaseMode, query: &str) -> Vec<TermSet> {
    let default_kind = if fuzzy { MatchKind::Fuzzy } else { MatchKind::Exact };
    let flipped_kind = if fuzzy { MatchKind::Exact } else { MatchKind::Fuzzy };

    let mut sets = Vec::new();
    let mut set = TermSet::new();
    // Set after a term; a following `|` clears it so the next term joins
    let mut switch_set = false;

    for token in query.split_whitespace() {
        if token == "|" {
            switch_set = false;
            continue;
        }

        let case_sensitive = case.is_case_sensitive(token);
        let folded;
        let mut text = if case_sensitive {
            token
        } else {
            folded = fold_text(token);
            folded.as_str()
        };

        let mut inverted = false;
        if let Some(rest) = text.strip_prefix('!') {
            inverted = true;
            text = rest;
        }

        let mut kind = default_kind;
        if let Some(rest) = text.strip_prefix('\'') {
            kind = flipped_kind;
            text = rest;
        } else if let Some(rest) = text.strip_prefix('^') {
            if let Some(inner) = rest.strip_suffix('$') {
                kind = MatchKind::Equal;
                text = inner;
            } else {
                kind = MatchKind::Prefix;
                text = rest;
            }
        } else if let Some(rest) = text.strip_suffix('$') {
            kind = MatchKind::Suffix;
            text = rest;
        }

        if text.is_empty() {
            continue;
        }

        if switch_set {
            sets.push(std::mem::take(&mut set));
        }
        set.push(Term {
            kind,
            inverted,
            case_sensitive,
            text: text.chars().collect(),
            orig_text: token.to_string(),
        });
        switch_set = true;
    }

    if !set.is_empty() {
        sets.push(set);
    }
    sets
}
