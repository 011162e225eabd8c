//! Evaluation of a [`Pattern`] against items.
//!
//! Offsets returned by matchers are relative to the projected field and are
//! shifted by the field's prefix length back into line coordinates.

use crate::item::{Item, Offset};
use crate::query::pattern::{MatchFn, Pattern};
use crate::utils::tokenizer::Token;
use std::sync::Arc;

impl Pattern {
    /// Membership test for a single item
    pub fn match_item(&self, item: &Item) -> bool {
        if !self.extended {
            return self.basic_match(item).is_some();
        }
        self.extended_match(item).len() == self.term_sets.len()
    }

    /// Matching items of a batch, in input order, each carrying its offsets
    pub fn match_items(&self, items: &[Item]) -> Vec<Item> {
        if !self.extended {
            return items
                .iter()
                .filter_map(|item| {
                    self.basic_match(item)
                        .map(|offset| item.with_offsets(vec![offset]))
                })
                .collect();
        }

        items
            .iter()
            .filter_map(|item| {
                let offsets = self.extended_match(item);
                (offsets.len() == self.term_sets.len()).then(|| item.with_offsets(offsets))
            })
            .collect()
    }

    fn basic_match(&self, item: &Item) -> Option<Offset> {
        let input = self.prepare_input(item);
        let matcher = if self.fuzzy {
            self.matchers.fuzzy
        } else {
            self.matchers.exact
        };
        self.iter(matcher, item.chars(), &input, self.case_sensitive, &self.text)
    }

    /// Offsets of the satisfied groups.
    ///
    /// Stops at the first hit of an inverted term, so a failed item yields
    /// fewer offsets than there are groups.
    fn extended_match(&self, item: &Item) -> Vec<Offset> {
        let input = self.prepare_input(item);
        let chars = item.chars();
        let mut offsets = Vec::with_capacity(self.term_sets.len());

        for term_set in &self.term_sets {
            for term in term_set {
                let matcher = self.matchers.get(term.kind);
                match self.iter(matcher, chars, &input, term.case_sensitive, &term.text) {
                    Some(_) if term.inverted => return offsets,
                    Some(offset) => {
                        offsets.push(offset);
                        break;
                    }
                    None if term.inverted => {
                        offsets.push(Offset::default());
                        break;
                    }
                    None => {}
                }
            }
        }
        offsets
    }

    fn prepare_input(&self, item: &Item) -> Arc<[Token]> {
        item.fields(&self.projection)
    }

    /// First field in which `pattern` matches
    fn iter(
        &self,
        matcher: MatchFn,
        chars: &[char],
        tokens: &[Token],
        case_sensitive: bool,
        pattern: &[char],
    ) -> Option<Offset> {
        tokens.iter().find_map(|token| {
            matcher(case_sensitive, self.forward, token.text(chars), pattern).map(|(sidx, eidx)| {
                Offset::new(
                    sidx + token.prefix_length,
                    eidx + token.prefix_length,
                    token.trim_length,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::item::{Item, Offset};
    use crate::query::parser::CaseMode;
    use crate::query::pattern::{MatchOptions, Pattern};
    use crate::utils::tokenizer::{Delimiter, split_nth};

    fn extended(query: &str) -> Pattern {
        Pattern::new(&MatchOptions::default(), query)
    }

    fn offsets(pattern: &Pattern, text: &str) -> Option<Vec<(u32, u32)>> {
        let matched = pattern.match_items(&[Item::new(0, text)]);
        matched
            .first()
            .map(|item| item.offsets().iter().map(|o| (o.start, o.end)).collect())
    }

    #[test]
    fn test_basic_fuzzy() {
        let options = MatchOptions {
            extended: false,
            ..MatchOptions::default()
        };
        let pattern = Pattern::new(&options, "fb");
        assert_eq!(offsets(&pattern, "foo bar"), Some(vec![(0, 5)]));
        assert_eq!(offsets(&pattern, "bar foo"), None);
    }

    #[test]
    fn test_basic_exact_keeps_spaces() {
        let options = MatchOptions {
            extended: false,
            fuzzy: false,
            ..MatchOptions::default()
        };
        let pattern = Pattern::new(&options, "o b");
        assert_eq!(offsets(&pattern, "foo bar"), Some(vec![(2, 5)]));
        assert_eq!(offsets(&pattern, "foobar"), None);
    }

    #[test]
    fn test_basic_case_respect() {
        let options = MatchOptions {
            extended: false,
            case: CaseMode::Respect,
            ..MatchOptions::default()
        };
        let pattern = Pattern::new(&options, "foo");
        assert!(!pattern.match_item(&Item::new(0, "FOO")));
        assert!(pattern.match_item(&Item::new(0, "foo")));
    }

    #[test]
    fn test_inversion() {
        let pattern = extended("!foo");
        assert_eq!(offsets(&pattern, "foobar"), None);
        assert_eq!(offsets(&pattern, "bar"), Some(vec![(0, 0)]));
        assert!(!pattern.match_item(&Item::new(0, "foobar")));
        assert!(pattern.match_item(&Item::new(0, "bar")));
    }

    #[test]
    fn test_inverted_hit_short_circuits() {
        let pattern = extended("bar !foo baz");
        assert!(!pattern.match_item(&Item::new(0, "bar foo baz")));
        assert!(pattern.match_item(&Item::new(0, "bar baz")));
    }

    #[test]
    fn test_anchors() {
        let pattern = extended("^foo");
        assert_eq!(offsets(&pattern, "foobar"), Some(vec![(0, 3)]));
        assert_eq!(offsets(&pattern, "barfoo"), None);

        let pattern = extended("foo$");
        assert_eq!(offsets(&pattern, "barfoo"), Some(vec![(3, 6)]));
        assert_eq!(offsets(&pattern, "foobar"), None);

        let pattern = extended("^foo$");
        assert_eq!(offsets(&pattern, "foo"), Some(vec![(0, 3)]));
        assert_eq!(offsets(&pattern, "foobar"), None);
        assert_eq!(offsets(&pattern, "barfoo"), None);
    }

    #[test]
    fn test_or_and_combination() {
        let pattern = extended("foo | bar baz");
        assert!(pattern.match_item(&Item::new(0, "foo baz")));
        assert!(pattern.match_item(&Item::new(0, "bar baz")));
        assert!(!pattern.match_item(&Item::new(0, "foo bar")));
        assert!(!pattern.match_item(&Item::new(0, "baz")));
    }

    #[test]
    fn test_or_first_alternative_wins() {
        let pattern = extended("'oo | 'ar");
        assert_eq!(offsets(&pattern, "foo bar"), Some(vec![(1, 3)]));
    }

    #[test]
    fn test_or_with_inverted_alternative() {
        // An inverted alternative that does not hit satisfies the group
        let pattern = extended("foo | !bar");
        assert!(pattern.match_item(&Item::new(0, "qux")));
        assert!(pattern.match_item(&Item::new(0, "foo")));
        assert!(!pattern.match_item(&Item::new(0, "bar")));
    }

    #[test]
    fn test_offsets_sorted() {
        let pattern = extended("'bar 'foo");
        assert_eq!(offsets(&pattern, "foo bar"), Some(vec![(0, 3), (4, 7)]));
    }

    #[test]
    fn test_smart_case_terms() {
        let pattern = extended("Foo");
        assert!(!pattern.match_item(&Item::new(0, "foo")));
        assert!(pattern.match_item(&Item::new(0, "Foo")));

        let pattern = extended("foo");
        assert!(pattern.match_item(&Item::new(0, "FOO")));
    }

    #[test]
    fn test_nth_field_offsets() {
        let options = MatchOptions {
            nth: split_nth("2").unwrap(),
            delimiter: Delimiter::parse(":"),
            ..MatchOptions::default()
        };
        let pattern = Pattern::new(&options, "'foo");
        let matched = pattern.match_items(&[
            Item::new(0, "foo:xfoo:z"),
            Item::new(1, "foo:bar:z"),
        ]);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].index(), 0);
        assert_eq!(matched[0].offsets(), &[Offset::new(5, 8, 5)]);
    }

    #[test]
    fn test_nth_first_matching_field() {
        let options = MatchOptions {
            nth: split_nth("3,1").unwrap(),
            ..MatchOptions::default()
        };
        let pattern = Pattern::new(&options, "^b");
        let matched = pattern.match_items(&[Item::new(0, "bx ay bz")]);
        // Field 3 is tried first
        assert_eq!(matched[0].offsets()[0].start, 6);
    }

    #[test]
    fn test_match_items_preserves_order() {
        let items: Vec<Item> = ["abc", "xyz", "aXc", "a c"]
            .iter()
            .enumerate()
            .map(|(i, text)| Item::new(i as u32, *text))
            .collect();
        let matched = extended("ac").match_items(&items);
        let indices: Vec<u32> = matched.iter().map(Item::index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert!(matched.iter().all(|m| m.rank.is_none()));
    }

    #[test]
    fn test_backward_direction() {
        let options = MatchOptions {
            forward: false,
            ..MatchOptions::default()
        };
        let pattern = Pattern::new(&options, "'ab");
        assert_eq!(offsets(&pattern, "ab ab"), Some(vec![(3, 5)]));
    }

    #[test]
    fn test_ignore_case_multichar_lowercase() {
        // 'İ' lowercases to two chars; terms must fold like candidates do
        let options = MatchOptions {
            case: CaseMode::Ignore,
            ..MatchOptions::default()
        };
        for query in ["İstanbul", "'İstanbul", "^İst", "bul$"] {
            let pattern = Pattern::new(&options, query);
            assert!(pattern.match_item(&Item::new(0, "İstanbul")), "{}", query);
        }
        assert!(Pattern::new(&options, "İst").match_item(&Item::new(0, "istanbul")));

        let basic = Pattern::new(
            &MatchOptions {
                extended: false,
                ..options
            },
            "İstanbul",
        );
        assert!(basic.match_item(&Item::new(0, "İSTANBUL")));
    }
}
