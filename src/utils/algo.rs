//! Character-level matchers.
//!
//! Every matcher shares one signature (see [`MatchFn`](crate::query::MatchFn)):
//! `(case_sensitive, forward, text, pattern)` and returns the matched span as
//! char indices into `text`, or `None`. When `case_sensitive` is false the
//! pattern is expected to be lowercased already; only the text is folded here.
//!
//! `forward` is a tie-break hint: when several spans qualify, forward
//! matchers prefer the leftmost one and backward matchers the rightmost.

#[inline]
fn index_at(index: usize, len: usize, forward: bool) -> usize {
    if forward { index } else { len - index - 1 }
}

#[inline]
fn fold(ch: char, case_sensitive: bool) -> char {
    if case_sensitive || (ch.is_ascii() && !ch.is_ascii_uppercase()) {
        ch
    } else if ch.is_ascii_uppercase() {
        ch.to_ascii_lowercase()
    } else {
        ch.to_lowercase().next().unwrap_or(ch)
    }
}

/// Lowercase `text` one char at a time, exactly as matchers fold candidates.
///
/// Unlike `str::to_lowercase` this never changes the char count, so a
/// folded pattern lines up with folded text.
pub fn fold_text(text: &str) -> String {
    text.chars().map(|ch| fold(ch, false)).collect()
}

#[inline]
fn matches_at(case_sensitive: bool, text: &[char], start: usize, pattern: &[char]) -> bool {
    pattern
        .iter()
        .enumerate()
        .all(|(i, &pchar)| fold(text[start + i], case_sensitive) == pchar)
}

/// Fuzzy subsequence match.
///
/// Scans once to find the first complete occurrence of the pattern as a
/// subsequence, then walks back from its end to shrink the span to the
/// shortest one ending at the same position.
pub fn fuzzy_match(
    case_sensitive: bool,
    forward: bool,
    text: &[char],
    pattern: &[char],
) -> Option<(usize, usize)> {
    if pattern.is_empty() {
        return Some((0, 0));
    }

    let len_text = text.len();
    let len_pattern = pattern.len();

    let mut pidx = 0;
    let mut sidx = None;
    let mut eidx = None;
    for index in 0..len_text {
        let ch = fold(text[index_at(index, len_text, forward)], case_sensitive);
        if ch == pattern[index_at(pidx, len_pattern, forward)] {
            if sidx.is_none() {
                sidx = Some(index);
            }
            pidx += 1;
            if pidx == len_pattern {
                eidx = Some(index + 1);
                break;
            }
        }
    }

    let mut sidx = sidx?;
    let eidx = eidx?;

    // Backtrack from the end of the match to tighten the start
    let mut pidx = len_pattern;
    for index in (sidx..eidx).rev() {
        let ch = fold(text[index_at(index, len_text, forward)], case_sensitive);
        if ch == pattern[index_at(pidx - 1, len_pattern, forward)] {
            pidx -= 1;
            if pidx == 0 {
                sidx = index;
                break;
            }
        }
    }

    if forward {
        Some((sidx, eidx))
    } else {
        Some((len_text - eidx, len_text - sidx))
    }
}

/// Literal substring match (naive scan).
pub fn exact_match_naive(
    case_sensitive: bool,
    forward: bool,
    text: &[char],
    pattern: &[char],
) -> Option<(usize, usize)> {
    if pattern.is_empty() {
        return Some((0, 0));
    }
    if text.len() < pattern.len() {
        return None;
    }

    let last_start = text.len() - pattern.len();
    let found = if forward {
        (0..=last_start).find(|&start| matches_at(case_sensitive, text, start, pattern))
    } else {
        (0..=last_start)
            .rev()
            .find(|&start| matches_at(case_sensitive, text, start, pattern))
    };

    found.map(|start| (start, start + pattern.len()))
}

/// Text must start with the pattern.
pub fn prefix_match(
    case_sensitive: bool,
    _forward: bool,
    text: &[char],
    pattern: &[char],
) -> Option<(usize, usize)> {
    if text.len() < pattern.len() || !matches_at(case_sensitive, text, 0, pattern) {
        return None;
    }
    Some((0, pattern.len()))
}

/// Text must end with the pattern, ignoring trailing whitespace.
pub fn suffix_match(
    case_sensitive: bool,
    _forward: bool,
    text: &[char],
    pattern: &[char],
) -> Option<(usize, usize)> {
    let trimmed_len = text.len()
        - text
            .iter()
            .rev()
            .take_while(|ch| ch.is_whitespace())
            .count();
    if trimmed_len < pattern.len() {
        return None;
    }

    let start = trimmed_len - pattern.len();
    if !matches_at(case_sensitive, text, start, pattern) {
        return None;
    }
    Some((start, trimmed_len))
}

/// Text must equal the pattern.
pub fn equal_match(
    case_sensitive: bool,
    _forward: bool,
    text: &[char],
    pattern: &[char],
) -> Option<(usize, usize)> {
    if text.len() != pattern.len() || !matches_at(case_sensitive, text, 0, pattern) {
        return None;
    }
    Some((0, pattern.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_fuzzy_match_forward() {
        let text = chars("fooBar");
        assert_eq!(fuzzy_match(false, true, &text, &chars("oba")), Some((2, 5)));
        assert_eq!(fuzzy_match(true, true, &text, &chars("oba")), None);
        assert_eq!(fuzzy_match(true, true, &text, &chars("oBa")), Some((2, 5)));
    }

    #[test]
    fn test_fuzzy_match_shortest_span() {
        // The first occurrence ends at the first 'c' and is already the
        // shortest span ending there.
        let text = chars("a_____b__c__abc");
        assert_eq!(fuzzy_match(false, true, &text, &chars("abc")), Some((0, 10)));

        let text = chars("axxaxbc");
        assert_eq!(fuzzy_match(false, true, &text, &chars("abc")), Some((3, 7)));
    }

    #[test]
    fn test_fuzzy_match_backward() {
        let text = chars("abc_abc");
        assert_eq!(fuzzy_match(false, true, &text, &chars("abc")), Some((0, 3)));
        assert_eq!(fuzzy_match(false, false, &text, &chars("abc")), Some((4, 7)));
    }

    #[test]
    fn test_fuzzy_match_missing() {
        assert_eq!(fuzzy_match(false, true, &chars("abc"), &chars("abd")), None);
        assert_eq!(fuzzy_match(false, true, &chars(""), &chars("a")), None);
        assert_eq!(fuzzy_match(false, true, &chars("abc"), &chars("")), Some((0, 0)));
    }

    #[test]
    fn test_exact_match_naive() {
        let text = chars("foo bar foo");
        assert_eq!(exact_match_naive(false, true, &text, &chars("foo")), Some((0, 3)));
        assert_eq!(exact_match_naive(false, false, &text, &chars("foo")), Some((8, 11)));
        assert_eq!(exact_match_naive(false, true, &text, &chars("fob")), None);
        assert_eq!(exact_match_naive(false, true, &chars("fo"), &chars("foo")), None);
    }

    #[test]
    fn test_exact_match_case_folding() {
        let text = chars("Hello WORLD");
        assert_eq!(exact_match_naive(false, true, &text, &chars("world")), Some((6, 11)));
        assert_eq!(exact_match_naive(true, true, &text, &chars("world")), None);
    }

    #[test]
    fn test_exact_match_unicode() {
        let text = chars("Straße ÄPFEL");
        assert_eq!(exact_match_naive(false, true, &text, &chars("äpfel")), Some((7, 12)));
    }

    #[test]
    fn test_prefix_match() {
        assert_eq!(prefix_match(false, true, &chars("foobar"), &chars("foo")), Some((0, 3)));
        assert_eq!(prefix_match(false, true, &chars("barfoo"), &chars("foo")), None);
        assert_eq!(prefix_match(false, true, &chars("fo"), &chars("foo")), None);
    }

    #[test]
    fn test_suffix_match() {
        assert_eq!(suffix_match(false, true, &chars("barfoo"), &chars("foo")), Some((3, 6)));
        assert_eq!(suffix_match(false, true, &chars("barfoo  "), &chars("foo")), Some((3, 6)));
        assert_eq!(suffix_match(false, true, &chars("foobar"), &chars("foo")), None);
        assert_eq!(suffix_match(false, true, &chars("oo"), &chars("foo")), None);
    }

    #[test]
    fn test_equal_match() {
        assert_eq!(equal_match(false, true, &chars("foo"), &chars("foo")), Some((0, 3)));
        assert_eq!(equal_match(false, true, &chars("FOO"), &chars("foo")), Some((0, 3)));
        assert_eq!(equal_match(true, true, &chars("FOO"), &chars("foo")), None);
        assert_eq!(equal_match(false, true, &chars("foobar"), &chars("foo")), None);
    }

    #[test]
    fn test_fold_text_keeps_char_count() {
        assert_eq!(fold_text("FooBar"), "foobar");
        assert_eq!(fold_text("İx"), "ix");
        assert_eq!("İx".to_lowercase().chars().count(), 3);
        assert_eq!(fold_text("ÀÉ"), "àé");
    }
}
