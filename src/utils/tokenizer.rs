use anyhow::{Context, Result, bail};
use memchr::memmem;
use regex::Regex;
use std::ops::Range;

/// One field of a candidate line.
///
/// `span` indexes into the candidate's chars. `prefix_length` is the number
/// of chars preceding the field in the original text, used to translate a
/// match inside the field back to line coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Range<usize>,
    pub prefix_length: usize,
    /// Length without leading/trailing blanks (tie-break input for ranking)
    pub trim_length: usize,
}

impl Token {
    /// Token covering the whole text
    pub fn whole(chars: &[char]) -> Self {
        Self {
            span: 0..chars.len(),
            prefix_length: 0,
            trim_length: trim_len(chars),
        }
    }

    #[inline]
    pub fn text<'a>(&self, chars: &'a [char]) -> &'a [char] {
        &chars[self.span.clone()]
    }
}

/// Field selection expression (`--nth`).
///
/// Indices are 1-based; negative values count from the last field.
/// `None` marks an open end, so `..` is `{ begin: None, end: None }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRange {
    pub begin: Option<i32>,
    pub end: Option<i32>,
}

impl FieldRange {
    pub fn single(index: i32) -> Self {
        Self {
            begin: Some(index),
            end: Some(index),
        }
    }
}

fn parse_index(text: &str, expr: &str) -> Result<i32> {
    let n: i32 = text
        .parse()
        .with_context(|| format!("invalid field index in range: {}", expr))?;
    if n == 0 {
        bail!("field indices start at 1: {}", expr);
    }
    Ok(n)
}

/// Parse a single range expression: `N`, `N..`, `..N`, `N..M` or `..`
pub fn parse_range(expr: &str) -> Result<FieldRange> {
    if expr == ".." {
        return Ok(FieldRange {
            begin: None,
            end: None,
        });
    }

    if let Some(end) = expr.strip_prefix("..") {
        return Ok(FieldRange {
            begin: None,
            end: Some(parse_index(end, expr)?),
        });
    }

    if let Some(begin) = expr.strip_suffix("..") {
        return Ok(FieldRange {
            begin: Some(parse_index(begin, expr)?),
            end: None,
        });
    }

    if let Some((begin, end)) = expr.split_once("..") {
        return Ok(FieldRange {
            begin: Some(parse_index(begin, expr)?),
            end: Some(parse_index(end, expr)?),
        });
    }

    Ok(FieldRange::single(parse_index(expr, expr)?))
}

/// Parse a comma-separated list of ranges (`1,3..,-1`)
pub fn split_nth(expr: &str) -> Result<Vec<FieldRange>> {
    expr.split(',').map(parse_range).collect()
}

/// How a line is split into fields.
#[derive(Debug, Clone, Default)]
pub enum Delimiter {
    /// AWK-style: fields are `\S+\s*`, leading blanks are skipped
    #[default]
    Awk,
    /// Fields end right after each occurrence of the string
    Literal(String),
    /// Fields end right after each match of the regex
    Regex(Regex),
}

impl Delimiter {
    /// Interpret a user-supplied delimiter.
    ///
    /// `\t` expands to a tab. Plain strings and strings that fail to compile
    /// as a regex are used literally.
    pub fn parse(expr: &str) -> Self {
        let expr = expr.replace("\\t", "\t");
        if regex::escape(&expr) == expr {
            return Delimiter::Literal(expr);
        }
        match Regex::new(&expr) {
            Ok(regex) => Delimiter::Regex(regex),
            Err(_) => Delimiter::Literal(expr),
        }
    }
}

impl PartialEq for Delimiter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Delimiter::Awk, Delimiter::Awk) => true,
            (Delimiter::Literal(a), Delimiter::Literal(b)) => a == b,
            (Delimiter::Regex(a), Delimiter::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Delimiter {}

/// Field selection applied to a line before matching.
///
/// Two equal projections always produce the same tokens for a line, which
/// is what lets items memoize the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Empty selects the whole line as one field
    pub nth: Vec<FieldRange>,
    pub delimiter: Delimiter,
}

impl Projection {
    pub fn new(nth: Vec<FieldRange>, delimiter: Delimiter) -> Self {
        Self { nth, delimiter }
    }

    /// Fields of a line, in range order
    pub fn apply(&self, text: &str, chars: &[char]) -> Vec<Token> {
        if self.nth.is_empty() {
            return vec![Token::whole(chars)];
        }
        let tokens = tokenize(text, chars, &self.delimiter);
        transform(chars, &tokens, &self.nth)
    }
}

#[inline]
fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Length of the text without leading and trailing blanks
pub fn trim_len(chars: &[char]) -> usize {
    let Some(last) = chars.iter().rposition(|&ch| !is_blank(ch)) else {
        return 0;
    };
    let first = chars.iter().position(|&ch| !is_blank(ch)).unwrap_or(0);
    last - first + 1
}

fn awk_spans(chars: &[char]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_blank = false;

    for (i, &ch) in chars.iter().enumerate() {
        let blank = is_blank(ch);
        match start {
            None if !blank => start = Some(i),
            None => {}
            Some(s) => {
                if blank {
                    in_blank = true;
                } else if in_blank {
                    spans.push(s..i);
                    start = Some(i);
                    in_blank = false;
                }
            }
        }
    }

    if let Some(s) = start {
        spans.push(s..chars.len());
    }
    spans
}

/// Convert byte boundaries in `text` to char boundaries
fn byte_ends_to_spans(text: &str, ends: impl Iterator<Item = usize>) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut prev_byte = 0;
    let mut prev_char = 0;
    for end in ends {
        let len = text[prev_byte..end].chars().count();
        spans.push(prev_char..prev_char + len);
        prev_byte = end;
        prev_char += len;
    }
    spans
}

fn literal_spans(text: &str, delimiter: &str) -> Vec<Range<usize>> {
    if delimiter.is_empty() {
        return byte_ends_to_spans(text, std::iter::once(text.len()));
    }
    let ends = memmem::find_iter(text.as_bytes(), delimiter.as_bytes())
        .map(|pos| pos + delimiter.len())
        .chain(std::iter::once(text.len()));
    byte_ends_to_spans(text, ends)
}

fn regex_spans(text: &str, regex: &Regex) -> Vec<Range<usize>> {
    let mut ends = Vec::new();
    let mut offset = 0;
    while offset < text.len() {
        let rest = &text[offset..];
        let mut end = regex.find(rest).map_or(rest.len(), |m| m.end());
        if end == 0 {
            // Empty match at the start: consume one char so we make progress
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        offset += end;
        ends.push(offset);
    }
    byte_ends_to_spans(text, ends.into_iter())
}

/// Split a line into fields.
///
/// Literal and regex delimiters keep the delimiter at the end of each field,
/// so concatenating the fields reproduces the line.
pub fn tokenize(text: &str, chars: &[char], delimiter: &Delimiter) -> Vec<Token> {
    let spans = match delimiter {
        Delimiter::Awk => awk_spans(chars),
        Delimiter::Literal(delim) => literal_spans(text, delim),
        Delimiter::Regex(regex) => regex_spans(text, regex),
    };

    spans
        .into_iter()
        .map(|span| Token {
            prefix_length: span.start,
            trim_length: trim_len(&chars[span.clone()]),
            span,
        })
        .collect()
}

/// Resolve a possibly negative 1-based index against `count` fields
#[inline]
fn resolve(index: i32, count: i32) -> i32 {
    if index < 0 { index + count + 1 } else { index }
}

/// Project the fields selected by `nth`, one token per range, in range order.
///
/// A range covering several fields yields a single token spanning all of
/// them. Out-of-range selections yield empty tokens.
pub fn transform(chars: &[char], tokens: &[Token], nth: &[FieldRange]) -> Vec<Token> {
    let count = tokens.len() as i32;

    nth.iter()
        .map(|range| {
            let (begin, end) = match (range.begin, range.end) {
                (None, None) => (1, count),
                (None, Some(end)) => (1, resolve(end, count)),
                (Some(begin), None) => (resolve(begin, count), count),
                (Some(begin), Some(end)) => (resolve(begin, count), resolve(end, count)),
            };

            let selected = begin.max(1)..=end.min(count);
            let min_idx = (begin - 1).max(0) as usize;
            let prefix_length = tokens.get(min_idx).map_or(0, |t| t.prefix_length);

            let span = if selected.is_empty() {
                prefix_length..prefix_length
            } else {
                let first = &tokens[(*selected.start() - 1) as usize];
                let last = &tokens[(*selected.end() - 1) as usize];
                first.span.start..last.span.end
            };

            Token {
                trim_length: trim_len(&chars[span.clone()]),
                prefix_length,
                span,
            }
        })
        .collect()
}
