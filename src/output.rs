//! Output formatting for matched items

use crate::item::{Item, Offset};
use serde::Serialize;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// JSON line emitted per match
#[derive(Debug, Serialize)]
pub struct MatchRecord<'a> {
    pub index: u32,
    pub text: &'a str,
    pub offsets: &'a [Offset],
}

impl<'a> From<&'a Item> for MatchRecord<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            index: item.index(),
            text: item.text(),
            offsets: item.offsets(),
        }
    }
}

/// Char positions covered by at least one non-empty offset
fn highlight_mask(len: usize, offsets: &[Offset]) -> Vec<bool> {
    let mut mask = vec![false; len];
    for offset in offsets.iter().filter(|o| !o.is_placeholder()) {
        let start = (offset.start as usize).min(len);
        let end = (offset.end as usize).min(len);
        mask[start..end.max(start)].iter_mut().for_each(|m| *m = true);
    }
    mask
}

/// Write one item with its matched spans highlighted
pub fn write_item<W: WriteColor>(out: &mut W, item: &Item) -> io::Result<()> {
    let chars = item.chars();
    let mask = highlight_mask(chars.len(), item.offsets());

    let mut start = 0;
    while start < chars.len() {
        let highlighted = mask[start];
        let end = mask[start..]
            .iter()
            .position(|&m| m != highlighted)
            .map_or(chars.len(), |n| start + n);
        let segment: String = chars[start..end].iter().collect();

        if highlighted {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
            write!(out, "{}", segment)?;
            out.reset()?;
        } else {
            write!(out, "{}", segment)?;
        }
        start = end;
    }

    writeln!(out)
}

/// Print matches, one per line
pub fn print_matches(items: &[Item], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    for item in items {
        write_item(&mut stdout, item)?;
    }
    stdout.flush()
}

/// Print matches as JSON lines
pub fn print_json(items: &[Item]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for item in items {
        serde_json::to_writer(&mut out, &MatchRecord::from(item))?;
        writeln!(out)?;
    }
    out.flush()
}
