use anyhow::{Context, Result};
use clap::Parser;
use fzm::item::{ChunkList, Item};
use fzm::output;
use fzm::query::{CaseMode, MatchOptions};
use fzm::session::Session;
use fzm::utils::{Delimiter, split_nth};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fzm")]
#[command(about = "Filter lines with an fzf-style query")]
struct Cli {
    /// Search query (terms are joined with spaces)
    query: Vec<String>,

    /// Read candidates from a file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Terms match exactly by default ('term flips back to fuzzy)
    #[arg(short, long)]
    exact: bool,

    /// Treat the whole query as one term, without the extended grammar
    #[arg(long)]
    basic: bool,

    /// Case-insensitive matching
    #[arg(short = 'i', long, conflicts_with = "case_sensitive")]
    ignore_case: bool,

    /// Case-sensitive matching (default: smart case)
    #[arg(long)]
    case_sensitive: bool,

    /// Limit matching to fields (e.g. 1,3..,-1)
    #[arg(short, long)]
    nth: Option<String>,

    /// Field delimiter, literal or regex (default: AWK-style whitespace)
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Prefer matches closer to the end of the line
    #[arg(long)]
    backward: bool,

    /// Re-run the query once per typed prefix, like an interactive session
    #[arg(long)]
    keystrokes: bool,

    /// Emit JSON lines with match offsets
    #[arg(long)]
    json: bool,

    /// Disable highlighting
    #[arg(long)]
    no_color: bool,

    /// Number of worker threads (default: one per core)
    #[arg(long)]
    threads: Option<usize>,
}

impl Cli {
    fn match_options(&self) -> Result<MatchOptions> {
        let case = if self.ignore_case {
            CaseMode::Ignore
        } else if self.case_sensitive {
            CaseMode::Respect
        } else {
            CaseMode::Smart
        };

        let nth = match &self.nth {
            Some(expr) => split_nth(expr).with_context(|| format!("invalid --nth: {}", expr))?,
            None => Vec::new(),
        };

        Ok(MatchOptions {
            fuzzy: !self.exact,
            extended: !self.basic,
            case,
            forward: !self.backward,
            nth,
            delimiter: self.delimiter.as_deref().map(Delimiter::parse).unwrap_or_default(),
            ..MatchOptions::default()
        })
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Read candidate lines, replacing invalid UTF-8
fn read_candidates(input: Option<&Path>) -> Result<ChunkList> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut list = ChunkList::new();
    for line in reader.split(b'\n') {
        let mut line = line.context("Failed to read input")?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        list.push(String::from_utf8_lossy(&line).into_owned());
    }
    Ok(list)
}

/// Feed the query one char at a time, as typing would
fn run_keystrokes(session: &Session, list: &ChunkList, query: &str) -> Vec<Item> {
    let mut typed = String::with_capacity(query.len());
    let mut matches = session.scan(&session.build_pattern(""), list.chunks());
    for ch in query.chars() {
        typed.push(ch);
        let pattern = session.build_pattern(&typed);
        matches = session.scan(&pattern, list.chunks());
        debug!(query = %typed, matches = matches.len(), "keystroke");
    }
    matches
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let options = cli.match_options()?;
    let list = read_candidates(cli.input.as_deref())?;
    let session = Session::new(options);
    let query = cli.query.join(" ");

    let matches = if cli.keystrokes {
        run_keystrokes(&session, &list, &query)
    } else {
        session.scan(&session.build_pattern(&query), list.chunks())
    };

    let stats = session.stats();
    info!(
        candidates = list.len(),
        matches = matches.len(),
        cache_hits = stats.hits,
        ancestor_hits = stats.ancestor_hits,
        misses = stats.misses,
        reuse_rate = stats.reuse_rate(),
        "done"
    );

    if cli.json {
        output::print_json(&matches)?;
    } else {
        output::print_matches(&matches, !cli.no_color)?;
    }

    if matches.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
