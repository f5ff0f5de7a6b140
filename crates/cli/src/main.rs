//! # CLI - Prolog index shell
//!
//! A REPL over a single segment index file. Reads commands from stdin, runs
//! them against the index and prints results to stdout. Works interactively
//! or with commands piped in.
//!
//! ## Commands
//!
//! ```text
//! WRITE offset position   Append an entry
//! READ n                  Read entry n (0-based)
//! LAST                    Read the most recently written entry
//! SCAN                    Print every entry
//! FLUSH                   Flush the mapped region to disk
//! STATS                   Print index debug info
//! EXIT / QUIT             Close the index (trimming the file) and exit
//! ```
//!
//! ## Configuration
//!
//! ```text
//! PROLOG_INDEX_PATH       Index file path        (default: "00000000000000000000.index")
//! PROLOG_MAX_INDEX_BYTES  Pre-allocated size     (default: 1048572)
//! PROLOG_INDEX_SYNC       Flush every write      (default: "false")
//! RUST_LOG                Log filter for stderr  (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! prolog index started (path=00000000000000000000.index, entries=0, max_index_bytes=1048572, sync=false)
//! > WRITE 0 0
//! OK
//! > WRITE 1 12
//! OK
//! > LAST
//! offset=1 position=12
//! > EXIT
//! bye
//! ```

use anyhow::{Context, Result};
use config::Config;
use index::{Index, IndexError, Selector};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default index file name: the segment with base offset 0.
const DEFAULT_INDEX_PATH: &str = "00000000000000000000.index";

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Whether the shell should keep reading after a command.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let path = env_or("PROLOG_INDEX_PATH", DEFAULT_INDEX_PATH);
    let config = Config::from_env();

    let mut index = Index::open(&path, &config.segment)
        .with_context(|| format!("failed to open index at {}", path))?;

    println!(
        "prolog index started (path={}, entries={}, max_index_bytes={}, sync={})",
        path,
        index.len(),
        config.segment.max_index_bytes,
        config.segment.sync_writes
    );
    println!("Commands: WRITE offset position | READ n | LAST | SCAN");
    println!("          FLUSH | STATS | EXIT");

    run_session(&mut index, io::stdin().lock(), &mut io::stdout())?;

    let entries = index.len();
    index.close().context("failed to close index")?;
    info!(path = %path, entries, "index closed");

    Ok(())
}

/// Reads commands from `input` until EXIT or end of input, prompting on `out`.
///
/// Lines are read as raw bytes so that one line of invalid UTF-8 gets an
/// error reply instead of ending the session.
fn run_session<R: BufRead, W: Write>(
    index: &mut Index,
    mut input: R,
    out: &mut W,
) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        write!(out, "> ")?;
        out.flush().ok();

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let step = match std::str::from_utf8(&buf) {
            Ok(line) => execute(index, line, out)?,
            Err(_) => {
                writeln!(out, "ERR input is not valid UTF-8")?;
                Step::Continue
            }
        };
        if step == Step::Exit {
            return Ok(());
        }
    }
}

/// Runs one command line against `index`, writing the response to `out`.
fn execute<W: Write>(index: &mut Index, line: &str, out: &mut W) -> io::Result<Step> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(Step::Continue);
    };

    match cmd.to_uppercase().as_str() {
        "WRITE" => {
            let (Some(off), Some(pos), None) = (parts.next(), parts.next(), parts.next()) else {
                writeln!(out, "ERR usage: WRITE offset position")?;
                return Ok(Step::Continue);
            };
            let (off, pos) = match (off.parse::<u32>(), pos.parse::<u64>()) {
                (Ok(o), Ok(p)) => (o, p),
                _ => {
                    writeln!(out, "ERR offset must be a u32 and position a u64")?;
                    return Ok(Step::Continue);
                }
            };
            match index.write(off, pos) {
                Ok(()) => writeln!(out, "OK")?,
                Err(IndexError::Eof) => writeln!(out, "(full)")?,
                Err(e) => writeln!(out, "ERR write failed: {}", e)?,
            }
        }
        "READ" => match parts.next().map(str::parse::<u64>) {
            Some(Ok(n)) => print_read(index, Selector::Nth(n), out)?,
            Some(Err(_)) => writeln!(out, "ERR entry number must be a u64")?,
            None => writeln!(out, "ERR usage: READ n")?,
        },
        "LAST" => print_read(index, Selector::Last, out)?,
        "SCAN" => {
            let mut count = 0u64;
            for (n, e) in index.entries().enumerate() {
                writeln!(out, "{}: offset={} position={}", n, e.offset, e.position)?;
                count += 1;
            }
            if count == 0 {
                writeln!(out, "(empty)")?;
            } else {
                writeln!(out, "({} entries)", count)?;
            }
        }
        "FLUSH" => match index.flush() {
            Ok(()) => writeln!(out, "OK")?,
            Err(e) => writeln!(out, "ERR flush failed: {}", e)?,
        },
        "STATS" => writeln!(out, "{:?}", index)?,
        "EXIT" | "QUIT" => {
            writeln!(out, "bye")?;
            return Ok(Step::Exit);
        }
        other => writeln!(out, "unknown command: {}", other)?,
    }

    Ok(Step::Continue)
}

fn print_read<W: Write>(index: &Index, selector: Selector, out: &mut W) -> io::Result<()> {
    match index.read(selector) {
        Ok(e) => writeln!(out, "offset={} position={}", e.offset, e.position),
        Err(IndexError::Eof) => writeln!(out, "(eof)"),
        Err(e) => writeln!(out, "ERR read failed: {}", e),
    }
}
