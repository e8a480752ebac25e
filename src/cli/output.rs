//! Handles all user-facing output for the CLI.
//!
//! Tree lines are colored by their marker: `>` leaves, `+` collapsible and
//! `-` expanded subtrees. Color is dropped when stdout is not a terminal.

use std::io::{self, IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::loader::CaseStatus;
use crate::query::TestQuery;
use crate::tree::TestTree;

fn stdout() -> StandardStream {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn marker_color(line: &str) -> Option<Color> {
    match line.trim_start().chars().next() {
        Some('>') => Some(Color::Green),
        Some('+') => Some(Color::Cyan),
        Some('-') => Some(Color::Yellow),
        Some('|') => Some(Color::White),
        _ => None,
    }
}

pub fn print_queries<'a>(queries: impl Iterator<Item = &'a TestQuery>) -> io::Result<()> {
    let mut out = stdout();
    for query in queries {
        writeln!(out, "{query}")?;
    }
    Ok(())
}

pub fn print_tree(tree: &TestTree) -> io::Result<()> {
    let mut out = stdout();
    write_tree(&mut out, tree)
}

fn write_tree(out: &mut impl WriteColor, tree: &TestTree) -> io::Result<()> {
    for line in tree.render().lines() {
        let indent = line.len() - line.trim_start().len();
        let (lead, rest) = line.split_at(indent);
        write!(out, "{lead}")?;
        if let Some(color) = marker_color(rest) {
            out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        }
        let (marker, body) = rest.split_at(rest.chars().next().map_or(0, char::len_utf8));
        write!(out, "{marker}")?;
        out.reset()?;
        writeln!(out, "{body}")?;
    }
    Ok(())
}

pub fn print_leaves(tree: &TestTree) -> io::Result<()> {
    let mut out = stdout();
    for leaf in tree.iterate_leaves() {
        let (color, label, reason) = match leaf.run() {
            CaseStatus::Pass => (Color::Green, "pass", None),
            CaseStatus::Fail { reason } => (Color::Red, "fail", Some(reason)),
            CaseStatus::Skip { reason } => (Color::Yellow, "skip", Some(reason)),
        };
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "{label}")?;
        out.reset()?;
        match reason {
            Some(reason) => writeln!(out, " {} ({reason})", leaf.query)?,
            None => writeln!(out, " {}", leaf.query)?,
        }
    }
    Ok(())
}
