use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use tokio::runtime::RuntimeFlavor;

use crate::types::Selectable;

pub const INVALID_SELECTION: &str = "Invalid selection. Please try again.";

/// Print a numbered menu of `items` and block until the operator picks one.
///
/// Invalid answers re-print the menu and prompt; there is no retry limit.
/// An empty menu or end of input is an error instead of an endless loop.
pub fn select<'a, T, R, W>(prompt: &str, items: &'a [T], input: &mut R, output: &mut W) -> Result<&'a T>
where
    T: Selectable,
    R: BufRead,
    W: Write,
{
    if items.is_empty() {
        bail!("nothing to choose from");
    }
    let mut line = String::new();
    loop {
        for (i, item) in items.iter().enumerate() {
            writeln!(output, "{}. {} (ID: {})", i + 1, item.name(), item.id())?;
        }
        write!(output, "{}", prompt)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed before a selection was made");
        }
        match parse_choice(&line) {
            Some(idx) if idx < items.len() => return Ok(&items[idx]),
            _ => writeln!(output, "{}", INVALID_SELECTION)?,
        }
    }
}

/// [`select`] from inside an async task. On a multi-threaded runtime the
/// worker is handed over with `block_in_place` while stdin is read; a
/// current-thread runtime has no other worker to hand to, so it reads inline.
pub fn select_in_task<'a, T, R, W>(prompt: &str, items: &'a [T], input: &mut R, output: &mut W) -> Result<&'a T>
where
    T: Selectable,
    R: BufRead,
    W: Write,
{
    match tokio::runtime::Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| select(prompt, items, input, output)),
        _ => select(prompt, items, input, output),
    }
}

/// Leading-integer parse of a 1-based answer, returned zero-based.
/// `"2"`, `"+2"` and `"2 please"` all give 1; `"abc"`, `"0"` and `"-1"` give None.
fn parse_choice(answer: &str) -> Option<usize> {
    let trimmed = answer.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
    trimmed[..digits].parse::<usize>().ok()?.checked_sub(1)
}
