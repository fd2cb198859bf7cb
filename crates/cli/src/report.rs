//! Human-readable rendering of delivered batches

use chrono::{DateTime, Local};
use pollwatch_watcher::{Batch, ChangeEvent};
use std::io::{self, Write};
use std::time::SystemTime;

const RULE: &str = "----------------";

/// Short label for the kind of change
pub fn change_label(event: &ChangeEvent) -> &'static str {
    if event.was_removed() {
        "Removed"
    } else if event.was_added() {
        "Added"
    } else {
        "Changed"
    }
}

/// Format a modification time in local time with full precision
pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S%.9f %z")
        .to_string()
}

/// Write one batch as a block of text
pub fn write_batch<W: Write>(out: &mut W, batch: &Batch) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "Updates Received ({})", batch.len())?;
    writeln!(out, "{RULE}")?;

    for event in batch {
        write_event(out, event)?;
    }

    Ok(())
}

fn write_event<W: Write>(out: &mut W, event: &ChangeEvent) -> io::Result<()> {
    let previous = event.previous();

    writeln!(out, "{} -- {}", event.path().display(), change_label(event))?;
    writeln!(out, "\tIsDir:\t\t{}", previous.is_dir)?;
    writeln!(out, "\tReadOnly:\t{}", previous.readonly)?;
    writeln!(
        out,
        "\tPrev, Size:\t{}, {}",
        format_time(previous.modified),
        previous.size
    )?;

    if let Some(error) = event.error() {
        writeln!(out, "\tError:\t\t{error}")?;
    } else if let Some(current) = event.current() {
        writeln!(
            out,
            "\tNext, Size:\t{}, {}",
            format_time(current.modified),
            current.size
        )?;
    }

    Ok(())
}
