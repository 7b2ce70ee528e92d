//! Terminal progress rendering.
//!
//! A single status line rewritten in place for every verdict.

use crate::dns::engine::ProgressSink;
use crate::dns::types::{Progress, RunTally};
use crossterm::style::Stylize;
use std::io::{self, Write};

/// Renders progress on stdout, valid count in green and invalid in red.
pub struct TerminalProgress {
    out: io::Stdout,
    colored: bool,
}

impl TerminalProgress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            colored: std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn update(&mut self, progress: &Progress) {
        let line = render_line(progress, self.colored);
        let _ = write!(self.out, "\r{line}");
        let _ = self.out.flush();
    }

    fn finish(&mut self, _tally: &RunTally) {
        let _ = writeln!(self.out);
    }
}

/// Discards every event (`--silent`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn update(&mut self, _progress: &Progress) {}
}

/// Format one progress line.
#[must_use]
pub fn render_line(progress: &Progress, colored: bool) -> String {
    let (valid, invalid) = if colored {
        (
            progress.valid.to_string().green().to_string(),
            progress.invalid.to_string().red().to_string(),
        )
    } else {
        (progress.valid.to_string(), progress.invalid.to_string())
    };

    format!(
        "Checking {} of {} DNS servers. Results: {} valid - {} non-valid DNS servers. {:.2}% completed.",
        progress.checked, progress.total, valid, invalid, progress.percent
    )
}
