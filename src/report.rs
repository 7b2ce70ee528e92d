//! Final run report.
//!
//! Summary of a finished validation run, printed as a table or as JSON.

use crate::dns::types::RunTally;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Summary of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Domain queried on every candidate
    pub test_domain: String,
    /// Addresses considered correct
    pub expected_answers: Vec<IpAddr>,
    /// Where valid resolvers were written
    pub output: PathBuf,
    /// Final counters
    pub tally: RunTally,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Share of checked resolvers that passed, as a percentage.
    #[must_use]
    pub fn valid_rate(&self) -> f64 {
        if self.tally.checked == 0 {
            0.0
        } else {
            (self.tally.valid as f64 / self.tally.checked as f64) * 100.0
        }
    }

    /// Wall-clock duration of the run in seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Human-readable summary lines.
    #[must_use]
    pub fn to_table(&self) -> String {
        let expected: Vec<String> = self.expected_answers.iter().map(ToString::to_string).collect();

        let mut out = String::new();
        out.push_str("=== Summary ===\n");
        out.push_str(&format!("{:<18} {}\n", "Test domain:", self.test_domain));
        out.push_str(&format!("{:<18} {}\n", "Expected answers:", expected.join(", ")));
        out.push_str(&format!("{:<18} {}\n", "Checked:", self.tally.checked));
        out.push_str(&format!(
            "{:<18} {} ({:.2}%)\n",
            "Valid:",
            self.tally.valid,
            self.valid_rate()
        ));
        out.push_str(&format!("{:<18} {}\n", "Non-valid:", self.tally.invalid));
        out.push_str(&format!("{:<18} {:.1} s\n", "Elapsed:", self.elapsed_secs()));
        out.push_str(&format!("{:<18} {}\n", "Output:", self.output.display()));
        out
    }
}
