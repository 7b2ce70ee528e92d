//! DNS types and data structures.
//!
//! This module provides the core types shared by the transport, the
//! validation policy and the validation engine: resolver addresses, the
//! expected answer set, per-attempt outcomes, verdicts and run counters.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Standard DNS service port. Every candidate is queried on it.
pub const DNS_PORT: u16 = 53;

/// A candidate DNS resolver, identified by its IP address.
///
/// Syntax is checked when the value is built; once accepted a resolver
/// is never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resolver(IpAddr);

impl Resolver {
    /// Create a resolver from an already parsed address.
    #[must_use]
    pub const fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    /// The resolver's IP address.
    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        self.0
    }

    /// Socket address used for queries (`ip:53`).
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.0, DNS_PORT)
    }

    /// Check if the resolver uses IPv4.
    #[must_use]
    pub const fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }
}

impl FromStr for Resolver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<IpAddr>()
            .map(Self)
            .map_err(|_| Error::parse(format!("Invalid IP address: {}", s.trim())))
    }
}

impl From<IpAddr> for Resolver {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Addresses considered correct for the test domain.
///
/// Built once from the known-good resolvers and read-only afterwards.
/// It can never be empty: [`ExpectedAnswers::new`] refuses an empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedAnswers {
    addrs: HashSet<IpAddr>,
}

impl ExpectedAnswers {
    /// Build the set, returning `None` when `addrs` yields nothing.
    pub fn new(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Self> {
        let addrs: HashSet<IpAddr> = addrs.into_iter().collect();
        if addrs.is_empty() {
            None
        } else {
            Some(Self { addrs })
        }
    }

    /// Whether `ip` is one of the expected answers.
    #[must_use]
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.addrs.contains(ip)
    }

    /// Whether any of `records` is an expected answer.
    ///
    /// Stops at the first match.
    #[must_use]
    pub fn matches_any(&self, records: &[IpAddr]) -> bool {
        records.iter().any(|ip| self.contains(ip))
    }

    /// Number of distinct expected addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Addresses in ascending order, for display and reports.
    #[must_use]
    pub fn sorted(&self) -> Vec<IpAddr> {
        let mut addrs: Vec<IpAddr> = self.addrs.iter().copied().collect();
        addrs.sort_unstable();
        addrs
    }
}

/// Successful reply to a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnswer {
    /// Address records found in the answer section
    pub records: Vec<IpAddr>,
    /// Round-trip time of the query
    pub elapsed: Duration,
}

impl QueryAnswer {
    #[must_use]
    pub fn new(records: Vec<IpAddr>, elapsed: Duration) -> Self {
        Self { records, elapsed }
    }
}

/// What a single attempt against a resolver produced.
///
/// Consumed immediately by the validation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The resolver answered with at least one address record.
    Answered {
        records: Vec<IpAddr>,
        elapsed: Duration,
    },
    /// Timeout, refused connection, malformed response...
    TransportError(String),
    /// The resolver answered, but without any address record.
    EmptyAnswer,
}

impl QueryOutcome {
    /// Classify a transport result into an outcome.
    #[must_use]
    pub fn from_result(result: Result<QueryAnswer>) -> Self {
        match result {
            Ok(answer) if answer.records.is_empty() => Self::EmptyAnswer,
            Ok(answer) => Self::Answered {
                records: answer.records,
                elapsed: answer.elapsed,
            },
            Err(e) => Self::TransportError(e.to_string()),
        }
    }
}

/// Why an attempt did not pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailReason {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty answer")]
    EmptyAnswer,

    #[error("no returned address matches the expected answers")]
    Mismatch,

    #[error("answered in {elapsed:?}, above the {limit:?} limit")]
    TooSlow { elapsed: Duration, limit: Duration },
}

/// Result of classifying one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(FailReason),
}

impl Verdict {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Final verdict for one candidate after the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// The resolver that was checked
    pub resolver: Resolver,
    /// Verdict of the last attempt made
    pub verdict: Verdict,
    /// Number of attempts consumed (at least 1)
    pub attempts: u32,
}

impl CheckResult {
    /// Whether the resolver is considered valid.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.verdict.is_pass()
    }

    /// The failure that decided an invalid verdict, if any.
    #[must_use]
    pub const fn fail_reason(&self) -> Option<&FailReason> {
        match &self.verdict {
            Verdict::Pass => None,
            Verdict::Fail(reason) => Some(reason),
        }
    }
}

/// Counters of a validation run.
///
/// At the end of a run `checked == total` and `valid + invalid == checked`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTally {
    /// Number of candidates handed to the engine
    pub total: usize,
    /// Number of candidates with a verdict
    pub checked: usize,
    /// Number of valid resolvers
    pub valid: usize,
    /// Number of invalid resolvers
    pub invalid: usize,
}

impl RunTally {
    /// Start a tally for `total` candidates.
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self {
            total,
            checked: 0,
            valid: 0,
            invalid: 0,
        }
    }

    /// Account for one verdict and return the progress it produces.
    pub fn record(&mut self, valid: bool) -> Progress {
        if valid {
            self.valid += 1;
        } else {
            self.invalid += 1;
        }
        self.checked += 1;
        self.progress()
    }

    /// Completion percentage, `100.0` for an empty run.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.checked as f64 / self.total as f64) * 100.0
        }
    }

    /// Whether every candidate has been checked.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.checked == self.total
    }

    /// Snapshot of the counters as a progress event.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            checked: self.checked,
            total: self.total,
            valid: self.valid,
            invalid: self.invalid,
            percent: self.percent(),
        }
    }
}

/// Progress event emitted once per verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub checked: usize,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_parse() {
        let r: Resolver = "8.8.8.8".parse().unwrap();
        assert!(r.is_ipv4());
        assert_eq!(r.socket_addr(), "8.8.8.8:53".parse().unwrap());
        assert_eq!(r.to_string(), "8.8.8.8");

        let r: Resolver = " 2606:4700:4700::1111 ".parse().unwrap();
        assert!(!r.is_ipv4());
        assert_eq!(r.socket_addr().port(), DNS_PORT);

        assert!("dns.google".parse::<Resolver>().is_err());
        assert!("".parse::<Resolver>().is_err());
    }

    #[test]
    fn test_expected_answers_rejects_empty() {
        assert!(ExpectedAnswers::new(Vec::new()).is_none());

        let expected = ExpectedAnswers::new(vec![
            "10.0.0.1".parse().unwrap(),
            "10.0.0.1".parse().unwrap(),
            "10.0.0.2".parse().unwrap(),
        ])
        .unwrap();
        assert_eq!(expected.len(), 2);
        assert!(!expected.is_empty());
        assert!(expected.matches_any(&["192.0.2.1".parse().unwrap(), "10.0.0.2".parse().unwrap()]));
        assert!(!expected.matches_any(&["192.0.2.1".parse().unwrap()]));
        assert!(!expected.matches_any(&[]));
    }

    #[test]
    fn test_outcome_from_result() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let elapsed = Duration::from_millis(12);

        let outcome = QueryOutcome::from_result(Ok(QueryAnswer::new(vec![ip], elapsed)));
        assert_eq!(
            outcome,
            QueryOutcome::Answered {
                records: vec![ip],
                elapsed
            }
        );

        let outcome = QueryOutcome::from_result(Ok(QueryAnswer::new(vec![], elapsed)));
        assert_eq!(outcome, QueryOutcome::EmptyAnswer);

        let outcome = QueryOutcome::from_result(Err(Error::Timeout));
        assert!(matches!(outcome, QueryOutcome::TransportError(_)));
    }

    #[test]
    fn test_tally_record() {
        let mut tally = RunTally::new(4);
        assert_eq!(tally.percent(), 0.0);

        let p = tally.record(true);
        assert_eq!((p.checked, p.valid, p.invalid), (1, 1, 0));
        assert_eq!(p.percent, 25.0);

        tally.record(false);
        tally.record(false);
        let p = tally.record(true);
        assert_eq!((p.checked, p.total, p.valid, p.invalid), (4, 4, 2, 2));
        assert_eq!(p.percent, 100.0);
        assert!(tally.is_complete());
        assert_eq!(tally.valid + tally.invalid, tally.checked);
    }

    #[test]
    fn test_tally_empty_run() {
        let tally = RunTally::new(0);
        assert!(tally.is_complete());
        assert_eq!(tally.percent(), 100.0);
    }
}
