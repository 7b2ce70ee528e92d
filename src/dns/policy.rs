//! Validation policy.
//!
//! Decides whether a resolver's answer is trustworthy: it must answer, one
//! of its addresses must be in the expected set, and, when a latency bound
//! is configured, it must answer within that bound. The retry loop lives
//! here too, since "what counts as a failure worth retrying" is policy.

use crate::dns::transport::QueryTransport;
use crate::dns::types::{CheckResult, ExpectedAnswers, FailReason, QueryOutcome, Resolver, Verdict};
use std::time::Duration;
use tracing::debug;

/// Pass/fail rules for a single candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    max_latency: Option<Duration>,
}

impl ValidationPolicy {
    /// Create a policy. A zero `max_latency` means no bound.
    #[must_use]
    pub fn new(max_latency: Option<Duration>) -> Self {
        Self {
            max_latency: max_latency.filter(|d| !d.is_zero()),
        }
    }

    /// The configured latency bound, if any.
    #[must_use]
    pub const fn max_latency(&self) -> Option<Duration> {
        self.max_latency
    }

    /// Classify one attempt. Pure, no I/O.
    #[must_use]
    pub fn classify(&self, outcome: &QueryOutcome, expected: &ExpectedAnswers) -> Verdict {
        match outcome {
            QueryOutcome::TransportError(cause) => Verdict::Fail(FailReason::Transport(cause.clone())),
            QueryOutcome::EmptyAnswer => Verdict::Fail(FailReason::EmptyAnswer),
            QueryOutcome::Answered { records, elapsed } => {
                if !expected.matches_any(records) {
                    return Verdict::Fail(FailReason::Mismatch);
                }
                match self.max_latency {
                    Some(limit) if *elapsed > limit => Verdict::Fail(FailReason::TooSlow {
                        elapsed: *elapsed,
                        limit,
                    }),
                    _ => Verdict::Pass,
                }
            }
        }
    }

    /// Query `resolver` up to `max_attempts` times, stopping at the first pass.
    ///
    /// Attempts are sequential and immediate. Every kind of failure is
    /// retried, including an answer that matched but was too slow. A
    /// `max_attempts` of zero is treated as one.
    pub async fn attempt_with_retries<T: QueryTransport>(
        &self,
        transport: &T,
        resolver: Resolver,
        domain: &str,
        timeout: Duration,
        expected: &ExpectedAnswers,
        max_attempts: u32,
    ) -> CheckResult {
        let max_attempts = max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let result = transport.query(resolver.socket_addr(), domain, timeout).await;
            let verdict = self.classify(&QueryOutcome::from_result(result), expected);

            match &verdict {
                Verdict::Pass => {
                    debug!(%resolver, attempts, "resolver passed");
                }
                Verdict::Fail(reason) => {
                    debug!(%resolver, attempt = attempts, max_attempts, %reason, "attempt failed");
                    if attempts < max_attempts {
                        continue;
                    }
                }
            }

            return CheckResult {
                resolver,
                verdict,
                attempts,
            };
        }
    }
}
