//! Ground truth for the test domain.
//!
//! Before any candidate is checked, the test domain is resolved through a
//! few well-known public resolvers. The union of their address answers is
//! the set a trustworthy resolver is expected to return.

#![allow(clippy::missing_errors_doc)]

use crate::dns::transport::QueryTransport;
use crate::dns::types::{ExpectedAnswers, Resolver};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for each known-good query in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 2;

/// Builds the expected answer set from known-good resolvers.
///
/// # Example
///
/// ```ignore
/// let truth = GroundTruthResolver::new(UdpTransport::new(), known_good);
/// let expected = truth.resolve("resolvalid.mmartin.me").await?;
/// ```
pub struct GroundTruthResolver<T> {
    transport: T,
    known_good: Vec<Resolver>,
    timeout: Duration,
}

impl<T: QueryTransport> GroundTruthResolver<T> {
    /// Create a resolver over `known_good` with the default timeout.
    pub fn new(transport: T, known_good: Vec<Resolver>) -> Self {
        Self {
            transport,
            known_good,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the per-query timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Query every known-good resolver in order and union their answers.
    ///
    /// A failing resolver is skipped. Fails with [`Error::NoGroundTruth`]
    /// when no address at all was collected.
    pub async fn resolve(&self, domain: &str) -> Result<ExpectedAnswers> {
        let mut addrs: HashSet<IpAddr> = HashSet::new();

        for server in &self.known_good {
            match self
                .transport
                .query(server.socket_addr(), domain, self.timeout)
                .await
            {
                Ok(answer) => {
                    debug!(%server, records = ?answer.records, "known-good resolver answered");
                    addrs.extend(answer.records);
                }
                Err(e) => {
                    debug!(%server, error = %e, "known-good resolver failed, skipping");
                }
            }
        }

        let expected = ExpectedAnswers::new(addrs).ok_or_else(|| Error::NoGroundTruth {
            domain: domain.to_string(),
        })?;
        info!(domain, expected = ?expected.sorted(), "ground truth established");
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::transport::tests::{ScriptedTransport, Step};

    fn known_good() -> Vec<Resolver> {
        ["192.0.2.1", "192.0.2.2", "192.0.2.3"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_all_fail_is_no_ground_truth() {
        let truth = GroundTruthResolver::new(ScriptedTransport::new(), known_good());
        let err = truth.resolve("t.test").await.unwrap_err();
        assert!(matches!(err, Error::NoGroundTruth { ref domain } if domain == "t.test"));
    }

    #[tokio::test]
    async fn test_empty_answers_are_no_ground_truth() {
        let transport = ScriptedTransport::new()
            .script("192.0.2.1", vec![Step::Empty])
            .script("192.0.2.2", vec![Step::Empty]);
        let truth = GroundTruthResolver::new(transport, known_good());
        assert!(truth.resolve("t.test").await.is_err());
    }

    #[tokio::test]
    async fn test_partial_success_unions_answers() {
        let transport = ScriptedTransport::new()
            .script("192.0.2.1", vec![Step::answer("10.0.0.1", 5)])
            .script(
                "192.0.2.3",
                vec![Step::Answer(
                    vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()],
                    Duration::from_millis(5),
                )],
            );
        let truth = GroundTruthResolver::new(transport, known_good()).with_timeout(Duration::from_millis(500));

        let expected = truth.resolve("t.test").await.unwrap();
        assert_eq!(
            expected.sorted(),
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "10.0.0.2".parse().unwrap()]
        );
    }

    #[tokio::test]
    async fn test_queries_each_known_good_once() {
        let transport = ScriptedTransport::new().script("192.0.2.2", vec![Step::answer("10.0.0.1", 5)]);
        let truth = GroundTruthResolver::new(transport, known_good());
        truth.resolve("t.test").await.unwrap();

        for server in ["192.0.2.1", "192.0.2.2", "192.0.2.3"] {
            assert_eq!(truth.transport.calls(server), 1);
        }
    }
}
