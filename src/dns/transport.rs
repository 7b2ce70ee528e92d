//! Query transport.
//!
//! Sends a single A query for the test domain to one resolver and reports
//! the returned addresses together with the round-trip time. The
//! [`QueryTransport`] trait is the seam between the validation core and
//! the network, so tests can swap in a scripted fake.

#![allow(clippy::missing_errors_doc)]

use crate::dns::types::QueryAnswer;
use crate::error::{Error, Result};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::rr::RecordType;
use trust_dns_resolver::TokioAsyncResolver;

/// Capability to send one address query to one resolver.
pub trait QueryTransport: Send + Sync + 'static {
    /// Query `server` for the A records of `domain`, giving up after `timeout`.
    ///
    /// An answer without address records is `Ok` with no records; timeouts
    /// and network failures are errors.
    fn query(
        &self,
        server: SocketAddr,
        domain: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<QueryAnswer>> + Send;
}

/// Plain DNS over UDP, one resolver per query.
///
/// Each query builds a single-server resolver with caching and the hosts
/// file disabled, so the answer always comes from the target server.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpTransport;

impl UdpTransport {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn resolver_for(server: SocketAddr, timeout: Duration) -> Result<TokioAsyncResolver> {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true),
        );

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.use_hosts_file = false;

        TokioAsyncResolver::tokio(config, opts).map_err(Error::Resolver)
    }
}

impl QueryTransport for UdpTransport {
    async fn query(
        &self,
        server: SocketAddr,
        domain: &str,
        timeout: Duration,
    ) -> Result<QueryAnswer> {
        let resolver = Self::resolver_for(server, timeout)?;
        let name = fqdn(domain);

        let start = Instant::now();
        let lookup = tokio::time::timeout(timeout, resolver.lookup(name.as_str(), RecordType::A))
            .await
            .map_err(|_| Error::Timeout)?;
        let elapsed = start.elapsed();

        match lookup {
            Ok(response) => {
                let records = response
                    .iter()
                    .filter_map(|r| r.as_a().map(|ip| IpAddr::V4(*ip)))
                    .collect();
                Ok(QueryAnswer::new(records, elapsed))
            }
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                Ok(QueryAnswer::new(Vec::new(), elapsed))
            }
            Err(e) if matches!(e.kind(), ResolveErrorKind::Timeout) => Err(Error::Timeout),
            Err(e) => Err(Error::Resolver(e)),
        }
    }
}

/// Make `domain` fully qualified.
#[must_use]
pub fn fqdn(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{domain}.")
    }
}
