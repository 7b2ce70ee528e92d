//! Run settings.
//!
//! Built-in default tables (known-good resolvers, test domains, default
//! list URL) and tunables, optionally overridden by a JSON file in the
//! user config directory. Settings are immutable once loaded.

use crate::dns::types::Resolver;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory name under the user config dir.
const APP_DIR: &str = "resolvalid";

/// Settings file name.
const SETTINGS_FILE: &str = "config.json";

/// Public resolvers trusted to establish the expected answers.
pub const DEFAULT_KNOWN_GOOD: [IpAddr; 3] = [
    IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
    IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
    IpAddr::V4(Ipv4Addr::new(8, 8, 4, 4)),
];

/// Test domains with a stable, known answer.
pub const DEFAULT_TEST_DOMAINS: &[&str] = &[
    "resolvalid.mmartin.me",
    "resolvalid2.mmartin.me",
    "resolvalid3.mmartin.me",
];

/// Resolver list used when no source is given.
pub const DEFAULT_LIST_URL: &str = "https://public-dns.info/nameservers.txt";

/// Immutable configuration supplied at startup.
///
/// Every field is optional in the JSON file; missing fields keep their
/// defaults.
///
/// ```json
/// { "threads": 50, "retries": 1, "max_latency_ms": 300 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Resolvers queried to build the expected answer set
    pub known_good_servers: Vec<Resolver>,
    /// Candidate test domains, one is picked at random when none is given
    pub test_domains: Vec<String>,
    /// Default source of the candidate list
    pub list_url: String,
    /// Number of concurrent checks
    pub threads: usize,
    /// Per-attempt query timeout in milliseconds
    pub timeout_ms: u64,
    /// Per-query timeout for the known-good resolvers in milliseconds
    pub ground_truth_timeout_ms: u64,
    /// Extra attempts after a failed one
    pub retries: u32,
    /// Latency bound in milliseconds, 0 for none
    pub max_latency_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            known_good_servers: DEFAULT_KNOWN_GOOD.iter().copied().map(Resolver::new).collect(),
            test_domains: DEFAULT_TEST_DOMAINS.iter().map(|s| (*s).to_string()).collect(),
            list_url: DEFAULT_LIST_URL.to_string(),
            threads: 20,
            timeout_ms: 2_000,
            ground_truth_timeout_ms: 2_000,
            retries: 0,
            max_latency_ms: 0,
        }
    }
}

impl Settings {
    /// Get the config directory path.
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Path of the default settings file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Self::config_dir().join(SETTINGS_FILE)
    }

    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load `path` if given, otherwise the default file if it exists,
    /// otherwise the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is invalid, or if an explicit
    /// `path` cannot be read.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let default_path = Self::default_path();
        if default_path.is_file() {
            tracing::debug!(path = %default_path.display(), "loading settings");
            Self::load_from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check the tables are usable.
    ///
    /// # Errors
    ///
    /// Returns a config error for empty tables or zero threads/timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.known_good_servers.is_empty() {
            return Err(Error::config("known_good_servers cannot be empty"));
        }
        if self.test_domains.iter().all(|d| d.trim().is_empty()) {
            return Err(Error::config("test_domains must contain a domain"));
        }
        if self.threads == 0 {
            return Err(Error::config("threads must be at least 1"));
        }
        if self.timeout_ms == 0 || self.ground_truth_timeout_ms == 0 {
            return Err(Error::config("timeouts must be greater than 0"));
        }
        Ok(())
    }

    /// Pick one of the configured test domains at random.
    #[must_use]
    pub fn pick_test_domain(&self) -> Option<&str> {
        let domains: Vec<&str> = self
            .test_domains
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect();
        if domains.is_empty() {
            return None;
        }
        Some(domains[fastrand::usize(..domains.len())])
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn ground_truth_timeout(&self) -> Duration {
        Duration::from_millis(self.ground_truth_timeout_ms)
    }

    /// Latency bound, `None` when unset.
    #[must_use]
    pub const fn max_latency(&self) -> Option<Duration> {
        if self.max_latency_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.max_latency_ms))
        }
    }
}
