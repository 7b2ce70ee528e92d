//! Candidate list loader.
//!
//! This module loads the list of resolvers to validate from a file, from
//! stdin, or from a remote URL. Lines that are not IP literals are dropped
//! before the list reaches the validation engine.

use crate::dns::types::Resolver;
use crate::error::{Error, Result};
use reqwest::Client;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeout for fetching a remote list in seconds.
const FETCH_TIMEOUT_SECS: u64 = 30;

/// User-Agent header value for HTTP requests.
const USER_AGENT: &str = concat!("resolvalid/", env!("CARGO_PKG_VERSION"));

/// Where the candidate list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    File(PathBuf),
    Stdin,
    Url(String),
}

impl ListSource {
    /// Pick the source from CLI inputs: a file (`-` for stdin) wins over a
    /// URL, and `default_url` is used when neither is given.
    #[must_use]
    pub fn select(file: Option<&Path>, url: Option<&str>, default_url: &str) -> Self {
        match (file, url) {
            (Some(path), _) if path == Path::new("-") => Self::Stdin,
            (Some(path), _) => Self::File(path.to_path_buf()),
            (None, Some(url)) => Self::Url(url.to_string()),
            (None, None) => Self::Url(default_url.to_string()),
        }
    }
}

impl std::fmt::Display for ListSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => write!(f, "stdin"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Parsed candidate list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    /// Accepted resolvers, in input order, duplicates kept
    pub resolvers: Vec<Resolver>,
    /// Number of non-empty lines that were not IP addresses
    pub skipped: usize,
}

/// Candidate list loader.
pub struct CandidateLoader;

impl CandidateLoader {
    /// Parse one resolver per line.
    ///
    /// Blank lines and `#` comments are ignored; anything else that is not
    /// an IP address is counted as skipped.
    #[must_use]
    pub fn parse(content: &str) -> CandidateList {
        let mut list = CandidateList::default();
        for line in content.lines() {
            Self::push_line(&mut list, line);
        }
        list
    }

    /// Parse a list from any buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<CandidateList> {
        let mut list = CandidateList::default();
        for line in reader.lines() {
            Self::push_line(&mut list, &line?);
        }
        Ok(list)
    }

    fn push_line(list: &mut CandidateList, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        match line.parse::<Resolver>() {
            Ok(resolver) => list.resolvers.push(resolver),
            Err(_) => {
                tracing::debug!(line, "skipping invalid resolver address");
                list.skipped += 1;
            }
        }
    }

    /// Load a list from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<CandidateList> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&content))
    }

    /// Fetch a list over HTTP(S).
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn load_from_url(url: &str) -> Result<CandidateList> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::network(format!(
                "fetching {url} failed with status {}",
                response.status().as_u16()
            )));
        }

        let content = response.text().await?;
        Ok(Self::parse(&content))
    }

    /// Load from `source`, refusing a list without any resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or holds no valid
    /// resolver address.
    pub async fn load(source: &ListSource) -> Result<CandidateList> {
        let list = match source {
            ListSource::File(path) => Self::load_from_file(path)?,
            ListSource::Stdin => Self::from_reader(std::io::stdin().lock())?,
            ListSource::Url(url) => Self::load_from_url(url).await?,
        };

        if list.skipped > 0 {
            tracing::warn!(skipped = list.skipped, "ignored lines that are not IP addresses");
        }
        if list.resolvers.is_empty() {
            return Err(Error::config(format!("No DNS servers found in {source}")));
        }
        Ok(list)
    }
}
