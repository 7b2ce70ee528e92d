//! resolvalid - Validate DNS resolvers against a known-good answer set.
//!
//! This crate provides both a library API and a CLI tool for:
//! - Establishing the expected answers for a test domain through
//!   well-known public resolvers
//! - Checking a list of candidate resolvers concurrently, with retries
//!   and an optional latency bound
//! - Writing the resolvers that answered correctly to a file
//!
//! # Library Usage
//!
//! ```ignore
//! use resolvalid::{EngineConfig, GroundTruthResolver, UdpTransport, ValidationEngine};
//!
//! let expected = GroundTruthResolver::new(UdpTransport::new(), known_good)
//!     .resolve("resolvalid.mmartin.me")
//!     .await?;
//!
//! let engine = ValidationEngine::new(UdpTransport::new(), EngineConfig::new("resolvalid.mmartin.me"))?;
//! let tally = engine.run_to_file(candidates, expected, path, false, SilentProgress).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Validate the default public list
//! resolvalid -o valid.txt
//!
//! # Local file, custom timeout and two retries
//! resolvalid -f servers.txt -o valid.txt --timeout 5s --retries 2
//!
//! # Only keep resolvers answering within 300ms
//! resolvalid -u https://example.com/list.txt -o valid.txt --max-latency 300ms
//! ```

pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod progress;
pub mod report;

// Re-export commonly used types
pub use cli::{Cli, OutputFormat};
pub use config::{CandidateLoader, ListSource, Settings};
pub use dns::types::{
    CheckResult, ExpectedAnswers, FailReason, Progress, QueryAnswer, QueryOutcome, Resolver,
    RunTally, Verdict,
};
pub use dns::{
    EngineConfig, GroundTruthResolver, OutputSink, ProgressSink, QueryTransport, UdpTransport,
    ValidationEngine, ValidationPolicy,
};
pub use error::{Error, Result};
pub use progress::{SilentProgress, TerminalProgress};
pub use report::RunReport;
