//! DNS module.
//!
//! This module provides the resolver validation core:
//! - Query transport (single A query per resolver)
//! - Ground truth from known-good resolvers
//! - Pass/fail policy with retries
//! - Concurrent validation engine
//! - Core data types

pub mod engine;
pub mod ground_truth;
pub mod policy;
pub mod transport;
pub mod types;

pub use engine::{EngineConfig, FileSink, OutputSink, ProgressSink, ValidationEngine};
pub use ground_truth::GroundTruthResolver;
pub use policy::ValidationPolicy;
pub use transport::{QueryTransport, UdpTransport};
pub use types::*;
