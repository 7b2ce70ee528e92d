//! Configuration module.
//!
//! This module provides the immutable run settings and the loader for
//! the candidate resolver list.

pub mod loader;
pub mod settings;

pub use loader::{CandidateList, CandidateLoader, ListSource};
pub use settings::Settings;
