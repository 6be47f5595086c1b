//! Runtime configuration for the demo binaries.
pub mod demo;

pub use demo::{load_enroll_config, load_match_config, EnrollConfig, MatchConfig, OutputConfig};
