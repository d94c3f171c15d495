//! Configuration module for the CSV fetcher
//!
//! This module provides the `FetchConfig` struct, its type-safe builder and
//! an environment loader covering every knob the binary exposes.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{FetchConfigBuilder, WithOutputDir};
pub use types::FetchConfig;
