//! Slipway Core
//!
//! Core types and pure logic for the Slipway release pipeline.
//!
//! This crate contains:
//! - Domain types: application types, pipeline configuration, release plans
//! - The configuration resolver (raw parameters to validated config)
//! - The release planner (config and build id to image reference)
//!
//! Nothing in here performs I/O; command execution lives in the runner.

pub mod domain;
pub mod error;
pub mod plan;
pub mod resolve;

pub use error::ValidationError;
pub use plan::plan;
pub use resolve::resolve;
