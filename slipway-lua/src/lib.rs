//! Slipway Lua definitions
//!
//! Pipeline definitions are small Lua files returning a table of parameters.
//! This crate evaluates them in a restricted sandbox and hands the resulting
//! raw parameters to the resolver in `slipway-core`.

pub mod parser;
pub mod sandbox;
pub mod stubs;

pub use parser::{load_definition, parse_definition};
pub use sandbox::create_sandbox;
