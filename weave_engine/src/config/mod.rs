//! Configuration for the Weave engine
//!
//! Compile-time limits live in [`constants`]; user-tunable preferences live
//! in [`runtime`] and are sourced from `WEAVE_*` environment variables or an
//! optional TOML file.

pub mod constants;
pub mod runtime;

pub use runtime::RuntimeConfig;
