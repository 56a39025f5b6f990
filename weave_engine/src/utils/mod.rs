//! Shared utilities for the Weave engine

pub mod span;

pub use span::{Position, SourceMap, Span, Spanned};
