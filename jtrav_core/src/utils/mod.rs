//! Shared source-location types used by the front end, diagnostics and logging

pub mod span;

pub use span::{Position, Span};
