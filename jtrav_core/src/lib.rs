//! Batch traversal of Java compilation units into a foreign AST
//!
//! The [`pipeline`] filters the command line, drives the [`frontend`] over
//! every requested source, walks each fully bound unit once per [`Session`]
//! and hands it to an [`AstBuilder`] through the [`TranslationBridge`].

pub mod bridge;
pub mod config;
pub mod driver;
pub mod filter;
pub mod frontend;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod registry;
pub mod session;
pub mod utils;

// Re-export key types for library consumers
pub use bridge::{AstBuilder, BuilderError, ForeignNode, MemoryAstBuilder, TranslationBridge};
pub use config::{ConfigError, RuntimeConfig};
pub use filter::{FilterConfig, FlagSyntax};
pub use frontend::{FrontEnd, LanguageLevel, SourceFrontEnd};
pub use pipeline::{PipelineConfig, PipelineError, PipelineOutcome};
pub use session::Session;
