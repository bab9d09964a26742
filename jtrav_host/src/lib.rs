//! # C ABI for the traversal bridge
//!
//! A native host calls `jtrav_init` once, then `jtrav_main` per batch with a
//! table of AST callbacks. Traversal state (the processed-file set, the error
//! flag, the conflict index) lives in one process-wide session between calls.

pub mod callbacks;
pub mod entry;
pub mod error;

pub use callbacks::{CallbackAstBuilder, JtravAstCallbacks};
pub use entry::{jtrav_get_error, jtrav_has_conflicts, jtrav_init, jtrav_main, jtrav_shutdown};
pub use error::{HostError, JtravStatus};
