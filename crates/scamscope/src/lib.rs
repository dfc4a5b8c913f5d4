//! Public facade crate for `scamscope`.
//!
//! No IO or provider-specific logic lives here; it re-exports the backend-agnostic types and
//! the `ModelBackend` trait from `scamscope-core`.

pub use scamscope_core::*;
