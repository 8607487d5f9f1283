//! Segue — a scroll-synchronized transition engine.
//!
//! This crate re-exports the engine; see `segue-engine` for the full API.

pub use segue_engine::*;
