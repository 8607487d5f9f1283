//! Error types for the engine's host-facing API.
//!
//! Internal layout/measurement problems are recovered locally (retry,
//! fallback, degrade) and never surface here; these errors cover host API
//! misuse only.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned to the host.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The referenced element does not exist on the surface.
    #[error("unknown element: {0}")]
    UnknownElement(String),

    /// Text splitting was requested on an element without text content.
    #[error("element {0} has no text content to split")]
    NoTextContent(String),

    /// A viewport-relative offset string could not be parsed.
    #[error("invalid viewport offset {input:?}: {reason}")]
    InvalidOffset { input: String, reason: String },

    /// Marquee speed must be strictly positive; direction is controlled by
    /// the `reversed` flag, never by a negative speed.
    #[error("marquee speed must be positive, got {0}; use `reversed` for direction")]
    InvalidSpeed(f64),

    /// A marquee was built with no items.
    #[error("marquee requires at least one item")]
    EmptyMarquee,

    /// An accordion operation referenced an unknown item.
    #[error("unknown accordion item: {0}")]
    UnknownAccordionItem(String),
}
