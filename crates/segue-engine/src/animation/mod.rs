//! Animation primitives: values, easing, tweens, timelines, and the
//! per-frame scheduler.
//!
//! ```text
//! FrameScheduler
//!   └── tick(delta_ms) → registered callbacks, in registration order
//!
//! Timeline
//!   └── offset-scheduled Tweens → interpolated StyleValues → Surface
//! ```
//!
//! Everything above this layer (bindings, lifecycle, triggers, marquee,
//! accordion, spring line) composes these primitives; nothing above it
//! interpolates by hand.

pub mod easing;
pub mod scheduler;
pub mod timeline;
pub mod tween;
pub mod value;

pub use easing::EasingFunction;
pub use scheduler::{CallbackId, FrameScheduler, TickOutcome};
pub use timeline::Timeline;
pub use tween::{Tween, TweenId, TweenPhase, TweenSpec};
pub use value::{Interpolate, StyleProperty, StyleValue};
