//! Segue: a scroll-synchronized transition engine.
//!
//! The animation-orchestration layer of a single-page site, driven by a
//! host that owns rendering, input, and the document itself. The engine
//! sequences page-to-page transitions, scroll-linked reveals, an infinite
//! marquee loop, accordion layout reflow, and a spring-physics cursor
//! line over an opaque element [`Surface`].
//!
//! Everything is frame-driven and cooperative: the host calls `update`
//! methods with a delta each frame (or registers them on a
//! [`FrameScheduler`]), and completion is reported through return values
//! and the [`EventQueue`], never by blocking.

pub mod accordion;
pub mod animation;
pub mod bind;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod marquee;
pub mod retry;
pub mod springline;
pub mod surface;
pub mod triggers;

pub use accordion::{Accordion, AccordionStateHandle, PanelPhase, RefreshRequest};
pub use animation::{
    CallbackId, EasingFunction, FrameScheduler, Interpolate, StyleProperty, StyleValue,
    TickOutcome, Timeline, Tween, TweenId, TweenPhase, TweenSpec,
};
pub use bind::{BindingRecipe, BindingRegistry, RecipeKind, SlideDirection};
pub use error::{EngineError, Result};
pub use events::{EngineEvent, EventQueue, TriggerEdge};
pub use lifecycle::{StateHandle, TransitionCoordinator, TransitionPhase, TransitionState};
pub use marquee::Marquee;
pub use retry::{MeasurePoll, MeasureRetry};
pub use springline::{SpringLine, SpringState};
pub use surface::{Geometry, SplitUnit, Surface};
pub use triggers::{
    ScrollTriggerManager, TriggerHandle, TriggerOffset, TriggerSpec, Viewport,
};
