//! Engine lifecycle events.
//!
//! Components collect events into an `EventQueue` during their updates;
//! the host drains the queue once per frame to react to navigation,
//! trigger, and refresh milestones. Events are serde-serializable so a
//! host bridge can forward them as data.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::lifecycle::TransitionPhase;

/// Which edge of a scroll trigger fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEdge {
    /// Scrolled forward past the start offset.
    Enter,
    /// Scrolled forward past the end offset.
    Leave,
    /// Scrolled backward past the end offset.
    EnterBack,
    /// Scrolled backward past the start offset.
    LeaveBack,
}

/// An event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A navigation left the idle state.
    NavigationStarted {
        /// Destination route.
        route: String,
    },
    /// The lifecycle coordinator changed phase.
    PhaseChanged {
        /// The phase just entered.
        phase: TransitionPhase,
    },
    /// A navigation's entrance sequence completed.
    NavigationFinished {
        /// Destination route.
        route: String,
    },
    /// A scroll trigger fired one of its edges.
    TriggerFired {
        /// Logical section key the trigger belongs to.
        section: String,
        /// Which edge fired.
        edge: TriggerEdge,
    },
    /// A debounced trigger refresh pass completed.
    RefreshCompleted {
        /// Number of handles recomputed.
        refreshed: usize,
    },
    /// A marquee started or stopped translating.
    LoopStateChanged {
        /// Whether the loop is now running.
        running: bool,
    },
}

impl EngineEvent {
    /// The section key, for trigger events.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::TriggerFired { section, .. } => Some(section),
            _ => None,
        }
    }

    /// Whether this event marks the end of a navigation.
    pub fn is_navigation_finished(&self) -> bool {
        matches!(self, Self::NavigationFinished { .. })
    }
}

/// FIFO queue of engine events, drained by the host each frame.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<EngineEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: EngineEvent) {
        self.events.push_back(event);
    }

    /// Remove and return the oldest event.
    pub fn pop(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }

    /// Peek at the oldest event without removing it.
    pub fn peek(&self) -> Option<&EngineEvent> {
        self.events.front()
    }

    /// Drain all pending events in order.
    pub fn drain(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.events.drain(..)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discard all pending events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
