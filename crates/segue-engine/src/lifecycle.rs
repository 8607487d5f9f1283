//! Page-transition lifecycle coordination.
//!
//! One coordinator owns the `Idle → LeaveRunning → Swapping → EnterRunning
//! → Idle` state machine and is the only writer of the shared
//! `TransitionState`; everything else (trigger gating, overlays, the host)
//! reads through a cloned handle. Sequencing is structural: the swap
//! callback cannot run before the leave timeline completes (or times out),
//! and the entrance cannot start before the swap, the minimum load time,
//! and the font gate.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use segue_config::TransitionConfig;

use crate::animation::timeline::Timeline;
use crate::bind::BindingRegistry;
use crate::events::{EngineEvent, EventQueue};
use crate::surface::Surface;

/// Phase of the navigation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    /// No navigation in flight.
    Idle,
    /// Exit animations running on the outgoing page.
    LeaveRunning,
    /// Handing the document swap to the host.
    Swapping,
    /// Entrance animations running (or gated) on the incoming page.
    EnterRunning,
}

/// Shared navigation state, single-writer (the coordinator), many-reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionState {
    /// Current phase.
    pub phase: TransitionPhase,
    /// True for exactly one contiguous interval per navigation.
    pub is_transitioning: bool,
    /// True until the first entrance sequence completes.
    pub is_first_load: bool,
    /// Overlay element shown while a navigation is in flight, if any.
    pub pending_overlay: Option<String>,
    /// Completed navigations; trigger gating compares generations with
    /// this to flush deferred attachments.
    pub navigation_count: u64,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            phase: TransitionPhase::Idle,
            is_transitioning: false,
            is_first_load: true,
            pending_overlay: None,
            navigation_count: 0,
        }
    }
}

/// Cloneable read handle onto the coordinator's state.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<RwLock<TransitionState>>,
}

impl StateHandle {
    /// Snapshot the current state.
    pub fn get(&self) -> TransitionState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, state: TransitionState) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

type SwapHandler = Box<dyn FnMut(&mut Surface) + Send>;
type IdleCallback = Box<dyn FnMut(&TransitionState) + Send>;

/// The navigation lifecycle coordinator.
pub struct TransitionCoordinator {
    config: TransitionConfig,
    state: StateHandle,
    current_route: Option<String>,
    target_route: Option<String>,
    /// Latest navigation requested while not idle; starts once idle again.
    pending_route: Option<String>,
    leave_timeline: Option<Timeline>,
    enter_timeline: Option<Timeline>,
    /// Milliseconds since the in-flight navigation began.
    nav_elapsed_ms: f32,
    swap_handler: Option<SwapHandler>,
    idle_callbacks: Vec<IdleCallback>,
}

impl std::fmt::Debug for TransitionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionCoordinator")
            .field("state", &self.state.get())
            .field("current_route", &self.current_route)
            .field("pending_route", &self.pending_route)
            .finish()
    }
}

impl TransitionCoordinator {
    /// Coordinator in the idle, first-load state.
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            state: StateHandle::default(),
            current_route: None,
            target_route: None,
            pending_route: None,
            leave_timeline: None,
            enter_timeline: None,
            nav_elapsed_ms: 0.0,
            swap_handler: None,
            idle_callbacks: Vec::new(),
        }
    }

    /// A read handle other components poll.
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    /// Current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.state.get().phase
    }

    /// Route currently displayed, once the first swap has happened.
    pub fn current_route(&self) -> Option<&str> {
        self.current_route.as_deref()
    }

    /// Install the host's document-swap callback.
    pub fn set_swap_handler(&mut self, handler: impl FnMut(&mut Surface) + Send + 'static) {
        self.swap_handler = Some(Box::new(handler));
    }

    /// Show this overlay element while navigations are in flight.
    pub fn set_pending_overlay(&mut self, element_id: impl Into<String>) {
        let mut state = self.state.get();
        state.pending_overlay = Some(element_id.into());
        self.state.set(state);
    }

    /// Observe returns to idle. Fires after every completed entrance,
    /// first load included.
    pub fn on_idle(&mut self, callback: impl FnMut(&TransitionState) + Send + 'static) {
        self.idle_callbacks.push(Box::new(callback));
    }

    /// Run the first-load entrance sequence without a navigation.
    ///
    /// `is_transitioning` stays false: a first load is not a navigation,
    /// and the one-interval-per-navigation invariant starts counting from
    /// the first `begin_navigation`.
    pub fn start_first_load(&mut self, route: impl Into<String>, events: &mut EventQueue) {
        let mut state = self.state.get();
        if state.phase != TransitionPhase::Idle || !state.is_first_load {
            warn!("first load requested twice, ignoring");
            return;
        }
        self.current_route = Some(route.into());
        self.nav_elapsed_ms = 0.0;
        // The enter timeline is compiled lazily in `update` once the
        // gates open, same as a navigation entrance.
        state.phase = TransitionPhase::EnterRunning;
        self.state.set(state);
        events.push(EngineEvent::PhaseChanged {
            phase: TransitionPhase::EnterRunning,
        });
    }

    /// Request a navigation to `route`.
    ///
    /// If a navigation is already in flight the request is queued and
    /// starts once the coordinator returns to idle; only the latest queued
    /// request is retained.
    pub fn begin_navigation(
        &mut self,
        route: impl Into<String>,
        registry: &BindingRegistry,
        surface: &mut Surface,
        events: &mut EventQueue,
    ) {
        let route = route.into();
        if self.state.get().phase != TransitionPhase::Idle {
            debug!(route = %route, "navigation while busy, queued");
            self.pending_route = Some(route);
            return;
        }
        self.start_navigation(route, registry, surface, events);
    }

    fn start_navigation(
        &mut self,
        route: String,
        registry: &BindingRegistry,
        surface: &mut Surface,
        events: &mut EventQueue,
    ) {
        events.push(EngineEvent::NavigationStarted {
            route: route.clone(),
        });
        self.target_route = Some(route);
        self.nav_elapsed_ms = 0.0;
        self.leave_timeline = Some(registry.build_leave_timeline(surface));
        self.enter_timeline = None;

        let mut state = self.state.get();
        state.is_transitioning = true;
        state.phase = TransitionPhase::LeaveRunning;
        self.state.set(state);
        events.push(EngineEvent::PhaseChanged {
            phase: TransitionPhase::LeaveRunning,
        });
    }

    /// Advance the lifecycle by one frame.
    ///
    /// A queued navigation starts on the first idle frame after the
    /// previous one completes, so there is always an observable idle
    /// interval between back-to-back navigations.
    pub fn update(
        &mut self,
        delta_ms: f32,
        registry: &BindingRegistry,
        surface: &mut Surface,
        events: &mut EventQueue,
    ) {
        let phase = self.state.get().phase;
        if phase == TransitionPhase::Idle {
            if let Some(route) = self.pending_route.take() {
                self.start_navigation(route, registry, surface, events);
            }
            return;
        }
        self.nav_elapsed_ms += delta_ms;

        match phase {
            TransitionPhase::Idle => {}
            TransitionPhase::LeaveRunning => self.update_leave(delta_ms, surface, events),
            TransitionPhase::Swapping => self.run_swap(surface, events),
            TransitionPhase::EnterRunning => {
                self.update_enter(delta_ms, registry, surface, events)
            }
        }
    }

    fn update_leave(&mut self, delta_ms: f32, surface: &mut Surface, events: &mut EventQueue) {
        let finished = match self.leave_timeline.as_mut() {
            Some(timeline) => !timeline.update(surface, delta_ms),
            None => true,
        };
        let timed_out = self.nav_elapsed_ms >= self.config.leave_timeout_ms;
        if timed_out && !finished {
            warn!(
                elapsed_ms = self.nav_elapsed_ms,
                "leave animations exceeded timeout, swapping anyway"
            );
            if let Some(timeline) = self.leave_timeline.as_mut() {
                timeline.cancel();
            }
        }
        if finished || timed_out {
            self.leave_timeline = None;
            let mut state = self.state.get();
            state.phase = TransitionPhase::Swapping;
            self.state.set(state);
            events.push(EngineEvent::PhaseChanged {
                phase: TransitionPhase::Swapping,
            });
        }
    }

    fn run_swap(&mut self, surface: &mut Surface, events: &mut EventQueue) {
        if let Some(handler) = self.swap_handler.as_mut() {
            handler(surface);
        }
        self.current_route = self.target_route.take();
        let mut state = self.state.get();
        state.phase = TransitionPhase::EnterRunning;
        self.state.set(state);
        events.push(EngineEvent::PhaseChanged {
            phase: TransitionPhase::EnterRunning,
        });
    }

    fn update_enter(
        &mut self,
        delta_ms: f32,
        registry: &BindingRegistry,
        surface: &mut Surface,
        events: &mut EventQueue,
    ) {
        if self.enter_timeline.is_none() {
            if !self.enter_gates_open(surface) {
                return;
            }
            self.enter_timeline = Some(registry.build_enter_timeline(surface));
        }
        let finished = match self.enter_timeline.as_mut() {
            Some(timeline) => !timeline.update(surface, delta_ms),
            None => true,
        };
        if finished {
            self.enter_timeline = None;
            self.finish(events);
        }
    }

    /// Minimum load time and font gate, both deadline-bounded.
    fn enter_gates_open(&self, surface: &Surface) -> bool {
        if self.nav_elapsed_ms < self.config.min_load_ms {
            return false;
        }
        if !surface.fonts_ready() && self.nav_elapsed_ms < self.config.font_fallback_ms {
            return false;
        }
        true
    }

    fn finish(&mut self, events: &mut EventQueue) {
        let mut state = self.state.get();
        let was_navigation = state.is_transitioning;
        state.phase = TransitionPhase::Idle;
        state.is_transitioning = false;
        state.is_first_load = false;
        if was_navigation {
            state.navigation_count += 1;
        }
        self.state.set(state.clone());

        if was_navigation {
            if let Some(route) = self.current_route.clone() {
                events.push(EngineEvent::NavigationFinished { route });
            }
        }
        events.push(EngineEvent::PhaseChanged {
            phase: TransitionPhase::Idle,
        });
        for callback in &mut self.idle_callbacks {
            callback(&state);
        }
    }

    /// Whether a queued navigation is waiting for idle.
    pub fn has_pending_navigation(&self) -> bool {
        self.pending_route.is_some()
    }
}

static_assertions::assert_impl_all!(TransitionCoordinator: Send);
static_assertions::assert_impl_all!(StateHandle: Send, Sync);
