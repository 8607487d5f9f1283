//! Scroll-trigger lifecycle management.
//!
//! Triggers tie scroll positions to callbacks and scrubbed timelines. The
//! manager owns every live trigger and enforces the one-handle-per-section
//! invariant structurally: attaching a section kills the prior handle
//! before the new one exists, so duplicated or stale triggers cannot
//! accumulate across navigations.
//!
//! Offsets are parsed from viewport-relative strings ("top 80%",
//! "center center") into element/viewport anchor fractions; the pixel
//! positions are derived per scroll from cached element geometry, and a
//! refresh replaces that cache from fresh measurement rather than patching
//! it.

use tracing::{debug, warn};

use segue_config::TriggerConfig;

use crate::animation::timeline::Timeline;
use crate::animation::value::{StyleProperty, StyleValue};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventQueue, TriggerEdge};
use crate::lifecycle::{TransitionPhase, TransitionState};
use crate::surface::{Geometry, Surface};

/// The host's scroll state, handed to `scroll` each time it changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Current scroll offset from the top of the page, in pixels.
    pub scroll_y: f64,
    /// Viewport height in pixels.
    pub height: f64,
}

/// A parsed viewport-relative offset: which point of the element meets
/// which point of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerOffset {
    /// Fraction down the element (0.0 top, 1.0 bottom).
    pub element_frac: f64,
    /// Fraction down the viewport (0.0 top, 1.0 bottom).
    pub viewport_frac: f64,
}

impl TriggerOffset {
    /// Parse an offset string such as "top 80%" or "center center".
    ///
    /// The first token anchors the element, the second the viewport; each
    /// is `top`, `center`, `bottom`, or a percentage.
    pub fn parse(input: &str) -> Result<Self> {
        let mut tokens = input.split_whitespace();
        let element = tokens.next().ok_or_else(|| EngineError::InvalidOffset {
            input: input.to_string(),
            reason: "expected two anchor tokens".to_string(),
        })?;
        let viewport = tokens.next().ok_or_else(|| EngineError::InvalidOffset {
            input: input.to_string(),
            reason: "missing viewport anchor".to_string(),
        })?;
        if tokens.next().is_some() {
            return Err(EngineError::InvalidOffset {
                input: input.to_string(),
                reason: "expected exactly two anchor tokens".to_string(),
            });
        }
        Ok(Self {
            element_frac: parse_anchor(element, input)?,
            viewport_frac: parse_anchor(viewport, input)?,
        })
    }

    /// The scroll offset at which this trigger point is crossed, for an
    /// element with the given geometry.
    fn scroll_position(&self, geometry: Geometry, viewport: Viewport) -> f64 {
        geometry.offset_top + geometry.height * self.element_frac
            - viewport.height * self.viewport_frac
    }
}

fn parse_anchor(token: &str, input: &str) -> Result<f64> {
    match token {
        "top" => Ok(0.0),
        "center" => Ok(0.5),
        "bottom" => Ok(1.0),
        _ => {
            let percent = token
                .strip_suffix('%')
                .and_then(|n| n.parse::<f64>().ok())
                .ok_or_else(|| EngineError::InvalidOffset {
                    input: input.to_string(),
                    reason: format!("unrecognized anchor {token:?}"),
                })?;
            Ok(percent / 100.0)
        }
    }
}

type TriggerAction = Box<dyn FnMut() + Send>;

/// Declaration of one scroll trigger.
pub struct TriggerSpec {
    element_id: String,
    start: TriggerOffset,
    end: TriggerOffset,
    pinned: bool,
    on_enter: Option<TriggerAction>,
    on_leave: Option<TriggerAction>,
    on_enter_back: Option<TriggerAction>,
    on_leave_back: Option<TriggerAction>,
    scrub: Option<Timeline>,
}

impl std::fmt::Debug for TriggerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerSpec")
            .field("element_id", &self.element_id)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("pinned", &self.pinned)
            .field("scrub", &self.scrub.is_some())
            .finish()
    }
}

impl TriggerSpec {
    /// Trigger on `element_id` between the parsed start and end offsets.
    pub fn new(element_id: impl Into<String>, start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            element_id: element_id.into(),
            start: TriggerOffset::parse(start)?,
            end: TriggerOffset::parse(end)?,
            pinned: false,
            on_enter: None,
            on_leave: None,
            on_enter_back: None,
            on_leave_back: None,
            scrub: None,
        })
    }

    /// Pin the element in place while the trigger range is active.
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Fire when scrolling forward past the start offset.
    pub fn on_enter(mut self, action: impl FnMut() + Send + 'static) -> Self {
        self.on_enter = Some(Box::new(action));
        self
    }

    /// Fire when scrolling forward past the end offset.
    pub fn on_leave(mut self, action: impl FnMut() + Send + 'static) -> Self {
        self.on_leave = Some(Box::new(action));
        self
    }

    /// Fire when scrolling backward past the end offset.
    pub fn on_enter_back(mut self, action: impl FnMut() + Send + 'static) -> Self {
        self.on_enter_back = Some(Box::new(action));
        self
    }

    /// Fire when scrolling backward past the start offset.
    pub fn on_leave_back(mut self, action: impl FnMut() + Send + 'static) -> Self {
        self.on_leave_back = Some(Box::new(action));
        self
    }

    /// Scrub this timeline with the trigger's progress.
    pub fn with_scrub(mut self, timeline: Timeline) -> Self {
        self.scrub = Some(timeline);
        self
    }

    /// Whether a layout refresh must recompute this trigger.
    ///
    /// Pinned and edge-firing triggers depend on absolute positions and go
    /// stale when layout shifts; a scrub-only trigger recomputes its
    /// progress from geometry every frame and stays correct without help.
    pub fn refresh_sensitive(&self) -> bool {
        self.pinned
            || self.on_enter.is_some()
            || self.on_leave.is_some()
            || self.on_enter_back.is_some()
            || self.on_leave_back.is_some()
    }
}

/// Identifier of a live trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerHandle(u64);

struct LiveTrigger {
    handle: TriggerHandle,
    section: String,
    spec: TriggerSpec,
    /// Geometry snapshot taken at attach/refresh time.
    geometry: Geometry,
    /// Whether the scroll position currently sits inside the range.
    active: bool,
}

type RefreshCallback = Box<dyn FnMut() + Send>;

/// Manager of all live scroll triggers.
pub struct ScrollTriggerManager {
    triggers: Vec<LiveTrigger>,
    next_handle: u64,
    /// Attachments deferred until the coordinator is observed idle.
    pending: Vec<(String, TriggerSpec)>,
    debounce_ms: f32,
    /// Remaining debounce time of a requested refresh, if one is pending.
    refresh_timer: Option<f32>,
    /// Sections the pending refresh is limited to; `None` means all.
    refresh_filter: Option<Vec<String>>,
    post_refresh: Vec<RefreshCallback>,
    last_scroll_y: f64,
}

impl std::fmt::Debug for ScrollTriggerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollTriggerManager")
            .field("live", &self.triggers.len())
            .field("pending", &self.pending.len())
            .field("refresh_pending", &self.refresh_timer.is_some())
            .finish()
    }
}

impl ScrollTriggerManager {
    /// Manager with the configured refresh debounce window.
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            triggers: Vec::new(),
            next_handle: 0,
            pending: Vec::new(),
            debounce_ms: config.refresh_debounce_ms,
            refresh_timer: None,
            refresh_filter: None,
            post_refresh: Vec::new(),
            last_scroll_y: 0.0,
        }
    }

    /// Attach a trigger for a logical section, killing any prior live
    /// handle for the same section first.
    pub fn attach(
        &mut self,
        section: impl Into<String>,
        spec: TriggerSpec,
        surface: &Surface,
    ) -> Result<TriggerHandle> {
        let section = section.into();
        let geometry = surface
            .measure(&spec.element_id)
            .ok_or_else(|| EngineError::UnknownElement(spec.element_id.clone()))?;

        let before = self.triggers.len();
        self.triggers.retain(|t| t.section != section);
        if self.triggers.len() != before {
            debug!(section = %section, "replaced live trigger for section");
        }

        self.next_handle += 1;
        let handle = TriggerHandle(self.next_handle);
        self.triggers.push(LiveTrigger {
            handle,
            section,
            spec,
            geometry,
            active: false,
        });
        Ok(handle)
    }

    /// Queue an attachment until the transition coordinator is observed
    /// idle after a navigation. `sync` flushes the queue.
    pub fn queue_attach(&mut self, section: impl Into<String>, spec: TriggerSpec) {
        let section = section.into();
        self.pending.retain(|(s, _)| *s != section);
        self.pending.push((section, spec));
    }

    /// Flush queued attachments if the coordinator state allows it.
    /// Returns the number attached.
    pub fn sync(&mut self, state: &TransitionState, surface: &Surface) -> usize {
        if state.phase != TransitionPhase::Idle || state.is_transitioning || state.is_first_load {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending);
        let mut attached = 0;
        for (section, spec) in pending {
            match self.attach(section, spec, surface) {
                Ok(_) => attached += 1,
                Err(err) => warn!(%err, "queued trigger attach failed"),
            }
        }
        attached
    }

    /// Detach a trigger. Returns true if it was live.
    pub fn detach(&mut self, handle: TriggerHandle) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|t| t.handle != handle);
        self.triggers.len() != before
    }

    /// Number of live triggers.
    pub fn live_count(&self) -> usize {
        self.triggers.len()
    }

    /// The live handle for a section, if any.
    pub fn section_handle(&self, section: &str) -> Option<TriggerHandle> {
        self.triggers
            .iter()
            .find(|t| t.section == section)
            .map(|t| t.handle)
    }

    /// Evaluate every live trigger against a new scroll position.
    pub fn scroll(&mut self, viewport: Viewport, surface: &mut Surface, events: &mut EventQueue) {
        let previous = self.last_scroll_y;
        let forward = viewport.scroll_y >= previous;
        self.last_scroll_y = viewport.scroll_y;

        for trigger in &mut self.triggers {
            let start = trigger.spec.start.scroll_position(trigger.geometry, viewport);
            let end = trigger.spec.end.scroll_position(trigger.geometry, viewport);
            let span = (end - start).max(1.0);
            let progress = ((viewport.scroll_y - start) / span).clamp(0.0, 1.0);
            let inside = viewport.scroll_y >= start && viewport.scroll_y < end;

            if inside && !trigger.active {
                let edge = if forward {
                    TriggerEdge::Enter
                } else {
                    TriggerEdge::EnterBack
                };
                fire(trigger, edge, events);
            } else if !inside && trigger.active {
                let edge = if forward {
                    TriggerEdge::Leave
                } else {
                    TriggerEdge::LeaveBack
                };
                fire(trigger, edge, events);
            } else if !inside && !trigger.active {
                // A fast scroll can jump the whole range within one event;
                // both edges still fire, in travel order.
                if forward && previous < start && viewport.scroll_y >= end {
                    fire(trigger, TriggerEdge::Enter, events);
                    fire(trigger, TriggerEdge::Leave, events);
                } else if !forward && previous >= end && viewport.scroll_y < start {
                    fire(trigger, TriggerEdge::EnterBack, events);
                    fire(trigger, TriggerEdge::LeaveBack, events);
                }
            }
            trigger.active = inside;

            if trigger.spec.pinned {
                let offset = if inside {
                    viewport.scroll_y - start
                } else if viewport.scroll_y >= end {
                    end - start
                } else {
                    0.0
                };
                surface.set_style(
                    &trigger.spec.element_id,
                    StyleProperty::TranslateY,
                    StyleValue::from(offset),
                );
            }
            if let Some(timeline) = trigger.spec.scrub.as_ref() {
                timeline.seek(surface, progress as f32);
            }
        }
    }

    /// Request a debounced refresh of refresh-sensitive triggers.
    ///
    /// A burst of requests within the debounce window coalesces into one
    /// pass; filters merge, and an unfiltered request widens the pass to
    /// every sensitive trigger.
    pub fn request_refresh(&mut self, sections: Option<&[&str]>) {
        match (&mut self.refresh_filter, sections) {
            // An earlier unfiltered request already covers everything.
            (None, _) if self.refresh_timer.is_some() => {}
            (_, None) => self.refresh_filter = None,
            (Some(filter), Some(sections)) => {
                for section in sections {
                    if !filter.iter().any(|s| s == section) {
                        filter.push((*section).to_string());
                    }
                }
            }
            (slot @ None, Some(sections)) => {
                *slot = Some(sections.iter().map(|s| s.to_string()).collect());
            }
        }
        self.refresh_timer = Some(self.debounce_ms);
    }

    /// Run a callback once, after the next completed refresh pass.
    pub fn on_refreshed(&mut self, callback: impl FnMut() + Send + 'static) {
        self.post_refresh.push(Box::new(callback));
    }

    /// Whether a refresh is waiting out its debounce window.
    pub fn refresh_pending(&self) -> bool {
        self.refresh_timer.is_some()
    }

    /// Advance the debounce clock; runs the refresh pass when it expires.
    pub fn update(&mut self, delta_ms: f32, surface: &Surface, events: &mut EventQueue) {
        let Some(timer) = self.refresh_timer.as_mut() else {
            return;
        };
        *timer -= delta_ms;
        if *timer > 0.0 {
            return;
        }
        self.refresh_timer = None;
        let filter = self.refresh_filter.take();
        let refreshed = self.refresh_from_measurement(surface, |trigger| {
            trigger.spec.refresh_sensitive()
                && filter
                    .as_ref()
                    .is_none_or(|sections| sections.iter().any(|s| *s == trigger.section))
        });
        events.push(EngineEvent::RefreshCompleted { refreshed });
        for mut callback in self.post_refresh.drain(..) {
            callback();
        }
    }

    /// Resize path: recompute every handle from fresh measurement
    /// immediately, sensitivity and debounce notwithstanding.
    pub fn invalidate_all(&mut self, surface: &Surface) -> usize {
        self.refresh_timer = None;
        self.refresh_filter = None;
        self.refresh_from_measurement(surface, |_| true)
    }

    fn refresh_from_measurement(
        &mut self,
        surface: &Surface,
        mut include: impl FnMut(&LiveTrigger) -> bool,
    ) -> usize {
        let mut refreshed = 0;
        for trigger in &mut self.triggers {
            if !include(trigger) {
                continue;
            }
            match surface.measure(&trigger.spec.element_id) {
                Some(geometry) => {
                    trigger.geometry = geometry;
                    refreshed += 1;
                }
                None => warn!(
                    element = %trigger.spec.element_id,
                    "trigger element missing at refresh, keeping stale geometry"
                ),
            }
        }
        refreshed
    }
}

fn fire(trigger: &mut LiveTrigger, edge: TriggerEdge, events: &mut EventQueue) {
    let action = match edge {
        TriggerEdge::Enter => trigger.spec.on_enter.as_mut(),
        TriggerEdge::Leave => trigger.spec.on_leave.as_mut(),
        TriggerEdge::EnterBack => trigger.spec.on_enter_back.as_mut(),
        TriggerEdge::LeaveBack => trigger.spec.on_leave_back.as_mut(),
    };
    if let Some(action) = action {
        action();
    }
    events.push(EngineEvent::TriggerFired {
        section: trigger.section.clone(),
        edge,
    });
}

static_assertions::assert_impl_all!(ScrollTriggerManager: Send);
