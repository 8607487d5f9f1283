//! Accordion reflow coordination.
//!
//! One list-level shared state (`active_item_id`) is the single source of
//! truth; items react to it rather than talking to each other. Expanding
//! animates panel height from zero to the measured natural height while
//! fading content in, and only one item may hold a nonzero target height:
//! activating another item first collapses the current one, then expands
//! the new one.
//!
//! Height animation shifts everything below the list, so scroll triggers
//! further down the page go stale while a panel moves. The accordion holds
//! a scroll lock for the whole animation, asks for a filtered trigger
//! refresh on settle, and releases the lock only after the host reports
//! the refresh done.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::animation::tween::{Tween, TweenSpec};
use crate::animation::value::{StyleProperty, StyleValue};
use crate::error::{EngineError, Result};
use crate::retry::{MeasurePoll, MeasureRetry};
use crate::surface::Surface;

/// Phase of one accordion panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

type StateSubscriber = Box<dyn FnMut(Option<&str>) + Send>;

#[derive(Default)]
struct StateInner {
    active_item_id: Option<String>,
    subscribers: Vec<StateSubscriber>,
}

/// Shared accordion state, injected into whoever needs to observe which
/// item is active. No parent/child coupling: items and outside observers
/// all go through this handle.
#[derive(Clone, Default)]
pub struct AccordionStateHandle {
    inner: Arc<Mutex<StateInner>>,
}

impl std::fmt::Debug for AccordionStateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccordionStateHandle")
            .field("active_item_id", &self.get())
            .finish()
    }
}

impl AccordionStateHandle {
    /// Fresh state with nothing active.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active item, if any.
    pub fn get(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active_item_id
            .clone()
    }

    /// Set the active item and notify subscribers.
    pub fn set(&self, active: Option<String>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.active_item_id == active {
            return;
        }
        inner.active_item_id = active;
        let current = inner.active_item_id.clone();
        for subscriber in &mut inner.subscribers {
            subscriber(current.as_deref());
        }
    }

    /// Observe active-item changes.
    pub fn subscribe(&self, callback: impl FnMut(Option<&str>) + Send + 'static) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .push(Box::new(callback));
    }
}

/// Ask the host to refresh scroll triggers for these sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Section keys whose triggers sit below the reflowed layout.
    pub sections: Vec<String>,
}

#[derive(Debug)]
struct Item {
    id: String,
    /// The panel element whose height animates.
    panel_id: String,
    phase: PanelPhase,
    height_tween: Option<Tween>,
    fade_tween: Option<Tween>,
    natural_height: f64,
    retry: MeasureRetry,
}

impl Item {
    fn is_animating(&self) -> bool {
        matches!(self.phase, PanelPhase::Expanding | PanelPhase::Collapsing)
    }

    /// The height the panel currently shows.
    fn current_height(&self, surface: &Surface) -> f64 {
        if let Some(tween) = &self.height_tween {
            if let Some(height) = tween.current_value().as_scalar() {
                return height;
            }
        }
        surface
            .inline_style(&self.panel_id, StyleProperty::Height)
            .and_then(|v| v.as_scalar())
            .unwrap_or(0.0)
    }
}

/// Coordinator for one accordion list.
pub struct Accordion {
    /// Sections whose triggers need a refresh after this list reflows.
    affected_sections: Vec<String>,
    state: AccordionStateHandle,
    items: Vec<Item>,
    spec: TweenSpec,
    retry_budget: u32,
    /// Item waiting to expand once the current one finishes collapsing.
    pending_expand: Option<String>,
    scroll_locked: bool,
    /// A refresh was requested and not yet confirmed done.
    awaiting_refresh: bool,
}

impl std::fmt::Debug for Accordion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accordion")
            .field("items", &self.items.len())
            .field("active", &self.state.get())
            .field("scroll_locked", &self.scroll_locked)
            .finish()
    }
}

impl Accordion {
    /// Accordion with the given shared state and panel animation timing.
    pub fn new(
        affected_sections: impl IntoIterator<Item = impl Into<String>>,
        state: AccordionStateHandle,
        spec: TweenSpec,
        retry_budget: u32,
    ) -> Self {
        Self {
            affected_sections: affected_sections.into_iter().map(Into::into).collect(),
            state,
            items: Vec::new(),
            spec,
            retry_budget,
            pending_expand: None,
            scroll_locked: false,
            awaiting_refresh: false,
        }
    }

    /// Register an item and the panel element it expands.
    pub fn add_item(&mut self, item_id: impl Into<String>, panel_id: impl Into<String>) {
        self.items.push(Item {
            id: item_id.into(),
            panel_id: panel_id.into(),
            phase: PanelPhase::Collapsed,
            height_tween: None,
            fade_tween: None,
            natural_height: 0.0,
            retry: MeasureRetry::new(self.retry_budget),
        });
    }

    /// The shared state handle.
    pub fn state_handle(&self) -> AccordionStateHandle {
        self.state.clone()
    }

    /// Phase of an item's panel.
    pub fn phase(&self, item_id: &str) -> Option<PanelPhase> {
        self.items.iter().find(|i| i.id == item_id).map(|i| i.phase)
    }

    /// Whether scrolling is currently held.
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Activate or deactivate an item.
    ///
    /// Toggling the active item collapses it. Activating another item
    /// collapses the current one first and queues the expansion. Toggling
    /// mid-animation retargets the running tween from its current height;
    /// a panel can never stick half-open.
    pub fn toggle(&mut self, item_id: &str, surface: &mut Surface) -> Result<()> {
        if !self.items.iter().any(|i| i.id == item_id) {
            return Err(EngineError::UnknownAccordionItem(item_id.to_string()));
        }
        let active = self.state.get();
        self.scroll_locked = true;

        if active.as_deref() == Some(item_id) {
            self.state.set(None);
            self.pending_expand = None;
            self.begin_collapse(item_id, surface);
            return Ok(());
        }

        self.state.set(Some(item_id.to_string()));
        let open = self
            .items
            .iter()
            .find(|i| {
                matches!(i.phase, PanelPhase::Expanded | PanelPhase::Expanding)
                    && i.id != item_id
            })
            .map(|i| i.id.clone());
        if let Some(open_id) = open {
            // Ordered pair: finish collapsing the open panel, then expand
            // the requested one.
            self.begin_collapse(&open_id, surface);
        }
        // The queue holds the latest request only. A collapse still in
        // flight from an earlier switch also blocks: every other panel must
        // land at zero before the new one expands.
        if self.items.iter().any(|i| i.id != item_id && i.is_animating()) {
            self.pending_expand = Some(item_id.to_string());
        } else {
            self.pending_expand = None;
            self.begin_expand(item_id);
        }
        Ok(())
    }

    /// The host confirmed the post-reflow trigger refresh; release the
    /// scroll lock.
    pub fn notify_refresh_complete(&mut self) {
        if self.awaiting_refresh {
            self.awaiting_refresh = false;
            self.scroll_locked = false;
        }
    }

    /// Advance panel animations one frame.
    ///
    /// Returns a refresh request exactly once per settle: when the last
    /// running panel animation finishes and no expansion is queued.
    pub fn update(&mut self, delta_ms: f32, surface: &mut Surface) -> Option<RefreshRequest> {
        let was_animating = self.items.iter().any(Item::is_animating);

        // Start queued expansions once their predecessor fully collapsed.
        if let Some(pending) = self.pending_expand.clone() {
            let blocked = self
                .items
                .iter()
                .any(|i| i.id != pending && i.is_animating());
            if !blocked {
                self.pending_expand = None;
                self.begin_expand(&pending);
            }
        }

        for index in 0..self.items.len() {
            self.update_item(index, delta_ms, surface);
        }

        let animating = self.items.iter().any(Item::is_animating);
        let settled =
            was_animating && !animating && self.pending_expand.is_none() && self.scroll_locked;
        if settled {
            debug!(sections = ?self.affected_sections, "accordion settled, requesting refresh");
            self.awaiting_refresh = true;
            return Some(RefreshRequest {
                sections: self.affected_sections.clone(),
            });
        }
        None
    }

    fn begin_expand(&mut self, item_id: &str) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) {
            item.phase = PanelPhase::Expanding;
            // The height tween is created in `update` once the natural
            // height measures valid.
            item.height_tween = None;
            item.fade_tween = None;
            item.retry.reset();
        }
    }

    fn begin_collapse(&mut self, item_id: &str, surface: &Surface) {
        let spec = self.spec;
        let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) else {
            return;
        };
        if item.phase == PanelPhase::Collapsed {
            return;
        }
        item.phase = PanelPhase::Collapsing;
        let from_height = item.current_height(surface);
        match item.height_tween.as_mut() {
            // Mid-flight: redirect from the current height.
            Some(tween) if tween.is_live() => tween.retarget(StyleValue::from(0.0), spec),
            _ => {
                item.height_tween = Some(Tween::new(
                    &item.panel_id,
                    StyleProperty::Height,
                    StyleValue::from(from_height),
                    StyleValue::from(0.0),
                    spec,
                ));
            }
        }
        match item.fade_tween.as_mut() {
            Some(tween) if tween.is_live() => tween.retarget(StyleValue::from(0.0), spec),
            _ => {
                item.fade_tween = Some(Tween::new(
                    &item.panel_id,
                    StyleProperty::Opacity,
                    StyleValue::from(1.0),
                    StyleValue::from(0.0),
                    spec,
                ));
            }
        }
    }

    fn update_item(&mut self, index: usize, delta_ms: f32, surface: &mut Surface) {
        let spec = self.spec;
        let item = &mut self.items[index];

        if item.phase == PanelPhase::Expanding && item.height_tween.is_none() {
            let panel_id = item.panel_id.clone();
            let poll = item
                .retry
                .poll(|| measure_natural_height(&panel_id, surface), |h| *h > 0.0);
            let Some(natural) = poll.into_value() else {
                return;
            };
            item.natural_height = natural;
            let from = surface
                .inline_style(&item.panel_id, StyleProperty::Height)
                .and_then(|v| v.as_scalar())
                .unwrap_or(0.0);
            item.height_tween = Some(Tween::new(
                &item.panel_id,
                StyleProperty::Height,
                StyleValue::from(from),
                StyleValue::from(natural),
                spec,
            ));
            item.fade_tween = Some(Tween::new(
                &item.panel_id,
                StyleProperty::Opacity,
                StyleValue::from(0.0),
                StyleValue::from(1.0),
                spec,
            ));
        }

        let mut height_live = false;
        if let Some(tween) = item.height_tween.as_mut() {
            height_live = tween.update(delta_ms);
            surface.set_style(&tween.element_id, tween.property, tween.current_value());
        }
        if let Some(tween) = item.fade_tween.as_mut() {
            tween.update(delta_ms);
            surface.set_style(&tween.element_id, tween.property, tween.current_value());
        }

        if !height_live && item.height_tween.is_some() {
            match item.phase {
                PanelPhase::Expanding => item.phase = PanelPhase::Expanded,
                PanelPhase::Collapsing => {
                    item.phase = PanelPhase::Collapsed;
                    item.height_tween = None;
                    item.fade_tween = None;
                }
                _ => {}
            }
        }
    }
}

fn measure_natural_height(panel_id: &str, surface: &Surface) -> f64 {
    surface.measure(panel_id).map(|g| g.height).unwrap_or(0.0)
}

static_assertions::assert_impl_all!(Accordion: Send);
static_assertions::assert_impl_all!(AccordionStateHandle: Send, Sync);
