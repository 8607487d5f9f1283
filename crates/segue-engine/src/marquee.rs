//! Infinite horizontal marquee loop.
//!
//! A fixed snapshot of items translates along one axis and wraps modulo
//! the track width; nothing is ever duplicated or re-created. Speed is
//! always positive — direction is carried exclusively by the `reversed`
//! flag, so `resume` can continue the current direction while `play`
//! resets to the forward default.
//!
//! Pausing is the OR of three independent gates (explicit pause, viewport
//! visibility, hover). The gates only ever flip their own flag, so the
//! order in which scroll and pointer events arrive within a frame cannot
//! change the outcome.

use tracing::warn;

use segue_config::MarqueeConfig;

use crate::animation::scheduler::TickOutcome;
use crate::animation::value::{StyleProperty, StyleValue};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventQueue};
use crate::retry::{MeasurePoll, MeasureRetry};
use crate::surface::Surface;

#[derive(Debug, Clone)]
struct ItemSlot {
    id: String,
    /// Resting left offset relative to the first item.
    base_left: f64,
    width: f64,
}

/// Layout snapshot taken from measurement.
#[derive(Debug, Clone, Default)]
struct TrackLayout {
    slots: Vec<ItemSlot>,
    track_width: f64,
}

/// The horizontal loop engine for one marquee.
#[derive(Debug)]
pub struct Marquee {
    item_ids: Vec<String>,
    gap: f64,
    padding_right: f64,
    /// Pixels per second; always positive.
    speed: f64,
    reversed: bool,
    user_paused: bool,
    hidden: bool,
    hovered: bool,
    /// Distance travelled along the track, wrapped to `[0, track_width)`.
    offset: f64,
    layout: TrackLayout,
    measured: bool,
    retry: MeasureRetry,
    last_running: Option<bool>,
}

impl Marquee {
    /// Marquee over the given item elements, configured with defaults.
    ///
    /// Fails on an empty item list or a non-positive speed; callers wanting
    /// the opposite direction set `reverse()`, never a negative speed.
    pub fn new(
        item_ids: impl IntoIterator<Item = impl Into<String>>,
        config: &MarqueeConfig,
    ) -> Result<Self> {
        let item_ids: Vec<String> = item_ids.into_iter().map(Into::into).collect();
        if item_ids.is_empty() {
            return Err(EngineError::EmptyMarquee);
        }
        if config.speed <= 0.0 {
            return Err(EngineError::InvalidSpeed(config.speed));
        }
        Ok(Self {
            item_ids,
            gap: config.gap,
            padding_right: config.padding_right,
            speed: config.speed,
            reversed: false,
            user_paused: false,
            hidden: false,
            hovered: false,
            offset: 0.0,
            layout: TrackLayout::default(),
            measured: false,
            retry: MeasureRetry::new(config.measure_retry_budget),
            last_running: None,
        })
    }

    /// Change the loop speed. Direction stays with `reversed`.
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        if speed <= 0.0 {
            return Err(EngineError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Stop translating until `resume` or `play`.
    pub fn pause(&mut self) {
        self.user_paused = true;
    }

    /// Continue in the current direction.
    pub fn resume(&mut self) {
        self.user_paused = false;
    }

    /// Unpause and reset to the forward direction.
    pub fn play(&mut self) {
        self.user_paused = false;
        self.reversed = false;
    }

    /// Flip the travel direction.
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Whether the loop currently runs in reverse.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Visibility gate, driven by a scroll trigger's enter/leave edges.
    pub fn set_visible(&mut self, visible: bool) {
        self.hidden = !visible;
    }

    /// Hover gate. Clearing it does not force a resume; the other gates
    /// still apply.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Whether any gate currently holds the loop.
    pub fn is_paused(&self) -> bool {
        self.user_paused || self.hidden || self.hovered
    }

    /// The distance one full wrap covers: summed item widths, the gaps
    /// between them, and the trailing right padding.
    pub fn cycle_distance(&self) -> f64 {
        self.layout.track_width
    }

    /// Normalized position along the cycle (0..1).
    pub fn progress(&self) -> f64 {
        if self.layout.track_width > 0.0 {
            self.offset / self.layout.track_width
        } else {
            0.0
        }
    }

    /// Re-measure on the next update (resize path).
    pub fn invalidate_layout(&mut self) {
        self.measured = false;
        self.retry.reset();
    }

    /// Advance the loop one frame and write item translations.
    ///
    /// Always returns `Continue`: the gates flip too often for the loop to
    /// retire itself.
    pub fn update(
        &mut self,
        delta_ms: f32,
        surface: &mut Surface,
        events: &mut EventQueue,
    ) -> TickOutcome {
        if !self.measured && !self.try_measure(surface) {
            return TickOutcome::Continue;
        }

        let running = !self.is_paused();
        if self.last_running != Some(running) {
            events.push(EngineEvent::LoopStateChanged { running });
            self.last_running = Some(running);
        }
        if !running {
            return TickOutcome::Continue;
        }

        let track = self.layout.track_width;
        if track <= 0.0 {
            return TickOutcome::Continue;
        }
        let direction = if self.reversed { -1.0 } else { 1.0 };
        self.offset = (self.offset + self.speed * f64::from(delta_ms) / 1000.0 * direction)
            .rem_euclid(track);

        for slot in &self.layout.slots {
            // Wrap each item's resting position along the track, then
            // express it as a translation from where it rests.
            let wrapped = (slot.base_left - self.offset).rem_euclid(track);
            surface.set_style(
                &slot.id,
                StyleProperty::TranslateX,
                StyleValue::from(wrapped - slot.base_left),
            );
        }
        TickOutcome::Continue
    }

    /// Poll measurement through the retry budget. True once a layout is
    /// adopted, valid or best-effort.
    fn try_measure(&mut self, surface: &Surface) -> bool {
        let gap = self.gap;
        let padding_right = self.padding_right;
        let item_ids = self.item_ids.clone();
        let poll = self.retry.poll(
            || measure_track(&item_ids, gap, padding_right, surface),
            |layout| layout_valid(layout),
        );
        match poll {
            MeasurePoll::Valid(layout) => {
                self.layout = layout;
                self.measured = true;
                true
            }
            MeasurePoll::Retry => false,
            MeasurePoll::Exhausted(layout) => {
                warn!(
                    items = self.item_ids.len(),
                    track_width = layout.track_width,
                    "marquee proceeding with best-effort layout"
                );
                self.layout = layout;
                self.measured = true;
                true
            }
        }
    }
}

fn measure_track(
    item_ids: &[String],
    gap: f64,
    padding_right: f64,
    surface: &Surface,
) -> TrackLayout {
    let mut slots = Vec::with_capacity(item_ids.len());
    let mut widths = 0.0;
    let mut first_left = None;
    for id in item_ids {
        let geometry = surface.measure(id).unwrap_or_default();
        let first = *first_left.get_or_insert(geometry.offset_left);
        widths += geometry.width;
        slots.push(ItemSlot {
            id: id.clone(),
            base_left: geometry.offset_left - first,
            width: geometry.width,
        });
    }
    let gaps = gap * (slots.len().saturating_sub(1)) as f64;
    TrackLayout {
        track_width: widths + gaps + padding_right,
        slots,
    }
}

/// A snapshot is usable when every item has a real width and the items
/// actually progress left to right (first strictly before last).
fn layout_valid(layout: &TrackLayout) -> bool {
    if layout.slots.iter().any(|s| s.width <= 0.0) {
        return false;
    }
    match (layout.slots.first(), layout.slots.last()) {
        (Some(first), Some(last)) if layout.slots.len() > 1 => first.base_left < last.base_left,
        (Some(_), Some(_)) => true,
        _ => false,
    }
}

static_assertions::assert_impl_all!(Marquee: Send);
