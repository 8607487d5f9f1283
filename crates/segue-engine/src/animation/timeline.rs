//! Timelines: offset-scheduled groups of tweens.
//!
//! A `Timeline` owns tweens placed at start offsets along a shared clock.
//! Each `update` advances the clock and writes current values into the
//! surface's inline styles. A timeline completes when every child tween
//! has finished; the lifecycle coordinator polls this rather than blocking.
//!
//! Trigger-bound timelines are not advanced by the clock at all; they are
//! scrubbed with `seek`, which applies the values for an arbitrary
//! normalized position.

use crate::surface::Surface;

use super::tween::{Tween, TweenPhase};

#[derive(Debug, Clone)]
struct Entry {
    /// Offset from the timeline start at which the tween's own clock
    /// begins, in milliseconds.
    start_ms: f32,
    tween: Tween,
}

/// An ordered group of tweens sharing one clock.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<Entry>,
    elapsed_ms: f32,
    paused: bool,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tween at the current end of the timeline.
    pub fn push(&mut self, tween: Tween) -> &mut Self {
        let start_ms = self.total_duration_ms();
        self.entries.push(Entry { start_ms, tween });
        self
    }

    /// Place a tween at an explicit offset from the timeline start.
    pub fn insert_at(&mut self, start_ms: f32, tween: Tween) -> &mut Self {
        self.entries.push(Entry { start_ms, tween });
        self
    }

    /// Place a batch of tweens starting `interval_ms` apart, beginning at
    /// the current end of the timeline.
    pub fn stagger(&mut self, tweens: impl IntoIterator<Item = Tween>, interval_ms: f32) -> &mut Self {
        let base = self.total_duration_ms();
        for (index, tween) in tweens.into_iter().enumerate() {
            self.entries.push(Entry {
                start_ms: base + interval_ms * index as f32,
                tween,
            });
        }
        self
    }

    /// Merge another timeline's entries at offset zero (parallel playback).
    pub fn join(&mut self, other: Timeline) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    /// Total scheduled length in milliseconds.
    pub fn total_duration_ms(&self) -> f32 {
        self.entries
            .iter()
            .map(|e| e.start_ms + e.tween.total_ms())
            .fold(0.0, f32::max)
    }

    /// Number of tweens on the timeline.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline holds no tweens.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance the shared clock and write current values to the surface.
    ///
    /// Returns `true` while any tween is still live.
    pub fn update(&mut self, surface: &mut Surface, delta_ms: f32) -> bool {
        if self.paused {
            return !self.is_finished();
        }
        let previous = self.elapsed_ms;
        self.elapsed_ms += delta_ms;

        let mut any_live = false;
        for entry in &mut self.entries {
            if entry.tween.phase == TweenPhase::Cancelled {
                continue;
            }
            if self.elapsed_ms < entry.start_ms {
                any_live = true;
                continue;
            }
            // Only the portion of the delta past the entry's start counts.
            let local_delta = if previous >= entry.start_ms {
                delta_ms
            } else {
                self.elapsed_ms - entry.start_ms
            };
            let live = entry.tween.update(local_delta);
            surface.set_style(
                &entry.tween.element_id,
                entry.tween.property,
                entry.tween.current_value(),
            );
            any_live |= live;
        }
        any_live
    }

    /// Apply the values for a normalized position (0..1) without touching
    /// the clock. Scroll triggers scrub bound timelines with this.
    pub fn seek(&self, surface: &mut Surface, position: f32) {
        let total = self.total_duration_ms();
        if total <= 0.0 {
            return;
        }
        let at_ms = total * position.clamp(0.0, 1.0);
        for entry in &self.entries {
            if entry.tween.phase == TweenPhase::Cancelled {
                continue;
            }
            let span = entry.tween.total_ms();
            let local = if span > 0.0 {
                ((at_ms - entry.start_ms) / span).clamp(0.0, 1.0)
            } else {
                1.0
            };
            surface.set_style(
                &entry.tween.element_id,
                entry.tween.property,
                entry.tween.sample(local),
            );
        }
    }

    /// Pause the shared clock.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the shared clock.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Cancel every tween on the timeline.
    pub fn cancel(&mut self) {
        for entry in &mut self.entries {
            entry.tween.cancel();
        }
    }

    /// Whether every tween has finished or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.entries.iter().all(|e| !e.tween.is_live())
    }

    /// Normalized progress of the shared clock (0..1).
    pub fn progress(&self) -> f32 {
        let total = self.total_duration_ms();
        if total <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / total).clamp(0.0, 1.0)
        }
    }

    /// Element ids this timeline writes to, in entry order (duplicates
    /// preserved).
    pub fn element_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.tween.element_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::easing::EasingFunction;
    use crate::animation::tween::TweenSpec;
    use crate::animation::value::{StyleProperty, StyleValue};

    fn linear(duration: f32) -> TweenSpec {
        TweenSpec::duration(duration).with_easing(EasingFunction::Linear)
    }

    fn fade(element: &str, duration: f32) -> Tween {
        Tween::new(
            element,
            StyleProperty::Opacity,
            StyleValue::from(0.0),
            StyleValue::from(1.0),
            linear(duration),
        )
    }

    fn surface_with(ids: &[&str]) -> Surface {
        let mut surface = Surface::new();
        for id in ids {
            surface.insert(*id);
        }
        surface
    }

    #[test]
    fn sequential_push_offsets() {
        let mut timeline = Timeline::new();
        timeline.push(fade("a", 100.0));
        timeline.push(fade("b", 50.0));
        assert_eq!(timeline.total_duration_ms(), 150.0);
    }

    #[test]
    fn update_writes_inline_styles() {
        let mut surface = surface_with(&["a"]);
        let mut timeline = Timeline::new();
        timeline.push(fade("a", 100.0));

        timeline.update(&mut surface, 50.0);
        let v = surface
            .inline_style("a", StyleProperty::Opacity)
            .unwrap()
            .as_scalar()
            .unwrap();
        assert!((v - 0.5).abs() < 0.01);

        assert!(!timeline.update(&mut surface, 60.0));
        assert!(timeline.is_finished());
        let v = surface
            .inline_style("a", StyleProperty::Opacity)
            .unwrap()
            .as_scalar()
            .unwrap();
        assert!((v - 1.0).abs() < 0.01);
    }

    #[test]
    fn second_entry_waits_for_offset() {
        let mut surface = surface_with(&["a", "b"]);
        let mut timeline = Timeline::new();
        timeline.push(fade("a", 100.0));
        timeline.push(fade("b", 100.0));

        timeline.update(&mut surface, 100.0);
        // "b" starts exactly at 100ms; no progress yet.
        let v = surface
            .inline_style("b", StyleProperty::Opacity)
            .map(|s| s.as_scalar().unwrap())
            .unwrap_or(0.0);
        assert!(v < 0.01, "b should not have progressed, got {v}");

        timeline.update(&mut surface, 50.0);
        let v = surface
            .inline_style("b", StyleProperty::Opacity)
            .unwrap()
            .as_scalar()
            .unwrap();
        assert!((v - 0.5).abs() < 0.01);
    }

    #[test]
    fn stagger_spaces_starts() {
        let mut timeline = Timeline::new();
        timeline.stagger(
            vec![fade("a", 100.0), fade("b", 100.0), fade("c", 100.0)],
            30.0,
        );
        assert_eq!(timeline.total_duration_ms(), 160.0);
    }

    #[test]
    fn join_runs_in_parallel() {
        let mut left = Timeline::new();
        left.push(fade("a", 100.0));
        let mut right = Timeline::new();
        right.push(fade("b", 80.0));

        left.join(right);
        assert_eq!(left.total_duration_ms(), 100.0);
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn seek_is_stateless_scrubbing() {
        let mut surface = surface_with(&["a"]);
        let mut timeline = Timeline::new();
        timeline.push(fade("a", 100.0));

        timeline.seek(&mut surface, 0.25);
        let v = surface
            .inline_style("a", StyleProperty::Opacity)
            .unwrap()
            .as_scalar()
            .unwrap();
        assert!((v - 0.25).abs() < 0.01);

        // Scrub backwards; no internal clock fights the position.
        timeline.seek(&mut surface, 0.0);
        let v = surface
            .inline_style("a", StyleProperty::Opacity)
            .unwrap()
            .as_scalar()
            .unwrap();
        assert!(v.abs() < 0.01);
    }

    #[test]
    fn pause_holds_the_clock() {
        let mut surface = surface_with(&["a"]);
        let mut timeline = Timeline::new();
        timeline.push(fade("a", 100.0));

        timeline.update(&mut surface, 30.0);
        timeline.pause();
        timeline.update(&mut surface, 500.0);
        assert!(!timeline.is_finished());

        timeline.resume();
        timeline.update(&mut surface, 80.0);
        assert!(timeline.is_finished());
    }

    #[test]
    fn cancel_finishes_the_timeline() {
        let mut surface = surface_with(&["a"]);
        let mut timeline = Timeline::new();
        timeline.push(fade("a", 100.0));
        timeline.cancel();
        assert!(timeline.is_finished());
        assert!(!timeline.update(&mut surface, 10.0));
    }

    #[test]
    fn empty_timeline_is_finished() {
        let timeline = Timeline::new();
        assert!(timeline.is_finished());
        assert_eq!(timeline.total_duration_ms(), 0.0);
    }
}
