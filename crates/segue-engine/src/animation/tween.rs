//! Single-property tweens.
//!
//! A `Tween` interpolates one inline style property on one element from a
//! starting value to a target value over a duration, with optional delay
//! and easing. It is a small state machine driven by `update(delta_ms)`;
//! completion is reported through the return value, never through blocking.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use super::easing::EasingFunction;
use super::value::{Interpolate, StyleProperty, StyleValue};

/// Unique identifier for a tween instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TweenId(pub u64);

impl TweenId {
    /// Generate a new unique tween ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TweenId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle phase of a tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenPhase {
    /// Created, waiting out its delay.
    Pending,
    /// Actively interpolating.
    Running,
    /// Paused; time does not advance.
    Paused,
    /// Completed normally.
    Finished,
    /// Cancelled before completion.
    Cancelled,
}

/// Timing parameters for a tween.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TweenSpec {
    /// Duration in milliseconds.
    pub duration_ms: f32,
    /// Delay before interpolation starts, in milliseconds.
    pub delay_ms: f32,
    /// Easing function.
    pub easing: EasingFunction,
}

impl Default for TweenSpec {
    fn default() -> Self {
        Self {
            duration_ms: 600.0,
            delay_ms: 0.0,
            easing: EasingFunction::Ease,
        }
    }
}

impl TweenSpec {
    /// Spec with the given duration and default easing.
    pub fn duration(duration_ms: f32) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    /// Set the delay.
    pub fn with_delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the easing function.
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }
}

/// An in-flight interpolation of one property on one element.
#[derive(Debug, Clone)]
pub struct Tween {
    /// Unique identifier.
    pub id: TweenId,
    /// The surface element this tween writes to.
    pub element_id: String,
    /// The inline style property being animated.
    pub property: StyleProperty,
    /// Starting value.
    pub from: StyleValue,
    /// Target value.
    pub to: StyleValue,
    duration_ms: f32,
    delay_ms: f32,
    elapsed_ms: f32,
    easing: EasingFunction,
    /// Current lifecycle phase.
    pub phase: TweenPhase,
}

impl Tween {
    /// Create a new tween.
    pub fn new(
        element_id: impl Into<String>,
        property: StyleProperty,
        from: StyleValue,
        to: StyleValue,
        spec: TweenSpec,
    ) -> Self {
        Self {
            id: TweenId::new(),
            element_id: element_id.into(),
            property,
            from,
            to,
            duration_ms: spec.duration_ms,
            delay_ms: spec.delay_ms,
            elapsed_ms: 0.0,
            easing: spec.easing,
            phase: if spec.delay_ms > 0.0 {
                TweenPhase::Pending
            } else {
                TweenPhase::Running
            },
        }
    }

    /// Advance the tween by `delta_ms`.
    ///
    /// Returns `true` while the tween is still live (pending, running or
    /// paused), `false` once finished or cancelled.
    pub fn update(&mut self, delta_ms: f32) -> bool {
        match self.phase {
            TweenPhase::Finished | TweenPhase::Cancelled => false,
            TweenPhase::Paused => true,
            TweenPhase::Pending => {
                self.elapsed_ms += delta_ms;
                if self.elapsed_ms >= self.delay_ms {
                    self.phase = TweenPhase::Running;
                    // Past the delay and already through the duration in one
                    // step: finish immediately.
                    if self.elapsed_ms - self.delay_ms >= self.duration_ms {
                        self.phase = TweenPhase::Finished;
                        return false;
                    }
                }
                true
            }
            TweenPhase::Running => {
                self.elapsed_ms += delta_ms;
                if self.elapsed_ms - self.delay_ms >= self.duration_ms {
                    self.phase = TweenPhase::Finished;
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Linear progress through the active portion (0..1).
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((self.elapsed_ms - self.delay_ms).max(0.0) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// The current interpolated value.
    pub fn current_value(&self) -> StyleValue {
        self.value_at(self.elapsed_ms)
    }

    /// The value this tween holds at an arbitrary elapsed time, without
    /// mutating state. Used by trigger-scrubbed timelines.
    pub fn value_at(&self, elapsed_ms: f32) -> StyleValue {
        match self.phase {
            TweenPhase::Cancelled => self.from,
            TweenPhase::Finished => self.to,
            _ => {
                let active = (elapsed_ms - self.delay_ms).max(0.0);
                let progress = if self.duration_ms > 0.0 {
                    (active / self.duration_ms).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                self.from.interpolate(&self.to, self.easing.evaluate(progress))
            }
        }
    }

    /// Sample the value at a raw linear progress (0..1), ignoring elapsed
    /// time and delay. Scrubbed playback uses this.
    pub fn sample(&self, progress: f32) -> StyleValue {
        let eased = self.easing.evaluate(progress.clamp(0.0, 1.0));
        self.from.interpolate(&self.to, eased)
    }

    /// Pause the tween; `update` stops advancing time.
    pub fn pause(&mut self) {
        if matches!(self.phase, TweenPhase::Running | TweenPhase::Pending) {
            self.phase = TweenPhase::Paused;
        }
    }

    /// Resume a paused tween.
    pub fn resume(&mut self) {
        if self.phase == TweenPhase::Paused {
            self.phase = if self.elapsed_ms < self.delay_ms {
                TweenPhase::Pending
            } else {
                TweenPhase::Running
            };
        }
    }

    /// Cancel the tween; its reported value reverts to `from`.
    pub fn cancel(&mut self) {
        self.phase = TweenPhase::Cancelled;
    }

    /// Redirect the tween towards a new target, continuing from its current
    /// interpolated value. Used when a property changes mid-flight (rapid
    /// accordion toggles rely on this).
    pub fn retarget(&mut self, to: StyleValue, spec: TweenSpec) {
        self.from = self.current_value();
        self.to = to;
        self.duration_ms = spec.duration_ms;
        self.delay_ms = spec.delay_ms;
        self.elapsed_ms = 0.0;
        self.easing = spec.easing;
        self.phase = if spec.delay_ms > 0.0 {
            TweenPhase::Pending
        } else {
            TweenPhase::Running
        };
    }

    /// Total scheduled time including delay.
    pub fn total_ms(&self) -> f32 {
        self.delay_ms + self.duration_ms
    }

    /// Whether the tween is pending, running or paused.
    pub fn is_live(&self) -> bool {
        matches!(
            self.phase,
            TweenPhase::Pending | TweenPhase::Running | TweenPhase::Paused
        )
    }

    /// Whether the tween completed normally.
    pub fn is_finished(&self) -> bool {
        self.phase == TweenPhase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opacity_tween(duration: f32) -> Tween {
        Tween::new(
            "hero",
            StyleProperty::Opacity,
            StyleValue::from(0.0),
            StyleValue::from(100.0),
            TweenSpec::duration(duration).with_easing(EasingFunction::Linear),
        )
    }

    #[test]
    fn runs_to_completion() {
        let mut tween = opacity_tween(100.0);
        assert_eq!(tween.phase, TweenPhase::Running);

        assert!(tween.update(50.0));
        assert!((tween.progress() - 0.5).abs() < 0.01);
        assert!((tween.current_value().as_scalar().unwrap() - 50.0).abs() < 0.01);

        assert!(!tween.update(60.0));
        assert!(tween.is_finished());
        assert_eq!(tween.current_value().as_scalar(), Some(100.0));
    }

    #[test]
    fn delay_holds_start_value() {
        let mut tween = Tween::new(
            "hero",
            StyleProperty::Opacity,
            StyleValue::from(0.0),
            StyleValue::from(1.0),
            TweenSpec::duration(100.0).with_delay(50.0),
        );
        assert_eq!(tween.phase, TweenPhase::Pending);

        tween.update(25.0);
        assert_eq!(tween.phase, TweenPhase::Pending);
        assert_eq!(tween.current_value().as_scalar(), Some(0.0));

        tween.update(30.0);
        assert_eq!(tween.phase, TweenPhase::Running);
    }

    #[test]
    fn pause_freezes_value() {
        let mut tween = opacity_tween(100.0);
        tween.update(40.0);
        let before = tween.current_value();

        tween.pause();
        tween.update(500.0);
        assert_eq!(tween.current_value(), before);

        tween.resume();
        tween.update(10.0);
        assert!(tween.current_value().as_scalar().unwrap() > before.as_scalar().unwrap());
    }

    #[test]
    fn cancel_reverts_to_from() {
        let mut tween = opacity_tween(100.0);
        tween.update(50.0);
        tween.cancel();
        assert!(!tween.update(10.0));
        assert_eq!(tween.current_value().as_scalar(), Some(0.0));
    }

    #[test]
    fn retarget_continues_from_current() {
        let mut tween = opacity_tween(100.0);
        tween.update(50.0);

        tween.retarget(
            StyleValue::from(0.0),
            TweenSpec::duration(200.0).with_easing(EasingFunction::Linear),
        );
        assert_eq!(tween.phase, TweenPhase::Running);
        assert!((tween.current_value().as_scalar().unwrap() - 50.0).abs() < 0.01);

        tween.update(200.0);
        assert_eq!(tween.current_value().as_scalar(), Some(0.0));
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut tween = opacity_tween(0.0);
        assert_eq!(tween.current_value().as_scalar(), Some(100.0));
        assert!(!tween.update(1.0));
        assert!(tween.is_finished());
    }

    #[test]
    fn sample_ignores_clock() {
        let tween = opacity_tween(100.0);
        assert!((tween.sample(0.25).as_scalar().unwrap() - 25.0).abs() < 0.01);
        assert!((tween.sample(1.0).as_scalar().unwrap() - 100.0).abs() < 0.01);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(TweenId::new(), TweenId::new());
    }
}
