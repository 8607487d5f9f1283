//! Easing functions for animation timing.
//!
//! The standard CSS curves plus a `Back` overshoot curve used by the
//! entrance animations. Cubic bezier evaluation solves for the curve
//! parameter with Newton-Raphson iteration.

use serde::{Deserialize, Serialize};

/// Easing function mapping linear progress (0..1) to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    /// No easing.
    Linear,
    /// CSS `ease`: cubic-bezier(0.25, 0.1, 0.25, 1.0).
    Ease,
    /// CSS `ease-in`: cubic-bezier(0.42, 0, 1, 1).
    EaseIn,
    /// CSS `ease-out`: cubic-bezier(0, 0, 0.58, 1).
    EaseOut,
    /// CSS `ease-in-out`: cubic-bezier(0.42, 0, 0.58, 1).
    EaseInOut,
    /// Custom cubic bezier; x values must lie in [0, 1].
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// Ease-out with overshoot past the target before settling.
    /// `overshoot` controls the swing amplitude (1.70158 matches the
    /// conventional back-out curve).
    Back { overshoot: f32 },
}

impl Default for EasingFunction {
    fn default() -> Self {
        Self::Ease
    }
}

impl EasingFunction {
    /// Evaluate the easing function at linear progress `t`.
    ///
    /// Input is clamped to [0, 1]; output may exceed the range for
    /// overshooting curves (`Back`, beziers with y outside [0, 1]).
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Ease => bezier_eval(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => bezier_eval(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => bezier_eval(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => bezier_eval(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => bezier_eval(*x1, *y1, *x2, *y2, t),
            Self::Back { overshoot } => back_out(*overshoot, t),
        }
    }

    /// Custom cubic bezier curve.
    ///
    /// # Panics
    /// Panics if `x1` or `x2` lie outside [0, 1]; such a curve is not a
    /// function of time.
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2),
            "bezier x control points must be in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// Conventional back-out curve (overshoot 1.70158).
    pub fn back_out() -> Self {
        Self::Back { overshoot: 1.70158 }
    }
}

/// Cubic bezier with implicit endpoints (0,0) and (1,1), evaluated as a
/// function of progress along x.
fn bezier_eval(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }
    let t = solve_for_x(x1, x2, progress);
    sample_axis(y1, y2, t)
}

/// One-dimensional bezier sample along a single axis with endpoint
/// coefficients 0 and 1: B(t) = 3(1-t)²t·c1 + 3(1-t)t²·c2 + t³.
#[inline]
fn sample_axis(c1: f32, c2: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * c1 + 3.0 * u * t * t * c2 + t * t * t
}

/// Derivative of `sample_axis` with respect to t.
#[inline]
fn sample_axis_derivative(c1: f32, c2: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * c1 + 6.0 * u * t * (c2 - c1) + 3.0 * t * t * (1.0 - c2)
}

/// Newton-Raphson solve for the parameter t where the x-axis bezier equals
/// `target`, falling back to the last iterate if the derivative vanishes.
fn solve_for_x(x1: f32, x2: f32, target: f32) -> f32 {
    let mut t = target;
    for _ in 0..8 {
        let err = sample_axis(x1, x2, t) - target;
        if err.abs() < 1e-6 {
            break;
        }
        let slope = sample_axis_derivative(x1, x2, t);
        if slope.abs() < 1e-6 {
            break;
        }
        t = (t - err / slope).clamp(0.0, 1.0);
    }
    t
}

/// Back-out overshoot: accelerate past 1.0 then settle back.
fn back_out(overshoot: f32, t: f32) -> f32 {
    let s = overshoot;
    let u = t - 1.0;
    u * u * ((s + 1.0) * u + s) + 1.0
}
