//! Animatable style values and the interpolation trait.
//!
//! The engine writes animated values into element inline styles as
//! `StyleValue`s keyed by `StyleProperty`. Interpolation is the core
//! mechanism that produces smooth in-between values each frame.

use serde::{Deserialize, Serialize};

/// Inline style properties the engine animates on surface elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleProperty {
    /// Element opacity (0.0 to 1.0).
    Opacity,
    /// Horizontal translation in pixels.
    TranslateX,
    /// Vertical translation in pixels.
    TranslateY,
    /// Animated height in pixels (accordion panels).
    Height,
    /// Clip-reveal progress (0.0 fully clipped, 1.0 fully revealed).
    ClipProgress,
    /// Uniform scale factor.
    Scale,
    /// Foreground color.
    Color,
}

impl StyleProperty {
    /// Returns true if this property shifts downstream layout when it
    /// changes (the accordion reflow path cares about this).
    pub fn affects_layout(&self) -> bool {
        matches!(self, Self::Height)
    }
}

/// A value an inline style property can hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StyleValue {
    /// Scalar value (opacity, height, translate component, clip fraction).
    Scalar { value: f64 },
    /// 2D translation in pixels.
    Translate { x: f64, y: f64 },
    /// RGBA color components.
    Color { rgba: [f32; 4] },
}

impl StyleValue {
    /// Try to extract a scalar value.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar { value } => Some(*value),
            _ => None,
        }
    }

    /// Try to extract a translation pair.
    pub fn as_translate(&self) -> Option<(f64, f64)> {
        match self {
            Self::Translate { x, y } => Some((*x, *y)),
            _ => None,
        }
    }

    /// Try to extract a color value.
    pub fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            Self::Color { rgba } => Some(*rgba),
            _ => None,
        }
    }
}

impl From<f64> for StyleValue {
    fn from(v: f64) -> Self {
        Self::Scalar { value: v }
    }
}

impl From<(f64, f64)> for StyleValue {
    fn from((x, y): (f64, f64)) -> Self {
        Self::Translate { x, y }
    }
}

impl From<[f32; 4]> for StyleValue {
    fn from(rgba: [f32; 4]) -> Self {
        Self::Color { rgba }
    }
}

/// Trait for values that can be interpolated between two endpoints.
///
/// When `t` is 0.0 the result is `self`; at 1.0 it is `to`. Values outside
/// that range extrapolate (overshoot easings rely on this).
pub trait Interpolate: Sized {
    /// Interpolate from self towards `to` at factor `t`.
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, t: f32) -> f64 {
    from + (to - from) * t as f64
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        lerp(*self, *to, t)
    }
}

impl Interpolate for [f32; 4] {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        let mut out = [0.0; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self[i] + (to[i] - self[i]) * t;
        }
        out
    }
}

impl Interpolate for StyleValue {
    /// Interpolate between two style values of the same variant.
    ///
    /// Mismatched variants return `self` unchanged; the tween that produced
    /// the mismatch is a host API misuse, not something worth corrupting a
    /// frame over.
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        match (self, to) {
            (Self::Scalar { value: a }, Self::Scalar { value: b }) => Self::Scalar {
                value: a.interpolate(b, t),
            },
            (Self::Translate { x: ax, y: ay }, Self::Translate { x: bx, y: by }) => {
                Self::Translate {
                    x: ax.interpolate(bx, t),
                    y: ay.interpolate(by, t),
                }
            }
            (Self::Color { rgba: a }, Self::Color { rgba: b }) => Self::Color {
                rgba: a.interpolate(b, t),
            },
            _ => *self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn scalar_interpolation() {
        let from = StyleValue::from(0.0);
        let to = StyleValue::from(100.0);
        assert!(approx(from.interpolate(&to, 0.0).as_scalar().unwrap(), 0.0));
        assert!(approx(from.interpolate(&to, 0.5).as_scalar().unwrap(), 50.0));
        assert!(approx(from.interpolate(&to, 1.0).as_scalar().unwrap(), 100.0));
    }

    #[test]
    fn translate_interpolation() {
        let from = StyleValue::from((0.0, -40.0));
        let to = StyleValue::from((10.0, 0.0));
        let (x, y) = from.interpolate(&to, 0.5).as_translate().unwrap();
        assert!(approx(x, 5.0));
        assert!(approx(y, -20.0));
    }

    #[test]
    fn color_interpolation() {
        let from = StyleValue::from([1.0, 0.0, 0.0, 1.0]);
        let to = StyleValue::from([0.0, 0.0, 1.0, 0.0]);
        let mid = from.interpolate(&to, 0.5).as_color().unwrap();
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert!((mid[2] - 0.5).abs() < 1e-6);
        assert!((mid[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mismatched_variants_return_self() {
        let from = StyleValue::from(42.0);
        let to = StyleValue::from((1.0, 2.0));
        assert_eq!(from.interpolate(&to, 0.7), from);
    }

    #[test]
    fn extrapolation_beyond_range() {
        let from = StyleValue::from(0.0);
        let to = StyleValue::from(10.0);
        // Overshoot easings produce t > 1.0.
        assert!(approx(from.interpolate(&to, 1.2).as_scalar().unwrap(), 12.0));
    }

    #[test]
    fn accessor_mismatch_returns_none() {
        let v = StyleValue::from(1.0);
        assert!(v.as_translate().is_none());
        assert!(v.as_color().is_none());
        assert_eq!(v.as_scalar(), Some(1.0));
    }

    #[test]
    fn layout_affecting_properties() {
        assert!(StyleProperty::Height.affects_layout());
        assert!(!StyleProperty::Opacity.affects_layout());
        assert!(!StyleProperty::TranslateX.affects_layout());
    }
}
