//! Declarative binding layer.
//!
//! Elements declare *what* entrance and exit behavior they want as a
//! `BindingRecipe`; the registry compiles all applicable recipes into one
//! timeline per lifecycle point. A recipe is owned by exactly one element:
//! registered on mount, discarded on unmount, with deregistration reverting
//! every surface mutation the recipe caused.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::animation::easing::EasingFunction;
use crate::animation::timeline::Timeline;
use crate::animation::tween::{Tween, TweenSpec};
use crate::animation::value::{StyleProperty, StyleValue};
use crate::surface::{SplitUnit, Surface};

/// How far slide recipes travel, in pixels.
const SLIDE_DISTANCE: f64 = 40.0;
/// Per-unit vertical travel for text-split entrances, in pixels.
const UNIT_RISE: f64 = 24.0;

/// Direction a slide recipe moves in from (enter) or toward (leave).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    /// The animated axis and the off-screen offset along it.
    fn axis_offset(self) -> (StyleProperty, f64) {
        match self {
            Self::Up => (StyleProperty::TranslateY, SLIDE_DISTANCE),
            Self::Down => (StyleProperty::TranslateY, -SLIDE_DISTANCE),
            Self::Left => (StyleProperty::TranslateX, SLIDE_DISTANCE),
            Self::Right => (StyleProperty::TranslateX, -SLIDE_DISTANCE),
        }
    }
}

/// The animation shape a binding applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipeKind {
    /// Opacity fade.
    Fade,
    /// Translate in/out while fading.
    Slide { direction: SlideDirection },
    /// Split text into units and stagger them in.
    TextSplit { unit: SplitUnit },
    /// Progressive clip reveal; degrades to fade where unsupported.
    ClipReveal,
    /// Stagger the element's registered children with fades.
    Stagger,
}

/// An element's declared entrance/exit behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingRecipe {
    /// Animation shape.
    pub kind: RecipeKind,
    /// Timing for the produced tweens.
    pub spec: TweenSpec,
    /// Spacing between staggered units or children, in milliseconds.
    pub stagger_interval_ms: f32,
    /// Whether the recipe participates in entrance timelines.
    pub applies_on_enter: bool,
    /// Whether the recipe participates in exit timelines.
    pub applies_on_leave: bool,
}

impl BindingRecipe {
    /// Recipe of the given kind applying on both lifecycle points.
    pub fn new(kind: RecipeKind) -> Self {
        Self {
            kind,
            spec: TweenSpec::default(),
            stagger_interval_ms: 40.0,
            applies_on_enter: true,
            applies_on_leave: true,
        }
    }

    /// Override the tween timing.
    pub fn with_spec(mut self, spec: TweenSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Override the stagger interval.
    pub fn with_stagger_interval(mut self, interval_ms: f32) -> Self {
        self.stagger_interval_ms = interval_ms;
        self
    }

    /// Participate only in entrance timelines.
    pub fn enter_only(mut self) -> Self {
        self.applies_on_leave = false;
        self
    }

    /// Participate only in exit timelines.
    pub fn leave_only(mut self) -> Self {
        self.applies_on_enter = false;
        self
    }
}

/// Which lifecycle point a timeline is being compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecyclePoint {
    Enter,
    Leave,
}

/// Registration-ordered map of element id to recipe.
///
/// A `Vec` rather than a map so compiled timelines are deterministic by
/// registration order within a frame.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: Vec<(String, BindingRecipe)>,
}

impl BindingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe for an element, replacing any prior recipe for
    /// the same element.
    pub fn register(&mut self, element_id: impl Into<String>, recipe: BindingRecipe) {
        let element_id = element_id.into();
        self.bindings.retain(|(id, _)| *id != element_id);
        self.bindings.push((element_id, recipe));
    }

    /// Remove an element's recipe and revert every surface mutation it
    /// caused, leaving the element exactly as the host handed it over.
    pub fn deregister(&mut self, element_id: &str, surface: &mut Surface) {
        let Some(index) = self.bindings.iter().position(|(id, _)| id == element_id) else {
            return;
        };
        let (id, recipe) = self.bindings.remove(index);
        if matches!(recipe.kind, RecipeKind::TextSplit { .. }) {
            for unit in surface.split_unit_ids(&id).to_vec() {
                surface.clear_inline_styles(&unit);
            }
            surface.revert_text(&id);
        }
        if matches!(recipe.kind, RecipeKind::Stagger) {
            for child in surface.children(&id).to_vec() {
                surface.clear_inline_styles(&child);
            }
        }
        surface.clear_inline_styles(&id);
    }

    /// The recipe registered for an element, if any.
    pub fn recipe(&self, element_id: &str) -> Option<&BindingRecipe> {
        self.bindings
            .iter()
            .find(|(id, _)| id == element_id)
            .map(|(_, recipe)| recipe)
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings are registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Compile all enter-applicable recipes into one entrance timeline.
    ///
    /// Finished animations leave their final values on the element, so the
    /// initial state for each participating element is re-established here
    /// by clearing inline styles before the timeline's first write.
    pub fn build_enter_timeline(&self, surface: &mut Surface) -> Timeline {
        self.build(surface, LifecyclePoint::Enter)
    }

    /// Compile all leave-applicable recipes into one exit timeline.
    pub fn build_leave_timeline(&self, surface: &mut Surface) -> Timeline {
        self.build(surface, LifecyclePoint::Leave)
    }

    fn build(&self, surface: &mut Surface, point: LifecyclePoint) -> Timeline {
        let mut timeline = Timeline::new();
        for (element_id, recipe) in &self.bindings {
            let applies = match point {
                LifecyclePoint::Enter => recipe.applies_on_enter,
                LifecyclePoint::Leave => recipe.applies_on_leave,
            };
            if !applies {
                continue;
            }
            if point == LifecyclePoint::Enter {
                surface.clear_inline_styles(element_id);
            }
            let mut part = Timeline::new();
            self.compile_recipe(element_id, recipe, surface, point, &mut part);
            timeline.join(part);
        }
        timeline
    }

    fn compile_recipe(
        &self,
        element_id: &str,
        recipe: &BindingRecipe,
        surface: &mut Surface,
        point: LifecyclePoint,
        out: &mut Timeline,
    ) {
        let entering = point == LifecyclePoint::Enter;
        match recipe.kind {
            RecipeKind::Fade => {
                out.push(fade_tween(element_id, entering, recipe.spec));
            }
            RecipeKind::Slide { direction } => {
                let (axis, offscreen) = direction.axis_offset();
                let (from, to) = if entering {
                    (offscreen, 0.0)
                } else {
                    (0.0, offscreen)
                };
                out.insert_at(
                    0.0,
                    Tween::new(
                        element_id,
                        axis,
                        StyleValue::from(from),
                        StyleValue::from(to),
                        recipe.spec,
                    ),
                );
                out.insert_at(0.0, fade_tween(element_id, entering, recipe.spec));
            }
            RecipeKind::TextSplit { unit } => {
                self.compile_text_split(element_id, recipe, unit, surface, entering, out);
            }
            RecipeKind::ClipReveal => {
                if surface.supports_clip_reveal(element_id) {
                    let (from, to) = if entering { (0.0, 1.0) } else { (1.0, 0.0) };
                    out.push(Tween::new(
                        element_id,
                        StyleProperty::ClipProgress,
                        StyleValue::from(from),
                        StyleValue::from(to),
                        recipe.spec,
                    ));
                } else {
                    warn!(element = element_id, "clip reveal unsupported, degrading to fade");
                    out.push(fade_tween(element_id, entering, recipe.spec));
                }
            }
            RecipeKind::Stagger => {
                let children = surface.children(element_id).to_vec();
                if entering {
                    for child in &children {
                        surface.clear_inline_styles(child);
                    }
                }
                out.stagger(
                    children
                        .iter()
                        .map(|child| fade_tween(child, entering, recipe.spec)),
                    recipe.stagger_interval_ms,
                );
            }
        }
    }

    fn compile_text_split(
        &self,
        element_id: &str,
        recipe: &BindingRecipe,
        unit: SplitUnit,
        surface: &mut Surface,
        entering: bool,
        out: &mut Timeline,
    ) {
        // Splitting before fonts settle would measure and stagger the wrong
        // glyph layout. The lifecycle coordinator holds the entrance until
        // the font gate reports ready (or its fallback deadline passes), so
        // an unready gate here means the deadline fired: degrade to a plain
        // fade rather than split mid-swap.
        if !surface.fonts_ready() {
            debug!(element = element_id, "fonts not ready, text split degrading to fade");
            out.push(fade_tween(element_id, entering, recipe.spec));
            return;
        }
        // Always re-split from the retained original text.
        let unit_ids = match surface.split_text(element_id, unit) {
            Ok(_) => surface.split_unit_ids(element_id).to_vec(),
            Err(err) => {
                warn!(element = element_id, %err, "text split failed, degrading to fade");
                out.push(fade_tween(element_id, entering, recipe.spec));
                return;
            }
        };
        let rise = EasingFunction::back_out();
        let mut units = Timeline::new();
        units.stagger(
            unit_ids.iter().map(|unit_id| {
                let (from, to) = if entering {
                    (UNIT_RISE, 0.0)
                } else {
                    (0.0, UNIT_RISE)
                };
                Tween::new(
                    unit_id,
                    StyleProperty::TranslateY,
                    StyleValue::from(from),
                    StyleValue::from(to),
                    recipe.spec.with_easing(rise),
                )
            }),
            recipe.stagger_interval_ms,
        );
        let mut fades = Timeline::new();
        fades.stagger(
            unit_ids
                .iter()
                .map(|unit_id| fade_tween(unit_id, entering, recipe.spec)),
            recipe.stagger_interval_ms,
        );
        units.join(fades);
        out.join(units);
    }
}

fn fade_tween(element_id: &str, entering: bool, spec: TweenSpec) -> Tween {
    let (from, to) = if entering { (0.0, 1.0) } else { (1.0, 0.0) };
    Tween::new(
        element_id,
        StyleProperty::Opacity,
        StyleValue::from(from),
        StyleValue::from(to),
        spec,
    )
}
