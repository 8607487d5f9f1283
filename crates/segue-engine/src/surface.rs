//! The opaque element surface the engine attaches behavior to.
//!
//! The host hands the engine a rendered tree it does not own. Elements are
//! addressed by string ids; the surface stores, per element, the measured
//! geometry the host supplies, the inline style overrides the engine
//! writes, and reversible text-splitting state.
//!
//! Two contracts matter here:
//!
//! - **Splitting is re-runnable.** The original, unsplit text is the only
//!   input splitting ever reads, so split → revert → split any number of
//!   times yields the same structure as a single split.
//! - **Inline styles persist.** A finished animation leaves its final
//!   values on the element. Any component that re-initializes an animation
//!   on the same element must call `clear_inline_styles` first; this is a
//!   precondition of the binding layer, not an incidental cleanup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::animation::value::{StyleProperty, StyleValue};
use crate::error::{EngineError, Result};

/// Measured geometry of an element, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// Distance from the top of the page to the element's top edge.
    pub offset_top: f64,
    /// Distance from the left of the page to the element's left edge.
    pub offset_left: f64,
    /// Element width in pixels.
    pub width: f64,
    /// Element height in pixels.
    pub height: f64,
}

impl Geometry {
    /// Geometry with the given position and size.
    pub fn new(offset_top: f64, offset_left: f64, width: f64, height: f64) -> Self {
        Self {
            offset_top,
            offset_left,
            width,
            height,
        }
    }
}

/// Granularity of text splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitUnit {
    /// One unit per character (whitespace excluded).
    Chars,
    /// One unit per whitespace-separated word.
    Words,
}

#[derive(Debug, Clone, Default)]
struct ElementRecord {
    geometry: Option<Geometry>,
    inline: HashMap<StyleProperty, StyleValue>,
    /// Original text content, retained across splits.
    text: Option<String>,
    split_unit: Option<SplitUnit>,
    unit_ids: Vec<String>,
    children: Vec<String>,
    supports_clip: bool,
}

impl ElementRecord {
    fn new() -> Self {
        Self {
            supports_clip: true,
            ..Self::default()
        }
    }
}

/// The element population the engine operates on.
///
/// The host (or a test) populates elements and geometry; the engine only
/// ever mutates inline styles and split state, and reverts both on
/// deregistration.
#[derive(Debug, Default)]
pub struct Surface {
    elements: HashMap<String, ElementRecord>,
    fonts_ready: bool,
}

impl Surface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element with no geometry yet.
    pub fn insert(&mut self, id: impl Into<String>) {
        self.elements.insert(id.into(), ElementRecord::new());
    }

    /// Insert an element with measured geometry.
    pub fn insert_with_geometry(&mut self, id: impl Into<String>, geometry: Geometry) {
        let mut record = ElementRecord::new();
        record.geometry = Some(geometry);
        self.elements.insert(id.into(), record);
    }

    /// Remove an element and any split-unit children it produced.
    pub fn remove(&mut self, id: &str) {
        if let Some(record) = self.elements.remove(id) {
            for unit in record.unit_ids {
                self.elements.remove(&unit);
            }
        }
    }

    /// Whether the element exists.
    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// Number of elements, split units included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the surface holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Update an element's measured geometry.
    pub fn set_geometry(&mut self, id: &str, geometry: Geometry) -> Result<()> {
        let record = self.record_mut(id)?;
        record.geometry = Some(geometry);
        Ok(())
    }

    /// Read an element's geometry, if it has been measured.
    pub fn measure(&self, id: &str) -> Option<Geometry> {
        self.elements.get(id).and_then(|r| r.geometry)
    }

    /// Set an element's text content. Reverts any existing split first so
    /// the new text becomes the splitting input.
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.revert_text(id);
        let record = self.record_mut(id)?;
        record.text = Some(text.into());
        Ok(())
    }

    /// The original (unsplit) text content.
    pub fn original_text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).and_then(|r| r.text.as_deref())
    }

    /// Split an element's text into per-unit child elements.
    ///
    /// Always re-runs from the retained original text: if the element is
    /// already split, the previous units are discarded first. Returns the
    /// number of units produced.
    pub fn split_text(&mut self, id: &str, unit: SplitUnit) -> Result<usize> {
        self.revert_text(id);

        let text = self
            .elements
            .get(id)
            .ok_or_else(|| EngineError::UnknownElement(id.to_string()))?
            .text
            .clone()
            .ok_or_else(|| EngineError::NoTextContent(id.to_string()))?;

        let units: Vec<String> = match unit {
            SplitUnit::Chars => text
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_string())
                .collect(),
            SplitUnit::Words => text.split_whitespace().map(str::to_string).collect(),
        };

        let mut unit_ids = Vec::with_capacity(units.len());
        for (index, content) in units.iter().enumerate() {
            let unit_id = format!("{id}::u{index}");
            let mut record = ElementRecord::new();
            record.text = Some(content.clone());
            self.elements.insert(unit_id.clone(), record);
            unit_ids.push(unit_id);
        }

        let count = unit_ids.len();
        let record = self.record_mut(id)?;
        record.split_unit = Some(unit);
        record.unit_ids = unit_ids;
        Ok(count)
    }

    /// Restore an element to its pre-split state, removing unit children.
    /// Safe to call on an unsplit or unknown element.
    pub fn revert_text(&mut self, id: &str) {
        let unit_ids = match self.elements.get_mut(id) {
            Some(record) => {
                record.split_unit = None;
                std::mem::take(&mut record.unit_ids)
            }
            None => return,
        };
        for unit in unit_ids {
            self.elements.remove(&unit);
        }
    }

    /// The element's current split granularity, if split.
    pub fn split_unit(&self, id: &str) -> Option<SplitUnit> {
        self.elements.get(id).and_then(|r| r.split_unit)
    }

    /// Ids of the element's split-unit children, in text order.
    pub fn split_unit_ids(&self, id: &str) -> &[String] {
        self.elements
            .get(id)
            .map(|r| r.unit_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Record a parent/child relation (used by stagger recipes).
    pub fn add_child(&mut self, parent: &str, child: impl Into<String>) -> Result<()> {
        let child = child.into();
        if !self.elements.contains_key(&child) {
            return Err(EngineError::UnknownElement(child));
        }
        let record = self.record_mut(parent)?;
        record.children.push(child);
        Ok(())
    }

    /// The element's registered children, in registration order.
    pub fn children(&self, id: &str) -> &[String] {
        self.elements
            .get(id)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    /// Write an inline style value.
    ///
    /// A missing element is traced and ignored: timelines may legitimately
    /// outlive elements across a document swap, and a stale write must not
    /// take the page down.
    pub fn set_style(&mut self, id: &str, property: StyleProperty, value: StyleValue) {
        match self.elements.get_mut(id) {
            Some(record) => {
                record.inline.insert(property, value);
            }
            None => trace!(element = id, ?property, "style write to missing element dropped"),
        }
    }

    /// Read an inline style value.
    pub fn inline_style(&self, id: &str, property: StyleProperty) -> Option<StyleValue> {
        self.elements.get(id).and_then(|r| r.inline.get(&property).copied())
    }

    /// Remove every inline style override from an element.
    pub fn clear_inline_styles(&mut self, id: &str) {
        if let Some(record) = self.elements.get_mut(id) {
            record.inline.clear();
        }
    }

    /// Whether the element carries any inline style overrides.
    pub fn has_inline_styles(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|r| !r.inline.is_empty())
    }

    /// Whether the element supports the clip-reveal capability.
    pub fn supports_clip_reveal(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|r| r.supports_clip)
    }

    /// Mark the clip-reveal capability available or not for an element.
    pub fn set_clip_support(&mut self, id: &str, supported: bool) -> Result<()> {
        let record = self.record_mut(id)?;
        record.supports_clip = supported;
        Ok(())
    }

    /// Replace the element population, modelling the host router swapping
    /// the document. The fonts-ready latch survives the swap; fonts do not
    /// unload with the page.
    pub fn swap_document(&mut self, populate: impl FnOnce(&mut Surface)) {
        self.elements.clear();
        populate(self);
    }

    /// Whether required fonts have finished loading.
    pub fn fonts_ready(&self) -> bool {
        self.fonts_ready
    }

    /// Latch the fonts-ready signal. One-way; fonts do not un-ready.
    pub fn set_fonts_ready(&mut self) {
        self.fonts_ready = true;
    }

    fn record_mut(&mut self, id: &str) -> Result<&mut ElementRecord> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownElement(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_measure_remove() {
        let mut surface = Surface::new();
        surface.insert_with_geometry("hero", Geometry::new(0.0, 0.0, 1200.0, 600.0));

        let geometry = surface.measure("hero").unwrap();
        assert_eq!(geometry.width, 1200.0);
        assert!(surface.measure("missing").is_none());

        surface.remove("hero");
        assert!(!surface.contains("hero"));
    }

    #[test]
    fn inline_styles_round_trip_and_clear() {
        let mut surface = Surface::new();
        surface.insert("hero");

        surface.set_style("hero", StyleProperty::Opacity, StyleValue::from(0.4));
        assert_eq!(
            surface
                .inline_style("hero", StyleProperty::Opacity)
                .unwrap()
                .as_scalar(),
            Some(0.4)
        );
        assert!(surface.has_inline_styles("hero"));

        surface.clear_inline_styles("hero");
        assert!(!surface.has_inline_styles("hero"));
    }

    #[test]
    fn style_write_to_missing_element_is_dropped() {
        let mut surface = Surface::new();
        // Must not panic.
        surface.set_style("gone", StyleProperty::Opacity, StyleValue::from(1.0));
        assert!(surface.inline_style("gone", StyleProperty::Opacity).is_none());
    }

    #[test]
    fn split_words_creates_units() {
        let mut surface = Surface::new();
        surface.insert("headline");
        surface.set_text("headline", "we build motion").unwrap();

        let count = surface.split_text("headline", SplitUnit::Words).unwrap();
        assert_eq!(count, 3);
        let units = surface.split_unit_ids("headline").to_vec();
        assert_eq!(units.len(), 3);
        assert_eq!(surface.original_text(&units[1]), Some("build"));
        // Original text retained on the parent.
        assert_eq!(surface.original_text("headline"), Some("we build motion"));
    }

    #[test]
    fn split_is_restartable() {
        let mut surface = Surface::new();
        surface.insert("headline");
        surface.set_text("headline", "ab cd").unwrap();

        surface.split_text("headline", SplitUnit::Chars).unwrap();
        let first = surface.split_unit_ids("headline").len();
        let population = surface.len();

        // Split, revert, re-split several times; structure must not drift.
        for _ in 0..3 {
            surface.revert_text("headline");
            surface.split_text("headline", SplitUnit::Chars).unwrap();
        }
        assert_eq!(surface.split_unit_ids("headline").len(), first);
        assert_eq!(surface.len(), population);

        // Re-splitting without an explicit revert also re-runs from the
        // original.
        surface.split_text("headline", SplitUnit::Chars).unwrap();
        assert_eq!(surface.split_unit_ids("headline").len(), first);
        assert_eq!(surface.len(), population);
    }

    #[test]
    fn revert_restores_pre_split_population() {
        let mut surface = Surface::new();
        surface.insert("headline");
        surface.set_text("headline", "one two").unwrap();
        let before = surface.len();

        surface.split_text("headline", SplitUnit::Words).unwrap();
        assert!(surface.len() > before);

        surface.revert_text("headline");
        assert_eq!(surface.len(), before);
        assert!(surface.split_unit("headline").is_none());
    }

    #[test]
    fn split_without_text_errors() {
        let mut surface = Surface::new();
        surface.insert("empty");
        assert!(matches!(
            surface.split_text("empty", SplitUnit::Chars),
            Err(EngineError::NoTextContent(_))
        ));
    }

    #[test]
    fn swap_document_replaces_elements_but_keeps_font_latch() {
        let mut surface = Surface::new();
        surface.insert("old");
        surface.set_fonts_ready();

        surface.swap_document(|s| {
            s.insert("new");
        });

        assert!(!surface.contains("old"));
        assert!(surface.contains("new"));
        assert!(surface.fonts_ready());
    }

    #[test]
    fn clip_capability_flag() {
        let mut surface = Surface::new();
        surface.insert("panel");
        assert!(surface.supports_clip_reveal("panel"));
        surface.set_clip_support("panel", false).unwrap();
        assert!(!surface.supports_clip_reveal("panel"));
    }

    #[test]
    fn children_registration_order() {
        let mut surface = Surface::new();
        surface.insert("list");
        surface.insert("a");
        surface.insert("b");
        surface.add_child("list", "a").unwrap();
        surface.add_child("list", "b").unwrap();
        assert_eq!(surface.children("list"), ["a", "b"]);
        assert!(surface.add_child("list", "missing").is_err());
    }
}
