//! Segue configuration system
//!
//! This crate provides centralized configuration management for Segue,
//! loading engine defaults from `segue.toml`. Configuration is always
//! optional: every value here has a built-in default, and every knob is
//! also settable per call on the engine API.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Segue
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SegueConfig {
    /// Page-transition lifecycle settings
    pub transition: TransitionConfig,
    /// Scroll-trigger settings
    pub triggers: TriggerConfig,
    /// Marquee loop settings
    pub marquee: MarqueeConfig,
    /// Spring-line physics constants
    pub spring: SpringConfig,
}

/// Page-transition lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Upper bound on waiting for exit animations, in milliseconds.
    /// A stuck animation never stalls navigation past this.
    pub leave_timeout_ms: f32,
    /// Minimum time a navigation takes end to end, in milliseconds
    pub min_load_ms: f32,
    /// How long to wait for fonts before entering anyway, in milliseconds
    pub font_fallback_ms: f32,
    /// Default tween duration for binding recipes, in milliseconds
    pub default_duration_ms: f32,
}

/// Scroll-trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Debounce window for coalescing refresh requests, in milliseconds
    pub refresh_debounce_ms: f32,
}

/// Marquee loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarqueeConfig {
    /// Default scroll speed in pixels per second (always positive)
    pub speed: f64,
    /// Default gap between items in pixels
    pub gap: f64,
    /// Default right padding appended to the track in pixels
    pub padding_right: f64,
    /// How many frames to retry a degenerate measurement before
    /// proceeding best-effort
    pub measure_retry_budget: u32,
}

/// Spring-line physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Pull strength toward the target per frame
    pub stiffness: f64,
    /// Velocity retained per frame (below 1.0)
    pub damping: f64,
    /// Vertical distance within which the cursor affects the line, in
    /// pixels; beyond it the bend target is zero
    pub proximity_radius: f64,
    /// Bend pixels per pixel of cursor closeness inside the radius
    pub proximity_scale: f64,
    /// Fraction of cursor vertical speed added to the bend target
    pub velocity_boost: f64,
    /// Velocity/displacement threshold under which the line snaps to rest
    pub rest_epsilon: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            leave_timeout_ms: 1200.0,
            min_load_ms: 400.0,
            font_fallback_ms: 2000.0,
            default_duration_ms: 600.0,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            refresh_debounce_ms: 120.0,
        }
    }
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            speed: 60.0,
            gap: 48.0,
            padding_right: 48.0,
            measure_retry_budget: 10,
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 0.08,
            damping: 0.85,
            proximity_radius: 160.0,
            proximity_scale: 0.35,
            velocity_boost: 0.2,
            rest_epsilon: 0.05,
        }
    }
}

impl SegueConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the segue.toml configuration file
    ///
    /// # Returns
    /// * `Ok(SegueConfig)` - Successfully loaded configuration
    /// * `Err(String)` - Error message if loading failed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Load configuration from the default location (segue.toml in the
    /// current directory) or return default configuration if file doesn't
    /// exist
    pub fn load_or_default() -> Self {
        Self::load_from_file("segue.toml").unwrap_or_default()
    }
}
