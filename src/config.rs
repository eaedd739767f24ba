//! Engine configuration: interaction switches, default paint styles, and size floors.
//!
//! Field names on the wire follow the host-facing camelCase spelling, with the
//! size floors kept as `MIN_WIDTH` / `MIN_HEIGHT` / `MIN_RADIUS`. Every field is
//! public and may be changed at any time; the engine reads the config fresh on
//! each event and frame.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::input::Tool;

/// Error returned when a config document or patch cannot be applied.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config patch must be a JSON object")]
    NotAnObject,
    #[error("invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Disable all interaction, including pan and zoom.
    pub lock: bool,
    /// Disable creation and mutation; selection, pan and zoom still work.
    pub readonly: bool,
    pub stroke_style: String,
    pub fill_style: String,
    pub line_width: f64,
    pub active_stroke_style: String,
    pub active_fill_style: String,
    pub ctrl_stroke_style: String,
    pub ctrl_fill_style: String,
    /// Control-point radius in screen pixels; also the hit radius of a Dot.
    pub ctrl_radius: f64,
    pub hide_label: bool,
    pub label_fill_style: String,
    pub label_font: String,
    pub text_fill_style: String,
    /// Labels longer than this many characters are truncated; 0 disables truncation.
    pub label_max_len: usize,
    pub label_up: bool,
    #[serde(rename = "MIN_WIDTH")]
    pub min_width: f64,
    #[serde(rename = "MIN_HEIGHT")]
    pub min_height: f64,
    #[serde(rename = "MIN_RADIUS")]
    pub min_radius: f64,
    /// Zoom with the mouse wheel.
    pub scroll_zoom: bool,
    /// What a primary pointer-down on the image creates.
    pub create_type: Tool,
    /// Two touch taps closer than this many milliseconds form a double tap.
    pub double_tap_ms: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock: false,
            readonly: false,
            stroke_style: "#0f0".to_owned(),
            fill_style: "rgba(0, 0, 255, 0.1)".to_owned(),
            line_width: 1.0,
            active_stroke_style: "#f00".to_owned(),
            active_fill_style: "rgba(255, 0, 0, 0.1)".to_owned(),
            ctrl_stroke_style: "#000".to_owned(),
            ctrl_fill_style: "#fff".to_owned(),
            ctrl_radius: 3.0,
            hide_label: false,
            label_fill_style: "#fff".to_owned(),
            label_font: "10px sans-serif".to_owned(),
            text_fill_style: "#000".to_owned(),
            label_max_len: 10,
            label_up: false,
            min_width: 10.0,
            min_height: 10.0,
            min_radius: 5.0,
            scroll_zoom: true,
            create_type: Tool::Select,
            double_tap_ms: 300.0,
        }
    }
}

impl Config {
    /// Parse a full or partial config document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when the JSON is malformed or a field has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Merge a partial JSON object into this config. Unknown keys are ignored.
    ///
    /// The config is left untouched when the merged result does not validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotAnObject` for a non-object patch and
    /// `ConfigError::Invalid` when a patched field has the wrong type.
    pub fn apply_patch(&mut self, patch: &Value) -> Result<(), ConfigError> {
        let Value::Object(incoming) = patch else {
            return Err(ConfigError::NotAnObject);
        };
        let mut merged = serde_json::to_value(&*self)?;
        if let Value::Object(existing) = &mut merged {
            for (k, v) in incoming {
                if existing.contains_key(k) {
                    existing.insert(k.clone(), v.clone());
                }
            }
        }
        *self = serde_json::from_value(merged)?;
        Ok(())
    }
}
