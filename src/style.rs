//! Paint style resolution: per-shape override, then engine default.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use std::borrow::Cow;

use crate::config::Config;
use crate::consts::LABEL_ELLIPSIS;
use crate::doc::Shape;

/// Typed view of the effective paint for one shape under one config.
///
/// Active shapes always use the config's active stroke/fill so selection
/// stays visible regardless of overrides.
#[derive(Debug, Clone, Copy)]
pub struct ShapeStyle<'a> {
    shape: &'a Shape,
    config: &'a Config,
}

fn pick<'a>(over: Option<&'a String>, default: &'a str) -> &'a str {
    over.map_or(default, String::as_str)
}

impl<'a> ShapeStyle<'a> {
    #[must_use]
    pub fn new(shape: &'a Shape, config: &'a Config) -> Self {
        Self { shape, config }
    }

    #[must_use]
    pub fn stroke(&self) -> &'a str {
        if self.shape.active {
            return &self.config.active_stroke_style;
        }
        pick(self.shape.style.stroke_style.as_ref(), &self.config.stroke_style)
    }

    #[must_use]
    pub fn fill(&self) -> &'a str {
        if self.shape.active {
            return &self.config.active_fill_style;
        }
        pick(self.shape.style.fill_style.as_ref(), &self.config.fill_style)
    }

    #[must_use]
    pub fn line_width(&self) -> f64 {
        self.shape.style.line_width.unwrap_or(self.config.line_width)
    }

    #[must_use]
    pub fn label_fill(&self) -> &'a str {
        pick(self.shape.style.label_fill_style.as_ref(), &self.config.label_fill_style)
    }

    #[must_use]
    pub fn text_fill(&self) -> &'a str {
        pick(self.shape.style.text_fill_style.as_ref(), &self.config.text_fill_style)
    }

    #[must_use]
    pub fn label_font(&self) -> &'a str {
        pick(self.shape.style.label_font.as_ref(), &self.config.label_font)
    }

    #[must_use]
    pub fn hide_label(&self) -> bool {
        self.shape.style.hide_label.unwrap_or(self.config.hide_label)
    }

    #[must_use]
    pub fn label_up(&self) -> bool {
        self.shape.style.label_up.unwrap_or(self.config.label_up)
    }

    /// The label text to draw, or `None` when hidden or empty.
    #[must_use]
    pub fn label_text(&self) -> Option<Cow<'a, str>> {
        if self.hide_label() || self.shape.label.is_empty() {
            return None;
        }
        Some(truncate_label(&self.shape.label, self.config.label_max_len))
    }
}

/// Cut `label` to `max_len` characters and append an ellipsis. `max_len == 0` keeps it whole.
#[must_use]
pub fn truncate_label(label: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed(label);
    }
    match label.char_indices().nth(max_len) {
        Some((cut, _)) => Cow::Owned(format!("{}{LABEL_ELLIPSIS}", &label[..cut])),
        None => Cow::Borrowed(label),
    }
}
