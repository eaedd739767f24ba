//! Shared numeric constants for the annotation engine.

// ── Zoom ladder ─────────────────────────────────────────────────

/// Per-step size multiplier while `scale_step >= 0`.
pub const ZOOM_IN_FACTOR: f64 = 1.05;

/// Per-step size multiplier while `scale_step < 0`.
pub const ZOOM_OUT_FACTOR: f64 = 0.95;

/// Zooming out is refused once the shorter displayed edge is below this many pixels.
pub const MIN_DISPLAY_EDGE_PX: f64 = 20.0;

/// Zooming in is refused once the displayed width exceeds the natural long edge times this.
pub const MAX_ZOOM_RATIO: f64 = 100.0;

/// Upper bound on ladder steps taken by a single fit-zoom search.
pub const FIT_ZOOM_MAX_STEPS: usize = 512;

// ── Hit-testing ─────────────────────────────────────────────────

/// Minimum stroke width, in screen pixels, used when rasterizing a polyline for hit-testing.
pub const LINE_HIT_MIN_WIDTH_PX: f64 = 5.0;

// ── Labels ──────────────────────────────────────────────────────

/// Suffix appended to labels truncated to `label_max_len` characters.
pub const LABEL_ELLIPSIS: &str = "...";

/// Horizontal padding around label text, in screen pixels.
pub const LABEL_PADDING_PX: f64 = 4.0;

/// Height of the label box, in screen pixels.
pub const LABEL_HEIGHT_PX: f64 = 16.0;
