//! Input model: tools, pointer sources, keys, and the gesture state machine.
//!
//! `PointerInput` merges mouse and touch into one stream: a position in screen
//! space plus the source details needed to classify the gesture. `InputState`
//! is the gesture tracked between pointer-down and pointer-up, carrying the
//! context needed to compute incremental edits on each move.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::doc::ShapeKind;

/// What a primary pointer-down creates (`createType`). `Select` creates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tool {
    /// Selection / move mode (default).
    #[default]
    Select = 0,
    Rect = 1,
    Polygon = 2,
    Dot = 3,
    Line = 4,
    Circle = 5,
}

/// A `createType` outside `0..=5`.
#[derive(Debug, thiserror::Error)]
#[error("unknown createType: {0}")]
pub struct UnknownTool(pub u8);

impl Tool {
    /// The shape kind this tool creates, if any.
    #[must_use]
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Self::Select => None,
            Self::Rect => Some(ShapeKind::Rect),
            Self::Polygon => Some(ShapeKind::Polygon),
            Self::Dot => Some(ShapeKind::Dot),
            Self::Line => Some(ShapeKind::Line),
            Self::Circle => Some(ShapeKind::Circle),
        }
    }
}

impl TryFrom<u8> for Tool {
    type Error = UnknownTool;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Select),
            1 => Ok(Self::Rect),
            2 => Ok(Self::Polygon),
            3 => Ok(Self::Dot),
            4 => Ok(Self::Line),
            5 => Ok(Self::Circle),
            other => Err(UnknownTool(other)),
        }
    }
}

impl From<Tool> for u8 {
    fn from(tool: Tool) -> Self {
        tool as u8
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button.
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// Where a pointer event came from.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerSource {
    Mouse(Button),
    /// Active touch points in screen space.
    Touch(Vec<Point>),
}

/// How a pointer-down should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Create, select, move, or resize.
    Primary,
    /// Drag the image origin.
    Pan,
    /// Two-finger zoom and pan.
    Pinch,
}

/// A mouse or touch event merged into one screen position.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInput {
    pub pos: Point,
    pub source: PointerSource,
    /// Event timestamp in milliseconds, used for double-tap detection.
    pub time_ms: f64,
}

impl PointerInput {
    #[must_use]
    pub fn mouse(pos: Point, button: Button) -> Self {
        Self { pos, source: PointerSource::Mouse(button), time_ms: 0.0 }
    }

    /// A touch event. Returns `None` when no touch point is present.
    #[must_use]
    pub fn touch(touches: Vec<Point>, time_ms: f64) -> Option<Self> {
        let pos = merge_touches(&touches)?;
        Some(Self { pos, source: PointerSource::Touch(touches), time_ms })
    }

    #[must_use]
    pub fn is_touch(&self) -> bool {
        matches!(self.source, PointerSource::Touch(_))
    }

    #[must_use]
    pub fn gesture(&self) -> Gesture {
        match &self.source {
            PointerSource::Mouse(Button::Primary) => Gesture::Primary,
            PointerSource::Mouse(_) => Gesture::Pan,
            PointerSource::Touch(t) if t.len() >= 2 => Gesture::Pinch,
            PointerSource::Touch(_) => Gesture::Primary,
        }
    }

    /// The first two touch points, when this is a two-finger touch.
    #[must_use]
    pub fn touch_pair(&self) -> Option<(Point, Point)> {
        match &self.source {
            PointerSource::Touch(t) => match t.as_slice() {
                [a, b, ..] => Some((*a, *b)),
                _ => None,
            },
            PointerSource::Mouse(_) => None,
        }
    }
}

/// Single touch reports itself; two or more report the midpoint of the first two.
#[must_use]
pub fn merge_touches(touches: &[Point]) -> Option<Point> {
    match touches {
        [] => None,
        [one] => Some(*one),
        [a, b, ..] => Some(Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)),
    }
}

/// A keyboard key, named as the browser reports it (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Gesture tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the image origin in screen space.
    Panning {
        /// Pointer position minus image origin at gesture start.
        grab: Point,
    },
    /// Two-finger pinch.
    Pinching {
        /// Product of the axis distances between the touches at the previous event.
        last_product: f64,
        last_center: Point,
    },
    /// Sizing a just-created Rect or Circle by dragging.
    Drawing {
        /// Image-space pointer-down point: the fixed corner or the circle center.
        anchor: Point,
    },
    /// Moving the active shape's body.
    Moving {
        /// Image-space pointer position at gesture start.
        start: Point,
        /// Vertices at gesture start.
        original: Vec<Point>,
    },
    /// Dragging one control point of the active shape.
    Resizing {
        ctrl: usize,
        /// Pointer minus control point, in image space, at gesture start.
        offset: Point,
    },
}
