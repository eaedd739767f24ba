//! Shape model: the five annotation variants, their interchange form, and the dataset.
//!
//! Geometry is a tagged union (`Geometry`) and everything that varies by shape
//! type (control points, hit-testing, rendering) dispatches on that tag. A
//! `Shape` wraps a geometry with the fields every annotation shares: identity,
//! label, style overrides, and lifecycle flags.
//!
//! `Dataset` is the ordered list the engine owns. Order is paint order: the last
//! shape draws on top and is hit-tested first. The `index` stored on each shape
//! is its stable identity within a session and survives temporary reordering.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::camera::Point;
use crate::geom::new_uuid;

/// Unique identifier for a shape.
pub type ShapeId = Uuid;

/// Error produced while building a shape from its interchange form.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("shape must be a JSON object")]
    NotAnObject,
    #[error("shape has no numeric type code")]
    MissingType,
    #[error("unknown shape type code: {0}")]
    UnknownType(i64),
    #[error("{0:?} shape has no coor")]
    MissingCoor(ShapeKind),
    #[error("invalid coor for {kind:?}: {reason}")]
    InvalidCoor { kind: ShapeKind, reason: String },
    #[error("invalid style field: {0}")]
    Style(#[source] serde_json::Error),
}

/// The five annotation variants, with their canonical type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ShapeKind {
    Rect = 1,
    Polygon = 2,
    Dot = 3,
    Line = 4,
    Circle = 5,
}

impl ShapeKind {
    /// Canonical type code (1..=5).
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether shapes of this kind are built one click per vertex.
    #[must_use]
    pub fn is_multi_point(self) -> bool {
        matches!(self, Self::Polygon | Self::Line)
    }

    /// Vertices required before a multi-point shape can be committed.
    #[must_use]
    pub fn min_vertices(self) -> usize {
        match self {
            Self::Polygon => 3,
            Self::Line | Self::Rect => 2,
            Self::Dot | Self::Circle => 1,
        }
    }
}

impl TryFrom<i64> for ShapeKind {
    type Error = ShapeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Rect),
            2 => Ok(Self::Polygon),
            3 => Ok(Self::Dot),
            4 => Ok(Self::Line),
            5 => Ok(Self::Circle),
            other => Err(ShapeError::UnknownType(other)),
        }
    }
}

impl From<ShapeKind> for i64 {
    fn from(kind: ShapeKind) -> Self {
        i64::from(kind.code())
    }
}

/// Type-dependent geometry, in image space.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box; `min` is top-left and `max` bottom-right once normalized.
    Rect { min: Point, max: Point },
    /// Closed polygon, one entry per vertex.
    Polygon(Vec<Point>),
    /// Single marker point.
    Dot(Point),
    /// Open polyline, one entry per vertex.
    Line(Vec<Point>),
    Circle { center: Point, radius: f64 },
}

impl Geometry {
    /// A rectangle spanning two arbitrary corners, normalized to min/max order.
    #[must_use]
    pub fn rect(a: Point, b: Point) -> Self {
        Self::Rect {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rect { .. } => ShapeKind::Rect,
            Self::Polygon(_) => ShapeKind::Polygon,
            Self::Dot(_) => ShapeKind::Dot,
            Self::Line(_) => ShapeKind::Line,
            Self::Circle { .. } => ShapeKind::Circle,
        }
    }

    /// Parse the interchange `coor` (and `radius` for circles) for a given kind.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::InvalidCoor` when `coor` has the wrong shape for `kind`.
    pub fn from_coor(kind: ShapeKind, coor: &Value, radius: Option<&Value>) -> Result<Self, ShapeError> {
        let invalid = |reason: String| ShapeError::InvalidCoor { kind, reason };
        let points = || serde_json::from_value::<Vec<Point>>(coor.clone()).map_err(|e| invalid(e.to_string()));
        let point = || serde_json::from_value::<Point>(coor.clone()).map_err(|e| invalid(e.to_string()));

        match kind {
            ShapeKind::Rect => {
                let pts = points()?;
                match pts.as_slice() {
                    [a, b] => Ok(Self::rect(*a, *b)),
                    _ => Err(invalid(format!("expected 2 corners, got {}", pts.len()))),
                }
            }
            ShapeKind::Polygon | ShapeKind::Line => {
                let pts = points()?;
                if pts.is_empty() {
                    return Err(invalid("no vertices".to_owned()));
                }
                Ok(if kind == ShapeKind::Polygon { Self::Polygon(pts) } else { Self::Line(pts) })
            }
            ShapeKind::Dot => Ok(Self::Dot(point()?)),
            ShapeKind::Circle => {
                let center = point()?;
                let radius = match radius {
                    None | Some(Value::Null) => 0.0,
                    Some(v) => v.as_f64().ok_or_else(|| invalid(format!("radius is not a number: {v}")))?,
                };
                if !radius.is_finite() || radius < 0.0 {
                    return Err(invalid(format!("radius out of range: {radius}")));
                }
                Ok(Self::Circle { center, radius })
            }
        }
    }

    /// The interchange `coor` value.
    #[must_use]
    pub fn coor(&self) -> Value {
        let pair = |p: &Point| Value::from(vec![p.x, p.y]);
        match self {
            Self::Rect { min, max } => Value::Array(vec![pair(min), pair(max)]),
            Self::Polygon(pts) | Self::Line(pts) => Value::Array(pts.iter().map(pair).collect()),
            Self::Dot(p) | Self::Circle { center: p, .. } => pair(p),
        }
    }

    /// All stored points, in storage order.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Self::Rect { min, max } => vec![*min, *max],
            Self::Polygon(pts) | Self::Line(pts) => pts.clone(),
            Self::Dot(p) | Self::Circle { center: p, .. } => vec![*p],
        }
    }

    /// Replace all stored points. Returns `false` (and changes nothing) on a length mismatch.
    pub fn set_vertices(&mut self, new: &[Point]) -> bool {
        match (self, new) {
            (Self::Rect { min, max }, [a, b]) => {
                *min = *a;
                *max = *b;
            }
            (Self::Polygon(pts) | Self::Line(pts), new) if pts.len() == new.len() => {
                pts.copy_from_slice(new);
            }
            (Self::Dot(p) | Self::Circle { center: p, .. }, [c]) => *p = *c,
            _ => return false,
        }
        true
    }

    /// The four corners of a rectangle, clockwise from top-left.
    #[must_use]
    pub fn corners(&self) -> Option<[Point; 4]> {
        match self {
            Self::Rect { min, max } => Some([*min, Point::new(max.x, min.y), *max, Point::new(min.x, max.y)]),
            _ => None,
        }
    }

    /// Control points (grips) for resizing, in image space.
    ///
    /// Rect: corners and edge midpoints clockwise from top-left (8 grips).
    /// Polygon/Line: one per vertex. Circle: center, then the radius grip on
    /// the right edge. Dot: none.
    #[must_use]
    pub fn ctrls(&self) -> Vec<Point> {
        match self {
            Self::Rect { min, max } => {
                let mx = min.x + (max.x - min.x) / 2.0;
                let my = min.y + (max.y - min.y) / 2.0;
                vec![
                    *min,
                    Point::new(mx, min.y),
                    Point::new(max.x, min.y),
                    Point::new(max.x, my),
                    *max,
                    Point::new(mx, max.y),
                    Point::new(min.x, max.y),
                    Point::new(min.x, my),
                ]
            }
            Self::Polygon(pts) | Self::Line(pts) => pts.clone(),
            Self::Circle { center, radius } => vec![*center, Point::new(center.x + radius, center.y)],
            Self::Dot(_) => Vec::new(),
        }
    }

    /// Scale per axis about the image origin. Circle radii scale by the geometric mean.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        let s = |p: &mut Point| {
            p.x *= sx;
            p.y *= sy;
        };
        match self {
            Self::Rect { min, max } => {
                s(min);
                s(max);
            }
            Self::Polygon(pts) | Self::Line(pts) => pts.iter_mut().for_each(s),
            Self::Dot(p) => s(p),
            Self::Circle { center, radius } => {
                s(center);
                *radius *= (sx * sy).abs().sqrt();
            }
        }
    }
}

/// Optional per-shape paint overrides. Absent fields fall back to engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_fill_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_fill_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_label: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_up: Option<bool>,
}

/// One annotation.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub uuid: ShapeId,
    /// Stable identity and original paint order within the session.
    pub index: usize,
    pub geometry: Geometry,
    pub label: String,
    pub style: StyleOverrides,
    /// The single selected (or in-construction) shape.
    pub active: bool,
    /// Still being drawn; implies `active`.
    pub creating: bool,
    /// Body drag in progress.
    pub dragging: bool,
    /// Excluded from rendering and hit-testing.
    pub hide: bool,
}

impl Shape {
    #[must_use]
    pub fn new(geometry: Geometry, index: usize) -> Self {
        Self {
            uuid: new_uuid(),
            index,
            geometry,
            label: String::new(),
            style: StyleOverrides::default(),
            active: false,
            creating: false,
            dragging: false,
            hide: false,
        }
    }

    /// Build a shape from its interchange property bag at position `index`.
    ///
    /// Transient flags (`active`, `creating`, `dragging`) in the input are ignored.
    ///
    /// # Errors
    ///
    /// Fails when `value` is not an object, carries an unknown `type`, or its
    /// `coor`/style fields do not match the type.
    pub fn from_value(value: &Value, index: usize) -> Result<Self, ShapeError> {
        let obj = value.as_object().ok_or(ShapeError::NotAnObject)?;
        let code = obj.get("type").and_then(Value::as_i64).ok_or(ShapeError::MissingType)?;
        let kind = ShapeKind::try_from(code)?;
        let coor = obj.get("coor").ok_or(ShapeError::MissingCoor(kind))?;
        let geometry = Geometry::from_coor(kind, coor, obj.get("radius"))?;
        let style: StyleOverrides = serde_json::from_value(value.clone()).map_err(ShapeError::Style)?;

        let uuid = match obj.get("uuid").and_then(Value::as_str).map(Uuid::parse_str) {
            Some(Ok(id)) => id,
            _ => new_uuid(),
        };

        Ok(Self {
            uuid,
            index,
            geometry,
            label: obj.get("label").and_then(Value::as_str).unwrap_or_default().to_owned(),
            style,
            active: false,
            creating: false,
            dragging: false,
            hide: obj.get("hide").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    /// The interchange representation: `{ type, coor, label, radius?, ...style }`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_owned(), Value::from(self.kind().code()));
        map.insert("coor".to_owned(), self.geometry.coor());
        map.insert("label".to_owned(), Value::from(self.label.clone()));
        map.insert("index".to_owned(), Value::from(self.index));
        map.insert("uuid".to_owned(), Value::from(self.uuid.to_string()));
        if let Geometry::Circle { radius, .. } = self.geometry {
            map.insert("radius".to_owned(), Value::from(radius));
        }
        if self.hide {
            map.insert("hide".to_owned(), Value::Bool(true));
        }
        if let Ok(Value::Object(style)) = serde_json::to_value(&self.style) {
            map.extend(style);
        }
        Value::Object(map)
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    #[must_use]
    pub fn ctrls(&self) -> Vec<Point> {
        self.geometry.ctrls()
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.geometry.scale(sx, sy);
    }
}

/// Ordered shape list. Position is paint order; `Shape::index` is identity.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    shapes: Vec<Shape>,
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from interchange values, skipping entries that fail to parse.
    ///
    /// Accepted shapes are numbered `0..n` in input order. Rejected entries are
    /// returned with their input position.
    #[must_use]
    pub fn from_values(values: &[Value]) -> (Self, Vec<(usize, ShapeError)>) {
        let mut shapes = Vec::with_capacity(values.len());
        let mut rejected = Vec::new();
        for (pos, value) in values.iter().enumerate() {
            match Shape::from_value(value, shapes.len()) {
                Ok(shape) => shapes.push(shape),
                Err(e) => rejected.push((pos, e)),
            }
        }
        (Self { shapes }, rejected)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shapes in paint order (bottom first).
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&Shape> {
        self.shapes.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut Shape> {
        self.shapes.get_mut(pos)
    }

    /// The `index` a newly appended shape should take.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.shapes.len()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn pop(&mut self) -> Option<Shape> {
        self.shapes.pop()
    }

    /// Position of the active shape, found by scanning.
    #[must_use]
    pub fn active_position(&self) -> Option<usize> {
        self.shapes.iter().position(|s| s.active)
    }

    #[must_use]
    pub fn active(&self) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.active)
    }

    /// Make the shape at `pos` the only active one.
    pub fn activate(&mut self, pos: usize) {
        for (i, shape) in self.shapes.iter_mut().enumerate() {
            shape.active = i == pos;
        }
    }

    pub fn deactivate_all(&mut self) {
        for shape in &mut self.shapes {
            shape.active = false;
            shape.creating = false;
            shape.dragging = false;
        }
    }

    /// Move the shape at `pos` to the top of the paint order. Returns its new position.
    pub fn bring_to_front(&mut self, pos: usize) -> usize {
        if pos < self.shapes.len() {
            let shape = self.shapes.remove(pos);
            self.shapes.push(shape);
        }
        self.shapes.len().saturating_sub(1)
    }

    /// Restore paint order to stored `index` order.
    pub fn restore_order(&mut self) {
        self.shapes.sort_by_key(|s| s.index);
    }

    #[must_use]
    pub fn position_of_index(&self, index: usize) -> Option<usize> {
        self.shapes.iter().position(|s| s.index == index)
    }

    /// Remove the shape whose `index` matches, then renumber the rest `0..n` in paint order.
    pub fn remove_by_index(&mut self, index: usize) -> Option<Shape> {
        let pos = self.position_of_index(index)?;
        let removed = self.shapes.remove(pos);
        self.renumber();
        Some(removed)
    }

    /// Reassign `index` to match current positions.
    pub fn renumber(&mut self) {
        for (i, shape) in self.shapes.iter_mut().enumerate() {
            shape.index = i;
        }
    }

    /// Interchange values in paint order.
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        self.shapes.iter().map(Shape::to_value).collect()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}
