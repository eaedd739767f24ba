//! Hit-testing in screen space.
//!
//! Rect, Circle, and Dot are tested analytically against their displayed
//! geometry. Polygon and Line are drawn alone into the `MaskRaster` and the
//! alpha under the pointer decides, so the hit area matches the filled shape
//! and a stroke band at least `LINE_HIT_MIN_WIDTH_PX` wide.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::config::Config;
use crate::consts::LINE_HIT_MIN_WIDTH_PX;
use crate::doc::{Dataset, Geometry, Shape};
use crate::mask::MaskRaster;
use crate::style::ShapeStyle;

/// Read-only state a hit test depends on.
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub camera: &'a Camera,
    pub config: &'a Config,
    /// Only the active shape is eligible.
    pub focus_mode: bool,
}

/// Whether `point` lies within `radius` screen pixels of the image point `center`.
#[must_use]
pub fn point_in_circle(point: Point, center: Point, radius: f64, camera: &Camera) -> bool {
    point.distance_to(camera.image_to_screen(center)) <= radius
}

/// Whether `point` lies inside the displayed box spanning image points `min`/`max`.
#[must_use]
pub fn point_in_rect(point: Point, min: Point, max: Point, camera: &Camera) -> bool {
    let a = camera.image_to_screen(min);
    let b = camera.image_to_screen(max);
    point.x >= a.x.min(b.x) && point.x <= a.x.max(b.x) && point.y >= a.y.min(b.y) && point.y <= a.y.max(b.y)
}

/// Index of the first control point of `shape` under `point`.
#[must_use]
pub fn hit_ctrl(point: Point, shape: &Shape, camera: &Camera, ctrl_radius: f64) -> Option<usize> {
    shape.ctrls().iter().position(|c| point_in_circle(point, *c, ctrl_radius, camera))
}

/// Whether `point` is on the body of `shape`.
pub fn hit_shape(point: Point, shape: &Shape, ctx: &HitContext<'_>, mask: &mut dyn MaskRaster) -> bool {
    let camera = ctx.camera;
    match &shape.geometry {
        Geometry::Rect { min, max } => point_in_rect(point, *min, *max, camera),
        Geometry::Dot(p) => point_in_circle(point, *p, ctx.config.ctrl_radius, camera),
        Geometry::Circle { center, radius } => {
            point_in_circle(point, *center, camera.image_len_to_screen(*radius), camera)
        }
        Geometry::Polygon(pts) => {
            let screen: Vec<Point> = pts.iter().map(|p| camera.image_to_screen(*p)).collect();
            mask.fill_polygon_mask(&screen);
            mask.sample_alpha(point) > 0
        }
        Geometry::Line(pts) => {
            let screen: Vec<Point> = pts.iter().map(|p| camera.image_to_screen(*p)).collect();
            let width = ShapeStyle::new(shape, ctx.config).line_width().max(LINE_HIT_MIN_WIDTH_PX);
            mask.stroke_line_mask(&screen, width);
            mask.sample_alpha(point) > 0
        }
    }
}

/// Topmost visible shape whose body is under `point`.
pub fn hit_test(point: Point, dataset: &Dataset, ctx: &HitContext<'_>, mask: &mut dyn MaskRaster) -> Option<usize> {
    dataset
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, s)| !s.hide && (!ctx.focus_mode || s.active))
        .find(|(_, s)| hit_shape(point, s, ctx, mask))
        .map(|(pos, _)| pos)
}
