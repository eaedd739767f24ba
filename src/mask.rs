//! Off-surface raster masks for hit-testing irregular shapes.
//!
//! Polygon containment and polyline proximity are decided by drawing the one
//! shape into a scratch buffer the size of the viewport and reading back the
//! alpha at the pointer pixel. `MaskRaster` keeps that backend behind three
//! calls so the hit-tester never touches pixels directly.

#[cfg(test)]
#[path = "mask_test.rs"]
mod mask_test;

use tiny_skia::{Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::camera::Point;

/// Scratch raster used for mask hit-testing. All coordinates are screen pixels.
pub trait MaskRaster {
    /// Reallocate the buffer for a new viewport size.
    fn resize(&mut self, width: u32, height: u32);

    /// Clear the buffer and fill the closed polygon through `points`.
    fn fill_polygon_mask(&mut self, points: &[Point]);

    /// Clear the buffer and stroke the open polyline through `points`.
    fn stroke_line_mask(&mut self, points: &[Point], width: f64);

    /// Alpha (0-255) at the pixel containing `at`; 0 outside the buffer.
    fn sample_alpha(&self, at: Point) -> u8;
}

/// `MaskRaster` backed by a tiny-skia pixmap.
#[derive(Default)]
pub struct PixmapMask {
    pixmap: Option<Pixmap>,
}

impl PixmapMask {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { pixmap: Pixmap::new(width, height) }
    }

    fn clear(&mut self) -> Option<&mut Pixmap> {
        let pixmap = self.pixmap.as_mut()?;
        pixmap.fill(Color::TRANSPARENT);
        Some(pixmap)
    }
}

fn solid_paint() -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = false;
    paint
}

#[allow(clippy::cast_possible_truncation)]
fn build_path(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

impl MaskRaster for PixmapMask {
    fn resize(&mut self, width: u32, height: u32) {
        self.pixmap = Pixmap::new(width, height);
    }

    fn fill_polygon_mask(&mut self, points: &[Point]) {
        let Some(pixmap) = self.clear() else {
            return;
        };
        if points.len() < 3 {
            return;
        }
        if let Some(path) = build_path(points, true) {
            pixmap.fill_path(&path, &solid_paint(), FillRule::Winding, Transform::identity(), None);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn stroke_line_mask(&mut self, points: &[Point], width: f64) {
        let Some(pixmap) = self.clear() else {
            return;
        };
        if points.len() < 2 {
            return;
        }
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        if let Some(path) = build_path(points, false) {
            pixmap.stroke_path(&path, &solid_paint(), &stroke, Transform::identity(), None);
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sample_alpha(&self, at: Point) -> u8 {
        let Some(pixmap) = self.pixmap.as_ref() else {
            return 0;
        };
        let (x, y) = (at.x.floor(), at.y.floor());
        if x < 0.0 || y < 0.0 {
            return 0;
        }
        pixmap.pixel(x as u32, y as u32).map_or(0, |c| c.alpha())
    }
}
