//! Image transform: origin, natural size, zoom ladder, and screen/image mapping.
//!
//! Shape geometry is stored in image space (natural-image pixels). The pointer
//! arrives in screen space (CSS pixels on the drawing surface). `Camera` owns the
//! only state relating the two: where the image's top-left sits on screen and how
//! large it is currently displayed.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::consts::{FIT_ZOOM_MAX_STEPS, MAX_ZOOM_RATIO, MIN_DISPLAY_EDGE_PX, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};

/// A point in either screen or image space.
///
/// Serialized as a two-element array `[x, y]`, the interchange form of `coor`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Size of the drawing surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Transform state for the displayed background image.
///
/// `origin_x` / `origin_y` are the screen position of the image's top-left corner.
/// `image_width` / `image_height` are the displayed size; the natural size lives
/// in `image_origin_width` / `image_origin_height`. The scale factor is always
/// derived from those, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub origin_x: f64,
    pub origin_y: f64,
    pub image_origin_width: f64,
    pub image_origin_height: f64,
    pub image_width: f64,
    pub image_height: f64,
    /// Position on the exponential zoom ladder; 0 is natural size.
    pub scale_step: i32,
}

impl Camera {
    /// Displayed-to-natural size ratio, or 1 when no image is loaded.
    #[must_use]
    pub fn scale(&self) -> f64 {
        if self.image_origin_width > 0.0 && self.image_width > 0.0 {
            self.image_width / self.image_origin_width
        } else {
            1.0
        }
    }

    /// Whether a background image with a nonzero natural size has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.image_origin_width > 0.0 && self.image_origin_height > 0.0
    }

    /// Reset the transform for a freshly loaded image of the given natural size.
    pub fn load_image(&mut self, width: f64, height: f64) {
        *self = Self {
            image_origin_width: width,
            image_origin_height: height,
            image_width: width,
            image_height: height,
            ..Self::default()
        };
    }

    /// Map a screen point to image space, rounded to whole image pixels.
    #[must_use]
    pub fn screen_to_image(&self, screen: Point) -> Point {
        let scale = self.scale();
        Point::new(
            ((screen.x - self.origin_x) / scale).round(),
            ((screen.y - self.origin_y) / scale).round(),
        )
    }

    /// Map an image-space point to screen space.
    #[must_use]
    pub fn image_to_screen(&self, image: Point) -> Point {
        let scale = self.scale();
        Point::new(image.x * scale + self.origin_x, image.y * scale + self.origin_y)
    }

    /// Convert an image-space length to screen pixels.
    #[must_use]
    pub fn image_len_to_screen(&self, len: f64) -> f64 {
        len * self.scale()
    }

    /// Whether a screen point lies on the displayed image.
    #[must_use]
    pub fn contains_screen(&self, screen: Point) -> bool {
        screen.x >= self.origin_x
            && screen.y >= self.origin_y
            && screen.x <= self.origin_x + self.image_width
            && screen.y <= self.origin_y + self.image_height
    }

    /// Whether an image-space point lies within the natural image bounds.
    #[must_use]
    pub fn contains_image(&self, image: Point) -> bool {
        image.x >= 0.0 && image.y >= 0.0 && image.x <= self.image_origin_width && image.y <= self.image_origin_height
    }

    /// Clamp an image-space point into the natural image bounds.
    #[must_use]
    pub fn clamp_image(&self, image: Point) -> Point {
        Point::new(
            image.x.clamp(0.0, self.image_origin_width.max(0.0)),
            image.y.clamp(0.0, self.image_origin_height.max(0.0)),
        )
    }

    /// Shift the image origin by a raw screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.origin_x += dx;
        self.origin_y += dy;
    }

    /// Take one step along the zoom ladder.
    ///
    /// With an `anchor`, the image point under that screen position stays put;
    /// otherwise the viewport center does. Returns `false` when the step is
    /// refused by the zoom bounds or no image is loaded.
    pub fn step_zoom(&mut self, zoom_in: bool, anchor: Option<Point>, viewport: Viewport) -> bool {
        if !self.is_loaded() {
            return false;
        }
        if zoom_in {
            if self.image_width > self.image_origin_width.max(self.image_origin_height) * MAX_ZOOM_RATIO {
                return false;
            }
        } else if self.image_width.min(self.image_height) < MIN_DISPLAY_EDGE_PX {
            return false;
        }

        let before = self.scale();
        let prev_width = self.image_width;
        let pinned = anchor.map(|p| (p, Point::new((p.x - self.origin_x) / before, (p.y - self.origin_y) / before)));

        self.scale_step += if zoom_in { 1 } else { -1 };
        let factor = if self.scale_step >= 0 { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
        let k = factor.powi(self.scale_step.abs());
        self.image_width = (self.image_origin_width * k).round();
        self.image_height = (self.image_origin_height * k).round();

        if let Some((screen, image)) = pinned {
            let after = self.scale();
            self.origin_x = screen.x - image.x * after;
            self.origin_y = screen.y - image.y * after;
        } else {
            let ratio = if prev_width > 0.0 { self.image_width / prev_width } else { 1.0 };
            let c = viewport.center();
            self.origin_x = c.x - (c.x - self.origin_x) * ratio;
            self.origin_y = c.y - (c.y - self.origin_y) * ratio;
        }
        true
    }

    /// Fit the image inside the viewport, preserving aspect ratio, and center it.
    ///
    /// First walks the ladder until the image is neither entirely smaller nor
    /// larger than the viewport, then snaps the displayed size so one axis fills
    /// the viewport exactly. Returns `false` when there is nothing to fit.
    pub fn fit(&mut self, viewport: Viewport) -> bool {
        if !self.is_loaded() || viewport.is_empty() {
            return false;
        }

        let mut steps = 0;
        while self.image_width < viewport.width && self.image_height < viewport.height && steps < FIT_ZOOM_MAX_STEPS {
            if !self.step_zoom(true, None, viewport) {
                break;
            }
            steps += 1;
        }
        while (self.image_width > viewport.width || self.image_height > viewport.height) && steps < FIT_ZOOM_MAX_STEPS {
            if !self.step_zoom(false, None, viewport) {
                break;
            }
            steps += 1;
        }

        if self.image_origin_height / self.image_origin_width >= viewport.height / viewport.width {
            self.image_width = self.image_origin_width / (self.image_origin_height / viewport.height);
            self.image_height = viewport.height;
        } else {
            self.image_width = viewport.width;
            self.image_height = self.image_origin_height / (self.image_origin_width / viewport.width);
        }
        self.origin_x = (viewport.width - self.image_width) / 2.0;
        self.origin_y = (viewport.height - self.image_height) / 2.0;
        true
    }
}
