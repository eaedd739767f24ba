//! Stateless geometry helpers shared by the shape model and hit-testing.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use uuid::Uuid;

use crate::camera::Point;
use crate::doc::{Geometry, Shape};

/// Ray-casting point-in-polygon test. Points exactly on an edge may land either way.
#[must_use]
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether every vertex of `inner` lies inside `outer`.
///
/// Only rectangle and polygon pairs can nest; any other combination is `false`.
#[must_use]
pub fn is_nested(outer: &Shape, inner: &Shape) -> bool {
    let inner_points: Vec<Point> = match &inner.geometry {
        Geometry::Rect { .. } => match inner.geometry.corners() {
            Some(corners) => corners.to_vec(),
            None => return false,
        },
        Geometry::Polygon(points) => points.clone(),
        _ => return false,
    };

    match &outer.geometry {
        Geometry::Rect { min, max } => inner_points
            .iter()
            .all(|p| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y),
        Geometry::Polygon(vertices) => inner_points.iter().all(|p| point_in_polygon(*p, vertices)),
        _ => false,
    }
}

#[must_use]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

#[must_use]
pub fn radians_to_degrees(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Fresh random (v4) identifier for a shape.
#[must_use]
pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}
