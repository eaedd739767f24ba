//! Rendering: draws the background image, shapes, labels, and grips to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads engine state and produces pixels; it never mutates shapes. Everything
//! is drawn in screen space so stroke widths and grip sizes stay constant under zoom.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::{Camera, Point};
use crate::config::Config;
use crate::consts::{LABEL_HEIGHT_PX, LABEL_PADDING_PX};
use crate::doc::{Geometry, Shape};
use crate::engine::EngineCore;
use crate::style::ShapeStyle;

/// Draw one frame.
///
/// `dpr` is the device pixel ratio; the viewport in `core` is in CSS pixels.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw(ctx: &CanvasRenderingContext2d, image: Option<&HtmlImageElement>, core: &EngineCore, dpr: f64) -> Result<(), JsValue> {
    let camera = &core.camera;
    let config = &core.config;

    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, core.viewport.width, core.viewport.height);

    if let Some(img) = image
        && camera.is_loaded()
    {
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            img,
            camera.origin_x,
            camera.origin_y,
            camera.image_width,
            camera.image_height,
        )?;
    }

    for shape in core.visible_shapes() {
        draw_shape(ctx, shape, camera, config)?;
    }

    if let Some(active) = core.active()
        && !active.hide
    {
        if active.creating
            && let Some(preview) = core.rubber_band()
        {
            draw_rubber_band(ctx, active, preview, camera, config);
        }
        draw_ctrls(ctx, active, camera, config)?;
    }

    for shape in core.visible_shapes() {
        draw_label(ctx, shape, camera, config)?;
    }
    Ok(())
}

// =============================================================
// Shapes
// =============================================================

fn draw_shape(ctx: &CanvasRenderingContext2d, shape: &Shape, camera: &Camera, config: &Config) -> Result<(), JsValue> {
    let style = ShapeStyle::new(shape, config);
    ctx.save();
    ctx.set_fill_style_str(style.fill());
    ctx.set_stroke_style_str(style.stroke());
    ctx.set_line_width(style.line_width());

    match &shape.geometry {
        Geometry::Rect { min, max } => {
            let a = camera.image_to_screen(*min);
            let b = camera.image_to_screen(*max);
            ctx.fill_rect(a.x, a.y, b.x - a.x, b.y - a.y);
            ctx.stroke_rect(a.x, a.y, b.x - a.x, b.y - a.y);
        }
        Geometry::Polygon(pts) => {
            trace_path(ctx, pts, camera);
            ctx.close_path();
            ctx.fill();
            ctx.stroke();
        }
        Geometry::Line(pts) => {
            trace_path(ctx, pts, camera);
            ctx.stroke();
        }
        Geometry::Dot(p) => {
            let c = camera.image_to_screen(*p);
            ctx.begin_path();
            ctx.arc(c.x, c.y, config.ctrl_radius, 0.0, TAU)?;
            ctx.fill();
            ctx.stroke();
        }
        Geometry::Circle { center, radius } => {
            let c = camera.image_to_screen(*center);
            ctx.begin_path();
            ctx.arc(c.x, c.y, camera.image_len_to_screen(*radius), 0.0, TAU)?;
            ctx.fill();
            ctx.stroke();
        }
    }

    ctx.restore();
    Ok(())
}

fn trace_path(ctx: &CanvasRenderingContext2d, pts: &[Point], camera: &Camera) {
    ctx.begin_path();
    for (i, p) in pts.iter().enumerate() {
        let s = camera.image_to_screen(*p);
        if i == 0 {
            ctx.move_to(s.x, s.y);
        } else {
            ctx.line_to(s.x, s.y);
        }
    }
}

/// Segment from the last committed vertex to the pointer.
fn draw_rubber_band(ctx: &CanvasRenderingContext2d, shape: &Shape, preview: Point, camera: &Camera, config: &Config) {
    let Some(last) = shape.geometry.vertices().last().copied() else {
        return;
    };
    let a = camera.image_to_screen(last);
    let b = camera.image_to_screen(preview);
    ctx.save();
    ctx.set_stroke_style_str(ShapeStyle::new(shape, config).stroke());
    ctx.begin_path();
    ctx.move_to(a.x, a.y);
    ctx.line_to(b.x, b.y);
    ctx.stroke();
    ctx.restore();
}

fn draw_ctrls(ctx: &CanvasRenderingContext2d, shape: &Shape, camera: &Camera, config: &Config) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_fill_style_str(&config.ctrl_fill_style);
    ctx.set_stroke_style_str(&config.ctrl_stroke_style);
    ctx.set_line_width(1.0);
    for grip in shape.ctrls() {
        let s = camera.image_to_screen(grip);
        ctx.begin_path();
        ctx.arc(s.x, s.y, config.ctrl_radius, 0.0, TAU)?;
        ctx.fill();
        ctx.stroke();
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Labels
// =============================================================

/// Screen point the label box hangs from.
fn label_anchor(shape: &Shape, camera: &Camera) -> Option<Point> {
    let p = match &shape.geometry {
        Geometry::Rect { min, .. } => *min,
        Geometry::Polygon(pts) | Geometry::Line(pts) => *pts.first()?,
        Geometry::Dot(p) | Geometry::Circle { center: p, .. } => *p,
    };
    Some(camera.image_to_screen(p))
}

fn draw_label(ctx: &CanvasRenderingContext2d, shape: &Shape, camera: &Camera, config: &Config) -> Result<(), JsValue> {
    let style = ShapeStyle::new(shape, config);
    let Some(text) = style.label_text() else {
        return Ok(());
    };
    let Some(anchor) = label_anchor(shape, camera) else {
        return Ok(());
    };

    ctx.save();
    ctx.set_font(style.label_font());
    let width = measured_text_width(ctx, &text) + LABEL_PADDING_PX * 2.0;
    let top = if style.label_up() { anchor.y - LABEL_HEIGHT_PX } else { anchor.y };

    ctx.set_fill_style_str(style.label_fill());
    ctx.fill_rect(anchor.x, top, width, LABEL_HEIGHT_PX);
    ctx.set_fill_style_str(style.text_fill());
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    ctx.fill_text(&text, anchor.x + LABEL_PADDING_PX, top + LABEL_HEIGHT_PX / 2.0)?;
    ctx.restore();
    Ok(())
}

fn measured_text_width(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
    match ctx.measure_text(text) {
        Ok(metrics) => metrics.width(),
        Err(_) => 0.0,
    }
}
