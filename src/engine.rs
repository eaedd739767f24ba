//! Engine core: the interaction state machine and the public operations.
//!
//! Pointer, key, and wheel input mutate the dataset and camera, then request a
//! redraw. Nothing here touches the DOM.

use serde_json::Value;
use tracing::{debug, warn};

use crate::camera::{Camera, Point, Viewport};
use crate::config::Config;
use crate::doc::{Dataset, Geometry, Shape, ShapeKind};
use crate::events::Event;
use crate::frame::{FrameHandle, FrameQueue, FrameScheduler};
use crate::hit::{HitContext, hit_ctrl, hit_test};
use crate::input::{Gesture, InputState, Key, PointerInput, WheelDelta};
use crate::mask::{MaskRaster, PixmapMask};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Core engine state: every piece of logic that doesn't depend on the browser.
///
/// Separated from `web::Engine` so it can be tested headlessly with a
/// tiny-skia mask and a recording frame scheduler. Events produced by an
/// operation are queued and drained by the host with `take_events`.
pub struct EngineCore {
    pub config: Config,
    pub camera: Camera,
    pub viewport: Viewport,
    pub input: InputState,
    dataset: Dataset,
    focus_mode: bool,
    /// Last pointer position in screen space; the zoom anchor.
    mouse: Point,
    /// Image-space preview point of the in-progress polygon/line.
    rubber_band: Option<Point>,
    last_tap_ms: Option<f64>,
    pending_data: Option<Vec<Value>>,
    image_src: Option<String>,
    mask: Box<dyn MaskRaster>,
    frames: Box<dyn FrameScheduler>,
    pending_frame: Option<FrameHandle>,
    outbox: Vec<Event>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_backends(Box::new(PixmapMask::default()), Box::new(FrameQueue::new()))
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_backends(mask: Box<dyn MaskRaster>, frames: Box<dyn FrameScheduler>) -> Self {
        Self {
            config: Config::default(),
            camera: Camera::default(),
            viewport: Viewport::default(),
            input: InputState::Idle,
            dataset: Dataset::new(),
            focus_mode: false,
            mouse: Point::default(),
            rubber_band: None,
            last_tap_ms: None,
            pending_data: None,
            image_src: None,
            mask,
            frames,
            pending_frame: None,
            outbox: Vec::new(),
        }
    }

    // --- Surface and image ---

    /// Re-measure the drawing surface (CSS pixels).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width.max(0.0), height.max(0.0));
        self.mask.resize(self.viewport.width.ceil() as u32, self.viewport.height.ceil() as u32);
        self.request_redraw();
    }

    /// Record a new background image source. Geometry is set by `on_image_loaded`.
    pub fn set_image(&mut self, src: &str) {
        self.image_src = Some(src.to_owned());
    }

    #[must_use]
    pub fn image_src(&self) -> Option<&str> {
        self.image_src.as_deref()
    }

    /// The background image finished decoding with the given natural size.
    pub fn on_image_loaded(&mut self, width: f64, height: f64) {
        debug!(width, height, "background image loaded");
        self.outbox.push(Event::Load(self.image_src.clone().unwrap_or_default()));
        self.camera.load_image(width, height);
        self.fit_zoom();
    }

    // --- Data ---

    /// Queue a bulk replacement of the dataset. Applied by `apply_pending_data`.
    pub fn set_data(&mut self, shapes: Vec<Value>) {
        self.pending_data = Some(shapes);
    }

    /// Apply the most recent `set_data` batch. Returns `false` when none was queued.
    pub fn apply_pending_data(&mut self) -> bool {
        let Some(values) = self.pending_data.take() else {
            return false;
        };
        let (dataset, rejected) = Dataset::from_values(&values);
        for (position, error) in rejected {
            warn!(position, error = %error, "dropping invalid shape");
            self.outbox.push(Event::Warn(format!("invalid shape at {position}: {error}")));
        }
        debug!(count = dataset.len(), "dataset replaced");
        self.dataset = dataset;
        self.input = InputState::Idle;
        self.rubber_band = None;
        self.request_redraw();
        true
    }

    /// Interchange form of the whole dataset, in paint order.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.dataset.to_values())
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The selected or in-construction shape.
    #[must_use]
    pub fn active(&self) -> Option<&Shape> {
        self.dataset.active()
    }

    #[must_use]
    pub fn rubber_band(&self) -> Option<Point> {
        self.rubber_band
    }

    #[must_use]
    pub fn focus_mode(&self) -> bool {
        self.focus_mode
    }

    /// Remove the shape with stored `index`, renumbering the rest.
    pub fn delete_by_index(&mut self, index: usize) -> Option<Shape> {
        let removed = self.dataset.remove_by_index(index)?;
        if removed.creating {
            self.rubber_band = None;
            self.input = InputState::Idle;
        }
        self.outbox.push(Event::Delete(removed.clone()));
        self.request_redraw();
        Some(removed)
    }

    // --- View ---

    /// One zoom step. Returns `false` when locked or refused by the zoom bounds.
    pub fn set_scale(&mut self, zoom_in: bool, around_pointer: bool, silent: bool) -> bool {
        if self.config.lock {
            return false;
        }
        let anchor = around_pointer.then_some(self.mouse);
        let changed = self.camera.step_zoom(zoom_in, anchor, self.viewport);
        if changed && !silent {
            self.request_redraw();
        }
        changed
    }

    /// Fit and center the image in the viewport.
    pub fn fit_zoom(&mut self) {
        if self.camera.fit(self.viewport) {
            debug!(
                width = self.camera.image_width,
                height = self.camera.image_height,
                step = self.camera.scale_step,
                "fit zoom"
            );
        }
        self.request_redraw();
    }

    pub fn set_focus_mode(&mut self, on: bool) {
        self.focus_mode = on;
        self.request_redraw();
    }

    // --- Redraw and events ---

    /// Force a redraw.
    pub fn update(&mut self) {
        self.request_redraw();
    }

    /// Cancel any pending frame and schedule a fresh one.
    pub fn request_redraw(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.frames.cancel(handle);
        }
        self.pending_frame = self.frames.request();
    }

    /// Drop the pending frame, if any, without scheduling another.
    pub fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.frames.cancel(handle);
        }
    }

    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Called by the host after a frame was drawn.
    pub fn frame_rendered(&mut self) {
        self.pending_frame = None;
        self.outbox.push(Event::Updated(self.dataset.shapes().to_vec()));
    }

    /// Drain queued events in emission order.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    fn warn_user(&mut self, message: String) {
        warn!(%message, "constraint");
        self.outbox.push(Event::Warn(message));
    }

    // --- Pointer down ---

    pub fn on_pointer_down(&mut self, input: &PointerInput) {
        if self.config.lock {
            return;
        }
        self.mouse = input.pos;
        let gesture = input.gesture();

        if input.is_touch() && gesture == Gesture::Primary {
            if self.creating_multi_point()
                && let Some(last) = self.last_tap_ms
                && input.time_ms - last < self.config.double_tap_ms
            {
                self.last_tap_ms = None;
                self.on_double_click();
                return;
            }
            self.last_tap_ms = Some(input.time_ms);
        }

        match gesture {
            Gesture::Pan => {
                let grab = input.pos - Point::new(self.camera.origin_x, self.camera.origin_y);
                self.input = InputState::Panning { grab };
            }
            Gesture::Pinch => {
                if let Some((a, b)) = input.touch_pair() {
                    self.input = InputState::Pinching { last_product: pinch_product(a, b), last_center: input.pos };
                }
            }
            Gesture::Primary => self.primary_down(input.pos),
        }
        self.request_redraw();
    }

    fn primary_down(&mut self, pos: Point) {
        let image_pt = self.camera.screen_to_image(pos);

        if !self.config.readonly
            && let Some(active) = self.dataset.active()
            && !active.creating
            && !active.hide
            && let Some(ctrl) = hit_ctrl(pos, active, &self.camera, self.config.ctrl_radius)
            && let Some(grip) = active.ctrls().get(ctrl).copied()
        {
            self.input = InputState::Resizing { ctrl, offset: image_pt - grip };
            return;
        }

        if !self.camera.contains_screen(pos) {
            return;
        }

        if let Some(active) = self.dataset.active_mut()
            && active.creating
        {
            if !self.config.readonly
                && let Geometry::Polygon(pts) | Geometry::Line(pts) = &mut active.geometry
                && pts.last() != Some(&image_pt)
            {
                pts.push(image_pt);
            }
            return;
        }

        if !self.config.readonly
            && let Some(kind) = self.config.create_type.shape_kind()
        {
            self.begin_create(kind, image_pt);
            return;
        }

        self.select_at(pos);
    }

    fn begin_create(&mut self, kind: ShapeKind, at: Point) {
        let geometry = match kind {
            ShapeKind::Rect => Geometry::rect(at, at),
            ShapeKind::Polygon => Geometry::Polygon(vec![at]),
            ShapeKind::Dot => Geometry::Dot(at),
            ShapeKind::Line => Geometry::Line(vec![at]),
            ShapeKind::Circle => Geometry::Circle { center: at, radius: 0.0 },
        };
        let mut shape = Shape::new(geometry, self.dataset.next_index());
        self.dataset.deactivate_all();
        shape.active = true;

        match kind {
            ShapeKind::Dot => {
                self.outbox.push(Event::Add(shape.clone()));
                self.dataset.push(shape);
            }
            ShapeKind::Rect | ShapeKind::Circle => {
                shape.creating = true;
                self.dataset.push(shape);
                self.input = InputState::Drawing { anchor: at };
            }
            ShapeKind::Polygon | ShapeKind::Line => {
                shape.creating = true;
                self.dataset.push(shape);
                self.rubber_band = Some(at);
            }
        }
    }

    fn select_at(&mut self, pos: Point) {
        let ctx = HitContext { camera: &self.camera, config: &self.config, focus_mode: self.focus_mode };
        let hit = hit_test(pos, &self.dataset, &ctx, self.mask.as_mut());

        let Some(hit) = hit else {
            self.dataset.deactivate_all();
            self.dataset.restore_order();
            self.outbox.push(Event::Select(None));
            return;
        };

        let position = self.dataset.bring_to_front(hit);
        self.dataset.activate(position);
        let readonly = self.config.readonly;
        let start = self.camera.screen_to_image(pos);
        if let Some(shape) = self.dataset.get_mut(position) {
            if !readonly {
                shape.dragging = true;
                self.input = InputState::Moving { start, original: shape.geometry.vertices() };
            }
            self.outbox.push(Event::Select(Some(shape.clone())));
        }
    }

    // --- Pointer move ---

    pub fn on_pointer_move(&mut self, input: &PointerInput) {
        if self.config.lock {
            return;
        }
        self.mouse = input.pos;
        let pos = input.pos;

        match std::mem::take(&mut self.input) {
            InputState::Idle => {
                self.track_rubber_band(pos);
                return;
            }
            InputState::Panning { grab } => {
                self.camera.origin_x = pos.x - grab.x;
                self.camera.origin_y = pos.y - grab.y;
                self.input = InputState::Panning { grab };
            }
            InputState::Pinching { last_product, last_center } => {
                let product = input.touch_pair().map_or(last_product, |(a, b)| pinch_product(a, b));
                if product > last_product {
                    self.set_scale(true, true, true);
                } else if product < last_product {
                    self.set_scale(false, true, true);
                }
                self.camera.pan(pos.x - last_center.x, pos.y - last_center.y);
                self.input = InputState::Pinching { last_product: product, last_center: pos };
            }
            InputState::Drawing { anchor } => {
                self.drag_new_shape(anchor, pos);
                self.input = InputState::Drawing { anchor };
            }
            InputState::Moving { start, original } => {
                self.drag_body(start, &original, pos);
                self.input = InputState::Moving { start, original };
            }
            InputState::Resizing { ctrl, offset } => {
                self.drag_ctrl(ctrl, offset, pos);
                self.input = InputState::Resizing { ctrl, offset };
            }
        }
        self.request_redraw();
    }

    fn creating_multi_point(&self) -> bool {
        self.dataset.active().is_some_and(|s| s.creating && s.kind().is_multi_point())
    }

    fn track_rubber_band(&mut self, pos: Point) {
        if self.creating_multi_point() {
            self.rubber_band = Some(self.camera.clamp_image(self.camera.screen_to_image(pos)));
            self.request_redraw();
        }
    }

    fn drag_new_shape(&mut self, anchor: Point, pos: Point) {
        let target = self.camera.clamp_image(self.camera.screen_to_image(pos));
        let Some(shape) = self.dataset.active_mut() else {
            return;
        };
        match &mut shape.geometry {
            rect @ Geometry::Rect { .. } => *rect = Geometry::rect(anchor, target),
            Geometry::Circle { radius, .. } => *radius = anchor.distance_to(target),
            _ => {}
        }
    }

    /// All-or-nothing: the move is dropped if any vertex would leave the image.
    fn drag_body(&mut self, start: Point, original: &[Point], pos: Point) {
        let delta = self.camera.screen_to_image(pos) - start;
        let moved: Vec<Point> = original.iter().map(|p| *p + delta).collect();
        if !moved.iter().all(|p| self.camera.contains_image(*p)) {
            return;
        }
        if let Some(shape) = self.dataset.active_mut() {
            shape.geometry.set_vertices(&moved);
        }
    }

    fn drag_ctrl(&mut self, ctrl: usize, offset: Point, pos: Point) {
        let wanted = self.camera.screen_to_image(pos) - offset;
        let target = self.camera.clamp_image(wanted);
        let mut warnings = Vec::new();
        if target != wanted {
            warnings.push("control point clamped to image bounds".to_owned());
        }

        let (min_w, min_h, min_r) = (self.config.min_width, self.config.min_height, self.config.min_radius);
        let Some(shape) = self.dataset.active_mut() else {
            return;
        };
        match &mut shape.geometry {
            Geometry::Rect { min, max } => {
                if let Some(w) = resize_rect(min, max, ctrl, target, min_w, min_h) {
                    warnings.push(w);
                }
            }
            Geometry::Polygon(pts) | Geometry::Line(pts) => {
                if let Some(p) = pts.get_mut(ctrl) {
                    *p = target;
                }
            }
            Geometry::Circle { center, radius } => match ctrl {
                0 => *center = target,
                1 => {
                    let r = center.distance_to(target);
                    if r < min_r {
                        warnings.push(format!("radius cannot be less than {min_r}"));
                    }
                    *radius = r.max(min_r);
                }
                _ => {}
            },
            Geometry::Dot(_) => {}
        }
        for message in warnings {
            self.warn_user(message);
        }
    }

    // --- Pointer up ---

    pub fn on_pointer_up(&mut self, _input: &PointerInput) {
        if self.config.lock {
            return;
        }
        // A pan or pinch may have replaced `Drawing` mid-drag.
        if self.dataset.active().is_some_and(|s| s.creating && !s.kind().is_multi_point()) {
            self.finish_drawing();
        }
        if let Some(shape) = self.dataset.active_mut() {
            shape.dragging = false;
        }
        self.input = InputState::Idle;
        self.request_redraw();
    }

    /// Commit or discard the Rect/Circle sized by the drag that just ended.
    fn finish_drawing(&mut self) {
        let Some(shape) = self.dataset.active() else {
            return;
        };
        if !shape.creating {
            return;
        }
        let too_small = match shape.geometry {
            Geometry::Rect { min, max } => {
                let (w, h) = (max.x - min.x, max.y - min.y);
                (w < self.config.min_width || h < self.config.min_height).then(|| {
                    format!(
                        "rectangle {w}x{h} is smaller than {}x{}, discarded",
                        self.config.min_width, self.config.min_height
                    )
                })
            }
            Geometry::Circle { radius, .. } => (radius < self.config.min_radius)
                .then(|| format!("circle radius {radius} is smaller than {}, discarded", self.config.min_radius)),
            _ => None,
        };

        if let Some(message) = too_small {
            if self.dataset.active_position() == Some(self.dataset.len().saturating_sub(1)) {
                self.dataset.pop();
            }
            self.warn_user(message);
            return;
        }
        if let Some(shape) = self.dataset.active_mut() {
            shape.creating = false;
            let committed = shape.clone();
            self.outbox.push(Event::Add(committed));
        }
    }

    // --- Double click, keys, wheel ---

    /// Complete an in-progress polygon or line if it has enough vertices.
    pub fn on_double_click(&mut self) {
        if self.config.lock {
            return;
        }
        let Some(shape) = self.dataset.active_mut() else {
            return;
        };
        let kind = shape.kind();
        if !shape.creating || !kind.is_multi_point() || shape.geometry.vertices().len() < kind.min_vertices() {
            return;
        }
        shape.creating = false;
        let committed = shape.clone();
        self.outbox.push(Event::Add(committed));
        self.rubber_band = None;
        self.request_redraw();
    }

    /// `focus_on_body` is whether the document body holds keyboard focus.
    pub fn on_key(&mut self, key: &Key, focus_on_body: bool) {
        if self.config.lock || self.config.readonly || !focus_on_body {
            return;
        }
        if key.is("Escape") {
            if let Some(shape) = self.dataset.active_mut()
                && shape.creating
                && let Geometry::Polygon(pts) | Geometry::Line(pts) = &mut shape.geometry
                && pts.len() > 1
            {
                pts.pop();
                self.request_redraw();
                return;
            }
            self.delete_active();
        } else if key.is("Backspace") {
            self.delete_active();
        }
    }

    fn delete_active(&mut self) {
        let Some(active) = self.dataset.active() else {
            return;
        };
        let (index, creating) = (active.index, active.creating);
        if !creating {
            self.delete_by_index(index);
            return;
        }
        debug!(index, "discarding unfinished shape");
        self.dataset.remove_by_index(index);
        self.rubber_band = None;
        self.input = InputState::Idle;
        self.request_redraw();
    }

    pub fn on_wheel(&mut self, pos: Point, delta: WheelDelta) {
        if self.config.lock || !self.config.scroll_zoom {
            return;
        }
        self.mouse = pos;
        self.set_scale(delta.dy < 0.0, true, false);
    }

    /// Read-only hit test at a screen point, honoring focus mode.
    pub fn shape_at(&mut self, pos: Point) -> Option<&Shape> {
        let ctx = HitContext { camera: &self.camera, config: &self.config, focus_mode: self.focus_mode };
        let position = hit_test(pos, &self.dataset, &ctx, self.mask.as_mut())?;
        self.dataset.get(position)
    }

    /// Shapes the renderer should draw, bottom first.
    pub fn visible_shapes(&self) -> impl Iterator<Item = &Shape> {
        let focus = self.focus_mode;
        self.dataset.iter().filter(move |s| !s.hide && (!focus || s.active))
    }
}

fn pinch_product(a: Point, b: Point) -> f64 {
    (a.x - b.x).abs() * (a.y - b.y).abs()
}

/// Move the rectangle edges owned by grip `ctrl` to `target`.
///
/// Grips run clockwise from top-left: 0 tl, 1 top, 2 tr, 3 right, 4 br,
/// 5 bottom, 6 bl, 7 left. A moved edge stops `min_w`/`min_h` short of the
/// opposite one; returns a warning message when that floor applied.
fn resize_rect(min: &mut Point, max: &mut Point, ctrl: usize, target: Point, min_w: f64, min_h: f64) -> Option<String> {
    let (left, right) = match ctrl {
        0 | 6 | 7 => (true, false),
        2..=4 => (false, true),
        _ => (false, false),
    };
    let (top, bottom) = match ctrl {
        0..=2 => (true, false),
        4..=6 => (false, true),
        _ => (false, false),
    };

    let mut floored = false;
    if left {
        let limit = max.x - min_w;
        floored |= target.x > limit;
        min.x = target.x.min(limit);
    } else if right {
        let limit = min.x + min_w;
        floored |= target.x < limit;
        max.x = target.x.max(limit);
    }
    if top {
        let limit = max.y - min_h;
        floored |= target.y > limit;
        min.y = target.y.min(limit);
    } else if bottom {
        let limit = min.y + min_h;
        floored |= target.y < limit;
        max.y = target.y.max(limit);
    }
    floored.then(|| format!("rectangle cannot be smaller than {min_w}x{min_h}"))
}
