//! Browser wrapper around `EngineCore`.
//!
//! `Engine` resolves the canvas, owns the 2D context and background image,
//! wires DOM listeners into the core, schedules renders with
//! `requestAnimationFrame`, and forwards core events to `EventBus` listeners.
//! A surface that cannot be resolved leaves the engine inert: every call is a
//! no-op and a warning is logged.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, EventTarget, HtmlCanvasElement, HtmlImageElement, KeyboardEvent, MouseEvent,
    TouchEvent, TouchList, WheelEvent, Window,
};

use crate::camera::Point;
use crate::config::{Config, ConfigError};
use crate::engine::EngineCore;
use crate::events::{Event, EventBus, EventKind, ListenerId};
use crate::frame::{FrameHandle, FrameScheduler};
use crate::input::{Button, Key, PointerInput, WheelDelta};
use crate::mask::PixmapMask;
use crate::render;

/// Why a drawing surface could not be attached.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("no browser window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("selector {0:?} matched nothing")]
    NotFound(String),
    #[error("selector {0:?} is not a canvas element")]
    NotACanvas(String),
    #[error("2D context unavailable")]
    NoContext,
    #[error("could not create image element")]
    NoImage,
}

/// `FrameScheduler` backed by `requestAnimationFrame`.
struct AnimationFrames {
    window: Window,
    callback: js_sys::Function,
}

impl FrameScheduler for AnimationFrames {
    fn request(&mut self) -> Option<FrameHandle> {
        match self.window.request_animation_frame(&self.callback) {
            Ok(id) => Some(FrameHandle(id)),
            Err(e) => {
                warn!(error = ?e, "requestAnimationFrame failed");
                None
            }
        }
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            debug!(error = ?e, "cancelAnimationFrame failed");
        }
    }
}

type DomListener = Closure<dyn FnMut(web_sys::Event)>;

struct Shared {
    window: Window,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    image: HtmlImageElement,
    core: RefCell<EngineCore>,
    bus: RefCell<EventBus>,
    dpr: Cell<f64>,
    listeners: RefCell<Vec<(EventTarget, &'static str, DomListener)>>,
    _frame_cb: Closure<dyn FnMut(f64)>,
}

impl Shared {
    fn build(canvas: HtmlCanvasElement) -> Result<Rc<Self>, SurfaceError> {
        let window = web_sys::window().ok_or(SurfaceError::NoWindow)?;
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| SurfaceError::NoContext)?
            .ok_or(SurfaceError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SurfaceError::NoContext)?;
        let image = HtmlImageElement::new().map_err(|_| SurfaceError::NoImage)?;

        Ok(Rc::new_cyclic(|weak: &Weak<Self>| {
            let w = weak.clone();
            let frame_cb = Closure::wrap(Box::new(move |_ts: f64| {
                if let Some(shared) = w.upgrade() {
                    shared.render_frame();
                }
            }) as Box<dyn FnMut(f64)>);
            let frames = AnimationFrames {
                window: window.clone(),
                callback: frame_cb.as_ref().unchecked_ref::<js_sys::Function>().clone(),
            };
            let core = EngineCore::with_backends(Box::new(PixmapMask::default()), Box::new(frames));
            Self {
                window,
                canvas,
                ctx,
                image,
                core: RefCell::new(core),
                bus: RefCell::new(EventBus::new()),
                dpr: Cell::new(1.0),
                listeners: RefCell::new(Vec::new()),
                _frame_cb: frame_cb,
            }
        }))
    }

    /// Run `f` against the core, then deliver whatever events it produced.
    fn with_core<R>(&self, f: impl FnOnce(&mut EngineCore) -> R) -> Option<R> {
        let out = match self.core.try_borrow_mut() {
            Ok(mut core) => f(&mut core),
            Err(_) => {
                warn!("engine re-entered while busy");
                return None;
            }
        };
        self.dispatch();
        Some(out)
    }

    /// Drain core events into listeners until none are left.
    ///
    /// A nested call (a listener calling back into the engine) returns early;
    /// the outer loop picks up what the nested call queued.
    fn dispatch(&self) {
        let Ok(mut bus) = self.bus.try_borrow_mut() else {
            return;
        };
        loop {
            let events = match self.core.try_borrow_mut() {
                Ok(mut core) => core.take_events(),
                Err(_) => break,
            };
            if events.is_empty() {
                break;
            }
            for event in &events {
                bus.emit(event);
            }
        }
    }

    fn render_frame(&self) {
        let loaded = self.image.complete() && self.image.natural_width() > 0;
        self.with_core(|core| {
            let image = loaded.then_some(&self.image);
            if let Err(e) = render::draw(&self.ctx, image, core, self.dpr.get()) {
                warn!(error = ?e, "render failed");
            }
            core.frame_rendered();
        });
    }

    fn measure(&self) {
        let dpr = self.window.device_pixel_ratio().max(1.0);
        let width = f64::from(self.canvas.client_width());
        let height = f64::from(self.canvas.client_height());
        self.dpr.set(dpr);
        self.set_backing_size(width * dpr, height * dpr);
        self.with_core(|core| core.resize(width, height));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn set_backing_size(&self, width: f64, height: f64) {
        self.canvas.set_width(width.round().max(0.0) as u32);
        self.canvas.set_height(height.round().max(0.0) as u32);
    }

    fn listen(self: &Rc<Self>, target: &EventTarget, name: &'static str, handler: fn(&Self, &web_sys::Event)) {
        let weak = Rc::downgrade(self);
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(shared) = weak.upgrade() {
                handler(&shared, &event);
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        match target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
            Ok(()) => self.listeners.borrow_mut().push((target.clone(), name, closure)),
            Err(e) => warn!(name, error = ?e, "addEventListener failed"),
        }
    }

    fn attach(self: &Rc<Self>) {
        let canvas: &EventTarget = self.canvas.as_ref();
        self.listen(canvas, "mousedown", Self::on_mouse_down);
        self.listen(canvas, "mousemove", Self::on_mouse_move);
        self.listen(canvas, "mouseup", Self::on_mouse_up);
        self.listen(canvas, "touchstart", Self::on_touch_start);
        self.listen(canvas, "touchmove", Self::on_touch_move);
        self.listen(canvas, "touchend", Self::on_touch_end);
        self.listen(canvas, "dblclick", Self::on_dblclick);
        self.listen(canvas, "wheel", Self::on_wheel);
        self.listen(canvas, "contextmenu", Self::on_context_menu);
        let image: &EventTarget = self.image.as_ref();
        self.listen(image, "load", Self::on_image_load);
        if let Some(body) = self.window.document().and_then(|d| d.body()) {
            let body: &EventTarget = body.as_ref();
            self.listen(body, "keyup", Self::on_key_up);
        }
    }

    fn detach(&self) {
        for (target, name, closure) in self.listeners.borrow_mut().drain(..) {
            if let Err(e) = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
                debug!(name, error = ?e, "removeEventListener failed");
            }
        }
    }

    // --- DOM handlers ---

    fn on_mouse_down(&self, event: &web_sys::Event) {
        if let Some(input) = mouse_input(event) {
            self.with_core(|core| core.on_pointer_down(&input));
        }
    }

    fn on_mouse_move(&self, event: &web_sys::Event) {
        if let Some(input) = mouse_input(event) {
            self.with_core(|core| core.on_pointer_move(&input));
        }
    }

    fn on_mouse_up(&self, event: &web_sys::Event) {
        if let Some(input) = mouse_input(event) {
            self.with_core(|core| core.on_pointer_up(&input));
        }
    }

    fn on_touch_start(&self, event: &web_sys::Event) {
        event.prevent_default();
        if let Some(input) = self.touch_input(event, TouchEvent::touches) {
            self.with_core(|core| core.on_pointer_down(&input));
        }
    }

    fn on_touch_move(&self, event: &web_sys::Event) {
        event.prevent_default();
        if let Some(input) = self.touch_input(event, TouchEvent::touches) {
            self.with_core(|core| core.on_pointer_move(&input));
        }
    }

    fn on_touch_end(&self, event: &web_sys::Event) {
        if let Some(input) = self.touch_input(event, TouchEvent::changed_touches) {
            self.with_core(|core| core.on_pointer_up(&input));
        }
    }

    fn on_dblclick(&self, _event: &web_sys::Event) {
        self.with_core(EngineCore::on_double_click);
    }

    fn on_wheel(&self, event: &web_sys::Event) {
        let Some(e) = event.dyn_ref::<WheelEvent>() else {
            return;
        };
        event.prevent_default();
        event.stop_propagation();
        let pos = Point::new(f64::from(e.offset_x()), f64::from(e.offset_y()));
        let delta = WheelDelta { dx: e.delta_x(), dy: e.delta_y() };
        self.with_core(|core| core.on_wheel(pos, delta));
    }

    fn on_context_menu(&self, event: &web_sys::Event) {
        event.prevent_default();
    }

    fn on_key_up(&self, event: &web_sys::Event) {
        let Some(e) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let on_body = self
            .window
            .document()
            .and_then(|d| d.active_element())
            .is_some_and(|el| el.tag_name().eq_ignore_ascii_case("body"));
        let key = Key(e.key());
        self.with_core(|core| core.on_key(&key, on_body));
    }

    fn on_image_load(&self, _event: &web_sys::Event) {
        let (w, h) = (f64::from(self.image.natural_width()), f64::from(self.image.natural_height()));
        self.with_core(|core| core.on_image_loaded(w, h));
    }

    fn touch_input(&self, event: &web_sys::Event, list: fn(&TouchEvent) -> TouchList) -> Option<PointerInput> {
        let e = event.dyn_ref::<TouchEvent>()?;
        let rect = self.canvas.get_bounding_client_rect();
        let touches = list(e);
        let points = (0..touches.length())
            .filter_map(|i| touches.get(i))
            .map(|t| Point::new(f64::from(t.client_x()) - rect.left(), f64::from(t.client_y()) - rect.top()))
            .collect();
        PointerInput::touch(points, event.time_stamp())
    }
}

fn mouse_input(event: &web_sys::Event) -> Option<PointerInput> {
    let e = event.dyn_ref::<MouseEvent>()?;
    let mut input = PointerInput::mouse(
        Point::new(f64::from(e.offset_x()), f64::from(e.offset_y())),
        Button::from_dom(e.button()),
    );
    input.time_ms = event.time_stamp();
    Some(input)
}

fn resolve_surface(selector: &str) -> Result<HtmlCanvasElement, SurfaceError> {
    let document = web_sys::window().ok_or(SurfaceError::NoWindow)?.document().ok_or(SurfaceError::NoDocument)?;
    let element = match document.query_selector(selector) {
        Ok(Some(el)) => el,
        Ok(None) | Err(_) => return Err(SurfaceError::NotFound(selector.to_owned())),
    };
    element.dyn_into::<HtmlCanvasElement>().map_err(|_| SurfaceError::NotACanvas(selector.to_owned()))
}

/// The annotation engine bound to a browser canvas.
pub struct Engine {
    shared: Option<Rc<Shared>>,
}

impl Engine {
    /// Attach to `canvas`, optionally loading `src` as the background image.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, src: Option<&str>) -> Self {
        Self::attach(Shared::build(canvas), src)
    }

    /// Attach to the first canvas matching a CSS selector.
    #[must_use]
    pub fn from_selector(selector: &str, src: Option<&str>) -> Self {
        Self::attach(resolve_surface(selector).and_then(Shared::build), src)
    }

    fn attach(built: Result<Rc<Shared>, SurfaceError>, src: Option<&str>) -> Self {
        let shared = match built {
            Ok(shared) => shared,
            Err(e) => {
                warn!(error = %e, "canvas surface unavailable; engine is inert");
                return Self { shared: None };
            }
        };
        shared.attach();
        shared.measure();
        let engine = Self { shared: Some(shared) };
        if let Some(src) = src {
            engine.set_image(src);
        }
        engine
    }

    /// Whether a surface was attached.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.shared.is_some()
    }

    fn with_core<R>(&self, f: impl FnOnce(&mut EngineCore) -> R) -> Option<R> {
        self.shared.as_ref()?.with_core(f)
    }

    // --- Configuration ---

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> Option<Config> {
        self.with_core(|core| core.config.clone())
    }

    /// Merge a partial JSON config and redraw.
    ///
    /// # Errors
    ///
    /// Returns the patch error; the config is unchanged in that case.
    pub fn set_config(&self, patch: &Value) -> Result<(), ConfigError> {
        self.with_core(|core| {
            core.config.apply_patch(patch)?;
            core.update();
            Ok(())
        })
        .unwrap_or(Ok(()))
    }

    // --- Operations ---

    pub fn set_image(&self, src: &str) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };
        shared.with_core(|core| core.set_image(src));
        shared.image.set_src(src);
    }

    /// Replace the dataset on the next microtask, so listeners registered right
    /// after this call still observe the resulting events.
    pub fn set_data(&self, shapes: Vec<Value>) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };
        shared.with_core(|core| core.set_data(shapes));
        let weak = Rc::downgrade(shared);
        let task = Closure::once_into_js(move || {
            if let Some(shared) = weak.upgrade() {
                shared.with_core(EngineCore::apply_pending_data);
            }
        });
        shared.window.queue_microtask(task.unchecked_ref());
    }

    pub fn set_scale(&self, zoom_in: bool, around_pointer: bool, silent: bool) {
        self.with_core(|core| core.set_scale(zoom_in, around_pointer, silent));
    }

    pub fn fit_zoom(&self) {
        self.with_core(EngineCore::fit_zoom);
    }

    pub fn set_focus_mode(&self, on: bool) {
        self.with_core(|core| core.set_focus_mode(on));
    }

    pub fn delete_by_index(&self, index: usize) {
        self.with_core(|core| core.delete_by_index(index));
    }

    /// Force a redraw.
    pub fn update(&self) {
        self.with_core(EngineCore::update);
    }

    /// Re-measure the canvas after a layout change.
    pub fn resize(&self) {
        if let Some(shared) = self.shared.as_ref() {
            shared.measure();
        }
    }

    /// Interchange form of the current dataset.
    #[must_use]
    pub fn data(&self) -> Value {
        self.with_core(|core| core.to_json()).unwrap_or(Value::Array(Vec::new()))
    }

    /// Detach every DOM and engine listener and release the surface.
    pub fn destroy(&mut self) {
        let Some(shared) = self.shared.take() else {
            return;
        };
        shared.detach();
        shared.with_core(EngineCore::cancel_frame);
        if let Ok(mut bus) = shared.bus.try_borrow_mut() {
            bus.clear();
        }
        shared.image.set_src("");
        debug!("engine destroyed");
    }

    // --- Events ---

    /// Subscribe to an engine event. `None` when inert or called from inside a listener.
    pub fn on(&self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> Option<ListenerId> {
        let shared = self.shared.as_ref()?;
        let Ok(mut bus) = shared.bus.try_borrow_mut() else {
            warn!("cannot subscribe during dispatch");
            return None;
        };
        Some(bus.on(kind, listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let Some(shared) = self.shared.as_ref() else {
            return false;
        };
        match shared.bus.try_borrow_mut() {
            Ok(mut bus) => bus.off(id),
            Err(_) => {
                warn!("cannot unsubscribe during dispatch");
                false
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.destroy();
    }
}
