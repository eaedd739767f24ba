//! Image annotation engine for the browser.
//!
//! This crate is compiled to WebAssembly. It draws a background image on a
//! canvas and lets the user create, select, move, resize, and delete shapes
//! (rectangles, polygons, dots, polylines, circles) in image pixel
//! coordinates, with pan and zoom. Everything except the DOM glue lives in
//! [`engine::EngineCore`], which runs headless so it can be tested natively.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`web`] | Browser [`web::Engine`]: canvas, DOM listeners, frame scheduling |
//! | [`engine`] | Testable [`engine::EngineCore`] and its input state machine |
//! | [`doc`] | Shape model, interchange format, and the ordered dataset |
//! | [`camera`] | Image placement, zoom ladder, and coordinate conversions |
//! | [`input`] | Tools, pointer and key inputs, gesture states |
//! | [`hit`] | Hit-testing shapes and control points |
//! | [`mask`] | Offscreen raster used for polygon and line hit tests |
//! | [`render`] | Drawing the image, shapes, labels, and grips |
//! | [`style`] | Effective per-shape styles and label text |
//! | [`config`] | Engine configuration and partial updates |
//! | [`events`] | Engine events and the listener registry |
//! | [`frame`] | Redraw scheduling |
//! | [`geom`] | Geometry helpers |
//! | [`consts`] | Shared numeric constants (zoom factors, hit widths, label metrics) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod events;
pub mod frame;
pub mod geom;
pub mod hit;
pub mod input;
pub mod mask;
pub mod render;
pub mod style;
pub mod web;

pub use engine::EngineCore;
pub use web::Engine;
