//! Stroke capture and raster compositing.
//!
//! # Responsibility
//! - Turn pointer gestures into committed pixels.
//! - Keep committed content across layout resizes and paint mode switches.
//!
//! # Invariants
//! - Committed pixels change only on pointer-up, `clear`, `restore` or `resize`.
//! - Out-of-order pointer input is a no-op, never an error.
//! - Only one pointer drives a stroke at a time; others are not handled.
//! - Erase mode is never applied retroactively and has no live preview.

mod paint;
mod stroke;
mod stroke_canvas;

pub use paint::{resolve_brush_width, CompositeMode, PaintSpec};
pub use stroke_canvas::{CanvasState, PointerAction, PointerEvent, PointerId, StrokeCanvas};
