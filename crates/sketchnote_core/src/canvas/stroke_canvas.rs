use super::paint::{resolve_brush_width, CompositeMode, PaintSpec};
use super::stroke::StrokePath;
use crate::config::CoreConfig;
use crate::raster::{PixelBuffer, Rgba};
use log::{debug, info, warn};
use tiny_skia::{ColorU8, FillRule, PathBuilder, Pixmap, Transform};

const FALLBACK_BRUSH_WIDTH: f32 = 10.0;

/// Lifecycle of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasState {
    /// No surface size has been reported yet.
    Uninitialized,
    /// A committed pixel surface exists.
    Ready,
}

/// Identifies one pointer (finger, pen, mouse) in a multi-pointer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

impl PointerId {
    pub const PRIMARY: Self = Self(0);
}

/// Pointer event kinds understood by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    Move,
    Up,
    /// Hover, cancel, scroll and anything else the host may forward.
    Other,
}

/// One pointer event in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub action: PointerAction,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn primary(action: PointerAction, x: f32, y: f32) -> Self {
        Self {
            pointer: PointerId::PRIMARY,
            action,
            x,
            y,
        }
    }
}

#[derive(Debug)]
struct ActiveStroke {
    pointer: PointerId,
    path: StrokePath,
}

/// Interactive sketch surface.
///
/// Pointer gestures accumulate into a pending `StrokePath`; pixels are only
/// committed on pointer-up. Committed pixels are kept as straight RGBA and
/// only premultiplied while a stroke is composited, so restored content
/// reads back unchanged. Not thread-safe by contract: drive it from the
/// interaction thread only.
pub struct StrokeCanvas {
    surface: Option<PixelBuffer>,
    active: Option<ActiveStroke>,
    paint: PaintSpec,
}

impl std::fmt::Debug for StrokeCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeCanvas")
            .field("size", &self.size())
            .field("active", &self.active)
            .field("paint", &self.paint)
            .finish()
    }
}

impl Default for StrokeCanvas {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}

impl StrokeCanvas {
    /// Creates an uninitialized canvas with paint defaults from `config`.
    pub fn new(config: &CoreConfig) -> Self {
        let width = resolve_brush_width(config.default_brush_size, config.display_density)
            .unwrap_or(FALLBACK_BRUSH_WIDTH);
        Self {
            surface: None,
            active: None,
            paint: PaintSpec::new(config.default_color, width),
        }
    }

    pub fn state(&self) -> CanvasState {
        if self.surface.is_some() {
            CanvasState::Ready
        } else {
            CanvasState::Uninitialized
        }
    }

    /// Current surface size, or `None` while uninitialized.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.surface
            .as_ref()
            .map(|surface| (surface.width(), surface.height()))
    }

    pub fn paint(&self) -> &PaintSpec {
        &self.paint
    }

    pub fn has_pending_stroke(&self) -> bool {
        self.active.is_some()
    }

    /// Applies a new surface size.
    ///
    /// The first call allocates a transparent surface. Later calls reallocate
    /// at the new size and copy the previous pixels to the top-left corner;
    /// uncovered area stays transparent and area outside the new bounds is
    /// cropped. Zero-sized layouts are ignored and return `false`.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.size() == Some((width, height)) {
            return true;
        }
        let Some(mut next) = PixelBuffer::new(width, height) else {
            warn!(
                "event=canvas_resize module=canvas status=error width={width} height={height} error_code=invalid_size"
            );
            return false;
        };

        match self.surface.take() {
            Some(previous) => {
                blit_top_left(&previous, &mut next);
                debug!(
                    "event=canvas_resize module=canvas status=ok from={}x{} to={width}x{height}",
                    previous.width(),
                    previous.height()
                );
            }
            None => info!("event=canvas_ready module=canvas status=ok size={width}x{height}"),
        }
        self.surface = Some(next);
        true
    }

    /// Dispatches one pointer event. Returns whether the event was handled.
    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        if !event.x.is_finite() || !event.y.is_finite() {
            return false;
        }
        match event.action {
            PointerAction::Down => self.begin_stroke(event.pointer, event.x, event.y),
            PointerAction::Move => self.extend_stroke(event.pointer, event.x, event.y),
            PointerAction::Up => self.commit_stroke(event.pointer, event.x, event.y),
            PointerAction::Other => false,
        }
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.handle_event(PointerEvent::primary(PointerAction::Down, x, y))
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.handle_event(PointerEvent::primary(PointerAction::Move, x, y))
    }

    pub fn on_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.handle_event(PointerEvent::primary(PointerAction::Up, x, y))
    }

    pub fn set_paint_color(&mut self, color: Rgba) {
        self.paint.set_color(color);
    }

    /// Sets the brush width from a logical size and display density.
    ///
    /// Invalid sizes leave the current width untouched and return `false`.
    pub fn set_brush_size(&mut self, logical: f32, density: f32) -> bool {
        match resolve_brush_width(logical, density) {
            Some(width) => {
                self.paint.set_width(width);
                true
            }
            None => {
                warn!(
                    "event=brush_size module=canvas status=error logical={logical} density={density} error_code=invalid_size"
                );
                false
            }
        }
    }

    /// Switches between painting and erasing for strokes committed from now on.
    pub fn set_erase_mode(&mut self, on: bool) {
        let mode = if on {
            CompositeMode::Erase
        } else {
            CompositeMode::Draw
        };
        self.paint.set_mode(mode);
    }

    /// Sets every committed pixel to transparent.
    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.fill(Rgba::TRANSPARENT);
        }
    }

    /// Drops the pending stroke without committing it.
    pub fn cancel_stroke(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Copies the committed pixels out, or `None` while uninitialized.
    pub fn snapshot(&self) -> Option<PixelBuffer> {
        self.surface.clone()
    }

    /// Replaces the committed pixels wholesale and drops any pending stroke.
    ///
    /// The canvas adopts the buffer's dimensions; the next `resize` reconciles
    /// them with the layout. `snapshot` returns `buffer` unchanged until the
    /// next mutation.
    pub fn restore(&mut self, buffer: &PixelBuffer) -> bool {
        self.surface = Some(buffer.clone());
        self.active = None;
        debug!(
            "event=canvas_restore module=canvas status=ok size={}x{}",
            buffer.width(),
            buffer.height()
        );
        true
    }

    /// Committed pixels with the pending stroke drawn on top.
    ///
    /// Erase strokes are not previewed; they only take effect on release.
    pub fn render_preview(&self) -> Option<PixelBuffer> {
        let surface = self.surface.as_ref()?;
        let mut preview = surface.clone();
        if let (Some(active), CompositeMode::Draw) = (&self.active, self.paint.mode()) {
            composite(&mut preview, &active.path, self.paint);
        }
        Some(preview)
    }

    fn begin_stroke(&mut self, pointer: PointerId, x: f32, y: f32) -> bool {
        if self.surface.is_none() {
            return false;
        }
        if let Some(active) = &self.active {
            if active.pointer != pointer {
                return false;
            }
            debug!(
                "event=stroke_discard module=canvas status=ok points={}",
                active.path.len()
            );
        }
        self.active = Some(ActiveStroke {
            pointer,
            path: StrokePath::starting_at(x, y),
        });
        true
    }

    fn extend_stroke(&mut self, pointer: PointerId, x: f32, y: f32) -> bool {
        match self.active.as_mut() {
            Some(active) if active.pointer == pointer => {
                active.path.push(x, y);
                true
            }
            _ => false,
        }
    }

    fn commit_stroke(&mut self, pointer: PointerId, x: f32, y: f32) -> bool {
        let mut active = match self.active.take() {
            Some(active) if active.pointer == pointer => active,
            other => {
                self.active = other;
                return false;
            }
        };
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        active.path.push_distinct(x, y);
        composite(surface, &active.path, self.paint);
        debug!(
            "event=stroke_commit module=canvas status=ok points={} mode={:?}",
            active.path.len(),
            self.paint.mode()
        );
        true
    }
}

fn rasterize(surface: &mut Pixmap, path: &StrokePath, paint: PaintSpec) {
    let skia_paint = paint.to_skia_paint();
    if path.is_dot() {
        if let Some(&(x, y)) = path.points().first() {
            if let Some(dot) = PathBuilder::from_circle(x, y, paint.width() / 2.0) {
                surface.fill_path(
                    &dot,
                    &skia_paint,
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
        return;
    }
    if let Some(polyline) = path.to_polyline() {
        surface.stroke_path(
            &polyline,
            &skia_paint,
            &paint.to_skia_stroke(),
            Transform::identity(),
            None,
        );
    }
}

/// Draws `path` into straight-alpha `target`.
///
/// Only pixels the stroke actually touched are written back, so untouched
/// pixels never go through a premultiply round trip.
fn composite(target: &mut PixelBuffer, path: &StrokePath, paint: PaintSpec) {
    let Some(base) = to_pixmap(target) else {
        return;
    };
    let mut drawn = base.clone();
    rasterize(&mut drawn, path, paint);

    let touched = base
        .data()
        .chunks_exact(4)
        .zip(drawn.data().chunks_exact(4))
        .map(|(before, after)| before != after);
    for ((dst, pixel), changed) in target
        .data_mut()
        .chunks_exact_mut(4)
        .zip(drawn.pixels())
        .zip(touched)
    {
        if changed {
            let color = pixel.demultiply();
            dst.copy_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
    }
}

fn to_pixmap(buffer: &PixelBuffer) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(buffer.width(), buffer.height())?;
    for (dst, src) in pixmap
        .pixels_mut()
        .iter_mut()
        .zip(buffer.data().chunks_exact(4))
    {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

fn blit_top_left(src: &PixelBuffer, dst: &mut PixelBuffer) {
    let row_bytes = src.width().min(dst.width()) as usize * 4;
    let rows = src.height().min(dst.height()) as usize;
    let src_stride = src.width() as usize * 4;
    let dst_stride = dst.width() as usize * 4;
    let src_data = src.data();
    let dst_data = dst.data_mut();
    for row in 0..rows {
        let src_start = row * src_stride;
        let dst_start = row * dst_stride;
        dst_data[dst_start..dst_start + row_bytes]
            .copy_from_slice(&src_data[src_start..src_start + row_bytes]);
    }
}

#[cfg(test)]
mod tests {
    use super::{blit_top_left, composite, CanvasState, StrokeCanvas};
    use crate::canvas::paint::PaintSpec;
    use crate::canvas::stroke::StrokePath;
    use crate::raster::{PixelBuffer, Rgba};

    #[test]
    fn blit_crops_when_shrinking() {
        let mut src = PixelBuffer::new(4, 4).unwrap();
        src.fill(Rgba::BLACK);
        let mut dst = PixelBuffer::new(2, 3).unwrap();
        blit_top_left(&src, &mut dst);
        assert!(dst.data().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn composite_leaves_untouched_translucent_pixels_exact() {
        let mut target = PixelBuffer::new(20, 20).unwrap();
        let faint = Rgba::new(200, 10, 30, 1);
        target.set_pixel(18, 18, faint);
        target.set_pixel(10, 10, Rgba::new(7, 8, 9, 128));

        let mut path = StrokePath::starting_at(2.0, 10.0);
        path.push(17.0, 10.0);
        composite(&mut target, &path, PaintSpec::new(Rgba::RED, 4.0));

        assert_eq!(target.pixel(18, 18), Some(faint));
        assert_eq!(target.pixel(10, 10), Some(Rgba::RED));
    }

    #[test]
    fn zero_size_layout_keeps_canvas_uninitialized() {
        let mut canvas = StrokeCanvas::default();
        assert!(!canvas.resize(0, 10));
        assert_eq!(canvas.state(), CanvasState::Uninitialized);
        assert!(canvas.snapshot().is_none());
        assert!(canvas.resize(10, 10));
        assert_eq!(canvas.state(), CanvasState::Ready);
    }

    #[test]
    fn pointer_down_before_layout_is_not_handled() {
        let mut canvas = StrokeCanvas::default();
        assert!(!canvas.on_pointer_down(1.0, 1.0));
        assert!(!canvas.has_pending_stroke());
    }
}
