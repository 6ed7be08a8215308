use crate::raster::Rgba;
use tiny_skia::{BlendMode, LineCap, LineJoin, Paint, Stroke};

/// How a committed stroke combines with existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Source-over painting with the paint color.
    Draw,
    /// Clears destination pixels within the stroke coverage.
    Erase,
}

/// Brush state applied when a stroke is committed.
///
/// Joins and caps are always round and anti-aliasing is always on, so only
/// color, width, and mode are configurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintSpec {
    color: Rgba,
    width: f32,
    mode: CompositeMode,
}

impl PaintSpec {
    pub(crate) fn new(color: Rgba, width: f32) -> Self {
        Self {
            color,
            width,
            mode: CompositeMode::Draw,
        }
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Stroke width in device pixels.
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub(crate) fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    pub(crate) fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub(crate) fn set_mode(&mut self, mode: CompositeMode) {
        self.mode = mode;
    }

    pub(crate) fn to_skia_paint(self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.anti_alias = true;
        match self.mode {
            CompositeMode::Draw => {
                paint.set_color_rgba8(self.color.r, self.color.g, self.color.b, self.color.a);
            }
            CompositeMode::Erase => paint.blend_mode = BlendMode::Clear,
        }
        paint
    }

    pub(crate) fn to_skia_stroke(self) -> Stroke {
        Stroke {
            width: self.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        }
    }
}

/// Resolves a logical brush size into device pixels.
///
/// Returns `None` for non-finite or non-positive inputs.
pub fn resolve_brush_width(logical: f32, density: f32) -> Option<f32> {
    let width = logical * density;
    (logical.is_finite() && density.is_finite() && width.is_finite() && width > 0.0)
        .then_some(width)
}

#[cfg(test)]
mod tests {
    use super::resolve_brush_width;

    #[test]
    fn brush_width_scales_with_density() {
        assert_eq!(resolve_brush_width(10.0, 2.0), Some(20.0));
        assert_eq!(resolve_brush_width(5.0, 1.0), Some(5.0));
    }

    #[test]
    fn brush_width_rejects_invalid_input() {
        assert_eq!(resolve_brush_width(0.0, 2.0), None);
        assert_eq!(resolve_brush_width(-1.0, 2.0), None);
        assert_eq!(resolve_brush_width(f32::NAN, 1.0), None);
        assert_eq!(resolve_brush_width(10.0, f32::INFINITY), None);
    }
}
