use tiny_skia::{Path, PathBuilder};

/// Ordered points of the in-progress gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StrokePath {
    points: Vec<(f32, f32)>,
}

impl StrokePath {
    pub(crate) fn starting_at(x: f32, y: f32) -> Self {
        Self {
            points: vec![(x, y)],
        }
    }

    pub(crate) fn push(&mut self, x: f32, y: f32) {
        self.points.push((x, y));
    }

    /// Appends the point unless it repeats the last one.
    pub(crate) fn push_distinct(&mut self, x: f32, y: f32) {
        if self.points.last() != Some(&(x, y)) {
            self.push(x, y);
        }
    }

    pub(crate) fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    /// Paths that never leave their first point (taps) render as dots
    /// instead of polylines.
    pub(crate) fn is_dot(&self) -> bool {
        match self.points.split_first() {
            Some((first, rest)) => rest.iter().all(|point| point == first),
            None => false,
        }
    }

    /// Builds the open polyline for stroking.
    ///
    /// Returns `None` for fewer than two points or non-finite coordinates.
    pub(crate) fn to_polyline(&self) -> Option<Path> {
        let (&(x0, y0), rest) = self.points.split_first()?;
        let mut builder = PathBuilder::new();
        builder.move_to(x0, y0);
        for &(x, y) in rest {
            builder.line_to(x, y);
        }
        builder.finish()
    }
}
