//! Rich-text body model.
//!
//! # Responsibility
//! - Represent styled text as plain text plus tagged `(range, attribute)` spans.
//! - Provide a canonical (normalized) form used by the markup codec.
//!
//! # Invariants
//! - Span ranges are char offsets and always lie within `0..=char_len`.
//! - Spans may overlap; the same range can carry several attributes.
//! - Styling never changes the plain-text projection.

use crate::raster::Rgba;
use std::collections::BTreeMap;
use std::ops::Range;

/// Character-level style attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleAttribute {
    Bold,
    Italic,
    Underline,
    Foreground(Rgba),
}

impl StyleAttribute {
    /// Total order used for canonical span and tag ordering.
    pub(crate) fn sort_key(self) -> (u8, u32) {
        match self {
            Self::Bold => (0, 0),
            Self::Italic => (1, 0),
            Self::Underline => (2, 0),
            Self::Foreground(color) => (3, color.to_argb()),
        }
    }
}

/// One attribute applied to a char range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpan {
    pub start: usize,
    pub end: usize,
    pub attribute: StyleAttribute,
}

impl StyleSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A maximal run of text sharing one attribute set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub range: Range<usize>,
    pub attributes: Vec<StyleAttribute>,
}

/// Plain text plus overlapping style spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    text: String,
    spans: Vec<StyleSpan>,
}

impl RichText {
    /// Creates an unstyled document.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[StyleSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in chars, the unit used by span ranges.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Applies `attribute` to `range`.
    ///
    /// The range is clamped to the text; empty ranges are ignored. Existing
    /// spans are kept, so re-applying an attribute never removes styling.
    pub fn add_attribute(&mut self, range: Range<usize>, attribute: StyleAttribute) {
        let len = self.char_len();
        let start = range.start.min(len);
        let end = range.end.min(len);
        if start >= end {
            return;
        }
        self.spans.push(StyleSpan {
            start,
            end,
            attribute,
        });
    }

    /// Builder form of [`RichText::add_attribute`].
    pub fn with_attribute(mut self, range: Range<usize>, attribute: StyleAttribute) -> Self {
        self.add_attribute(range, attribute);
        self
    }

    /// Attributes active at char `index`, in canonical order.
    pub fn attributes_at(&self, index: usize) -> Vec<StyleAttribute> {
        let mut attributes: Vec<StyleAttribute> = self
            .spans
            .iter()
            .filter(|span| span.start <= index && index < span.end)
            .map(|span| span.attribute)
            .collect();
        sort_dedup(&mut attributes);
        attributes
    }

    /// Canonical form: same-attribute spans that touch or overlap are merged,
    /// and spans are ordered by `(start, attribute)`.
    pub fn normalized(&self) -> Self {
        let mut open: BTreeMap<(u8, u32), (StyleAttribute, usize)> = BTreeMap::new();
        let mut spans = Vec::new();

        for segment in self.segments() {
            let active: Vec<(u8, u32)> = segment
                .attributes
                .iter()
                .map(|attribute| attribute.sort_key())
                .collect();
            open.retain(|key, (attribute, start)| {
                if active.contains(key) {
                    return true;
                }
                spans.push(StyleSpan {
                    start: *start,
                    end: segment.range.start,
                    attribute: *attribute,
                });
                false
            });
            for attribute in &segment.attributes {
                open.entry(attribute.sort_key())
                    .or_insert((*attribute, segment.range.start));
            }
        }
        let len = self.char_len();
        for (attribute, start) in open.into_values() {
            spans.push(StyleSpan {
                start,
                end: len,
                attribute,
            });
        }
        spans.sort_by_key(|span| (span.start, span.attribute.sort_key(), span.end));

        Self {
            text: self.text.clone(),
            spans,
        }
    }

    /// Splits the text into maximal runs with a constant attribute set.
    pub(crate) fn segments(&self) -> Vec<Segment> {
        let len = self.char_len();
        if len == 0 {
            return Vec::new();
        }
        let mut bounds = vec![0, len];
        for span in &self.spans {
            bounds.push(span.start.min(len));
            bounds.push(span.end.min(len));
        }
        bounds.sort_unstable();
        bounds.dedup();

        bounds
            .windows(2)
            .map(|pair| {
                let range = pair[0]..pair[1];
                let mut attributes: Vec<StyleAttribute> = self
                    .spans
                    .iter()
                    .filter(|span| span.start <= range.start && range.end <= span.end)
                    .map(|span| span.attribute)
                    .collect();
                sort_dedup(&mut attributes);
                Segment { range, attributes }
            })
            .collect()
    }

    /// Returns the substring for a char range.
    pub(crate) fn slice_chars(&self, range: Range<usize>) -> &str {
        let start = self.byte_offset(range.start);
        let end = self.byte_offset(range.end);
        &self.text[start..end]
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(offset, _)| offset)
    }

    pub(crate) fn from_parts(text: String, spans: Vec<StyleSpan>) -> Self {
        Self { text, spans }
    }
}

fn sort_dedup(attributes: &mut Vec<StyleAttribute>) {
    attributes.sort_by_key(|attribute| attribute.sort_key());
    attributes.dedup();
}

#[cfg(test)]
mod tests {
    use super::{RichText, StyleAttribute, StyleSpan};
    use crate::raster::Rgba;

    #[test]
    fn add_attribute_clamps_and_ignores_empty_ranges() {
        let mut doc = RichText::plain("hello");
        doc.add_attribute(3..99, StyleAttribute::Bold);
        doc.add_attribute(2..2, StyleAttribute::Italic);
        doc.add_attribute(10..12, StyleAttribute::Underline);
        assert_eq!(
            doc.spans(),
            &[StyleSpan {
                start: 3,
                end: 5,
                attribute: StyleAttribute::Bold
            }]
        );
    }

    #[test]
    fn overlapping_spans_stack_attributes() {
        let doc = RichText::plain("abcdef")
            .with_attribute(0..4, StyleAttribute::Bold)
            .with_attribute(2..6, StyleAttribute::Foreground(Rgba::RED));
        assert_eq!(doc.attributes_at(1), vec![StyleAttribute::Bold]);
        assert_eq!(
            doc.attributes_at(3),
            vec![StyleAttribute::Bold, StyleAttribute::Foreground(Rgba::RED)]
        );
        assert_eq!(doc.segments().len(), 3);
    }

    #[test]
    fn normalized_merges_touching_spans_of_same_attribute() {
        let doc = RichText::plain("abcdef")
            .with_attribute(0..2, StyleAttribute::Bold)
            .with_attribute(2..4, StyleAttribute::Bold)
            .with_attribute(1..3, StyleAttribute::Bold);
        let normalized = doc.normalized();
        assert_eq!(
            normalized.spans(),
            &[StyleSpan {
                start: 0,
                end: 4,
                attribute: StyleAttribute::Bold
            }]
        );
        assert_eq!(normalized.text(), "abcdef");
    }

    #[test]
    fn slice_chars_respects_multibyte_text() {
        let doc = RichText::plain("héllo wörld");
        assert_eq!(doc.slice_chars(1..5), "éllo");
        assert_eq!(doc.slice_chars(6..11), "wörld");
    }
}
