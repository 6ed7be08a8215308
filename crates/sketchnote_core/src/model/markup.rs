//! Markup string codec for rich-text bodies.
//!
//! # Responsibility
//! - Serialize `RichText` into the persisted HTML-like markup string.
//! - Parse stored markup (including legacy paragraph/span output) back.
//!
//! # Invariants
//! - `from_markup(&to_markup(doc))? == doc.normalized()`.
//! - Output is deterministic: one tag group per constant-style segment, tags
//!   opened in `b, i, u, font` order and closed in reverse.
//! - Unknown or unbalanced tags are rejected, never silently dropped.

use crate::model::rich_text::{RichText, StyleAttribute, StyleSpan};
use crate::raster::Rgba;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z]+)([^<>]*)>").expect("valid tag regex"));
static COLOR_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"color\s*[:=]\s*"?\s*(#[0-9A-Fa-f]+)"#).expect("valid color attribute regex")
});
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z]+);").expect("valid entity regex")
});

/// Markup parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// Tag name outside the supported set.
    UnknownTag(String),
    /// Closing tag without a matching open tag.
    UnbalancedClose(String),
    /// Open tag never closed before end of input.
    Unclosed(String),
    /// Color tag with missing or malformed color value.
    InvalidColor(String),
}

impl Display for MarkupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTag(tag) => write!(f, "unsupported markup tag `<{tag}>`"),
            Self::UnbalancedClose(tag) => write!(f, "unbalanced closing tag `</{tag}>`"),
            Self::Unclosed(tag) => write!(f, "tag `<{tag}>` is never closed"),
            Self::InvalidColor(value) => write!(f, "invalid markup color `{value}`"),
        }
    }
}

impl Error for MarkupError {}

/// Serializes a rich-text document into markup.
pub fn to_markup(doc: &RichText) -> String {
    let mut out = String::with_capacity(doc.text().len());
    for segment in doc.segments() {
        for attribute in &segment.attributes {
            out.push_str(&open_tag(*attribute));
        }
        escape_into(doc.slice_chars(segment.range.clone()), &mut out);
        for attribute in segment.attributes.iter().rev() {
            out.push_str(close_tag(*attribute));
        }
    }
    out
}

/// Parses markup into a normalized rich-text document.
///
/// Accepted tags: `b`, `i`, `u`, `font color`, `span style="color:..."`,
/// `br`, and `p` (paragraph wrapper).
pub fn from_markup(markup: &str) -> Result<RichText, MarkupError> {
    let mut text = String::with_capacity(markup.len());
    let mut char_len = 0usize;
    let mut spans = Vec::new();
    let mut stack: Vec<(String, Option<StyleAttribute>, usize)> = Vec::new();
    let mut cursor = 0usize;

    for caps in TAG_RE.captures_iter(markup) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        char_len += push_text(&markup[cursor..whole.start()], &mut text);
        cursor = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        let attrs = &caps[3];

        if closing {
            if name == "br" {
                continue;
            }
            match stack.pop() {
                Some((open_name, attribute, start)) if open_name == name => {
                    if let Some(attribute) = attribute {
                        if start < char_len {
                            spans.push(StyleSpan {
                                start,
                                end: char_len,
                                attribute,
                            });
                        }
                    }
                }
                _ => return Err(MarkupError::UnbalancedClose(name)),
            }
            continue;
        }

        let self_closing = attrs.trim_end().ends_with('/');
        let attribute = match name.as_str() {
            "br" => {
                text.push('\n');
                char_len += 1;
                continue;
            }
            "p" => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                    char_len += 1;
                }
                None
            }
            "b" | "strong" => Some(StyleAttribute::Bold),
            "i" | "em" => Some(StyleAttribute::Italic),
            "u" => Some(StyleAttribute::Underline),
            "font" | "span" => match COLOR_ATTR_RE.captures(attrs) {
                Some(color) => Some(StyleAttribute::Foreground(parse_color(&color[1])?)),
                None if name == "span" => None,
                None => return Err(MarkupError::InvalidColor(attrs.trim().to_string())),
            },
            _ => return Err(MarkupError::UnknownTag(name)),
        };
        if !self_closing {
            stack.push((name, attribute, char_len));
        }
    }
    push_text(&markup[cursor..], &mut text);

    if let Some((name, _, _)) = stack.pop() {
        return Err(MarkupError::Unclosed(name));
    }

    Ok(RichText::from_parts(text, spans).normalized())
}

fn open_tag(attribute: StyleAttribute) -> String {
    match attribute {
        StyleAttribute::Bold => "<b>".to_string(),
        StyleAttribute::Italic => "<i>".to_string(),
        StyleAttribute::Underline => "<u>".to_string(),
        StyleAttribute::Foreground(color) => format!("<font color=\"{}\">", format_color(color)),
    }
}

fn close_tag(attribute: StyleAttribute) -> &'static str {
    match attribute {
        StyleAttribute::Bold => "</b>",
        StyleAttribute::Italic => "</i>",
        StyleAttribute::Underline => "</u>",
        StyleAttribute::Foreground(_) => "</font>",
    }
}

/// `#RRGGBB` for opaque colors, `#AARRGGBB` otherwise.
pub fn format_color(color: Rgba) -> String {
    if color.is_opaque() {
        format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
    } else {
        format!("#{:08X}", color.to_argb())
    }
}

/// Parses `#RRGGBB` or `#AARRGGBB`.
pub fn parse_color(value: &str) -> Result<Rgba, MarkupError> {
    let invalid = || MarkupError::InvalidColor(value.to_string());
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let packed = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
    match hex.len() {
        6 => Ok(Rgba::from_argb(0xFF00_0000 | packed)),
        8 => Ok(Rgba::from_argb(packed)),
        _ => Err(invalid()),
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br>"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
}

/// Appends unescaped text and returns the number of chars added.
///
/// Raw line breaks are layout whitespace in markup; only `<br>` and
/// paragraph boundaries produce newlines.
fn push_text(raw: &str, out: &mut String) -> usize {
    let mut added = 0;
    let mut cursor = 0;
    for caps in ENTITY_RE.captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        added += push_literal(&raw[cursor..whole.start()], out);
        match decode_entity(&caps[1]) {
            Some(ch) => {
                out.push(ch);
                added += 1;
            }
            None => added += push_literal(whole.as_str(), out),
        }
        cursor = whole.end();
    }
    added + push_literal(&raw[cursor..], out)
}

fn push_literal(fragment: &str, out: &mut String) -> usize {
    let mut added = 0;
    for ch in fragment.chars().filter(|ch| *ch != '\n' && *ch != '\r') {
        out.push(ch);
        added += 1;
    }
    added
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(hex) = body
        .strip_prefix("#x")
        .or_else(|| body.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{format_color, from_markup, parse_color, to_markup, MarkupError};
    use crate::model::rich_text::{RichText, StyleAttribute};
    use crate::raster::Rgba;

    #[test]
    fn plain_text_escapes_reserved_characters() {
        let doc = RichText::plain("a < b & \"c\"\nnext");
        assert_eq!(
            to_markup(&doc),
            "a &lt; b &amp; &quot;c&quot;<br>next"
        );
    }

    #[test]
    fn overlapping_spans_serialize_per_segment() {
        let doc = RichText::plain("abcd")
            .with_attribute(0..3, StyleAttribute::Bold)
            .with_attribute(2..4, StyleAttribute::Italic);
        assert_eq!(to_markup(&doc), "<b>ab</b><b><i>c</i></b><i>d</i>");
    }

    #[test]
    fn color_formats_roundtrip() {
        assert_eq!(format_color(Rgba::RED), "#FF0000");
        assert_eq!(parse_color("#FF0000").unwrap(), Rgba::RED);
        let translucent = Rgba::new(1, 2, 3, 4);
        assert_eq!(parse_color(&format_color(translucent)).unwrap(), translucent);
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn legacy_paragraph_and_span_markup_is_accepted() {
        let legacy = "<p dir=\"ltr\">milk <span style=\"color:#0000FF;\">eggs</span></p>\n\
                      <p dir=\"ltr\">bread</p>\n";
        let doc = from_markup(legacy).unwrap();
        assert_eq!(doc.text(), "milk eggs\nbread");
        assert_eq!(doc.attributes_at(6), vec![StyleAttribute::Foreground(Rgba::BLUE)]);
        assert!(doc.attributes_at(0).is_empty());
    }

    #[test]
    fn unbalanced_and_unknown_tags_are_rejected() {
        assert_eq!(
            from_markup("<b>x</i>").unwrap_err(),
            MarkupError::UnbalancedClose("i".to_string())
        );
        assert_eq!(
            from_markup("<b>x").unwrap_err(),
            MarkupError::Unclosed("b".to_string())
        );
        assert_eq!(
            from_markup("<script>x</script>").unwrap_err(),
            MarkupError::UnknownTag("script".to_string())
        );
    }
}
