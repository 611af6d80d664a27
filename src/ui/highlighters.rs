//! JSON syntax highlighting for the schema preview.

use eframe::egui::{self, Color32};
use eframe::epaint::text::{LayoutJob, TextFormat};

/// Lexical class of a span of JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonToken {
    /// Object key, including its quotes
    Key,
    /// String value, including its quotes
    String,
    /// Number literal
    Number,
    /// `true`, `false` or `null`
    Literal,
    /// Punctuation, whitespace and anything unrecognised
    Plain,
}

/// Splits JSON text into classified byte ranges covering the whole input.
///
/// A string counts as a key when the next non-whitespace character is `:`.
/// Unterminated strings run to the end of the text.
pub fn tokenize_json(text: &str) -> Vec<(JsonToken, std::ops::Range<usize>)> {
    let bytes = text.as_bytes();
    let mut spans: Vec<(JsonToken, std::ops::Range<usize>)> = Vec::new();
    let mut push = |token: JsonToken, range: std::ops::Range<usize>| match spans.last_mut() {
        Some((JsonToken::Plain, last)) if token == JsonToken::Plain && last.end == range.start => {
            last.end = range.end;
        }
        _ => spans.push((token, range)),
    };

    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                i = i.min(bytes.len());
                let is_key = text[i..].trim_start().starts_with(':');
                push(if is_key { JsonToken::Key } else { JsonToken::String }, start..i);
            }
            b'-' | b'0'..=b'9' => {
                i += 1;
                while i < bytes.len() && matches!(bytes[i], b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-') {
                    i += 1;
                }
                push(JsonToken::Number, start..i);
            }
            b'a'..=b'z' | b'A'..=b'Z' => {
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let token = match &text[start..i] {
                    "true" | "false" | "null" => JsonToken::Literal,
                    _ => JsonToken::Plain,
                };
                push(token, start..i);
            }
            _ => {
                // step over a whole UTF-8 character
                i += text[i..].chars().next().map_or(1, char::len_utf8);
                push(JsonToken::Plain, start..i);
            }
        }
    }
    spans
}

fn token_color(token: JsonToken, dark_mode: bool) -> Color32 {
    match (token, dark_mode) {
        (JsonToken::Key, true) => Color32::from_rgb(156, 220, 254),
        (JsonToken::Key, false) => Color32::from_rgb(0, 102, 204),
        (JsonToken::String, true) => Color32::from_rgb(206, 145, 120),
        (JsonToken::String, false) => Color32::from_rgb(163, 21, 21),
        (JsonToken::Number, true) => Color32::from_rgb(181, 206, 168),
        (JsonToken::Number, false) => Color32::from_rgb(100, 0, 150),
        (JsonToken::Literal, true) => Color32::from_rgb(86, 156, 214),
        (JsonToken::Literal, false) => Color32::from_rgb(0, 0, 170),
        (JsonToken::Plain, true) => Color32::from_rgb(212, 212, 212),
        (JsonToken::Plain, false) => Color32::BLACK,
    }
}

/// Highlights JSON text with syntax colouring.
///
/// # Arguments
///
/// * `text` - The JSON to highlight
/// * `font_id` - The font to use for rendering
/// * `dark_mode` - Picks the palette for dark or light visuals
///
/// # Returns
///
/// A `LayoutJob` containing the highlighted text
pub fn highlight_json(text: &str, font_id: egui::FontId, dark_mode: bool) -> LayoutJob {
    let mut job = LayoutJob::default();
    for (token, range) in tokenize_json(text) {
        job.append(
            &text[range],
            0.0,
            TextFormat::simple(font_id.clone(), token_color(token, dark_mode)),
        );
    }
    job
}
