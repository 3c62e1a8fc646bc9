//! Font selection and text measurement.
//!
//! A TrueType file (Baskerville by default) is tried first and its glyph
//! advances feed the line wrapper. When it is missing or unreadable the
//! document falls back to one of the PDF builtin families, measured with an
//! average-advance heuristic.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{Error, Result};

/// The PDF base-14 families usable without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFamily {
    Times,
    Helvetica,
    Courier,
}

impl BuiltinFamily {
    /// Map a family name such as `Times-Roman` or `Helvetica`.
    /// Unknown names map to Times.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("helvetica") || lower == "arial" || lower == "sans-serif" {
            BuiltinFamily::Helvetica
        } else if lower.starts_with("courier") || lower == "monospace" {
            BuiltinFamily::Courier
        } else {
            BuiltinFamily::Times
        }
    }

    /// Average advance as a fraction of the font size.
    fn average_advance(self, bold: bool) -> f32 {
        match (self, bold) {
            (BuiltinFamily::Courier, _) => 0.6,
            (BuiltinFamily::Helvetica, false) => 0.5,
            (BuiltinFamily::Helvetica, true) => 0.55,
            (BuiltinFamily::Times, false) => 0.45,
            (BuiltinFamily::Times, true) => 0.5,
        }
    }
}

/// A parsed TrueType face with the metrics the layout needs.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
}

/// Selected document font.
#[derive(Clone)]
pub struct FontManager {
    family: String,
    embedded: Option<FontData>,
    fallback: BuiltinFamily,
}

impl std::fmt::Debug for FontManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontManager")
            .field("family", &self.family)
            .field("embedded", &self.embedded.is_some())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl FontManager {
    /// Use a builtin family only.
    pub fn builtin(family: &str) -> Self {
        Self {
            family: family.to_string(),
            embedded: None,
            fallback: BuiltinFamily::from_name(family),
        }
    }

    /// Try `font_path`, falling back to the builtin `fallback` family.
    pub fn with_fallback(font_path: &str, fallback: &str) -> Self {
        let mut manager = Self::builtin(fallback);
        let path = Path::new(font_path);
        if !path.exists() {
            info!("Font '{font_path}' not found, using {fallback}");
            return manager;
        }
        match fs::read(path)
            .map_err(Error::from)
            .and_then(|bytes| manager.load_font(bytes))
        {
            Ok(()) => {
                manager.family = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(fallback)
                    .to_string();
                info!("Using embedded font '{}'", manager.family);
            }
            Err(e) => warn!("Could not load font '{font_path}': {e}; using {fallback}"),
        }
        manager
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(&mut self, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| Error::Font(format!("Failed to parse font: {e}")))?;
        let units_per_em = face.units_per_em() as f32;
        let ascender = face.ascender() as f32;
        self.embedded = Some(FontData {
            bytes,
            units_per_em,
            ascender,
        });
        Ok(())
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn builtin_family(&self) -> BuiltinFamily {
        self.fallback
    }

    /// Font bytes for embedding, if a TrueType face was loaded.
    pub fn embedded_bytes(&self) -> Option<&[u8]> {
        self.embedded.as_ref().map(|d| d.bytes.as_slice())
    }

    /// Width of `text` in points at `font_size`.
    ///
    /// `bold` only matters for builtin metrics. An embedded face has one
    /// weight and its bold is drawn by stroking, which keeps the regular
    /// advances, so the same widths apply.
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let Some(data) = &self.embedded else {
            return text.chars().count() as f32 * font_size * self.fallback.average_advance(bold);
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| {
                        face.glyph_index(ch)
                            .and_then(|gid| face.glyph_hor_advance(gid))
                            .map(|advance| advance as f32 * scale)
                            .unwrap_or(font_size * 0.5)
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * font_size * 0.5,
        }
    }

    /// Distance from the top of a line to its baseline.
    pub fn ascender_px(&self, font_size: f32) -> f32 {
        match &self.embedded {
            Some(data) => data.ascender * font_size / data.units_per_em,
            None => font_size * 0.75,
        }
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::builtin("Times-Roman")
    }
}

/// Word-wrap text to fit within `max_width` points.
///
/// Embedded newlines always break. Words wider than a full line are cut
/// between characters.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let fits = |s: &str| fonts.measure_text_width(s, font_size, bold) <= max_width;
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            if fits(&candidate) {
                current_line = candidate;
                continue;
            }
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            if fits(word) {
                current_line = word.to_string();
                continue;
            }
            // Hard-break an overlong word (long URLs in source lines).
            for ch in word.chars() {
                current_line.push(ch);
                if !fits(&current_line) && current_line.chars().count() > 1 {
                    current_line.pop();
                    lines.push(std::mem::take(&mut current_line));
                    current_line.push(ch);
                }
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
