//! Layout config – the intermediate representation between pagination and
//! PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page.

use serde::{Deserialize, Serialize};

/// US Letter width in points.
pub const LETTER_WIDTH_PT: f32 = 612.0;
/// US Letter height in points.
pub const LETTER_HEIGHT_PT: f32 = 792.0;
/// Points per inch.
pub const INCH: f32 = 72.0;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub border: Option<BorderStyle>,
    pub text: Option<TextContent>,

    /// Children (nested boxes), page-absolute coordinates.
    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 3],
    pub line_height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment)
    pub x_offset: f32,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
}

impl LayoutConfig {
    /// An empty US Letter document.
    pub fn letter(title: &str) -> Self {
        Self {
            title: title.to_string(),
            page_width_pt: LETTER_WIDTH_PT,
            page_height_pt: LETTER_HEIGHT_PT,
            pages: Vec::new(),
        }
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Every text line on a page, in placement order.
    pub fn page_text(&self, page_index: usize) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(page) = self.pages.get(page_index) {
            for lbox in &page.boxes {
                lbox.collect_text(&mut out);
            }
        }
        out
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            border: None,
            text: None,
            children: Vec::new(),
        }
    }

    fn collect_text(&self, out: &mut Vec<String>) {
        if let Some(text) = &self.text {
            out.extend(text.lines.iter().map(|l| l.text.clone()));
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}
