//! Paragraph styles for exported documents.
//!
//! A [`StyleSheet`] is built once (font selection included) and handed by
//! reference to everything that lays out text.

use crate::fonts::FontManager;
use crate::settings::ExportSettings;

/// RGB colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const GREY: Self = Self {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Named paragraph roles used by the document builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    /// Recipe title, centred
    Title,
    /// Grey category / source line
    Category,
    /// Section label such as "Ingredients:"
    Subtitle,
    /// Body text
    Text,
    /// Category divider page heading
    Divider,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub font_size: f32,
    /// Baseline-to-baseline distance in points
    pub leading: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub align: TextAlign,
}

impl ParagraphStyle {
    fn new(font_size: f32, leading: f32) -> Self {
        Self {
            font_size,
            leading,
            bold: false,
            italic: false,
            color: Color::BLACK,
            align: TextAlign::Left,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn centered(mut self) -> Self {
        self.align = TextAlign::Center;
        self
    }

    fn colored(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Immutable typography for one export run.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    pub fonts: FontManager,
    pub title: ParagraphStyle,
    pub category: ParagraphStyle,
    pub subtitle: ParagraphStyle,
    pub text: ParagraphStyle,
    pub divider: ParagraphStyle,
}

impl StyleSheet {
    pub fn new(fonts: FontManager) -> Self {
        Self {
            fonts,
            title: ParagraphStyle::new(16.0, 18.0).bold().centered(),
            category: ParagraphStyle::new(10.0, 12.0).colored(Color::GREY),
            subtitle: ParagraphStyle::new(12.0, 14.0).bold(),
            text: ParagraphStyle::new(10.0, 12.0),
            divider: ParagraphStyle::new(32.0, 38.0).bold().centered(),
        }
    }

    /// Load the configured font (with fallback) and build the sheet.
    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self::new(FontManager::with_fallback(
            &settings.font_path,
            &settings.fallback_font,
        ))
    }

    pub fn get(&self, kind: StyleKind) -> &ParagraphStyle {
        match kind {
            StyleKind::Title => &self.title,
            StyleKind::Category => &self.category,
            StyleKind::Subtitle => &self.subtitle,
            StyleKind::Text => &self.text,
            StyleKind::Divider => &self.divider,
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::new(FontManager::default())
    }
}
