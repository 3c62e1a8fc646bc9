//! Flow primitives: the story a document builder emits and the paginator
//! consumes.

use crate::style::StyleKind;

/// One element of a document story.
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    /// Wrapped text in a single style. May split across frames.
    Paragraph { text: String, style: StyleKind },
    /// Vertical gap in points.
    Spacer(f32),
    /// Grid of text cells. Splits only between rows.
    Table(Table),
    /// Never split; moves to the next frame whole when it does not fit.
    KeepTogether(Vec<Flowable>),
    /// Continue on a fresh page.
    PageBreak,
    /// Continue in the next frame (next page after the last frame).
    FrameBreak,
    /// Heading that fills a whole frame, text centred.
    Divider(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    /// Width of each column in points.
    pub col_widths: Vec<f32>,
    pub style: StyleKind,
    /// Cell padding: left/right and top/bottom.
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Flowable {
    pub fn paragraph(text: impl Into<String>, style: StyleKind) -> Self {
        Flowable::Paragraph {
            text: text.into(),
            style,
        }
    }

    /// Text of a paragraph or divider.
    pub fn text(&self) -> Option<&str> {
        match self {
            Flowable::Paragraph { text, .. } | Flowable::Divider(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_page_break(&self) -> bool {
        matches!(self, Flowable::PageBreak)
    }
}

/// Count the page breaks at the top level of a story.
pub fn count_page_breaks(story: &[Flowable]) -> usize {
    story.iter().filter(|f| f.is_page_break()).count()
}
