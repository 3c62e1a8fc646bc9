//! Pagination – flows a story of [`Flowable`]s into the frames of a page
//! template and freezes the result as a [`LayoutConfig`].
//!
//! Handles:
//! - page and frame breaks
//! - paragraph splitting between lines across frames
//! - table splitting between rows
//! - keep-together blocks that move whole to the next frame, or split
//!   between their parts when no frame can hold them

use log::{debug, warn};

use crate::flowable::{Flowable, Table};
use crate::fonts::wrap_text;
use crate::layout_config::*;
use crate::style::{ParagraphStyle, StyleSheet, TextAlign};

/// Inner padding of every frame in points.
pub const FRAME_PADDING_PT: f32 = 6.0;

/// A rectangle on the page that content flows into (top-left origin, points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn inner_x(&self) -> f32 {
        self.x + FRAME_PADDING_PT
    }

    fn inner_y(&self) -> f32 {
        self.y + FRAME_PADDING_PT
    }

    pub fn inner_width(&self) -> f32 {
        self.width - 2.0 * FRAME_PADDING_PT
    }

    pub fn inner_height(&self) -> f32 {
        self.height - 2.0 * FRAME_PADDING_PT
    }
}

/// Page size plus the frames filled, in order, on every page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    pub page_width: f32,
    pub page_height: f32,
    pub frames: Vec<Frame>,
}

/// Recipe card width (7").
pub const CARD_WIDTH_PT: f32 = 7.0 * INCH;
/// Recipe card height (5").
pub const CARD_HEIGHT_PT: f32 = 5.0 * INCH;

impl PageTemplate {
    /// One frame inset by `margin` on every side.
    pub fn single_frame(page_width: f32, page_height: f32, margin: f32) -> Self {
        Self {
            page_width,
            page_height,
            frames: vec![Frame::new(
                margin,
                margin,
                page_width - 2.0 * margin,
                page_height - 2.0 * margin,
            )],
        }
    }

    /// US Letter with 1" margins.
    pub fn letter() -> Self {
        Self::single_frame(LETTER_WIDTH_PT, LETTER_HEIGHT_PT, INCH)
    }

    /// US Letter holding two 7"×5" cards, top and bottom, half an inch from
    /// the page edges and centred horizontally.
    pub fn letter_two_cards() -> Self {
        let x = (LETTER_WIDTH_PT - CARD_WIDTH_PT) / 2.0;
        let top_y = 0.5 * INCH;
        let bottom_y = LETTER_HEIGHT_PT - CARD_HEIGHT_PT - 0.5 * INCH;
        Self {
            page_width: LETTER_WIDTH_PT,
            page_height: LETTER_HEIGHT_PT,
            frames: vec![
                Frame::new(x, top_y, CARD_WIDTH_PT, CARD_HEIGHT_PT),
                Frame::new(x, bottom_y, CARD_WIDTH_PT, CARD_HEIGHT_PT),
            ],
        }
    }
}

/// Flow `story` through `template`, producing one [`PageLayout`] per page.
pub fn paginate(
    story: &[Flowable],
    template: &PageTemplate,
    styles: &StyleSheet,
    title: &str,
) -> LayoutConfig {
    let mut flow = Flow::new(template, styles, title);
    for flowable in story {
        flow.place(flowable);
    }
    flow.finish()
}

struct Flow<'a> {
    template: &'a PageTemplate,
    styles: &'a StyleSheet,
    config: LayoutConfig,
    current: PageLayout,
    frame: usize,
    /// Height already consumed in the current frame.
    used: f32,
    frame_empty: bool,
}

impl<'a> Flow<'a> {
    fn new(template: &'a PageTemplate, styles: &'a StyleSheet, title: &str) -> Self {
        Self {
            template,
            styles,
            config: LayoutConfig {
                title: title.to_string(),
                page_width_pt: template.page_width,
                page_height_pt: template.page_height,
                pages: Vec::new(),
            },
            current: PageLayout {
                page_index: 0,
                boxes: Vec::new(),
            },
            frame: 0,
            used: 0.0,
            frame_empty: true,
        }
    }

    fn frame(&self) -> Frame {
        self.template.frames[self.frame]
    }

    fn available(&self) -> f32 {
        (self.frame().inner_height() - self.used).max(0.0)
    }

    fn cursor_y(&self) -> f32 {
        self.frame().inner_y() + self.used
    }

    fn page_is_blank(&self) -> bool {
        self.frame == 0 && self.frame_empty
    }

    fn new_page(&mut self) {
        let next = PageLayout {
            page_index: self.config.pages.len() + 1,
            boxes: Vec::new(),
        };
        let done = std::mem::replace(&mut self.current, next);
        self.config.pages.push(done);
        self.frame = 0;
        self.used = 0.0;
        self.frame_empty = true;
    }

    fn next_frame(&mut self) {
        if self.frame + 1 < self.template.frames.len() {
            self.frame += 1;
            self.used = 0.0;
            self.frame_empty = true;
        } else {
            self.new_page();
        }
    }

    fn push(&mut self, lbox: LayoutBox) {
        self.used += lbox.height;
        self.frame_empty = false;
        self.current.boxes.push(lbox);
    }

    fn place(&mut self, flowable: &Flowable) {
        match flowable {
            Flowable::PageBreak => {
                if !self.page_is_blank() {
                    self.new_page();
                }
            }
            Flowable::FrameBreak => {
                if !self.frame_empty {
                    self.next_frame();
                }
            }
            Flowable::Spacer(height) => {
                // Spacers are dropped at the top of a frame.
                if self.frame_empty {
                    return;
                }
                if *height > self.available() {
                    self.next_frame();
                } else {
                    self.used += height;
                }
            }
            Flowable::Paragraph { text, style } => {
                let style = self.styles.get(*style);
                self.place_paragraph(text, style);
            }
            Flowable::Table(table) => self.place_table(table),
            Flowable::KeepTogether(items) => self.place_keep_together(items),
            Flowable::Divider(text) => self.place_divider(text),
        }
    }

    fn place_paragraph(&mut self, text: &str, style: &ParagraphStyle) {
        let lines = self.wrap(text, style, self.frame().inner_width());
        let mut rest: &[String] = &lines;
        while !rest.is_empty() {
            let fit = (self.available() / style.leading).floor() as usize;
            let take = match fit {
                0 if !self.frame_empty => {
                    self.next_frame();
                    continue;
                }
                // Even an empty frame too short for one line takes one.
                0 => 1,
                n => n.min(rest.len()),
            };
            let (now, later) = rest.split_at(take);
            let frame = self.frame();
            let lbox = text_box(
                now,
                style,
                frame.inner_x(),
                self.cursor_y(),
                frame.inner_width(),
                self.styles,
            );
            self.push(lbox);
            rest = later;
        }
    }

    fn place_table(&mut self, table: &Table) {
        for row in &table.rows {
            let height = self.row_height(table, row);
            if height > self.available() && !self.frame_empty {
                self.next_frame();
            }
            let lbox = self.row_box(table, row, self.cursor_y());
            self.push(lbox);
        }
    }

    fn place_keep_together(&mut self, items: &[Flowable]) {
        let width = self.frame().inner_width();
        let height: f32 = items.iter().map(|f| self.measure(f, width)).sum();

        // Too tall for any frame: start fresh and let the parts split.
        if height > self.frame().inner_height() {
            warn!(
                "Block of {height:.0} pt is taller than its {:.0} pt frame, splitting it",
                self.frame().inner_height()
            );
            if !self.frame_empty {
                self.next_frame();
            }
            for item in items {
                self.place(item);
            }
            return;
        }

        if height > self.available() && !self.frame_empty {
            debug!("Keep-together block of {height:.0} pt moves to the next frame");
            self.next_frame();
        }
        for item in items {
            self.place_unbroken(item);
        }
    }

    fn place_divider(&mut self, text: &str) {
        if !self.page_is_blank() {
            self.new_page();
        }
        let style = &self.styles.divider;
        let frame = self.frame();
        let lines = self.wrap(text, style, frame.inner_width());
        let height = lines.len() as f32 * style.leading;
        let y = frame.inner_y() + ((frame.inner_height() - height) / 2.0).max(0.0);
        let lbox = text_box(
            &lines,
            style,
            frame.inner_x(),
            y,
            frame.inner_width(),
            self.styles,
        );
        self.current.boxes.push(lbox);
        self.used = frame.inner_height();
        self.frame_empty = false;
    }

    /// Lay out without any frame checks; used inside keep-together blocks.
    fn place_unbroken(&mut self, flowable: &Flowable) {
        match flowable {
            Flowable::Paragraph { text, style } => {
                let style = self.styles.get(*style);
                let frame = self.frame();
                let lines = self.wrap(text, style, frame.inner_width());
                let lbox = text_box(
                    &lines,
                    style,
                    frame.inner_x(),
                    self.cursor_y(),
                    frame.inner_width(),
                    self.styles,
                );
                self.push(lbox);
            }
            Flowable::Spacer(height) => {
                self.used += height;
                self.frame_empty = false;
            }
            Flowable::Table(table) => {
                for row in &table.rows {
                    let lbox = self.row_box(table, row, self.cursor_y());
                    self.push(lbox);
                }
            }
            Flowable::KeepTogether(items) => {
                for item in items {
                    self.place_unbroken(item);
                }
            }
            Flowable::Divider(text) => {
                let style = &self.styles.divider;
                let frame = self.frame();
                let lines = self.wrap(text, style, frame.inner_width());
                let lbox = text_box(
                    &lines,
                    style,
                    frame.inner_x(),
                    self.cursor_y(),
                    frame.inner_width(),
                    self.styles,
                );
                self.push(lbox);
            }
            Flowable::PageBreak | Flowable::FrameBreak => {}
        }
    }

    fn measure(&self, flowable: &Flowable, width: f32) -> f32 {
        match flowable {
            Flowable::Paragraph { text, style } => {
                let style = self.styles.get(*style);
                self.wrap(text, style, width).len() as f32 * style.leading
            }
            Flowable::Spacer(height) => *height,
            Flowable::Table(table) => table.rows.iter().map(|r| self.row_height(table, r)).sum(),
            Flowable::KeepTogether(items) => items.iter().map(|f| self.measure(f, width)).sum(),
            Flowable::Divider(text) => {
                let style = &self.styles.divider;
                self.wrap(text, style, width).len() as f32 * style.leading
            }
            Flowable::PageBreak | Flowable::FrameBreak => 0.0,
        }
    }

    fn wrap(&self, text: &str, style: &ParagraphStyle, width: f32) -> Vec<String> {
        wrap_text(
            text,
            style.font_size,
            style.bold,
            width,
            &self.styles.fonts,
        )
    }

    fn cell_lines(&self, table: &Table, col: usize, text: &str) -> Vec<String> {
        let style = self.styles.get(table.style);
        let width = table.col_widths.get(col).copied().unwrap_or(0.0) - 2.0 * table.pad_x;
        self.wrap(text, style, width)
    }

    fn row_height(&self, table: &Table, row: &[String]) -> f32 {
        let leading = self.styles.get(table.style).leading;
        let lines = row
            .iter()
            .enumerate()
            .map(|(col, text)| self.cell_lines(table, col, text).len())
            .max()
            .unwrap_or(1);
        lines as f32 * leading + 2.0 * table.pad_y
    }

    fn row_box(&self, table: &Table, row: &[String], y: f32) -> LayoutBox {
        let style = self.styles.get(table.style);
        let height = self.row_height(table, row);
        let x0 = self.frame().inner_x();
        let width: f32 = table.col_widths.iter().sum();
        let mut row_box = LayoutBox::new(x0, y, width, height);

        let mut x = x0;
        for (col, text) in row.iter().enumerate() {
            let col_width = table.col_widths.get(col).copied().unwrap_or(0.0);
            let mut cell = LayoutBox::new(x, y, col_width, height);
            if !text.is_empty() {
                let lines = self.cell_lines(table, col, text);
                let mut content = text_content(&lines, style, col_width - 2.0 * table.pad_x, self.styles);
                for line in &mut content.lines {
                    line.x_offset += table.pad_x;
                    line.y_offset += table.pad_y;
                }
                cell.text = Some(content);
            }
            row_box.children.push(cell);
            x += col_width;
        }
        row_box
    }
}

impl Flow<'_> {
    fn finish(mut self) -> LayoutConfig {
        if !self.current.boxes.is_empty() || self.config.pages.is_empty() {
            self.config.pages.push(self.current);
        }
        self.config
    }
}

fn text_content(
    lines: &[String],
    style: &ParagraphStyle,
    width: f32,
    styles: &StyleSheet,
) -> TextContent {
    let text_lines = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let x_offset = match style.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => {
                    let w = styles
                        .fonts
                        .measure_text_width(line, style.font_size, style.bold);
                    ((width - w) / 2.0).max(0.0)
                }
            };
            TextLine {
                text: line.clone(),
                x_offset,
                y_offset: i as f32 * style.leading,
            }
        })
        .collect();

    TextContent {
        lines: text_lines,
        font_size: style.font_size,
        bold: style.bold,
        italic: style.italic,
        color: [style.color.r, style.color.g, style.color.b],
        line_height: style.leading,
    }
}

fn text_box(
    lines: &[String],
    style: &ParagraphStyle,
    x: f32,
    y: f32,
    width: f32,
    styles: &StyleSheet,
) -> LayoutBox {
    let mut lbox = LayoutBox::new(x, y, width, lines.len() as f32 * style.leading);
    lbox.text = Some(text_content(lines, style, width, styles));
    lbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleKind;

    fn para(text: &str) -> Flowable {
        Flowable::paragraph(text, StyleKind::Text)
    }

    #[test]
    fn single_page() {
        let story = vec![para("Short text")];
        let config = paginate(&story, &PageTemplate::letter(), &StyleSheet::default(), "t");
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.page_text(0), vec!["Short text"]);
    }

    #[test]
    fn long_paragraph_splits_across_pages() {
        let text = vec!["line"; 120].join("\n");
        let config = paginate(
            &[para(&text)],
            &PageTemplate::letter(),
            &StyleSheet::default(),
            "t",
        );
        // 648 pt frame minus padding at 12 pt leading holds 53 lines.
        assert_eq!(config.pages.len(), 3);
        let total: usize = (0..3).map(|i| config.page_text(i).len()).sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn page_break_on_blank_page_is_ignored() {
        let story = vec![
            Flowable::PageBreak,
            para("a"),
            Flowable::PageBreak,
            para("b"),
        ];
        let config = paginate(&story, &PageTemplate::letter(), &StyleSheet::default(), "t");
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.page_text(1), vec!["b"]);
    }

    #[test]
    fn frame_break_fills_both_card_slots_before_a_new_page() {
        let story = vec![
            para("one"),
            Flowable::FrameBreak,
            para("two"),
            Flowable::FrameBreak,
            para("three"),
        ];
        let template = PageTemplate::letter_two_cards();
        let config = paginate(&story, &template, &StyleSheet::default(), "t");
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.page_text(0), vec!["one", "two"]);

        let bottom = &config.pages[0].boxes[1];
        assert!((bottom.y - (template.frames[1].y + FRAME_PADDING_PT)).abs() < 0.01);
    }

    #[test]
    fn keep_together_moves_whole() {
        let filler = vec!["x"; 50].join("\n");
        let block = Flowable::KeepTogether(vec![para("head"), para("a\nb\nc\nd\ne")]);
        let config = paginate(
            &[para(&filler), block],
            &PageTemplate::letter(),
            &StyleSheet::default(),
            "t",
        );
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.page_text(1), vec!["head", "a", "b", "c", "d", "e"]);
    }

    #[test]
    fn table_rows_are_laid_out_side_by_side() {
        let table = Flowable::Table(Table {
            rows: vec![
                vec!["- a".into(), "- c".into()],
                vec!["- b".into(), String::new()],
            ],
            col_widths: vec![216.0, 216.0],
            style: StyleKind::Text,
            pad_x: 4.0,
            pad_y: 2.0,
        });
        let config = paginate(&[table], &PageTemplate::letter(), &StyleSheet::default(), "t");
        let rows = &config.pages[0].boxes;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].children.len(), 2);
        assert!(rows[1].children[1].text.is_none());
        assert!((rows[0].children[1].x - rows[0].children[0].x - 216.0).abs() < 0.01);
    }

    #[test]
    fn divider_fills_its_page() {
        let story = vec![
            para("before"),
            Flowable::Divider("BREAD".into()),
            para("after"),
        ];
        let config = paginate(&story, &PageTemplate::letter(), &StyleSheet::default(), "t");
        assert_eq!(config.pages.len(), 3);
        assert_eq!(config.page_text(1), vec!["BREAD"]);
        assert_eq!(config.page_text(2), vec!["after"]);
    }

    #[test]
    fn oversized_block_splits_instead_of_overlapping() {
        let template = PageTemplate::letter_two_cards();
        let tall = vec!["row"; 40].join("\n");
        let story = vec![
            Flowable::KeepTogether(vec![para("big"), para(&tall)]),
            Flowable::FrameBreak,
            para("small"),
        ];
        let config = paginate(&story, &template, &StyleSheet::default(), "t");

        for page in &config.pages {
            for lbox in &page.boxes {
                let frame = template
                    .frames
                    .iter()
                    .find(|f| lbox.y >= f.y && lbox.y < f.y + f.height)
                    .unwrap();
                assert!(lbox.y + lbox.height <= frame.y + frame.height - FRAME_PADDING_PT + 0.01);
            }
        }
        // The block fills the top card and runs into the bottom one.
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.page_text(0).len(), 41);
        assert_eq!(config.page_text(1), vec!["small"]);
    }
}
