//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Builtin families have real bold and oblique variants. An embedded
//! TrueType face is loaded in one weight only, so emphasis on it is
//! synthesised: bold strokes the glyph outlines in the fill colour and italic
//! shears the text matrix. Neither changes glyph advances.

use log::warn;
use printpdf::*;

use crate::error::Result;
use crate::fonts::{BuiltinFamily, FontManager};
use crate::layout_config::*;

/// Horizontal shear applied to embedded-face text drawn as italic.
const ITALIC_SKEW: f32 = 0.21;

/// Outline width, as a fraction of the font size, for embedded-face bold.
const BOLD_STROKE_RATIO: f32 = 0.04;

/// Font used for every text op on a page.
#[derive(Clone)]
enum PageFont {
    Builtin(BuiltinFamily),
    Embedded(FontId),
}

/// Render a LayoutConfig into PDF bytes.
///
/// Text uses the embedded TrueType face when `fonts` carries one, else the
/// builtin family it falls back to.
pub fn render_pdf(config: &LayoutConfig, fonts: &FontManager) -> Result<Vec<u8>> {
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    let font = match fonts.embedded_bytes() {
        Some(bytes) => match ParsedFont::from_bytes(bytes, 0, &mut Vec::new()) {
            Some(parsed) => PageFont::Embedded(doc.add_font(&parsed)),
            None => {
                warn!(
                    "printpdf could not parse '{}', using builtin font",
                    fonts.family()
                );
                PageFont::Builtin(fonts.builtin_family())
            }
        },
        None => PageFont::Builtin(fonts.builtin_family()),
    };

    let mut pages = Vec::new();
    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &font, fonts);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    Ok(bytes)
}

fn builtin_font(family: BuiltinFamily, bold: bool, italic: bool) -> BuiltinFont {
    match (family, bold, italic) {
        (BuiltinFamily::Times, true, true) => BuiltinFont::TimesBoldItalic,
        (BuiltinFamily::Times, true, false) => BuiltinFont::TimesBold,
        (BuiltinFamily::Times, false, true) => BuiltinFont::TimesItalic,
        (BuiltinFamily::Times, false, false) => BuiltinFont::TimesRoman,
        (BuiltinFamily::Helvetica, true, true) => BuiltinFont::HelveticaBoldOblique,
        (BuiltinFamily::Helvetica, true, false) => BuiltinFont::HelveticaBold,
        (BuiltinFamily::Helvetica, false, true) => BuiltinFont::HelveticaOblique,
        (BuiltinFamily::Helvetica, false, false) => BuiltinFont::Helvetica,
        (BuiltinFamily::Courier, true, true) => BuiltinFont::CourierBoldOblique,
        (BuiltinFamily::Courier, true, false) => BuiltinFont::CourierBold,
        (BuiltinFamily::Courier, false, true) => BuiltinFont::CourierOblique,
        (BuiltinFamily::Courier, false, false) => BuiltinFont::Courier,
    }
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{00BD}' => 0xBD, // one half
            '\u{00BC}' => 0xBC, // one quarter
            '\u{00BE}' => 0xBE, // three quarters
            '\u{00B0}' => 0xB0, // degree
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF; printpdf passes these
    // bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn rgb(c: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    font: &PageFont,
    fonts: &FontManager,
) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let pdf_y = page_height - lbox.y;

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });

        let x1 = lbox.x;
        let y1 = pdf_y - lbox.height;
        let x2 = lbox.x + lbox.width;
        let y2 = pdf_y;

        ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    point(x1, y2),
                    point(x2, y2),
                    point(x2, y1),
                    point(x1, y1),
                ],
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let ascender_offset = fonts.ascender_px(text.font_size);
        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            let text_y = pdf_y - tline.y_offset - ascender_offset;

            ops.extend(text_line_ops(font, text, &tline.text, text_x, text_y));
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, font, fonts);
    }
}

/// Ops drawing one line of `text` with its baseline starting at `(x, y)`.
fn text_line_ops(font: &PageFont, text: &TextContent, line: &str, x: f32, y: f32) -> Vec<Op> {
    let mut ops = vec![Op::StartTextSection];
    let synthetic = matches!(font, PageFont::Embedded(_));

    if synthetic && text.italic {
        ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Raw([1.0, 0.0, ITALIC_SKEW, 1.0, x, y]),
        });
    } else {
        ops.push(Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(y) },
        });
    }
    ops.push(Op::SetLineHeight {
        lh: Pt(text.line_height),
    });
    ops.push(Op::SetFillColor {
        col: rgb(text.color),
    });

    let fake_bold = synthetic && text.bold;
    if fake_bold {
        ops.push(Op::SetOutlineColor {
            col: rgb(text.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(text.font_size * BOLD_STROKE_RATIO),
        });
        ops.push(Op::SetTextRenderingMode {
            mode: TextRenderingMode::FillStroke,
        });
    }

    match font {
        PageFont::Builtin(family) => {
            let builtin = builtin_font(*family, text.bold, text.italic);
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font: builtin,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(line))],
                font: builtin,
            });
        }
        PageFont::Embedded(id) => {
            ops.push(Op::SetFontSize {
                size: Pt(text.font_size),
                font: id.clone(),
            });
            ops.push(Op::WriteText {
                items: vec![TextItem::Text(line.to_string())],
                font: id.clone(),
            });
        }
    }

    if fake_bold {
        ops.push(Op::SetTextRenderingMode {
            mode: TextRenderingMode::Fill,
        });
    }
    ops.push(Op::EndTextSection);
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::letter("empty");
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn winlatin_maps_kitchen_symbols() {
        let encoded = to_winlatin("½ cup, 350°");
        let bytes = encoded.as_bytes();
        assert_eq!(bytes[0], 0xBD);
        assert_eq!(bytes[bytes.len() - 1], 0xB0);
    }

    #[test]
    fn builtin_variants_follow_weight_and_slant() {
        assert!(matches!(
            builtin_font(BuiltinFamily::Times, true, false),
            BuiltinFont::TimesBold
        ));
        assert!(matches!(
            builtin_font(BuiltinFamily::Helvetica, false, true),
            BuiltinFont::HelveticaOblique
        ));
    }

    fn styled(bold: bool, italic: bool) -> TextContent {
        TextContent {
            lines: Vec::new(),
            font_size: 10.0,
            bold,
            italic,
            color: [0.0, 0.0, 0.0],
            line_height: 12.0,
        }
    }

    fn has_fill_stroke(ops: &[Op]) -> bool {
        ops.iter().any(|op| {
            matches!(
                op,
                Op::SetTextRenderingMode {
                    mode: TextRenderingMode::FillStroke
                }
            )
        })
    }

    #[test]
    fn embedded_bold_strokes_then_restores_fill() {
        let font = PageFont::Embedded(FontId("F1".into()));
        let ops = text_line_ops(&font, &styled(true, false), "Apple Pie", 60.0, 700.0);
        assert!(has_fill_stroke(&ops));
        let fill_reset = ops.iter().rposition(|op| {
            matches!(
                op,
                Op::SetTextRenderingMode {
                    mode: TextRenderingMode::Fill
                }
            )
        });
        let write = ops.iter().position(|op| matches!(op, Op::WriteText { .. }));
        assert!(fill_reset > write);
        assert!(matches!(ops.last(), Some(Op::EndTextSection)));
    }

    #[test]
    fn embedded_italic_shears_the_text_matrix() {
        let font = PageFont::Embedded(FontId("F1".into()));
        let ops = text_line_ops(&font, &styled(false, true), "Dessert", 60.0, 700.0);
        assert!(ops.contains(&Op::SetTextMatrix {
            matrix: TextMatrix::Raw([1.0, 0.0, ITALIC_SKEW, 1.0, 60.0, 700.0]),
        }));
        assert!(!ops.iter().any(|op| matches!(op, Op::SetTextCursor { .. })));
        assert!(!has_fill_stroke(&ops));
    }

    #[test]
    fn builtin_emphasis_uses_real_variants() {
        let font = PageFont::Builtin(BuiltinFamily::Helvetica);
        let ops = text_line_ops(&font, &styled(true, true), "Apple Pie", 60.0, 700.0);
        assert!(!has_fill_stroke(&ops));
        assert!(ops.iter().any(|op| matches!(op, Op::SetTextCursor { .. })));
        assert!(ops.iter().any(|op| matches!(
            op,
            Op::WriteTextBuiltinFont {
                font: BuiltinFont::HelveticaBoldOblique,
                ..
            }
        )));
    }
}
