//! PDF rendering of report layouts with printpdf.
//!
//! Text is set in DejaVu Sans, embedded in the file, so accented and
//! non-Latin names print as written and line widths come from the real
//! glyph advances. Long text wraps, pages break automatically and table
//! header rows repeat at the top of each continued page.

use std::mem;

use printpdf::path::PaintMode;
use printpdf::{
    Color, CustomPdfConformance, Greyscale, IndirectFontRef, Mm, PdfConformance, PdfDocument,
    PdfLayerReference, Pt, Rect,
};
use tracing::warn;
use ttf_parser::{Face, GlyphId};

use crate::error::{ReportError, Result};

/// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const TOP: f32 = PAGE_HEIGHT - MARGIN;
/// Lowest y for body content; the footer sits below it.
const BOTTOM: f32 = MARGIN + 20.0;
const BODY_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;
const CELL_PADDING: f32 = 4.0;
const HEADER_SHADE: f32 = 0.88;
const STRIPE_SHADE: f32 = 0.96;

const REGULAR_TTF: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
const BOLD_TTF: &[u8] = include_bytes!("../fonts/DejaVuSans-Bold.ttf");

/// Layout unit extracted from an HTML report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String, bold: bool },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Lay out blocks on A4 pages and return the PDF bytes.
pub fn render_blocks(blocks: &[Block], title: &str) -> Result<Vec<u8>> {
    let fonts = Fonts::load()?;
    let pages = lay_out(blocks, title, &fonts)?;
    paint(&pages, title, &fonts)
}

fn lay_out(blocks: &[Block], title: &str, fonts: &Fonts) -> Result<Vec<Page>> {
    let mut layout = Layout::new(fonts);
    for block in blocks {
        match block {
            Block::Heading { level, text } => layout.heading(*level, text),
            Block::Paragraph { text, bold } => {
                let style = if *bold { Style::Bold } else { Style::Regular };
                layout.paragraph(text, style, BODY_SIZE, 6.0);
            }
            Block::Table { header, rows } => layout.table(header, rows)?,
        }
    }
    let mut pages = layout.finish();
    let total = pages.len();
    for (idx, page) in pages.iter_mut().enumerate() {
        footer(page, fonts, title, idx + 1, total);
    }
    Ok(pages)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Regular,
    Bold,
}

/// The embedded faces, parsed once for measuring text.
struct Fonts {
    regular: Face<'static>,
    bold: Face<'static>,
}

impl Fonts {
    fn load() -> Result<Self> {
        Ok(Self {
            regular: parse_face(REGULAR_TTF)?,
            bold: parse_face(BOLD_TTF)?,
        })
    }

    fn face(&self, style: Style) -> &Face<'static> {
        match style {
            Style::Regular => &self.regular,
            Style::Bold => &self.bold,
        }
    }

    /// Advance width of `text` at `size`, in points.
    fn text_width(&self, style: Style, text: &str, size: f32) -> f32 {
        let face = self.face(style);
        let units: u32 = text
            .chars()
            .map(|ch| {
                let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
                u32::from(face.glyph_hor_advance(glyph).unwrap_or(0))
            })
            .sum();
        units as f32 * size / f32::from(face.units_per_em())
    }

    /// Characters the face cannot draw.
    fn missing_glyphs(&self, style: Style, text: &str) -> Vec<char> {
        let face = self.face(style);
        let mut missing: Vec<char> = text
            .chars()
            .filter(|ch| !ch.is_whitespace() && face.glyph_index(*ch).is_none())
            .collect();
        missing.dedup();
        missing
    }
}

fn parse_face(data: &'static [u8]) -> Result<Face<'static>> {
    Face::parse(data, 0).map_err(|error| ReportError::render(format!("embedded font: {error}")))
}

/// Drawing operations of one page, in points from the bottom-left corner.
type Page = Vec<Item>;

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Text {
        x: f32,
        baseline: f32,
        style: Style,
        size: f32,
        text: String,
    },
    Shade {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gray: f32,
    },
    Frame {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

struct Layout<'a> {
    fonts: &'a Fonts,
    pages: Vec<Page>,
    page: Page,
    y: f32,
}

impl<'a> Layout<'a> {
    fn new(fonts: &'a Fonts) -> Self {
        Self {
            fonts,
            pages: Vec::new(),
            page: Vec::new(),
            y: TOP,
        }
    }

    fn remaining(&self) -> f32 {
        self.y - BOTTOM
    }

    fn at_page_top(&self) -> bool {
        self.y >= TOP
    }

    fn new_page(&mut self) {
        self.pages.push(mem::take(&mut self.page));
        self.y = TOP;
    }

    /// Start a new page unless `height` still fits on this one.
    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }
    }

    fn skip(&mut self, space: f32) {
        if !self.at_page_top() {
            self.y -= space;
        }
    }

    fn heading(&mut self, level: u8, text: &str) {
        let size = match level {
            1 => 18.0,
            2 => 14.0,
            3 => 12.0,
            _ => 11.0,
        };
        // Keep a heading together with at least one following line.
        self.skip(size * 0.6);
        self.ensure(size * 1.3 + BODY_SIZE * 1.4);
        self.paragraph(text, Style::Bold, size, size * 0.4);
    }

    fn paragraph(&mut self, text: &str, style: Style, size: f32, space_after: f32) {
        let leading = size * 1.3;
        for line in wrap(self.fonts, text, style, size, CONTENT_WIDTH) {
            self.ensure(leading);
            self.page.push(Item::Text {
                x: MARGIN,
                baseline: self.y - size,
                style,
                size,
                text: line,
            });
            self.y -= leading;
        }
        self.skip(space_after);
    }

    fn table(&mut self, header: &[String], rows: &[Vec<String>]) -> Result<()> {
        let columns = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return Ok(());
        }
        let grid = Grid::new(columns);
        let header_cells =
            (!header.is_empty()).then(|| grid.cells(self.fonts, header, Style::Bold));
        let header_height = header_cells.as_ref().map_or(0.0, |cells| grid.height(cells));

        self.skip(6.0);
        for (idx, row) in rows.iter().enumerate() {
            let cells = grid.cells(self.fonts, row, Style::Regular);
            let height = grid.height(&cells);
            if height + header_height > TOP - BOTTOM {
                return Err(ReportError::render(format!(
                    "table row {} is taller than a page",
                    idx + 1
                )));
            }
            let needs_header = idx == 0 || height > self.remaining();
            if needs_header {
                self.ensure(height + header_height);
                if let Some(cells) = &header_cells {
                    self.row(&grid, cells, Style::Bold, Some(HEADER_SHADE));
                }
            }
            let shade = (idx % 2 == 1).then_some(STRIPE_SHADE);
            self.row(&grid, &cells, Style::Regular, shade);
        }
        if rows.is_empty()
            && let Some(cells) = &header_cells
        {
            self.ensure(header_height);
            self.row(&grid, cells, Style::Bold, Some(HEADER_SHADE));
        }
        self.skip(10.0);
        Ok(())
    }

    fn row(&mut self, grid: &Grid, cells: &[Vec<String>], style: Style, shade: Option<f32>) {
        let height = grid.height(cells);
        let top = self.y;
        let bottom = top - height;
        if let Some(gray) = shade {
            self.page.push(Item::Shade {
                x: MARGIN,
                y: bottom,
                width: CONTENT_WIDTH,
                height,
                gray,
            });
        }
        for column in 0..grid.columns {
            let x = MARGIN + column as f32 * grid.column_width;
            self.page.push(Item::Frame {
                x,
                y: bottom,
                width: grid.column_width,
                height,
            });
            let lines = cells.get(column).map(Vec::as_slice).unwrap_or_default();
            for (line_idx, line) in lines.iter().enumerate() {
                self.page.push(Item::Text {
                    x: x + CELL_PADDING,
                    baseline: top - CELL_PADDING - grid.size - line_idx as f32 * grid.leading,
                    style,
                    size: grid.size,
                    text: line.clone(),
                });
            }
        }
        self.y = bottom;
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.page.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

/// Evenly divided table columns.
struct Grid {
    columns: usize,
    column_width: f32,
    size: f32,
    leading: f32,
}

impl Grid {
    fn new(columns: usize) -> Self {
        Self {
            columns,
            column_width: CONTENT_WIDTH / columns as f32,
            size: BODY_SIZE,
            leading: BODY_SIZE * 1.3,
        }
    }

    /// Wrapped lines of each cell.
    fn cells(&self, fonts: &Fonts, row: &[String], style: Style) -> Vec<Vec<String>> {
        let width = self.column_width - 2.0 * CELL_PADDING;
        (0..self.columns)
            .map(|column| {
                row.get(column)
                    .map(|text| wrap(fonts, text, style, self.size, width))
                    .unwrap_or_default()
            })
            .collect()
    }

    fn height(&self, cells: &[Vec<String>]) -> f32 {
        let lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        lines as f32 * self.leading + 2.0 * CELL_PADDING
    }
}

/// Greedy word wrap; words wider than a line are split by character.
fn wrap(fonts: &Fonts, text: &str, style: Style, size: f32, width: f32) -> Vec<String> {
    let space = fonts.text_width(style, " ", size);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0.0;
    for word in text.split_whitespace() {
        let word_width = fonts.text_width(style, word, size);
        if !line.is_empty() && line_width + space + word_width <= width {
            line.push(' ');
            line.push_str(word);
            line_width += space + word_width;
            continue;
        }
        if !line.is_empty() {
            lines.push(mem::take(&mut line));
        }
        if word_width <= width {
            line.push_str(word);
            line_width = word_width;
            continue;
        }
        line_width = 0.0;
        for ch in word.chars() {
            let ch_width = fonts.text_width(style, ch.encode_utf8(&mut [0; 4]), size);
            if !line.is_empty() && line_width + ch_width > width {
                lines.push(mem::take(&mut line));
                line_width = 0.0;
            }
            line.push(ch);
            line_width += ch_width;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn footer(page: &mut Page, fonts: &Fonts, title: &str, number: usize, total: usize) {
    let baseline = MARGIN - FOOTER_SIZE;
    page.push(Item::Text {
        x: MARGIN,
        baseline,
        style: Style::Regular,
        size: FOOTER_SIZE,
        text: title.to_string(),
    });
    let label = format!("Page {number} of {total}");
    let x = PAGE_WIDTH - MARGIN - fonts.text_width(Style::Regular, &label, FOOTER_SIZE);
    page.push(Item::Text {
        x,
        baseline,
        style: Style::Regular,
        size: FOOTER_SIZE,
        text: label,
    });
}

fn paint(pages: &[Page], title: &str, fonts: &Fonts) -> Result<Vec<u8>> {
    let conformance = PdfConformance::Custom(CustomPdfConformance {
        requires_icc_profile: false,
        requires_xmp_metadata: false,
        ..CustomPdfConformance::default()
    });
    let (document, first_page, first_layer) =
        PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Report");
    let document = document
        .with_conformance(conformance)
        .with_producer("gradebook");
    let regular = document.add_external_font(REGULAR_TTF).map_err(pdf_error)?;
    let bold = document.add_external_font(BOLD_TTF).map_err(pdf_error)?;

    for (idx, page) in pages.iter().enumerate() {
        let layer = if idx == 0 {
            document.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                document.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Report");
            document.get_page(page_index).get_layer(layer_index)
        };
        layer.set_outline_color(gray(0.6));
        layer.set_outline_thickness(0.5);
        for item in page {
            draw(&layer, item, fonts, &regular, &bold);
        }
    }
    document.save_to_bytes().map_err(pdf_error)
}

fn draw(
    layer: &PdfLayerReference,
    item: &Item,
    fonts: &Fonts,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    match item {
        Item::Text {
            x,
            baseline,
            style,
            size,
            text,
        } => {
            let missing = fonts.missing_glyphs(*style, text);
            if !missing.is_empty() {
                warn!(text = %text, missing = ?missing, "characters have no glyph in the report font");
            }
            let font = match style {
                Style::Regular => regular,
                Style::Bold => bold,
            };
            layer.use_text(text.as_str(), *size, mm(*x), mm(*baseline), font);
        }
        Item::Shade {
            x,
            y,
            width,
            height,
            gray: level,
        } => {
            layer.set_fill_color(gray(*level));
            layer.add_rect(rect(*x, *y, *width, *height).with_mode(PaintMode::Fill));
            layer.set_fill_color(gray(0.0));
        }
        Item::Frame {
            x,
            y,
            width,
            height,
        } => layer.add_rect(rect(*x, *y, *width, *height).with_mode(PaintMode::Stroke)),
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> Rect {
    Rect::new(mm(x), mm(y), mm(x + width), mm(y + height))
}

fn gray(level: f32) -> Color {
    Color::Greyscale(Greyscale::new(level, None))
}

fn pdf_error(error: printpdf::Error) -> ReportError {
    ReportError::render(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use printpdf::lopdf::content::Content;
    use printpdf::lopdf::{Document, Object};

    use super::*;

    const NAMES: &str = "Élodie Ğürbüz Ærøskøbing Ζωή";

    /// Text shown on each page, decoded back through the embedded faces.
    fn shown_text(pdf: &[u8], fonts: &Fonts) -> Vec<Vec<String>> {
        let alphabet: String = (' '..='~').chain(NAMES.chars()).collect();
        let maps: Vec<HashMap<u16, char>> = [Style::Regular, Style::Bold]
            .into_iter()
            .map(|style| {
                let face = fonts.face(style);
                alphabet
                    .chars()
                    .filter_map(|ch| face.glyph_index(ch).map(|glyph| (glyph.0, ch)))
                    .collect()
            })
            .collect();
        let document = Document::load_mem(pdf).expect("parse pdf");
        document
            .get_pages()
            .values()
            .map(|&page_id| {
                let content = document.get_page_content(page_id).expect("page content");
                let content = Content::decode(&content).expect("decode content");
                let mut shown = Vec::new();
                for operation in content.operations.iter().filter(|op| op.operator == "Tj") {
                    let Some(Object::String(bytes, _)) = operation.operands.first() else {
                        continue;
                    };
                    let glyphs: Vec<u16> = bytes
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                        .collect();
                    let mut decoded: Vec<String> = maps
                        .iter()
                        .filter_map(|map| {
                            glyphs
                                .iter()
                                .map(|glyph| map.get(glyph).copied())
                                .collect::<Option<String>>()
                        })
                        .collect();
                    decoded.dedup();
                    shown.extend(decoded);
                }
                shown
            })
            .collect()
    }

    fn count(shown: &[String], text: &str) -> usize {
        shown.iter().filter(|line| line.as_str() == text).count()
    }

    #[test]
    fn single_page_document_has_footer() {
        let blocks = vec![
            Block::Heading {
                level: 1,
                text: "Grades Report".into(),
            },
            Block::Paragraph {
                text: "GINF31 Programmation oriente objet et XML".into(),
                bold: false,
            },
        ];
        let pdf = render_blocks(&blocks, "GINF31").expect("render");
        assert!(pdf.starts_with(b"%PDF-"));
        let fonts = Fonts::load().expect("fonts");
        let pages = shown_text(&pdf, &fonts);
        assert_eq!(pages.len(), 1);
        assert_eq!(count(&pages[0], "Grades Report"), 1);
        assert_eq!(count(&pages[0], "Page 1 of 1"), 1);
    }

    #[test]
    fn empty_layout_still_has_one_page() {
        let pdf = render_blocks(&[], "empty").expect("render");
        let document = Document::load_mem(&pdf).expect("parse pdf");
        assert_eq!(document.get_pages().len(), 1);
    }

    #[test]
    fn long_tables_repeat_the_header_row() {
        let rows: Vec<Vec<String>> = (0..200)
            .map(|idx| vec![format!("2101{idx:04}"), "XML et Applications".into(), "14".into()])
            .collect();
        let blocks = vec![Block::Table {
            header: vec!["Student ID".into(), "Element".into(), "Grade".into()],
            rows,
        }];
        let pdf = render_blocks(&blocks, "GINF31").expect("render");
        let fonts = Fonts::load().expect("fonts");
        let pages = shown_text(&pdf, &fonts);
        assert!(pages.len() > 1);
        assert!(pages.iter().all(|shown| count(shown, "Student ID") == 1));
        let total: usize = pages.iter().map(|shown| count(shown, "21010199")).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn non_latin_names_keep_their_characters() {
        let fonts = Fonts::load().expect("fonts");
        for style in [Style::Regular, Style::Bold] {
            assert!(fonts.missing_glyphs(style, NAMES).is_empty());
        }
        let blocks = vec![Block::Table {
            header: vec!["Student".into(), "Grade".into()],
            rows: vec![vec![NAMES.into(), "13.50".into()]],
        }];
        let pages = lay_out(&blocks, "GINF31", &fonts).expect("layout");
        assert!(pages[0].iter().any(|item| matches!(
            item,
            Item::Text { text, .. } if text.as_str() == NAMES
        )));

        let pdf = render_blocks(&blocks, "GINF31").expect("render");
        let shown = shown_text(&pdf, &fonts);
        assert_eq!(count(&shown[0], NAMES), 1);
        assert!(shown[0].iter().all(|line| !line.contains('?')));
    }

    #[test]
    fn accented_text_is_measured_per_glyph() {
        let fonts = Fonts::load().expect("fonts");
        let narrow = fonts.text_width(Style::Regular, "iiii", 10.0);
        let wide = fonts.text_width(Style::Regular, "ÉÉÉÉ", 10.0);
        assert!(wide > narrow * 2.0);
        assert_eq!(
            fonts.text_width(Style::Regular, "é", 10.0),
            fonts.text_width(Style::Regular, "e", 10.0)
        );
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let fonts = Fonts::load().expect("fonts");
        let text = "administration et sécurité des bases de données";
        let lines = wrap(&fonts, text, Style::Regular, 10.0, 100.0);
        assert!(lines.len() > 1);
        assert!(
            lines
                .iter()
                .all(|line| fonts.text_width(Style::Regular, line, 10.0) <= 100.0)
        );
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn oversized_rows_are_rejected() {
        let text = "word ".repeat(4000);
        let blocks = vec![Block::Table {
            header: vec![],
            rows: vec![vec![text]],
        }];
        let error = render_blocks(&blocks, "big").expect_err("row taller than page");
        assert_eq!(error.kind(), grades_model::ErrorKind::Render);
    }
}
