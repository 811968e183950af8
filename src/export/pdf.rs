//! Single-page PDF rendering of the editor text.
//!
//! The layout is fixed: a 550x750 pt page with the whole buffer drawn as one
//! block of Helvetica 12 pt starting 50 pt from the top-left corner and
//! wrapped at 450 pt. Lines that run past the bottom edge are still emitted;
//! the page never grows and no second page is added.

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};
use thiserror::Error;

pub const PAGE_WIDTH: f32 = 550.0;
pub const PAGE_HEIGHT: f32 = 750.0;
pub const MARGIN: f32 = 50.0;
pub const FONT_SIZE: f32 = 12.0;
pub const LINE_HEIGHT: f32 = FONT_SIZE * 1.2;
pub const MAX_LINE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const FONT_NAME: Name<'static> = Name(b"F1");
const TAB_STOP: &str = "    ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PdfError {
    /// The standard Helvetica font only covers WinAnsi.
    #[error("WinAnsi cannot encode {ch:?}")]
    Unencodable { ch: char },
    #[error("PDF generation failed: {0}")]
    Backend(String),
}

/// Something that turns text into PDF bytes.
pub trait PdfEngine {
    /// # Errors
    /// Returns an error if the text cannot be laid out or encoded.
    fn render(&self, text: &str) -> Result<Vec<u8>, PdfError>;
}

/// `pdf-writer` backed engine using the built-in Helvetica font.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPdf;

impl PdfEngine for BuiltinPdf {
    fn render(&self, text: &str) -> Result<Vec<u8>, PdfError> {
        let lines = layout_lines(text)?;

        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let page_id = Ref::new(3);
        let font_id = Ref::new(4);
        let content_id = Ref::new(5);

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);
        {
            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(page_tree_id);
            page.contents(content_id);
            page.resources().fonts().pair(FONT_NAME, font_id);
        }
        pdf.type1_font(font_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        let mut content = Content::new();
        content.begin_text();
        content.set_font(FONT_NAME, FONT_SIZE);
        content.next_line(MARGIN, PAGE_HEIGHT - MARGIN);
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                content.next_line(0.0, -LINE_HEIGHT);
            }
            if !line.is_empty() {
                content.show(Str(line));
            }
        }
        content.end_text();
        let stream = content.finish();
        pdf.stream(content_id, &stream);

        Ok(pdf.finish())
    }
}

/// Break `text` into WinAnsi-encoded lines that fit [`MAX_LINE_WIDTH`].
///
/// Explicit newlines always break. Within a line, breaks happen at spaces;
/// a single word wider than the line keeps its own overlong line.
pub fn layout_lines(text: &str) -> Result<Vec<Vec<u8>>, PdfError> {
    let mut out = Vec::new();
    for raw in text.split('\n') {
        let expanded = raw.replace('\r', "").replace('\t', TAB_STOP);
        let mut line: Vec<u8> = Vec::new();
        let mut line_width = 0.0_f32;
        for (idx, word) in expanded.split(' ').enumerate() {
            let encoded = encode_win_ansi(word)?;
            let word_width = text_width(&encoded);
            if idx == 0 {
                line = encoded;
                line_width = word_width;
                continue;
            }
            let space = glyph_width(b' ');
            if line_width + space + word_width > MAX_LINE_WIDTH && !line.is_empty() {
                out.push(std::mem::take(&mut line));
                line = encoded;
                line_width = word_width;
            } else {
                line.push(b' ');
                line.extend_from_slice(&encoded);
                line_width += space + word_width;
            }
        }
        out.push(line);
    }
    Ok(out)
}

/// Width in points of WinAnsi bytes at [`FONT_SIZE`].
pub fn text_width(bytes: &[u8]) -> f32 {
    bytes.iter().map(|&b| glyph_width(b)).sum()
}

fn glyph_width(byte: u8) -> f32 {
    f32::from(helvetica_advance(byte)) * FONT_SIZE / 1000.0
}

/// Helvetica advance widths (AFM units) for printable ASCII.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

fn helvetica_advance(byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => HELVETICA_ASCII[usize::from(byte - 0x20)],
        // Accented Latin-1 letters are close enough to the digit width.
        _ => 556,
    }
}

/// Encode to WinAnsi (Windows-1252), failing on the first character the
/// encoding does not cover.
pub fn encode_win_ansi(text: &str) -> Result<Vec<u8>, PdfError> {
    text.chars()
        .map(|ch| win_ansi_byte(ch).ok_or(PdfError::Unencodable { ch }))
        .collect()
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = u32::from(ch);
    match code {
        0x20..=0x7E | 0xA0..=0xFF => u8::try_from(code).ok(),
        _ => Some(match ch {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => return None,
        }),
    }
}
