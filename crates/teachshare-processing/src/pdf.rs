//! Plain text to PDF rendering.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

const FONT_RESOURCE: &str = "F1";

/// Fixed page geometry in PDF points.
///
/// The default is A4 with a 10 mm (28 pt) left margin, 10 mm line pitch, and a
/// 12 pt Helvetica face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub width: i64,
    pub height: i64,
    pub margin: i64,
    pub line_height: i64,
    pub font_size: i64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: 595,
            height: 842,
            margin: 28,
            line_height: 28,
            font_size: 12,
        }
    }
}

impl PageLayout {
    /// How many lines fit on one page before the bottom margin.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.height - 2 * self.margin - self.font_size;
        if usable < 0 || self.line_height <= 0 {
            return 1;
        }
        (usable / self.line_height + 1) as usize
    }

    fn first_baseline(&self) -> i64 {
        self.height - self.margin - self.font_size
    }
}

/// Renders lines of text onto fixed-layout pages.
///
/// Output is deterministic: no creation dates or document IDs are written, so
/// identical text always produces identical bytes.
#[derive(Debug, Clone, Default)]
pub struct TextPdfRenderer {
    layout: PageLayout,
}

impl TextPdfRenderer {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Render `text` and return the PDF bytes with the page count.
    ///
    /// A new page starts whenever the next line would cross the bottom margin.
    /// Empty input yields a single blank page.
    pub fn render(&self, text: &str) -> Result<(Vec<u8>, usize), lopdf::Error> {
        let lines: Vec<&str> = text.lines().collect();
        let per_page = self.layout.lines_per_page();
        let blank: &[&str] = &[];
        let chunks: Vec<&[&str]> = if lines.is_empty() {
            vec![blank]
        } else {
            lines.chunks(per_page).collect()
        };

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_RESOURCE => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let page_id = self.add_page(&mut doc, pages_id, chunk)?;
            kids.push(page_id.into());
        }

        let page_count = kids.len();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(self.layout.width),
                Object::Integer(self.layout.height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok((buffer, page_count))
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        lines: &[&str],
    ) -> Result<ObjectId, lopdf::Error> {
        let mut operations = Vec::with_capacity(lines.len() * 5);
        let mut baseline = self.layout.first_baseline();
        for line in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![FONT_RESOURCE.into(), Object::Integer(self.layout.font_size)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(self.layout.margin), Object::Integer(baseline)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_line(line))],
            ));
            operations.push(Operation::new("ET", vec![]));
            baseline -= self.layout.line_height;
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }))
    }
}

/// Encode a line for a WinAnsi-encoded standard font.
///
/// Tabs expand to four spaces; characters outside printable Latin-1 become `?`.
fn encode_line(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\t' => out.extend_from_slice(b"    "),
            ' '..='~' => out.push(c as u8),
            '\u{A0}'..='\u{FF}' => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_count_of(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_renders_valid_pdf() {
        let (bytes, pages) = TextPdfRenderer::default().render("Line1\nLine2").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(pages, 1);
        assert_eq!(page_count_of(&bytes), 1);
    }

    #[test]
    fn test_output_is_deterministic() {
        let renderer = TextPdfRenderer::default();
        let (a, _) = renderer.render("same text\nsecond line").unwrap();
        let (b, _) = renderer.render("same text\nsecond line").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_overflow_starts_new_page() {
        let renderer = TextPdfRenderer::default();
        let per_page = renderer.layout().lines_per_page();
        assert_eq!(per_page, 28);

        let text: Vec<String> = (0..per_page + 1).map(|i| format!("line {}", i)).collect();
        let (bytes, pages) = renderer.render(&text.join("\n")).unwrap();
        assert_eq!(pages, 2);
        assert_eq!(page_count_of(&bytes), 2);
    }

    #[test]
    fn test_empty_text_is_one_blank_page() {
        let (bytes, pages) = TextPdfRenderer::default().render("").unwrap();
        assert_eq!(pages, 1);
        assert_eq!(page_count_of(&bytes), 1);
    }

    #[test]
    fn test_encode_line_replaces_unrepresentable() {
        assert_eq!(encode_line("a\tb"), b"a    b".to_vec());
        assert_eq!(encode_line("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_line("日本"), b"??".to_vec());
    }
}
