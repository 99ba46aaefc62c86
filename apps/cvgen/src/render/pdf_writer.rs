//! Minimal lopdf document assembly: fixed-size pages, the two standard Helvetica
//! fonts, one content stream per page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::layout::font_metrics::FontFamily;
use crate::layout::pdf_text::encode_win_ansi;
use crate::render::RenderError;

pub struct PdfBuilder {
    width: f32,
    height: f32,
    pages: Vec<Vec<Operation>>,
}

impl PdfBuilder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pages: Vec::new(),
        }
    }

    pub fn add_page(&mut self, operations: Vec<Operation>) {
        self.pages.push(operations);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serializes the document. A builder with no pages still produces one blank page.
    pub fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for family in [FontFamily::Helvetica, FontFamily::HelveticaBold] {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => family.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(family.resource_name(), font_id);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let encoded = Content { operations }
                .encode()
                .map_err(|e| RenderError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                real(self.width),
                real(self.height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(buf)
    }
}

pub fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// `BT /Fx size Tf x y Td (text) Tj ET`
pub fn text_operations(font: FontFamily, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font.resource_name().as_bytes().to_vec()), real(size)],
        ),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Thin horizontal rule from `x1` to `x2` at height `y`.
pub fn rule_operations(x1: f32, x2: f32, y: f32) -> Vec<Operation> {
    vec![
        Operation::new("w", vec![real(0.5)]),
        Operation::new("m", vec![real(x1), real(y)]),
        Operation::new("l", vec![real(x2), real(y)]),
        Operation::new("S", vec![]),
    ]
}
