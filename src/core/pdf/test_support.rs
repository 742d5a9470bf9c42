//! lopdf-built fixtures shared by the pdf module tests.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::remover::decode_text_operands;

/// Write a minimal PDF with one content line per entry, one page per
/// outer element. Helvetica text, A4 pages.
pub(crate) fn build_pdf(path: &Path, pages: &[Vec<&str>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        let mut y = 760;
        for line in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), 12.into()],
            ));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
            y -= 20;
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.save(path).expect("save fixture pdf");
}

/// Decoded text of every page, joined per page with newlines
pub(crate) fn extracted_page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("load pdf");
    let mut texts = Vec::new();

    for (_num, page_id) in doc.get_pages() {
        let content = doc
            .get_and_decode_page_content(page_id)
            .expect("decode content");
        let encodings: BTreeMap<Vec<u8>, String> = doc
            .get_page_fonts(page_id)
            .into_iter()
            .map(|(name, font)| (name, font.get_font_encoding().to_string()))
            .collect();

        let mut current_encoding: Option<String> = None;
        let mut lines = Vec::new();
        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        current_encoding = encodings.get(name).cloned();
                    }
                }
                "Tj" | "'" | "\"" | "TJ" => {
                    let text = decode_text_operands(op, current_encoding.as_deref());
                    if !text.is_empty() {
                        lines.push(text);
                    }
                }
                _ => {}
            }
        }
        texts.push(lines.join("\n"));
    }
    texts
}

/// MediaBox of every page as numbers, for geometry-preservation assertions
pub(crate) fn page_media_boxes(path: &Path) -> Vec<Vec<f64>> {
    let doc = Document::load(path).expect("load pdf");
    let mut boxes = Vec::new();

    for (_num, page_id) in doc.get_pages() {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .expect("page dict");
        let media_box = match page.get(b"MediaBox") {
            Ok(obj) => obj,
            Err(_) => {
                // Inherited from the parent Pages node
                let parent_id = page
                    .get(b"Parent")
                    .and_then(Object::as_reference)
                    .expect("parent ref");
                doc.get_object(parent_id)
                    .and_then(Object::as_dict)
                    .and_then(|d| d.get(b"MediaBox"))
                    .expect("inherited MediaBox")
            }
        };
        let values = media_box
            .as_array()
            .expect("MediaBox array")
            .iter()
            .map(number)
            .collect();
        boxes.push(values);
    }
    boxes
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        _ => 0.0,
    }
}
