//! Draws a composed [`Document`] with `printpdf` and finishes the file with `lopdf`.
//!
//! Text is set in the built-in Helvetica faces, so no font program is embedded.
//! printpdf stamps creation dates and a random file identifier on every save;
//! the `lopdf` pass strips them and attaches the category outline, so the same
//! display list always produces the same bytes.

mod outline;

use std::io::BufWriter;

use lopdf::{Object, ObjectId};
use printpdf::{
    BuiltinFont, Color, CustomPdfConformance, IndirectFontRef, Line, Mm, PdfConformance,
    PdfDocument, PdfLayerReference, Point, Pt,
};
use thiserror::Error;

use crate::document::{Document, DrawOp, Page};
use crate::fonts::FontWeight;
use crate::layout::Rgb;

const LAYER_NAME: &str = "Report";
const PRODUCER: &str = concat!("exit_report ", env!("CARGO_PKG_VERSION"));

/// Errors raised while writing PDF output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to draw PDF pages")]
    Draw(#[from] printpdf::Error),
    #[error("failed to post-process PDF")]
    Pdf(#[from] lopdf::Error),
    #[error("failed to write PDF bytes")]
    Io(#[from] std::io::Error),
    #[error("document has no pages")]
    NoPages,
    #[error("outline entry '{title}' refers to missing page {page}")]
    MissingPage { title: String, page: usize },
}

struct Faces {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Faces {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// Renders the document into a complete PDF file held in memory.
pub fn render(document: &Document) -> Result<Vec<u8>, RenderError> {
    if document.pages().is_empty() {
        return Err(RenderError::NoPages);
    }

    let width = mm(document.width());
    let height = mm(document.height());
    let (pdf, first_page, first_layer) =
        PdfDocument::new(document.title(), width, height, LAYER_NAME);
    let pdf = pdf.with_conformance(PdfConformance::Custom(CustomPdfConformance {
        allows_default_fonts: true,
        ..CustomPdfConformance::default()
    }));

    let faces = Faces {
        regular: pdf.add_builtin_font(FontWeight::Regular.builtin_font())?,
        bold: pdf.add_builtin_font(FontWeight::Bold.builtin_font())?,
    };

    for (index, page) in document.pages().iter().enumerate() {
        let layer = if index == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = pdf.add_page(width, height, LAYER_NAME);
            pdf.get_page(page_index).get_layer(layer_index)
        };
        draw_page(&layer, page, document.height(), &faces);
    }

    let mut drawn = Vec::new();
    {
        let mut writer = BufWriter::new(&mut drawn);
        pdf.save(&mut writer)?;
        writer.into_inner().map_err(|err| err.into_error())?;
    }

    finish(&drawn, document)
}

/// Replays the top-left based operations of a page onto a printpdf layer.
fn draw_page(layer: &PdfLayerReference, page: &Page, page_height: f64, faces: &Faces) {
    for operation in page.operations() {
        match operation {
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                let bottom = page_height - y - height;
                let top = bottom + height;
                layer.set_fill_color(fill_color(*color));
                layer.add_shape(Line {
                    points: vec![
                        (point(*x, bottom), false),
                        (point(x + width, bottom), false),
                        (point(x + width, top), false),
                        (point(*x, top), false),
                    ],
                    is_closed: true,
                    has_fill: true,
                    has_stroke: false,
                    is_clipping_path: false,
                });
            }
            DrawOp::Text {
                text,
                x,
                y,
                size,
                weight,
                color,
            } => {
                layer.set_fill_color(fill_color(*color));
                layer.use_text(
                    text.as_str(),
                    *size,
                    mm(*x),
                    mm(page_height - y),
                    faces.get(*weight),
                );
            }
        }
    }
}

/// Strips save-time metadata, attaches the outline and compresses the file.
fn finish(drawn: &[u8], document: &Document) -> Result<Vec<u8>, RenderError> {
    let mut pdf = lopdf::Document::load_mem(drawn)?;

    pdf.trailer.remove(b"ID");
    if let Ok(info_id) = pdf.trailer.get(b"Info").and_then(Object::as_reference) {
        let info = pdf.get_dictionary_mut(info_id)?;
        info.remove(b"CreationDate");
        info.remove(b"ModDate");
        info.set("Producer", Object::string_literal(PRODUCER));
    }

    let page_ids: Vec<ObjectId> = pdf.get_pages().into_values().collect();
    let outlines_id = outline::write_outline(&mut pdf, document.outline(), &page_ids)?;

    let catalog = pdf.catalog_mut()?;
    match outlines_id {
        Some(outlines_id) => {
            catalog.set("Outlines", Object::Reference(outlines_id));
            catalog.set("PageMode", Object::Name("UseOutlines".into()));
        }
        None => {
            catalog.remove(b"Outlines");
        }
    }

    pdf.prune_objects();
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)?;
    Ok(bytes)
}

fn mm(points: f64) -> Mm {
    Mm::from(Pt(points))
}

fn point(x: f64, y: f64) -> Point {
    Point::new(mm(x), mm(y))
}

fn fill_color(color: Rgb) -> Color {
    let [r, g, b] = color.unit_channels();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}
