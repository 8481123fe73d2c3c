//! Paginated display list produced by the composer.
//!
//! A [`Document`] is a backend-independent description of the finished
//! report: an ordered list of pages, each holding positioned drawing
//! operations.  Coordinates use PDF points with the origin in the top-left
//! corner and text positioned by its left edge and baseline, so the values can
//! be inspected in tests before the PDF writer flips them into PDF space.

use crate::fonts::{self, FontWeight};
use crate::layout::Rgb;

/// Horizontal anchoring of a text run relative to its reference x position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// The reference x is the left edge.
    #[default]
    Left,
    /// The reference x is the centre.
    Center,
    /// The reference x is the right edge.
    Right,
}

/// A single drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Solid rectangle; `y` is the top edge.
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgb,
    },
    /// Single line of text; `x` is the left edge and `y` the baseline.
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        weight: FontWeight,
        color: Rgb,
    },
}

/// Style applied to a text run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub weight: FontWeight,
    pub color: Rgb,
}

impl TextStyle {
    pub fn new(size: f64, weight: FontWeight, color: Rgb) -> Self {
        Self {
            size,
            weight,
            color,
        }
    }

    pub fn regular(size: f64, color: Rgb) -> Self {
        Self::new(size, FontWeight::Regular, color)
    }

    pub fn bold(size: f64, color: Rgb) -> Self {
        Self::new(size, FontWeight::Bold, color)
    }
}

/// One page of drawing operations, in painting order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    operations: Vec<DrawOp>,
}

impl Page {
    pub fn operations(&self) -> &[DrawOp] {
        &self.operations
    }

    /// Paints a solid rectangle whose top-left corner is at `(x, y)`.
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        self.operations.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    /// Writes `text` with its baseline at `y`, anchored at `x` per `alignment`.
    pub fn text(
        &mut self,
        text: impl Into<String>,
        x: f64,
        y: f64,
        style: TextStyle,
        alignment: HorizontalAlignment,
    ) {
        let text = text.into();
        let width = fonts::text_width(&text, style.weight, style.size);
        let left = match alignment {
            HorizontalAlignment::Left => x,
            HorizontalAlignment::Center => x - width / 2.0,
            HorizontalAlignment::Right => x - width,
        };
        self.operations.push(DrawOp::Text {
            text,
            x: left,
            y,
            size: style.size,
            weight: style.weight,
            color: style.color,
        });
    }

    /// Iterates over the text runs on this page.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().filter_map(|operation| match operation {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::FillRect { .. } => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text == needle)
    }
}

/// Navigation entry pointing at the page where a category starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    pub title: String,
    /// Zero-based page index.
    pub page: usize,
}

/// A finished, paginated report.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    title: String,
    width: f64,
    height: f64,
    pages: Vec<Page>,
    outline: Vec<OutlineEntry>,
}

impl Document {
    /// Creates a document holding one empty page.
    pub fn new(title: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            pages: vec![Page::default()],
            outline: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    /// Appends an empty page and returns its index.
    pub fn add_page(&mut self) -> usize {
        self.pages.push(Page::default());
        self.pages.len() - 1
    }

    /// Index of the page currently being written.
    pub fn current_page_index(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn current_page(&mut self) -> &mut Page {
        let index = self.current_page_index();
        &mut self.pages[index]
    }

    /// Records an outline entry for the current page.
    pub fn add_outline_entry(&mut self, title: impl Into<String>) {
        let page = self.current_page_index();
        self.outline.push(OutlineEntry {
            title: title.into(),
            page,
        });
    }

    /// Returns the index of the first page holding the exact text run.
    pub fn find_text(&self, needle: &str) -> Option<usize> {
        self.pages.iter().position(|page| page.contains_text(needle))
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.find_text(needle).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_positions_text_by_width() {
        let mut page = Page::default();
        let style = TextStyle::regular(10.0, Rgb::BLACK);
        let width = fonts::text_width("Total", FontWeight::Regular, 10.0);

        page.text("Total", 100.0, 50.0, style, HorizontalAlignment::Right);
        page.text("Total", 100.0, 50.0, style, HorizontalAlignment::Center);

        let lefts: Vec<f64> = page
            .operations()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, .. } => Some(*x),
                DrawOp::FillRect { .. } => None,
            })
            .collect();
        assert!((lefts[0] - (100.0 - width)).abs() < 1e-9);
        assert!((lefts[1] - (100.0 - width / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn outline_tracks_current_page() {
        let mut document = Document::new("Report", 595.0, 842.0);
        document.add_outline_entry("First");
        document.add_page();
        document.current_page().text(
            "Second page",
            40.0,
            40.0,
            TextStyle::regular(10.0, Rgb::BLACK),
            HorizontalAlignment::Left,
        );
        document.add_outline_entry("Second");

        assert_eq!(document.page_count(), 2);
        assert_eq!(document.outline()[1].page, 1);
        assert_eq!(document.find_text("Second page"), Some(1));
    }
}
