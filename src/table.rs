//! Course table layout.
//!
//! Tables span as many pages as needed.  Every page a table continues onto
//! starts at [`LayoutConfig::table_continuation_top`] and repeats the head row.
//! Cell text is centred in both directions and wrapped to the column width.

use log::debug;

use crate::document::{Document, HorizontalAlignment, Page, TextStyle};
use crate::fonts;
use crate::layout::{LayoutConfig, Rgb, COLUMN_COUNT};
use crate::model::{Category, COURSE_TABLE_HEAD};

/// Head and body cells of one category's course table.
#[derive(Clone, Debug, PartialEq)]
pub struct CourseTable {
    head: [String; COLUMN_COUNT],
    rows: Vec<[String; COLUMN_COUNT]>,
}

impl CourseTable {
    /// Builds the table for a category with its courses in display order.
    pub fn for_category(category: &Category) -> Self {
        Self {
            head: COURSE_TABLE_HEAD.map(str::to_string),
            rows: category.table_rows(),
        }
    }

    pub fn head(&self) -> &[String; COLUMN_COUNT] {
        &self.head
    }

    pub fn rows(&self) -> &[[String; COLUMN_COUNT]] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Draws the table starting at `start_y` on the current page and returns
    /// the y position just below its last row.
    pub fn draw(&self, document: &mut Document, config: &LayoutConfig, start_y: f64) -> f64 {
        let widths = config.column_widths();
        let theme = &config.theme;
        let head_style = TextStyle::bold(config.table_font_size, theme.table_head_text);
        let body_style = TextStyle::regular(config.table_font_size, theme.text);

        let head = RowLayout::new(&self.head, &widths, head_style, config);
        let body: Vec<RowLayout> = self
            .rows
            .iter()
            .map(|row| RowLayout::new(row, &widths, body_style, config))
            .collect();

        let bottom = config.content_bottom();
        let mut y = start_y;

        let first_height = body.first().map_or(0.0, |row| row.height);
        if y + head.height + first_height > bottom {
            debug!("Course table does not fit at y={:.1}; starting on a new page", y);
            document.add_page();
            y = config.table_continuation_top;
        }

        head.paint(document.current_page(), y, &widths, Some(theme.table_head), config);
        y += head.height;

        let mut rows_on_page = 0;
        for (index, row) in body.iter().enumerate() {
            if rows_on_page > 0 && y + row.height > bottom {
                document.add_page();
                debug!(
                    "Course table continues on page {} at row {}",
                    document.page_count(),
                    index
                );
                y = config.table_continuation_top;
                head.paint(document.current_page(), y, &widths, Some(theme.table_head), config);
                y += head.height;
                rows_on_page = 0;
            }

            let fill = (index % 2 == 0).then_some(theme.table_stripe);
            row.paint(document.current_page(), y, &widths, fill, config);
            y += row.height;
            rows_on_page += 1;
        }

        y
    }
}

struct RowLayout {
    cells: Vec<Vec<String>>,
    style: TextStyle,
    height: f64,
}

impl RowLayout {
    fn new(
        cells: &[String; COLUMN_COUNT],
        widths: &[f64; COLUMN_COUNT],
        style: TextStyle,
        config: &LayoutConfig,
    ) -> Self {
        let padding = config.table_cell_padding;
        let cells: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let inner = (width - 2.0 * padding).max(0.0);
                fonts::wrap_text(cell, style.weight, style.size, inner)
            })
            .collect();
        let max_lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        let height = max_lines as f64 * line_height(config) + 2.0 * padding;

        Self {
            cells,
            style,
            height,
        }
    }

    fn paint(
        &self,
        page: &mut Page,
        y: f64,
        widths: &[f64; COLUMN_COUNT],
        fill: Option<Rgb>,
        config: &LayoutConfig,
    ) {
        let line_height = line_height(config);
        let mut x = config.table_margin;

        if let Some(color) = fill {
            page.fill_rect(x, y, config.table_width(), self.height, color);
        }

        for (lines, width) in self.cells.iter().zip(widths) {
            let block = lines.len() as f64 * line_height;
            let top = y + (self.height - block) / 2.0;
            let centre = x + width / 2.0;
            for (index, line) in lines.iter().enumerate() {
                let baseline = top
                    + index as f64 * line_height
                    + line_height / 2.0
                    + self.style.size * fonts::CAP_HEIGHT / 2.0;
                page.text(
                    line.clone(),
                    centre,
                    baseline,
                    self.style,
                    HorizontalAlignment::Center,
                );
            }
            x += width;
        }
    }
}

fn line_height(config: &LayoutConfig) -> f64 {
    config.table_font_size * config.table_line_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Course;

    fn category_with(count: usize) -> Category {
        Category {
            category_name: "Core".into(),
            courses: (0..count)
                .map(|index| Course {
                    year: Some("2022-2023".into()),
                    semester: Some("Odd Sem".into()),
                    course_code: format!("CS{:03}", index),
                    course_name: "Data Structures".into(),
                    credits: Some(4.0),
                    grade: Some("A".into()),
                })
                .collect(),
            ..Category::default()
        }
    }

    fn head_count(page: &Page) -> usize {
        page.texts().filter(|text| *text == "Course Code").count()
    }

    #[test]
    fn short_table_stays_on_page() {
        let config = LayoutConfig::default();
        let mut document = Document::new("t", config.page_width, config.page_height);
        let table = CourseTable::for_category(&category_with(3));

        let end = table.draw(&mut document, &config, 200.0);

        assert_eq!(document.page_count(), 1);
        assert!(end > 200.0);
        assert_eq!(head_count(&document.pages()[0]), 1);
        assert!(document.contains_text("CS002"));
    }

    #[test]
    fn long_table_continues_with_repeated_head() {
        let config = LayoutConfig::default();
        let mut document = Document::new("t", config.page_width, config.page_height);
        let table = CourseTable::for_category(&category_with(80));

        let end = table.draw(&mut document, &config, 200.0);

        assert!(document.page_count() > 1);
        for page in document.pages() {
            assert_eq!(head_count(page), 1);
        }
        assert!(end <= config.content_bottom());
        assert!(end > config.table_continuation_top);
        assert_eq!(document.find_text("CS079"), Some(document.page_count() - 1));
    }

    #[test]
    fn table_near_bottom_moves_to_next_page() {
        let config = LayoutConfig::default();
        let mut document = Document::new("t", config.page_width, config.page_height);
        let table = CourseTable::for_category(&category_with(1));

        table.draw(&mut document, &config, config.content_bottom() - 5.0);

        assert_eq!(document.page_count(), 2);
        assert_eq!(head_count(&document.pages()[0]), 0);
        assert_eq!(head_count(&document.pages()[1]), 1);
    }

    #[test]
    fn wrapped_cells_grow_row_height() {
        let config = LayoutConfig::default();
        let widths = config.column_widths();
        let style = TextStyle::regular(config.table_font_size, Rgb::BLACK);
        let short = RowLayout::new(&COURSE_TABLE_HEAD.map(str::to_string), &widths, style, &config);

        let mut cells = COURSE_TABLE_HEAD.map(str::to_string);
        cells[3] = "Advanced Topics in Distributed Systems and Cloud Computing Infrastructure".into();
        let tall = RowLayout::new(&cells, &widths, style, &config);

        assert!(tall.height > short.height);
    }
}
