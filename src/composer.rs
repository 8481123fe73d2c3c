//! Lays out a [`Report`] as a paginated [`Document`].
//!
//! The composer keeps a vertical cursor on the current page and walks the
//! report top to bottom: branded header, student block, summary totals, one
//! block per category, and finally the footer band on the last page.  All
//! distances come from [`LayoutConfig`], so the output depends only on the
//! report and the configuration.

use log::debug;

use crate::document::{Document, HorizontalAlignment, TextStyle};
use crate::layout::LayoutConfig;
use crate::model::{Category, Report};
use crate::table::CourseTable;

/// Notice rendered in place of the table for a category without courses.
pub const NO_COURSES_NOTICE: &str = "No courses registered";

/// Composes the report into a finished document.
pub fn compose(report: &Report, config: &LayoutConfig) -> Document {
    let mut composer = Composer::new(config, document_title(report));
    composer.draw_header();
    composer.draw_student(report);
    composer.draw_summary(report);
    for category in &report.categories {
        composer.draw_category(category);
    }
    composer.draw_footer(report);
    composer.finish()
}

/// Composes the report when one is available; returns `None` immediately otherwise.
pub fn compose_optional(report: Option<&Report>, config: &LayoutConfig) -> Option<Document> {
    report.map(|report| compose(report, config))
}

/// Title stored in the document metadata.
pub fn document_title(report: &Report) -> String {
    format!("Exit Requirement Report - {}", report.student_id)
}

/// Cursor-driven writer over a [`Document`].
pub struct Composer<'a> {
    config: &'a LayoutConfig,
    document: Document,
    cursor: f64,
}

impl<'a> Composer<'a> {
    /// Creates a composer holding a single empty page.
    pub fn new(config: &'a LayoutConfig, title: impl Into<String>) -> Self {
        Self {
            config,
            document: Document::new(title, config.page_width, config.page_height),
            cursor: config.page_margin,
        }
    }

    /// Current vertical write position on the current page.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Starts a new page when fewer than `required` points remain above the bottom margin.
    pub fn ensure_space(&mut self, required: f64) {
        if self.cursor + required > self.config.content_bottom() {
            let page = self.document.add_page();
            debug!(
                "Page break at y={:.1}; continuing on page {}",
                self.cursor,
                page + 1
            );
            self.cursor = self.config.page_margin;
        }
    }

    pub fn draw_header(&mut self) {
        let config = self.config;
        let theme = &config.theme;
        let centre = config.page_width / 2.0;
        let page = self.document.current_page();

        page.fill_rect(0.0, 0.0, config.page_width, config.header_height, theme.brand);
        page.text(
            theme.header_title.as_str(),
            centre,
            config.header_title_baseline,
            TextStyle::bold(config.header_title_size, theme.on_brand),
            HorizontalAlignment::Center,
        );
        page.text(
            theme.header_subtitle.as_str(),
            centre,
            config.header_subtitle_baseline,
            TextStyle::bold(config.header_subtitle_size, theme.on_brand),
            HorizontalAlignment::Center,
        );

        self.cursor = config.content_top;
    }

    pub fn draw_student(&mut self, report: &Report) {
        let config = self.config;
        let theme = &config.theme;
        let centre = config.page_width / 2.0;
        let y = self.cursor;
        let page = self.document.current_page();

        page.text(
            report.student_name.as_str(),
            centre,
            y,
            TextStyle::bold(config.student_name_size, theme.text),
            HorizontalAlignment::Center,
        );
        page.text(
            format!("ID: {}", report.student_id),
            centre,
            y + config.student_id_offset,
            TextStyle::regular(config.student_id_size, theme.muted_text),
            HorizontalAlignment::Center,
        );

        self.cursor += config.student_block_advance;
    }

    /// Writes the course and credit totals at both ends of one row.
    pub fn draw_summary(&mut self, report: &Report) {
        let config = self.config;
        let style = TextStyle::regular(config.summary_size, config.theme.text);
        let y = self.cursor;
        let page = self.document.current_page();

        page.text(
            report.total_courses_line(),
            config.page_margin,
            y,
            style,
            HorizontalAlignment::Left,
        );
        page.text(
            report.total_credits_line(),
            config.page_width - config.page_margin,
            y,
            style,
            HorizontalAlignment::Right,
        );

        self.cursor += config.summary_advance;
    }

    pub fn draw_category(&mut self, category: &Category) {
        let config = self.config;
        let theme = &config.theme;

        self.ensure_space(config.category_space_threshold);
        self.document
            .add_outline_entry(category.category_name.as_str());

        let y = self.cursor;
        let detail = TextStyle::regular(config.category_detail_size, theme.text);
        let page = self.document.current_page();

        page.fill_rect(
            config.category_band_inset,
            y - config.category_band_rise,
            config.page_width - 2.0 * config.category_band_inset,
            config.category_band_height,
            theme.category_band,
        );
        page.text(
            category.category_name.as_str(),
            config.page_margin,
            y,
            TextStyle::bold(config.category_name_size, theme.text),
            HorizontalAlignment::Left,
        );
        page.text(
            category.required_line(),
            config.page_margin,
            y + config.category_detail_offset,
            detail,
            HorizontalAlignment::Left,
        );
        page.text(
            category.completed_line(),
            config.category_completed_x,
            y + config.category_detail_offset,
            detail,
            HorizontalAlignment::Left,
        );

        self.cursor += config.category_advance;

        let table = CourseTable::for_category(category);
        if table.is_empty() {
            self.draw_empty_notice();
        } else {
            let end = table.draw(&mut self.document, config, self.cursor);
            self.cursor = end + config.table_gap;
        }
    }

    fn draw_empty_notice(&mut self) {
        let config = self.config;
        self.cursor -= config.empty_notice_lift;
        let y = self.cursor + config.empty_notice_offset;

        self.document.current_page().text(
            NO_COURSES_NOTICE,
            config.page_width / 2.0,
            y,
            TextStyle::regular(config.empty_notice_size, config.theme.notice),
            HorizontalAlignment::Center,
        );

        self.cursor += config.empty_notice_advance;
    }

    /// Paints the footer band with the totals on the current page.
    pub fn draw_footer(&mut self, report: &Report) {
        let config = self.config;
        let theme = &config.theme;
        let style = TextStyle::regular(config.footer_text_size, theme.on_brand);
        let baseline = config.page_height - config.footer_baseline;
        let page = self.document.current_page();

        page.fill_rect(
            0.0,
            config.page_height - config.footer_height,
            config.page_width,
            config.footer_height,
            theme.brand,
        );
        page.text(
            report.total_courses_line(),
            config.page_margin,
            baseline,
            style,
            HorizontalAlignment::Left,
        );
        page.text(
            report.total_credits_line(),
            config.page_width - config.page_margin,
            baseline,
            style,
            HorizontalAlignment::Right,
        );
    }

    pub fn finish(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DrawOp;
    use crate::model::Course;

    fn report_with(categories: Vec<Category>) -> Report {
        Report {
            student_name: "Asha Rao".into(),
            student_id: "2100030123".into(),
            total_registered_courses: Some(40),
            total_registered_credits: Some(160),
            categories,
        }
    }

    fn empty_category(name: &str) -> Category {
        Category {
            category_name: name.into(),
            min_required_courses: Some(2),
            registered_courses: Some(0),
            courses: Vec::new(),
        }
    }

    #[test]
    fn header_resets_cursor_below_band() {
        let config = LayoutConfig::default();
        let mut composer = Composer::new(&config, "t");
        composer.draw_header();
        assert_eq!(composer.cursor(), config.content_top);

        let page = &composer.document().pages()[0];
        assert!(page.contains_text("KONERU LAKSHMAIAH EDUCATION FOUNDATION"));
        assert!(matches!(
            page.operations()[0],
            DrawOp::FillRect { x, y, height, .. } if x == 0.0 && y == 0.0 && height == 60.0
        ));
    }

    #[test]
    fn student_block_and_summary_advance_cursor() {
        let config = LayoutConfig::default();
        let report = report_with(Vec::new());
        let mut composer = Composer::new(&config, "t");
        composer.draw_header();
        composer.draw_student(&report);
        composer.draw_summary(&report);

        assert_eq!(composer.cursor(), 200.0);
        let page = &composer.document().pages()[0];
        assert!(page.contains_text("ID: 2100030123"));
        assert!(page.contains_text("Total Registered Credits: 160"));
    }

    #[test]
    fn credits_total_is_right_aligned() {
        let config = LayoutConfig::default();
        let document = compose(&report_with(Vec::new()), &config);
        let right_edge = document.pages()[0]
            .operations()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text {
                    text, x, size, weight, ..
                } if text == "Total Registered Credits: 160" => {
                    Some(x + crate::fonts::text_width(text, *weight, *size))
                }
                _ => None,
            })
            .expect("credits line");
        assert!((right_edge - (config.page_width - config.page_margin)).abs() < 1e-9);
    }

    #[test]
    fn empty_category_renders_notice_without_table() {
        let config = LayoutConfig::default();
        let document = compose(&report_with(vec![empty_category("Humanities")]), &config);

        assert!(document.contains_text(NO_COURSES_NOTICE));
        assert!(document.contains_text("Humanities"));
        assert!(document.contains_text("Required courses: 2"));
        assert!(!document.contains_text("Course Code"));
    }

    #[test]
    fn empty_category_advances_cursor_with_compensation() {
        let config = LayoutConfig::default();
        let mut composer = Composer::new(&config, "t");
        composer.draw_header();
        composer.draw_category(&empty_category("Electives"));
        assert_eq!(composer.cursor(), 100.0 + 30.0 - 10.0 + 60.0);
    }

    #[test]
    fn category_breaks_page_when_threshold_not_met() {
        let config = LayoutConfig::default();
        let mut composer = Composer::new(&config, "t");
        composer.cursor = config.content_bottom() - 59.0;
        composer.draw_category(&empty_category("Late"));

        let document = composer.finish();
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.find_text("Late"), Some(1));
        assert_eq!(document.outline()[0].page, 1);
    }

    #[test]
    fn category_exactly_at_threshold_stays_on_page() {
        let config = LayoutConfig::default();
        let mut composer = Composer::new(&config, "t");
        composer.cursor = config.content_bottom() - 60.0;
        composer.draw_category(&empty_category("Fits"));
        assert_eq!(composer.finish().page_count(), 1);
    }

    #[test]
    fn table_is_followed_by_gap() {
        let config = LayoutConfig::default();
        let category = Category {
            category_name: "Core".into(),
            courses: vec![Course {
                year: Some("2021-2022".into()),
                semester: Some("Odd Sem".into()),
                course_code: "CS101".into(),
                course_name: "Programming".into(),
                credits: Some(4.0),
                grade: None,
            }],
            ..Category::default()
        };
        let mut composer = Composer::new(&config, "t");
        composer.draw_header();
        composer.draw_category(&category);

        let mut probe = Document::new("probe", config.page_width, config.page_height);
        let end = CourseTable::for_category(&category).draw(&mut probe, &config, 130.0);
        assert!((composer.cursor() - (end + config.table_gap)).abs() < 1e-9);
        assert!(composer.document().contains_text("Not Released"));
    }

    #[test]
    fn footer_only_on_last_page() {
        let config = LayoutConfig::default();
        let categories = (0..30)
            .map(|index| empty_category(&format!("Category {}", index)))
            .collect();
        let document = compose(&report_with(categories), &config);

        assert!(document.page_count() > 1);
        let footer_pages: Vec<usize> = document
            .pages()
            .iter()
            .enumerate()
            .filter(|(_, page)| {
                page.operations().iter().any(|op| {
                    matches!(op, DrawOp::FillRect { y, .. } if *y == config.page_height - config.footer_height)
                })
            })
            .map(|(index, _)| index)
            .collect();
        assert_eq!(footer_pages, vec![document.page_count() - 1]);
    }

    #[test]
    fn outline_lists_categories_in_input_order() {
        let config = LayoutConfig::default();
        let document = compose(
            &report_with(vec![empty_category("Zeta"), empty_category("Alpha")]),
            &config,
        );
        let titles: Vec<&str> = document.outline().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Zeta", "Alpha"]);
    }

    #[test]
    fn absent_report_composes_nothing() {
        assert!(compose_optional(None, &LayoutConfig::default()).is_none());
    }
}
