//! Layout constants and colour theme used by the report composer.
//!
//! Every value is expressed in PDF points with the origin in the top-left
//! corner of the page.  [`LayoutConfig::default`] reproduces the branded A4
//! report; partial overrides can be loaded from JSON because every field falls
//! back to its default.

use std::fs;
use std::io;
use std::path::Path;

use printpdf::{Mm, Pt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const A4_WIDTH_MM: f64 = 210.0;
const A4_HEIGHT_MM: f64 = 297.0;

/// Number of columns in the course table.
pub const COLUMN_COUNT: usize = 6;

/// An RGB colour with 8-bit channels, serialized as `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Returns the channels scaled into the `0.0..=1.0` range used by PDF operators.
    pub fn unit_channels(self) -> [f64; 3] {
        [self.0, self.1, self.2].map(|channel| f64::from(channel) / 255.0)
    }
}

/// Branding colours and titles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// First line of the header band.
    pub header_title: String,
    /// Second line of the header band.
    pub header_subtitle: String,
    /// Fill of the header and footer bands.
    pub brand: Rgb,
    /// Text drawn on top of the brand colour.
    pub on_brand: Rgb,
    pub text: Rgb,
    /// Colour of the `ID: ...` line.
    pub muted_text: Rgb,
    pub category_band: Rgb,
    pub table_head: Rgb,
    pub table_head_text: Rgb,
    /// Fill of every other table body row.
    pub table_stripe: Rgb,
    /// Colour of the "No courses registered" notice.
    pub notice: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_title: "DEPARTMENT OF COMPUTER SCIENCE AND ENGINEERING".to_string(),
            header_subtitle: "KONERU LAKSHMAIAH EDUCATION FOUNDATION".to_string(),
            brand: Rgb(128, 0, 0),
            on_brand: Rgb::WHITE,
            text: Rgb::BLACK,
            muted_text: Rgb(100, 100, 100),
            category_band: Rgb(230, 230, 230),
            table_head: Rgb(160, 110, 110),
            table_head_text: Rgb::WHITE,
            table_stripe: Rgb(245, 245, 245),
            notice: Rgb(115, 65, 65),
        }
    }
}

/// Named layout constants consumed by [`crate::composer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width: f64,
    pub page_height: f64,
    /// Top margin after a page break, bottom limit for content, and the
    /// horizontal inset of the summary lines.
    pub page_margin: f64,

    pub header_height: f64,
    pub header_title_baseline: f64,
    pub header_subtitle_baseline: f64,
    pub header_title_size: f64,
    pub header_subtitle_size: f64,
    /// Cursor position once the header band is drawn.
    pub content_top: f64,

    pub student_name_size: f64,
    pub student_id_size: f64,
    pub student_id_offset: f64,
    pub student_block_advance: f64,

    pub summary_size: f64,
    pub summary_advance: f64,

    /// Space a category header needs before a page break is forced.
    pub category_space_threshold: f64,
    pub category_band_inset: f64,
    /// Distance from the band's top edge to the category name baseline.
    pub category_band_rise: f64,
    pub category_band_height: f64,
    pub category_name_size: f64,
    pub category_detail_size: f64,
    pub category_detail_offset: f64,
    /// Horizontal position of the "Completed courses" line.
    pub category_completed_x: f64,
    pub category_advance: f64,

    pub table_margin: f64,
    pub table_font_size: f64,
    pub table_cell_padding: f64,
    /// Line height as a multiple of the table font size.
    pub table_line_height: f64,
    /// Where a table resumes on each page it continues onto.
    pub table_continuation_top: f64,
    /// Gap between the end of a table and the next category.
    pub table_gap: f64,
    /// Relative column widths for the course table.
    pub table_column_weights: [f64; COLUMN_COUNT],

    /// Upward correction applied before the notice, compensating for the band.
    pub empty_notice_lift: f64,
    pub empty_notice_offset: f64,
    pub empty_notice_size: f64,
    pub empty_notice_advance: f64,

    pub footer_height: f64,
    /// Distance from the page bottom to the footer text baseline.
    pub footer_baseline: f64,
    pub footer_text_size: f64,

    pub theme: Theme,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let (page_width, page_height) = a4_points();
        Self {
            page_width,
            page_height,
            page_margin: 40.0,

            header_height: 60.0,
            header_title_baseline: 30.0,
            header_subtitle_baseline: 50.0,
            header_title_size: 18.0,
            header_subtitle_size: 16.0,
            content_top: 100.0,

            student_name_size: 18.0,
            student_id_size: 16.0,
            student_id_offset: 20.0,
            student_block_advance: 60.0,

            summary_size: 12.0,
            summary_advance: 40.0,

            category_space_threshold: 60.0,
            category_band_inset: 30.0,
            category_band_rise: 20.0,
            category_band_height: 30.0,
            category_name_size: 14.0,
            category_detail_size: 10.0,
            category_detail_offset: 20.0,
            category_completed_x: 450.0,
            category_advance: 30.0,

            table_margin: 30.0,
            table_font_size: 10.0,
            table_cell_padding: 2.0,
            table_line_height: 1.15,
            table_continuation_top: 80.0,
            table_gap: 50.0,
            table_column_weights: [1.2, 1.0, 1.1, 2.6, 0.8, 1.1],

            empty_notice_lift: 10.0,
            empty_notice_offset: 20.0,
            empty_notice_size: 10.0,
            empty_notice_advance: 60.0,

            footer_height: 30.0,
            footer_baseline: 15.0,
            footer_text_size: 10.0,

            theme: Theme::default(),
        }
    }
}

/// Errors raised while loading or validating a [`LayoutConfig`].
#[derive(Debug, Error)]
pub enum LayoutConfigError {
    #[error("failed to read layout file {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse layout file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid layout: {0}")]
    Invalid(String),
}

impl LayoutConfig {
    /// Loads a layout override file; omitted fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LayoutConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| LayoutConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|source| LayoutConfigError::Parse {
                path: display,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the page can hold a table and the bands.
    pub fn validate(&self) -> Result<(), LayoutConfigError> {
        if !(self.page_width > 0.0 && self.page_height > 0.0) {
            return Err(LayoutConfigError::Invalid(
                "page dimensions must be positive".to_string(),
            ));
        }
        if self.table_width() <= 0.0 {
            return Err(LayoutConfigError::Invalid(format!(
                "table margin {} leaves no room on a page {} wide",
                self.table_margin, self.page_width
            )));
        }
        if self.table_column_weights.iter().any(|weight| *weight < 0.0)
            || self.table_column_weights.iter().sum::<f64>() <= 0.0
        {
            return Err(LayoutConfigError::Invalid(
                "column weights must be non-negative and not all zero".to_string(),
            ));
        }
        if self.table_font_size <= 0.0 || self.table_line_height <= 0.0 {
            return Err(LayoutConfigError::Invalid(
                "table font size and line height must be positive".to_string(),
            ));
        }
        if self.page_margin * 2.0 >= self.page_height {
            return Err(LayoutConfigError::Invalid(format!(
                "page margin {} leaves no writable height",
                self.page_margin
            )));
        }
        Ok(())
    }

    /// Lowest y position content may reach before a page break.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.page_margin
    }

    pub fn table_width(&self) -> f64 {
        self.page_width - 2.0 * self.table_margin
    }

    /// Absolute column widths derived from the weights.
    pub fn column_widths(&self) -> [f64; COLUMN_COUNT] {
        let total: f64 = self.table_column_weights.iter().sum();
        let width = self.table_width();
        self.table_column_weights
            .map(|weight| width * weight / total)
    }
}

fn a4_points() -> (f64, f64) {
    let width: Pt = Mm(A4_WIDTH_MM).into();
    let height: Pt = Mm(A4_HEIGHT_MM).into();
    (width.0, height.0)
}
