//! Core entry point for the exit_report crate.
//!
//! Report data is resolved through [`provider::ReportProvider`], laid out by
//! [`composer::compose`] into a [`document::Document`], written to PDF bytes
//! by [`pdf::render`] and saved by [`export`].

pub mod cache;
pub mod composer;
pub mod document;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod provider;
pub mod table;

pub use cache::{FileCache, MemoryCache, ReportCache};
pub use composer::compose;
pub use export::{export_file_name, export_report, DirectorySink, DocumentSink, DownloadButton};
pub use layout::LayoutConfig;
pub use model::{Category, Course, Report};
pub use provider::{HttpReportSource, ReportProvider, ReportSource};
