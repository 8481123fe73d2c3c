//! Turns a resolved report into a saved PDF file.
//!
//! [`DownloadButton`] mirrors the download control: it is enabled only when
//! the provider holds a report and is not loading, and pressing it composes,
//! renders and hands the bytes to a [`DocumentSink`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::info;
use thiserror::Error;

use crate::cache::{encode_file_name, ReportCache};
use crate::composer;
use crate::layout::LayoutConfig;
use crate::model::Report;
use crate::pdf::{self, RenderError};
use crate::provider::{LoadingFlag, ReportProvider, ReportSource};

/// Suffix appended to the student identifier in exported file names.
pub const REPORT_FILE_SUFFIX: &str = "_Exit_Requirement_Report";

pub const LABEL_LOADING: &str = "Loading data...";
pub const LABEL_READY: &str = "Download";

/// Returns `<student_id>_Exit_Requirement_Report.pdf`.
pub fn export_file_name(student_id: &str) -> String {
    format!("{}{}.pdf", student_id, REPORT_FILE_SUFFIX)
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to render report")]
    Render(#[from] RenderError),
    #[error("failed to save report to {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Destination for finished documents.
pub trait DocumentSink {
    /// Stores `bytes` under `file_name` and returns where they ended up.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

impl<S: DocumentSink + ?Sized> DocumentSink for &S {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        (**self).save(file_name, bytes)
    }
}

/// Writes documents into a directory, creating it on first use.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(local_file_name(file_name));
        let save_err = |source| ExportError::Save {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(save_err)?;
        fs::write(&path, bytes).map_err(save_err)?;
        Ok(path)
    }
}

/// Escapes separators and other unsafe bytes so `file_name` names one entry
/// directly inside the sink directory.
fn local_file_name(file_name: &str) -> String {
    let escaped = encode_file_name(file_name, b"_-.");
    if escaped.bytes().all(|byte| byte == b'.') {
        encode_file_name(file_name, b"_-")
    } else {
        escaped
    }
}

/// Keeps saved documents in memory, keyed by file name.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_name)
            .cloned()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl DocumentSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(PathBuf::from(file_name))
    }
}

/// Summary of a saved report.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub file_name: String,
    pub page_count: usize,
    pub byte_len: usize,
}

/// Composes, renders and saves `report`.
pub fn export_report(
    report: &Report,
    layout: &LayoutConfig,
    sink: &impl DocumentSink,
) -> Result<ExportOutcome, ExportError> {
    let document = composer::compose(report, layout);
    let bytes = pdf::render(&document)?;
    let file_name = export_file_name(&report.student_id);
    let path = sink.save(&file_name, &bytes)?;

    info!(
        "Saved {} ({} pages, {} bytes)",
        path.display(),
        document.page_count(),
        bytes.len()
    );
    Ok(ExportOutcome {
        path,
        file_name,
        page_count: document.page_count(),
        byte_len: bytes.len(),
    })
}

/// Download control bound to a provider.
#[derive(Clone, Debug, Default)]
pub struct DownloadButton {
    layout: LayoutConfig,
}

impl DownloadButton {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn is_enabled<S, C>(&self, provider: &ReportProvider<S, C>) -> bool
    where
        S: ReportSource,
        C: ReportCache,
    {
        self.is_enabled_with(&provider.loading_flag(), provider.report().is_some())
    }

    /// Enabled state for a report holder whose fetches raise `loading`.
    pub fn is_enabled_with(&self, loading: &LoadingFlag, has_report: bool) -> bool {
        !loading.is_set() && has_report
    }

    pub fn label<S, C>(&self, provider: &ReportProvider<S, C>) -> &'static str
    where
        S: ReportSource,
        C: ReportCache,
    {
        self.label_with(&provider.loading_flag())
    }

    pub fn label_with(&self, loading: &LoadingFlag) -> &'static str {
        if loading.is_set() {
            LABEL_LOADING
        } else {
            LABEL_READY
        }
    }

    /// Exports the held report; does nothing and returns `Ok(None)` without one.
    pub fn press<S, C>(
        &self,
        provider: &ReportProvider<S, C>,
        sink: &impl DocumentSink,
    ) -> Result<Option<ExportOutcome>, ExportError>
    where
        S: ReportSource,
        C: ReportCache,
    {
        match provider.report() {
            Some(report) => export_report(report, &self.layout, sink).map(Some),
            None => Ok(None),
        }
    }
}
