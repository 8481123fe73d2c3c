//! Resolves report data for a student from the cache or the report endpoint.
//!
//! [`ReportProvider::resolve`] reads through the [`ReportCache`] first and
//! only calls the [`ReportSource`] on a miss.  A successful fetch is kept in
//! memory and written to the cache unconditionally.  Failures are returned to
//! the caller as they are; there is no retry, and the loading flag is cleared
//! whatever the outcome.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::cache::{cache_key, CacheError, ReportCache};
use crate::model::Report;

/// Report generation endpoint queried when the cache has no entry.
pub const DEFAULT_ENDPOINT: &str =
    "https://keen-radiance-production.up.railway.app/api/v1/frontend/generatereport";

/// Errors raised while fetching a report from its source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to report endpoint failed")]
    Http(#[from] reqwest::Error),
    #[error("report endpoint {endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("report endpoint returned a malformed report")]
    Decode(#[from] serde_json::Error),
    #[error("report source failed: {0}")]
    Source(String),
}

/// Errors raised while resolving a report.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("cached report under {key} is not valid JSON")]
    CorruptCache {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize report for the cache")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to fetch report for {student_id}")]
    Fetch {
        student_id: String,
        #[source]
        source: FetchError,
    },
}

/// Remote origin of report data.
pub trait ReportSource {
    /// Fetches the report for `student_id`; `Ok(None)` means the source had no data.
    fn fetch(
        &self,
        student_id: &str,
    ) -> impl Future<Output = Result<Option<Report>, FetchError>> + Send;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchRequest<'a> {
    university_id: &'a str,
}

/// Fetches reports by POSTing `{"universityId": ...}` to the report endpoint.
#[derive(Clone, Debug)]
pub struct HttpReportSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReportSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpReportSource {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ReportSource for HttpReportSource {
    async fn fetch(&self, student_id: &str) -> Result<Option<Report>, FetchError> {
        info!("Requesting report for {} from {}", student_id, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&FetchRequest {
                university_id: student_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        decode_response(&body)
    }
}

/// Decodes a response body; an empty body or JSON `null` carries no report.
pub fn decode_response(body: &[u8]) -> Result<Option<Report>, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Shareable flag that is set while a report is being resolved.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn begin(&self) -> LoadingGuard {
        self.0.store(true, Ordering::SeqCst);
        LoadingGuard(self.clone())
    }
}

/// Clears the loading flag when dropped.
struct LoadingGuard(LoadingFlag);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::SeqCst);
    }
}

/// Holds the report for the current student and resolves it on demand.
pub struct ReportProvider<S, C> {
    source: S,
    cache: C,
    loading: LoadingFlag,
    student_id: Option<String>,
    report: Option<Report>,
}

impl<S, C> ReportProvider<S, C>
where
    S: ReportSource,
    C: ReportCache,
{
    pub fn new(source: S, cache: C) -> Self {
        Self {
            source,
            cache,
            loading: LoadingFlag::new(),
            student_id: None,
            report: None,
        }
    }

    /// Uses an existing flag so other components can observe loading state.
    pub fn with_loading_flag(mut self, flag: LoadingFlag) -> Self {
        self.loading = flag;
        self
    }

    /// Resolves the report for `student_id`.
    ///
    /// An absent or empty identifier is ignored: nothing is fetched and the
    /// held report is returned unchanged.  Switching to a different
    /// identifier drops the previously held report before resolving.
    pub async fn resolve(
        &mut self,
        student_id: Option<&str>,
    ) -> Result<Option<&Report>, ProviderError> {
        let Some(student_id) = student_id.filter(|id| !id.is_empty()) else {
            debug!("No student identifier; skipping report resolution");
            return Ok(self.report.as_ref());
        };

        if self.student_id.as_deref() != Some(student_id) {
            self.report = None;
            self.student_id = Some(student_id.to_string());
        }

        let _loading = self.loading.begin();
        let key = cache_key(student_id);

        if let Some(stored) = self.cache.get(&key)? {
            debug!("Using cached report under {}", key);
            let report = Report::from_json(&stored)
                .map_err(|source| ProviderError::CorruptCache { key, source })?;
            self.report = Some(report);
            return Ok(self.report.as_ref());
        }

        let fetched = self
            .source
            .fetch(student_id)
            .await
            .map_err(|source| ProviderError::Fetch {
                student_id: student_id.to_string(),
                source,
            })?;

        match fetched {
            Some(report) => {
                let json = report.to_json().map_err(ProviderError::Serialize)?;
                self.report = Some(report);
                self.cache.set(&key, &json)?;
                info!("Cached report for {} under {}", student_id, key);
            }
            None => warn!("Report endpoint returned no data for {}", student_id),
        }

        Ok(self.report.as_ref())
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_university_id() {
        let body = serde_json::to_string(&FetchRequest {
            university_id: "2100030123",
        })
        .unwrap();
        assert_eq!(body, r#"{"universityId":"2100030123"}"#);
    }

    #[test]
    fn null_and_empty_bodies_carry_no_report() {
        assert!(decode_response(b"null").unwrap().is_none());
        assert!(decode_response(b"  \n").unwrap().is_none());
    }

    #[test]
    fn decodes_report_body() {
        let report = decode_response(br#"{"studentId":"7","categories":[]}"#)
            .unwrap()
            .expect("report");
        assert_eq!(report.student_id, "7");
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(
            decode_response(b"<html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn guard_clears_flag_on_drop() {
        let flag = LoadingFlag::new();
        {
            let _guard = flag.begin();
            assert!(flag.is_set());
        }
        assert!(!flag.is_set());
    }
}
