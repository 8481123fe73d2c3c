mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use exit_report::cache::{cache_key, FileCache, MemoryCache, ReportCache};
use exit_report::export::{DownloadButton, MemorySink, LABEL_LOADING, LABEL_READY};
use exit_report::model::Report;
use exit_report::provider::{FetchError, LoadingFlag, ProviderError, ReportProvider, ReportSource};

use common::{sample_report, STUDENT_ID};

/// Button state seen from inside a fetch.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ButtonView {
    label: &'static str,
    enabled: bool,
}

/// Scripted source that counts calls and can observe the loading flag.
#[derive(Default)]
struct StubSource {
    response: Option<Report>,
    fail: bool,
    calls: Arc<AtomicUsize>,
    observed_loading: Arc<AtomicBool>,
    observed_button: Arc<Mutex<Option<ButtonView>>>,
    flag: Option<LoadingFlag>,
}

impl StubSource {
    fn returning(report: Option<Report>) -> Self {
        Self {
            response: report,
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl ReportSource for StubSource {
    async fn fetch(&self, _student_id: &str) -> Result<Option<Report>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(flag) = &self.flag {
            self.observed_loading.store(flag.is_set(), Ordering::SeqCst);
            let button = DownloadButton::default();
            *self.observed_button.lock().unwrap() = Some(ButtonView {
                label: button.label_with(flag),
                enabled: button.is_enabled_with(flag, true),
            });
        }
        if self.fail {
            return Err(FetchError::Source("connection refused".to_string()));
        }
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn second_resolve_is_served_from_cache() {
    let cache = Arc::new(MemoryCache::new());

    let first = StubSource::returning(Some(sample_report()));
    let first_calls = Arc::clone(&first.calls);
    let mut provider = ReportProvider::new(first, Arc::clone(&cache));
    let fetched = provider
        .resolve(Some(STUDENT_ID))
        .await
        .unwrap()
        .cloned()
        .expect("report after fetch");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert!(cache.get(&cache_key(STUDENT_ID)).unwrap().is_some());

    let second = StubSource::returning(None);
    let second_calls = Arc::clone(&second.calls);
    let mut provider = ReportProvider::new(second, Arc::clone(&cache));
    let cached = provider
        .resolve(Some(STUDENT_ID))
        .await
        .unwrap()
        .cloned()
        .expect("report from cache");

    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    assert_eq!(cached, fetched);
}

#[tokio::test]
async fn absent_identifier_does_nothing() {
    let source = StubSource::returning(Some(sample_report()));
    let calls = Arc::clone(&source.calls);
    let mut provider = ReportProvider::new(source, MemoryCache::new());

    assert!(provider.resolve(None).await.unwrap().is_none());
    assert!(provider.resolve(Some("")).await.unwrap().is_none());

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!provider.is_loading());
    assert!(provider.cache().is_empty());

    let button = DownloadButton::default();
    assert!(!button.is_enabled(&provider));
    assert_eq!(button.label(&provider), LABEL_READY);
    assert_eq!(button.press(&provider, &MemorySink::new()).unwrap(), None);
}

#[tokio::test]
async fn fetch_failure_clears_loading_and_skips_cache() {
    let mut provider = ReportProvider::new(StubSource::failing(), MemoryCache::new());

    let err = provider.resolve(Some(STUDENT_ID)).await.unwrap_err();
    assert!(matches!(err, ProviderError::Fetch { .. }));
    assert!(!provider.is_loading());
    assert!(provider.report().is_none());
    assert!(provider.cache().is_empty());
}

#[tokio::test]
async fn corrupt_cache_entry_is_reported() {
    let cache = MemoryCache::new();
    cache.set(&cache_key(STUDENT_ID), "{not json").unwrap();

    let source = StubSource::returning(Some(sample_report()));
    let calls = Arc::clone(&source.calls);
    let mut provider = ReportProvider::new(source, cache);

    let err = provider.resolve(Some(STUDENT_ID)).await.unwrap_err();
    match err {
        ProviderError::CorruptCache { key, .. } => assert_eq!(key, "reportData_2100030123"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!provider.is_loading());
}

#[tokio::test]
async fn empty_response_is_not_cached() {
    let mut provider = ReportProvider::new(StubSource::returning(None), MemoryCache::new());

    assert!(provider.resolve(Some(STUDENT_ID)).await.unwrap().is_none());
    assert!(provider.cache().is_empty());
    assert!(!DownloadButton::default().is_enabled(&provider));
}

#[tokio::test]
async fn loading_flag_is_set_while_fetching() {
    let flag = LoadingFlag::new();
    let mut source = StubSource::returning(Some(sample_report()));
    source.flag = Some(flag.clone());
    let observed = Arc::clone(&source.observed_loading);
    let during_fetch = Arc::clone(&source.observed_button);

    let mut provider =
        ReportProvider::new(source, MemoryCache::new()).with_loading_flag(flag.clone());
    provider.resolve(Some(STUDENT_ID)).await.unwrap();

    assert!(observed.load(Ordering::SeqCst), "flag should be set during fetch");
    assert_eq!(
        *during_fetch.lock().unwrap(),
        Some(ButtonView {
            label: LABEL_LOADING,
            enabled: false,
        })
    );
    assert!(!flag.is_set());

    let button = DownloadButton::default();
    assert!(button.is_enabled(&provider));
    assert_eq!(button.label(&provider), LABEL_READY);
}

#[tokio::test]
async fn switching_students_drops_previous_report() {
    let cache = MemoryCache::new();
    cache
        .set(&cache_key(STUDENT_ID), &sample_report().to_json().unwrap())
        .unwrap();

    let mut provider = ReportProvider::new(StubSource::returning(None), cache);
    assert!(provider.resolve(Some(STUDENT_ID)).await.unwrap().is_some());

    assert!(provider.resolve(Some("2100099999")).await.unwrap().is_none());
    assert_eq!(provider.student_id(), Some("2100099999"));
    assert!(provider.report().is_none());
}

#[tokio::test]
async fn file_cache_survives_a_new_provider() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut provider = ReportProvider::new(
        StubSource::returning(Some(sample_report())),
        FileCache::new(dir.path()),
    );
    provider.resolve(Some(STUDENT_ID)).await.unwrap();

    let source = StubSource::returning(None);
    let calls = Arc::clone(&source.calls);
    let mut provider = ReportProvider::new(source, FileCache::new(dir.path()));
    let report = provider.resolve(Some(STUDENT_ID)).await.unwrap().cloned();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report, Some(sample_report()));
}

#[tokio::test]
async fn pressing_download_saves_the_report() {
    let mut provider = ReportProvider::new(
        StubSource::returning(Some(sample_report())),
        MemoryCache::new(),
    );
    provider.resolve(Some(STUDENT_ID)).await.unwrap();

    let sink = MemorySink::new();
    let outcome = DownloadButton::default()
        .press(&provider, &sink)
        .unwrap()
        .expect("export outcome");

    assert_eq!(outcome.file_name, "2100030123_Exit_Requirement_Report.pdf");
    assert!(sink.get(&outcome.file_name).is_some());
}
