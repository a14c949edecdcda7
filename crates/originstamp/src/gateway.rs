//! Read side: stored content by digest, and the paged remote history.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use originstamp_client::{TableRequest, TimestampApi};
use originstamp_core::{ContentDigest, RemoteSubmissionEntry, Settings};
use originstamp_store::Ledger;

use crate::error::{GatewayError, Result};

/// Rows per history page.
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Public verification page for a digest.
pub const DEFAULT_VERIFY_BASE_URL: &str = "https://originstamp.org/s/";

/// Position of one page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// Current page, 1-based and clamped into range.
    pub page: u64,
    pub page_size: u64,
    pub num_pages: u64,
    pub total: u64,
    pub offset: u64,
    /// First displayed row, 1-based; 0 when there are no rows.
    pub start: u64,
    /// Last displayed row.
    pub end: u64,
}

impl PageWindow {
    pub fn compute(total: u64, page_size: u64, requested: u64) -> Self {
        let page_size = page_size.max(1);
        let num_pages = total.div_ceil(page_size);
        let page = requested.clamp(1, num_pages.max(1));
        let offset = (page - 1) * page_size;
        let start = if total == 0 { 0 } else { offset + 1 };
        let end = offset.saturating_add(page_size).min(total);

        Self {
            page,
            page_size,
            num_pages,
            total,
            offset,
            start,
            end,
        }
    }

    pub fn prev(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next(&self) -> Option<u64> {
        (self.page < self.num_pages).then(|| self.page + 1)
    }
}

/// Anchoring state of a remote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Confirmed,
    Pending,
}

/// One history row, decorated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub hash_string: String,
    pub created_at: DateTime<Utc>,
    pub status: SubmissionState,
    pub verify_url: String,
    pub download_path: String,
    /// Whether the text behind this digest is in the local ledger.
    pub stored_locally: bool,
}

impl HistoryRow {
    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn created_display(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// One page of remote history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePage {
    pub window: PageWindow,
    pub rows: Vec<HistoryRow>,
}

impl RemotePage {
    pub fn empty(page_size: u64) -> Self {
        Self {
            window: PageWindow::compute(0, page_size, 1),
            rows: Vec::new(),
        }
    }
}

/// Display options for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub page_size: u64,
    pub verify_base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            verify_base_url: DEFAULT_VERIFY_BASE_URL.to_string(),
        }
    }
}

/// Serves stored content and remote history.
pub struct RetrievalGateway<L, A> {
    ledger: Arc<L>,
    api: Arc<A>,
    settings: Settings,
    config: GatewayConfig,
}

impl<L: Ledger, A: TimestampApi> RetrievalGateway<L, A> {
    pub fn new(ledger: Arc<L>, api: Arc<A>, settings: Settings, config: GatewayConfig) -> Self {
        Self {
            ledger,
            api,
            settings,
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The stored `title || body` for `digest`.
    pub async fn fetch_local(&self, digest: &ContentDigest) -> Result<Bytes> {
        let record = self
            .ledger
            .get(digest)
            .await?
            .ok_or(GatewayError::NotFound(*digest))?;
        Ok(Bytes::from(record.payload()))
    }

    /// One page of the remote submission history.
    ///
    /// The requested page is fetched directly. A second request is only made
    /// when the returned total shows that page was out of range.
    pub async fn fetch_remote_page(&self, requested: u64) -> Result<RemotePage> {
        let page_size = self.config.page_size.max(1);
        let Some(api_key) = self.settings.api_key() else {
            debug!("No API key configured, history is empty");
            return Ok(RemotePage::empty(page_size));
        };

        let requested = requested.max(1);
        let mut response = self
            .api
            .table(api_key, &self.table_request(api_key, requested, page_size))
            .await?;
        let mut window = PageWindow::compute(response.total_records, page_size, requested);

        if window.page != requested {
            debug!(
                requested,
                clamped = window.page,
                "Requested page out of range, refetching"
            );
            response = self
                .api
                .table(api_key, &self.table_request(api_key, window.page, page_size))
                .await?;
            window = PageWindow::compute(response.total_records, page_size, window.page);
        }

        let mut rows = Vec::with_capacity(response.hashes.len());
        for entry in &response.hashes {
            rows.push(self.decorate(entry).await?);
        }
        Ok(RemotePage { window, rows })
    }

    fn table_request(&self, api_key: &str, page: u64, page_size: u64) -> TableRequest {
        TableRequest {
            api_key: api_key.to_string(),
            // A page past the end saturates; the returned total then drives the refetch.
            offset: (page - 1).saturating_mul(page_size),
            records: page_size,
        }
    }

    async fn decorate(&self, entry: &RemoteSubmissionEntry) -> Result<HistoryRow> {
        let stored_locally = match entry.hash_string.parse::<ContentDigest>() {
            Ok(digest) => self.ledger.contains(&digest).await?,
            Err(_) => false,
        };
        let status = if entry.submit_status.is_confirmed() {
            SubmissionState::Confirmed
        } else {
            SubmissionState::Pending
        };

        Ok(HistoryRow {
            hash_string: entry.hash_string.clone(),
            created_at: DateTime::from_timestamp_millis(entry.date_created)
                .unwrap_or_default(),
            status,
            verify_url: format!("{}{}", self.config.verify_base_url, entry.hash_string),
            download_path: format!("/download/{}", entry.hash_string),
            stored_locally,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use originstamp_client::MemoryTimestampApi;
    use originstamp_core::{fingerprint, FingerprintRecord, SubmitStatus};
    use originstamp_store::MemoryLedger;

    fn entry(i: u64, multi_seed: i32) -> RemoteSubmissionEntry {
        RemoteSubmissionEntry {
            hash_string: format!("{:064x}", i),
            date_created: 1_500_000_000_000 + i as i64,
            submit_status: SubmitStatus { multi_seed },
            email: None,
        }
    }

    fn gateway(
        ledger: Arc<MemoryLedger>,
        api: Arc<MemoryTimestampApi>,
        settings: Settings,
    ) -> RetrievalGateway<MemoryLedger, MemoryTimestampApi> {
        RetrievalGateway::new(ledger, api, settings, GatewayConfig::default())
    }

    fn keyed() -> Settings {
        Settings::new(Some("key".into()), None)
    }

    #[test]
    fn test_window_clamps_and_ranges() {
        let w = PageWindow::compute(57, 25, 5);
        assert_eq!(w.num_pages, 3);
        assert_eq!(w.page, 3);
        assert_eq!(w.offset, 50);
        assert_eq!((w.start, w.end), (51, 57));
        assert_eq!(w.prev(), Some(2));
        assert_eq!(w.next(), None);

        let first = PageWindow::compute(57, 25, 0);
        assert_eq!(first.page, 1);
        assert_eq!((first.start, first.end), (1, 25));
        assert_eq!(first.prev(), None);
        assert_eq!(first.next(), Some(2));
    }

    #[test]
    fn test_window_empty_set() {
        let w = PageWindow::compute(0, 25, 4);
        assert_eq!(w.num_pages, 0);
        assert_eq!(w.page, 1);
        assert_eq!((w.offset, w.start, w.end), (0, 0, 0));
        assert_eq!(w.next(), None);
    }

    #[test]
    fn test_window_exact_multiple() {
        let w = PageWindow::compute(50, 25, 2);
        assert_eq!(w.num_pages, 2);
        assert_eq!((w.start, w.end), (26, 50));
    }

    #[tokio::test]
    async fn test_fetch_local_roundtrip() {
        let ledger = Arc::new(MemoryLedger::new());
        let fp = fingerprint("Hello  World", "<p>Line1\n\nLine2</p>");
        ledger
            .insert(&FingerprintRecord::from_fingerprint(&fp, 0))
            .await
            .unwrap();
        let gw = gateway(ledger, Arc::new(MemoryTimestampApi::new()), keyed());

        let bytes = gw.fetch_local(&fp.digest).await.unwrap();
        assert_eq!(&bytes[..], b"Hello WorldLine1 Line2");
    }

    #[tokio::test]
    async fn test_fetch_local_unknown_digest() {
        let gw = gateway(
            Arc::new(MemoryLedger::new()),
            Arc::new(MemoryTimestampApi::new()),
            keyed(),
        );
        let digest = fingerprint("nothing", "").digest;
        assert!(matches!(
            gw.fetch_local(&digest).await,
            Err(GatewayError::NotFound(d)) if d == digest
        ));
    }

    #[tokio::test]
    async fn test_history_without_credential_makes_no_calls() {
        let api = Arc::new(MemoryTimestampApi::with_history(vec![entry(1, 3)]));
        let gw = gateway(Arc::new(MemoryLedger::new()), api.clone(), Settings::default());

        let page = gw.fetch_remote_page(1).await.unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.window.total, 0);
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_in_range_page_is_one_request() {
        let history = (0..57).map(|i| entry(i, 0)).collect();
        let api = Arc::new(MemoryTimestampApi::with_history(history));
        let gw = gateway(Arc::new(MemoryLedger::new()), api.clone(), keyed());

        let page = gw.fetch_remote_page(2).await.unwrap();
        assert_eq!(page.window.page, 2);
        assert_eq!(page.rows.len(), 25);
        assert_eq!(page.rows[0].hash_string, format!("{:064x}", 25));

        let calls = api.table_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].offset, calls[0].records), (25, 25));
        assert_eq!(calls[0].api_key, "key");
    }

    #[tokio::test]
    async fn test_out_of_range_page_clamps_and_refetches() {
        let history = (0..57).map(|i| entry(i, 0)).collect();
        let api = Arc::new(MemoryTimestampApi::with_history(history));
        let gw = gateway(Arc::new(MemoryLedger::new()), api.clone(), keyed());

        let page = gw.fetch_remote_page(5).await.unwrap();
        assert_eq!(page.window.page, 3);
        assert_eq!((page.window.start, page.window.end), (51, 57));
        assert_eq!(page.rows.len(), 7);

        let offsets: Vec<u64> = api.table_calls().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![100, 50]);
    }

    #[tokio::test]
    async fn test_huge_page_number_clamps_to_last_page() {
        let history: Vec<_> = (1..=30).map(|i| entry(i, 0)).collect();
        let api = Arc::new(MemoryTimestampApi::with_history(history));
        let gw = gateway(Arc::new(MemoryLedger::new()), api.clone(), keyed());

        let page = gw.fetch_remote_page(u64::MAX).await.unwrap();
        assert_eq!(page.window.page, 2);
        assert_eq!((page.window.start, page.window.end), (26, 30));
        assert_eq!(page.rows.len(), 5);

        let calls = api.table_calls();
        assert_eq!(calls[0].offset, u64::MAX);
        assert_eq!(calls[1].offset, 25);
    }

    #[tokio::test]
    async fn test_huge_page_number_on_empty_history() {
        let api = Arc::new(MemoryTimestampApi::new());
        let gw = gateway(Arc::new(MemoryLedger::new()), api.clone(), keyed());

        let page = gw.fetch_remote_page(u64::MAX).await.unwrap();
        assert_eq!(page.window.page, 1);
        assert!(page.rows.is_empty());
        assert_eq!(api.table_calls().last().unwrap().offset, 0);
    }

    #[test]
    fn test_window_with_extreme_values() {
        let w = PageWindow::compute(u64::MAX, 25, u64::MAX);
        assert_eq!(w.page, w.num_pages);
        assert_eq!(w.end, u64::MAX);
    }

    #[tokio::test]
    async fn test_rows_are_decorated() {
        let ledger = Arc::new(MemoryLedger::new());
        let fp = fingerprint("Title", "Body");
        ledger
            .insert(&FingerprintRecord::from_fingerprint(&fp, 0))
            .await
            .unwrap();

        let local = RemoteSubmissionEntry {
            hash_string: fp.digest.to_hex(),
            date_created: 0,
            submit_status: SubmitStatus { multi_seed: 3 },
            email: None,
        };
        let api = Arc::new(MemoryTimestampApi::with_history(vec![local, entry(9, 1)]));
        let gw = gateway(ledger, api, keyed());

        let page = gw.fetch_remote_page(1).await.unwrap();
        let confirmed = &page.rows[0];
        assert_eq!(confirmed.status, SubmissionState::Confirmed);
        assert!(confirmed.stored_locally);
        assert_eq!(confirmed.created_display(), "1970-01-01 00:00:00");
        assert_eq!(
            confirmed.verify_url,
            format!("https://originstamp.org/s/{}", fp.digest)
        );
        assert_eq!(confirmed.download_path, format!("/download/{}", fp.digest));

        let pending = &page.rows[1];
        assert_eq!(pending.status, SubmissionState::Pending);
        assert!(!pending.stored_locally);
    }
}
