//! Non-blocking cover-art acquisition.
//!
//! Requests carry a monotonic sequence number. A fetched result is
//! published only while its sequence is still the latest issued, so a
//! late fetch can never overwrite newer art — switching modes faster
//! than a download resolves just orphans the old request.

pub mod retro;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pod_proto::now_playing::CoverThumbnail;
use pod_proto::theme::ThemeColor;
use tokio::sync::mpsc;
use tracing::debug;

/// Raw bytes transform synchronously; URLs fetch on a background task.
#[derive(Debug, Clone)]
pub enum CoverSource {
    Bytes(Vec<u8>),
    Url(String),
}

/// Single blocking art download, wrapped in a worker by the loader.
#[async_trait]
pub trait CoverFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

pub struct HttpCoverFetch {
    client: reqwest::Client,
}

impl HttpCoverFetch {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CoverFetch for HttpCoverFetch {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

/// A finished cover request. `thumbnail` is None when the fetch failed or
/// the bytes would not decode — rendered as "no cover", never an error.
#[derive(Debug)]
pub struct CoverUpdate {
    pub sequence: u64,
    pub thumbnail: Option<CoverThumbnail>,
}

pub struct CoverLoader {
    fetcher: Arc<dyn CoverFetch>,
    updates: mpsc::Sender<CoverUpdate>,
    latest: Arc<AtomicU64>,
}

impl CoverLoader {
    pub fn new(fetcher: Arc<dyn CoverFetch>) -> (Self, mpsc::Receiver<CoverUpdate>) {
        let (updates, rx) = mpsc::channel(8);
        (
            Self {
                fetcher,
                updates,
                latest: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Issue the sequence number for the next request. Anything still in
    /// flight becomes stale immediately.
    pub fn next_sequence(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Orphan any in-flight request without issuing a new one — called on
    /// mode transitions that show no cover art.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Fire-and-forget. `sequence` must come from `next_sequence`.
    pub fn request(&self, source: CoverSource, theme: ThemeColor, sequence: u64) {
        match source {
            CoverSource::Bytes(bytes) => {
                let thumbnail = retro::render_from_bytes(&bytes, theme);
                self.publish(CoverUpdate { sequence, thumbnail });
            }
            CoverSource::Url(url) => {
                let fetcher = Arc::clone(&self.fetcher);
                let latest = Arc::clone(&self.latest);
                let updates = self.updates.clone();
                tokio::spawn(async move {
                    let thumbnail = match fetcher.fetch(&url).await {
                        Ok(bytes) => retro::render_from_bytes(&bytes, theme),
                        Err(e) => {
                            debug!("cover fetch failed for {}: {}", url, e);
                            None
                        }
                    };
                    if latest.load(Ordering::SeqCst) != sequence {
                        debug!("discarding stale cover result (seq {})", sequence);
                        return;
                    }
                    if updates.try_send(CoverUpdate { sequence, thumbnail }).is_err() {
                        debug!("cover update channel full or closed");
                    }
                });
            }
        }
    }

    fn publish(&self, update: CoverUpdate) {
        if self.updates.try_send(update).is_err() {
            debug!("cover update channel full or closed");
        }
    }
}
