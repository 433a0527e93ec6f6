//! The remote-transport proxy seam. The catalog client itself is an
//! external collaborator; the core consumes it through this trait and
//! treats every failure as "unknown, retain last state".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pod_proto::now_playing::PlaybackMode;
use tracing::debug;

use crate::backend::{BackendError, BackendHandle};

/// What the remote transport reports as currently playing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotePlayback {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track_index: u32,
    pub track_count: u32,
    pub duration_ms: u64,
    pub progress_ms: u64,
    pub is_playing: bool,
    pub cover_url: Option<String>,
}

#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// None when the remote device reports nothing loaded.
    async fn current_playback(&self) -> anyhow::Result<Option<RemotePlayback>>;

    async fn start_playback(&self, uri: &str) -> anyhow::Result<()>;

    /// Best-effort; some account tiers cannot stop remote playback.
    async fn stop_playback(&self) -> anyhow::Result<()>;
}

/// Arbiter-facing adapter over the remote transport.
pub struct RemoteCatalogBackend {
    transport: Arc<dyn RemoteTransport>,
    active: AtomicBool,
}

impl RemoteCatalogBackend {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        Self {
            transport,
            active: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BackendHandle for RemoteCatalogBackend {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::RemoteCatalog
    }

    async fn start(&self, target: &str) -> Result<(), BackendError> {
        self.transport
            .start_playback(target)
            .await
            .map_err(BackendError::Fault)?;
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        if let Err(e) = self.transport.stop_playback().await {
            debug!("remote backend: best-effort stop failed: {}", e);
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
