//! The three engine-backed drivers: local files, radio streams, and live
//! channels. Each owns its own engine instance; the live driver resolves
//! the channel handle to a stream URL through streamlink first.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use pod_proto::now_playing::PlaybackMode;
use tracing::{debug, warn};

use super::engine::AudioEngine;
use super::{BackendError, BackendHandle};

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LocalFileBackend {
    engine: AudioEngine,
    active: AtomicBool,
}

impl LocalFileBackend {
    pub fn new(engine: AudioEngine) -> Self {
        Self {
            engine,
            active: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BackendHandle for LocalFileBackend {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::LocalFile
    }

    async fn start(&self, target: &str) -> Result<(), BackendError> {
        if !Path::new(target).is_file() {
            return Err(BackendError::Unavailable(format!("no such file: {}", target)));
        }
        self.engine.load(target).await?;
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        if let Err(e) = self.engine.stop().await {
            warn!("local backend: stop failed: {}", e);
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

pub struct RadioStreamBackend {
    engine: AudioEngine,
    active: AtomicBool,
}

impl RadioStreamBackend {
    pub fn new(engine: AudioEngine) -> Self {
        Self {
            engine,
            active: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BackendHandle for RadioStreamBackend {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::InternetRadio
    }

    async fn start(&self, target: &str) -> Result<(), BackendError> {
        if !target.starts_with("http://") && !target.starts_with("https://") {
            return Err(BackendError::Unavailable(format!(
                "not a stream url: {}",
                target
            )));
        }
        self.engine.load(target).await?;
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        if let Err(e) = self.engine.stop().await {
            warn!("radio backend: stop failed: {}", e);
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

pub struct LiveStreamBackend {
    engine: AudioEngine,
    streamlink: PathBuf,
    url_base: String,
    active: AtomicBool,
}

impl LiveStreamBackend {
    pub fn new(engine: AudioEngine, streamlink: PathBuf, url_base: String) -> Self {
        Self {
            engine,
            streamlink,
            url_base,
            active: AtomicBool::new(false),
        }
    }

    /// Resolve a channel handle to a playable stream URL. Ok(None) means
    /// the channel is offline; audio-only renditions are preferred.
    async fn resolve_stream_url(&self, handle: &str) -> Result<Option<String>, BackendError> {
        let channel_url = format!("{}/{}", self.url_base.trim_end_matches('/'), handle);
        let output = tokio::time::timeout(
            RESOLVE_TIMEOUT,
            tokio::process::Command::new(&self.streamlink)
                .arg("--stream-url")
                .arg(&channel_url)
                .arg("audio_only,worst")
                .output(),
        )
        .await
        .map_err(|_| BackendError::Fault(anyhow!("stream resolution timed out")))?
        .map_err(|e| BackendError::Fault(anyhow!("running streamlink: {}", e)))?;

        if !output.status.success() {
            debug!("live backend: resolver exited with {}", output.status);
            return Ok(None);
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(url.starts_with("http").then_some(url))
    }
}

#[async_trait]
impl BackendHandle for LiveStreamBackend {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::LiveStream
    }

    // Resolution takes seconds; the caller renders a "connecting" hint
    // before invoking the switch.
    async fn start(&self, target: &str) -> Result<(), BackendError> {
        let stream_url = match self.resolve_stream_url(target).await? {
            Some(url) => url,
            None => {
                return Err(BackendError::Unavailable(format!(
                    "channel offline: {}",
                    target
                )))
            }
        };
        self.engine.load(&stream_url).await?;
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        if let Err(e) = self.engine.stop().await {
            warn!("live backend: stop failed: {}", e);
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
