//! Sole owner of the audio sink: serializes every backend start/stop and
//! guarantees at most one backend is active at a time.

use std::sync::Arc;

use pod_proto::now_playing::PlaybackMode;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::backend::{BackendError, BackendHandle};

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// The requested media or channel cannot be reached; nothing plays
    /// afterwards and the navigation layer decides what to show.
    #[error("target unavailable: {0}")]
    TargetUnavailable(String),
    /// A driver failed. Recoverable: the session survives, playback is
    /// left stopped.
    #[error("backend fault: {0}")]
    BackendFault(anyhow::Error),
}

impl From<BackendError> for PlaybackError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(what) => PlaybackError::TargetUnavailable(what),
            BackendError::Fault(e) => PlaybackError::BackendFault(e),
        }
    }
}

pub struct PlaybackArbiter {
    backends: Vec<Arc<dyn BackendHandle>>,
    gate: Mutex<()>,
    active: RwLock<PlaybackMode>,
}

impl PlaybackArbiter {
    pub fn new(backends: Vec<Arc<dyn BackendHandle>>) -> Self {
        Self {
            backends,
            gate: Mutex::new(()),
            active: RwLock::new(PlaybackMode::Idle),
        }
    }

    /// Mode published after the last switch; Idle after a failed one.
    pub async fn active_mode(&self) -> PlaybackMode {
        *self.active.read().await
    }

    /// Stop every backend whose mode differs from `mode`, then start the
    /// target backend with `target`. Policy on failure: everything is
    /// left stopped and Idle is published — a failed switch never leaves
    /// a previous backend silently playing, nor claims success.
    ///
    /// LiveStream starts block while the stream resolves; the caller
    /// renders a transient "connecting" indication before invoking this.
    pub async fn switch(&self, mode: PlaybackMode, target: &str) -> Result<(), PlaybackError> {
        let _gate = self.gate.lock().await;

        for backend in self.backends.iter().filter(|b| b.mode() != mode) {
            backend.stop().await;
        }

        if mode == PlaybackMode::Idle {
            *self.active.write().await = PlaybackMode::Idle;
            return Ok(());
        }

        let backend = self
            .backends
            .iter()
            .find(|b| b.mode() == mode)
            .ok_or_else(|| {
                PlaybackError::BackendFault(anyhow::anyhow!(
                    "no backend registered for {:?}",
                    mode
                ))
            })?;

        match backend.start(target).await {
            Ok(()) => {
                *self.active.write().await = mode;
                info!("arbiter: {:?} active ({})", mode, target);
                Ok(())
            }
            Err(err) => {
                backend.stop().await;
                *self.active.write().await = PlaybackMode::Idle;
                warn!("arbiter: switch to {:?} failed: {}", mode, err);
                Err(err.into())
            }
        }
    }

    /// Stop everything and publish Idle.
    pub async fn stop_all(&self) {
        let _gate = self.gate.lock().await;
        for backend in &self.backends {
            backend.stop().await;
        }
        *self.active.write().await = PlaybackMode::Idle;
    }
}
