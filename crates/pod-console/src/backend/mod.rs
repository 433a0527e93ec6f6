pub mod drivers;
pub mod engine;

use async_trait::async_trait;
use pod_proto::now_playing::PlaybackMode;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The requested media or channel cannot be reached right now.
    #[error("target unavailable: {0}")]
    Unavailable(String),
    /// Driver-level failure.
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

/// One playback engine for one source type. Handles are created once at
/// startup and only started/stopped afterwards: `start` may be called
/// repeatedly (a running engine just loads the new target), `stop` is
/// idempotent and never raises.
#[async_trait]
pub trait BackendHandle: Send + Sync {
    fn mode(&self) -> PlaybackMode;

    async fn start(&self, target: &str) -> Result<(), BackendError>;

    /// Idempotent; driver trouble is logged, not propagated.
    async fn stop(&self);

    /// True between a successful `start` and the next `stop`.
    fn is_active(&self) -> bool;
}
