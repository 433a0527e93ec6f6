//! The unified "now playing" state machine.
//!
//! One writer (this session) behind a RwLock; the render layer clones a
//! `NowPlayingSnapshot` out every frame and never blocks on I/O. Remote
//! refreshes and finished cover requests arrive over channels and are
//! applied in `tick()`, once per render frame — background tasks never
//! touch the model directly.

use std::sync::Arc;
use std::time::Duration;

use pod_proto::now_playing::{NowPlayingSnapshot, PlaybackMode};
use pod_proto::theme::ThemeColor;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::debug;

use crate::chat::{parse::normalize_channel, ChatFeed, ChatState};
use crate::cover::{CoverFetch, CoverLoader, CoverSource, CoverUpdate};
use crate::remote::{RemotePlayback, RemoteTransport};
use crate::tasks::RepeatingTask;

/// Shown in RemoteCatalog mode until the first successful poll.
const REMOTE_PLACEHOLDER: &str = "Loading...";

enum RemoteRefresh {
    Playing(RemotePlayback),
    /// The remote device reports nothing loaded.
    Stopped,
}

struct SessionState {
    snap: NowPlayingSnapshot,
    /// URL of the cover currently requested or shown; identical poll
    /// results must not re-fetch.
    cover_url: Option<String>,
    /// RemoteCatalog sub-state: no successful poll yet.
    awaiting_refresh: bool,
}

pub struct NowPlayingSession {
    state: RwLock<SessionState>,
    chat: Arc<ChatFeed>,
    remote: Arc<dyn RemoteTransport>,
    covers: CoverLoader,
    cover_rx: Mutex<mpsc::Receiver<CoverUpdate>>,
    refresh_tx: mpsc::Sender<RemoteRefresh>,
    refresh_rx: Mutex<mpsc::Receiver<RemoteRefresh>>,
    poll_interval: Duration,
    poll_task: std::sync::Mutex<Option<RepeatingTask>>,
}

impl NowPlayingSession {
    pub fn new(
        remote: Arc<dyn RemoteTransport>,
        chat: Arc<ChatFeed>,
        fetcher: Arc<dyn CoverFetch>,
        poll_interval: Duration,
    ) -> Self {
        let (covers, cover_rx) = CoverLoader::new(fetcher);
        let (refresh_tx, refresh_rx) = mpsc::channel(4);
        Self {
            state: RwLock::new(SessionState {
                snap: NowPlayingSnapshot::default(),
                cover_url: None,
                awaiting_refresh: false,
            }),
            chat,
            remote,
            covers,
            cover_rx: Mutex::new(cover_rx),
            refresh_tx,
            refresh_rx: Mutex::new(refresh_rx),
            poll_interval,
            poll_task: std::sync::Mutex::new(None),
        }
    }

    pub async fn snapshot(&self) -> NowPlayingSnapshot {
        self.state.read().await.snap.clone()
    }

    pub fn chat(&self) -> &ChatFeed {
        &self.chat
    }

    /// RemoteCatalog sub-state: true from `set_mode_remote` until the
    /// first successful poll has been applied.
    pub async fn awaiting_remote_refresh(&self) -> bool {
        self.state.read().await.awaiting_refresh
    }

    pub fn chat_entries(&self) -> Vec<pod_proto::now_playing::ChatEntry> {
        self.chat.entries()
    }

    /// Cover view vs. detail-text view. Orthogonal to the mode.
    pub async fn toggle_detail_view(&self) {
        let mut st = self.state.write().await;
        st.snap.detail_view = !st.snap.detail_view;
    }

    pub async fn set_mode_remote(&self) {
        self.chat.disconnect();
        self.covers.invalidate();
        {
            let mut st = self.state.write().await;
            Self::reset_metadata(&mut st, PlaybackMode::RemoteCatalog);
            st.snap.track_title = REMOTE_PLACEHOLDER.to_string();
            st.awaiting_refresh = true;
        }
        self.start_remote_poll();
    }

    pub async fn set_mode_local(
        &self,
        title: &str,
        artist: &str,
        album: &str,
        cover_bytes: Option<Vec<u8>>,
    ) {
        self.stop_remote_poll();
        self.chat.disconnect();
        self.covers.invalidate();
        {
            let mut st = self.state.write().await;
            Self::reset_metadata(&mut st, PlaybackMode::LocalFile);
            st.snap.track_title = title.to_string();
            st.snap.artist = artist.to_string();
            st.snap.album = album.to_string();
            st.snap.is_playing = true;
        }
        self.request_cover_bytes(cover_bytes, PlaybackMode::LocalFile.theme());
    }

    pub async fn set_mode_radio(&self, station_name: &str) {
        self.stop_remote_poll();
        self.chat.disconnect();
        self.covers.invalidate();
        let mut st = self.state.write().await;
        Self::reset_metadata(&mut st, PlaybackMode::InternetRadio);
        st.snap.track_title = station_name.to_string();
        st.snap.artist = "Live Radio".to_string();
        st.snap.album = "FM Stream".to_string();
        st.snap.is_playing = true;
        // no cover for radio; the renderer draws its placeholder
    }

    pub async fn set_mode_live(
        &self,
        channel: &str,
        category: &str,
        cover_bytes: Option<Vec<u8>>,
    ) {
        self.stop_remote_poll();
        self.covers.invalidate();

        // Re-entering the channel we already serve must not reconnect.
        let normalized = normalize_channel(channel);
        let already_joined = self.chat.current_channel().as_deref() == Some(normalized.as_str())
            && self.chat.state() != ChatState::Disconnected;
        if !already_joined {
            self.chat.connect(channel);
        }

        {
            let mut st = self.state.write().await;
            Self::reset_metadata(&mut st, PlaybackMode::LiveStream);
            st.snap.track_title = channel.to_string();
            st.snap.artist = "Live Stream".to_string();
            st.snap.album = category.to_string();
            st.snap.is_playing = true;
        }
        self.request_cover_bytes(cover_bytes, PlaybackMode::LiveStream.theme());
    }

    pub async fn set_idle(&self) {
        self.stop_remote_poll();
        self.chat.disconnect();
        self.covers.invalidate();
        let mut st = self.state.write().await;
        Self::reset_metadata(&mut st, PlaybackMode::Idle);
    }

    /// Apply pending background results. Called once per render frame;
    /// cheap when nothing is queued.
    pub async fn tick(&self) {
        let mut covers = Vec::new();
        {
            let mut rx = self.cover_rx.lock().await;
            while let Ok(update) = rx.try_recv() {
                covers.push(update);
            }
        }
        if !covers.is_empty() {
            let mut st = self.state.write().await;
            for update in covers {
                st.snap.cover = update.thumbnail.map(Arc::new);
            }
        }

        let mut refreshes = Vec::new();
        {
            let mut rx = self.refresh_rx.lock().await;
            while let Ok(refresh) = rx.try_recv() {
                refreshes.push(refresh);
            }
        }
        for refresh in refreshes {
            self.apply_refresh(refresh).await;
        }
    }

    // ── mode transition helpers ──────────────────────────────────────────

    /// Overwrite everything a transition resets. The detail/cover view
    /// flag is deliberately left alone.
    fn reset_metadata(st: &mut SessionState, mode: PlaybackMode) {
        st.snap.mode = mode;
        st.snap.theme = mode.theme();
        st.snap.track_title = String::new();
        st.snap.artist = String::new();
        st.snap.album = String::new();
        st.snap.track_index = 0;
        st.snap.track_count = 0;
        st.snap.duration_ms = 0;
        st.snap.progress_ms = 0;
        st.snap.is_playing = false;
        st.snap.cover = None;
        st.cover_url = None;
        st.awaiting_refresh = false;
    }

    fn request_cover_bytes(&self, cover_bytes: Option<Vec<u8>>, theme: ThemeColor) {
        if let Some(bytes) = cover_bytes {
            let sequence = self.covers.next_sequence();
            self.covers.request(CoverSource::Bytes(bytes), theme, sequence);
        }
    }

    // ── remote refresh ───────────────────────────────────────────────────

    fn start_remote_poll(&self) {
        let remote = Arc::clone(&self.remote);
        let tx = self.refresh_tx.clone();
        let task = RepeatingTask::spawn(self.poll_interval, move || {
            let remote = Arc::clone(&remote);
            let tx = tx.clone();
            async move {
                match remote.current_playback().await {
                    Ok(Some(playback)) => {
                        let _ = tx.try_send(RemoteRefresh::Playing(playback));
                    }
                    Ok(None) => {
                        let _ = tx.try_send(RemoteRefresh::Stopped);
                    }
                    // Unreliable connectivity is normal here: keep the
                    // last snapshot, retry on the next interval.
                    Err(e) => debug!("remote poll failed: {}", e),
                }
            }
        });
        *self.poll_task.lock().expect("poll task poisoned") = Some(task);
    }

    fn stop_remote_poll(&self) {
        self.poll_task.lock().expect("poll task poisoned").take();
    }

    async fn apply_refresh(&self, refresh: RemoteRefresh) {
        let mut request: Option<(String, ThemeColor, u64)> = None;
        {
            let mut st = self.state.write().await;
            if st.snap.mode != PlaybackMode::RemoteCatalog {
                // late result from a poll task that lost the mode race
                return;
            }
            match refresh {
                RemoteRefresh::Stopped => {
                    st.snap.is_playing = false;
                }
                RemoteRefresh::Playing(playback) => {
                    st.awaiting_refresh = false;
                    st.snap.track_title = playback.title;
                    st.snap.artist = playback.artist;
                    st.snap.album = playback.album;
                    st.snap.track_index = playback.track_index;
                    st.snap.track_count = playback.track_count;
                    st.snap.duration_ms = playback.duration_ms;
                    st.snap.progress_ms = playback.progress_ms;
                    st.snap.is_playing = playback.is_playing;

                    if playback.cover_url != st.cover_url {
                        st.cover_url = playback.cover_url.clone();
                        match playback.cover_url {
                            Some(url) => {
                                let sequence = self.covers.next_sequence();
                                request = Some((url, st.snap.theme, sequence));
                            }
                            None => st.snap.cover = None,
                        }
                    }
                }
            }
        }
        if let Some((url, theme, sequence)) = request {
            self.covers.request(CoverSource::Url(url), theme, sequence);
        }
    }
}
