//! Console facade: maps activated navigation items onto the arbiter and
//! the session, so the navigation layer deals with exactly one entry
//! point and one error type.

use pod_proto::action::SelectionAction;
use pod_proto::now_playing::{ChatEntry, NowPlayingSnapshot, PlaybackMode};
use tracing::info;

use crate::arbiter::{PlaybackArbiter, PlaybackError};
use crate::session::NowPlayingSession;

pub struct Console {
    arbiter: PlaybackArbiter,
    session: NowPlayingSession,
}

impl Console {
    pub fn new(arbiter: PlaybackArbiter, session: NowPlayingSession) -> Self {
        Self { arbiter, session }
    }

    /// Handle one activated item. Live switches block while the stream
    /// resolves — render a "connecting" hint before calling. On failure
    /// the arbiter has already stopped everything; the session is set to
    /// Idle and the error goes back to the navigation layer.
    pub async fn handle_action(&self, action: SelectionAction) -> Result<(), PlaybackError> {
        let result = self.dispatch(action).await;
        if result.is_err() {
            self.session.set_idle().await;
        }
        result
    }

    async fn dispatch(&self, action: SelectionAction) -> Result<(), PlaybackError> {
        match action {
            SelectionAction::PlayRemoteItem { uri } => {
                self.arbiter
                    .switch(PlaybackMode::RemoteCatalog, &uri)
                    .await?;
                self.session.set_mode_remote().await;
            }
            SelectionAction::PlayLocalTrack {
                path,
                title,
                artist,
                album,
                cover,
            } => {
                self.arbiter.switch(PlaybackMode::LocalFile, &path).await?;
                self.session
                    .set_mode_local(&title, &artist, &album, cover)
                    .await;
            }
            SelectionAction::TuneRadio { name, url } => {
                self.arbiter
                    .switch(PlaybackMode::InternetRadio, &url)
                    .await?;
                self.session.set_mode_radio(&name).await;
            }
            SelectionAction::JoinLiveChannel {
                handle,
                category,
                cover,
            } => {
                self.arbiter
                    .switch(PlaybackMode::LiveStream, &handle)
                    .await?;
                self.session
                    .set_mode_live(&handle, &category, cover)
                    .await;
            }
            SelectionAction::StopPlayback => {
                self.arbiter.stop_all().await;
                self.session.set_idle().await;
            }
            SelectionAction::System { command } => {
                info!("system action {:?}: stopping playback", command);
                self.arbiter.stop_all().await;
                self.session.set_idle().await;
            }
        }
        Ok(())
    }

    /// Apply pending background results; call once per render frame.
    pub async fn tick(&self) {
        self.session.tick().await;
    }

    pub async fn snapshot(&self) -> NowPlayingSnapshot {
        self.session.snapshot().await
    }

    pub fn chat_entries(&self) -> Vec<ChatEntry> {
        self.session.chat_entries()
    }

    pub async fn toggle_detail_view(&self) {
        self.session.toggle_detail_view().await;
    }

    pub async fn active_mode(&self) -> PlaybackMode {
        self.arbiter.active_mode().await
    }

    pub fn session(&self) -> &NowPlayingSession {
        &self.session
    }
}
