use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::theme::ThemeColor;

/// Which audio source currently owns the single output. Exactly one is
/// active at any instant; the arbiter enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlaybackMode {
    RemoteCatalog,
    LocalFile,
    InternetRadio,
    LiveStream,
    #[default]
    Idle,
}

impl PlaybackMode {
    pub fn theme(self) -> ThemeColor {
        match self {
            PlaybackMode::RemoteCatalog | PlaybackMode::Idle => ThemeColor::Catalog,
            PlaybackMode::LocalFile => ThemeColor::LocalLibrary,
            PlaybackMode::InternetRadio => ThemeColor::Radio,
            PlaybackMode::LiveStream => ThemeColor::LiveStream,
        }
    }

    /// Header label for the source.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackMode::RemoteCatalog => "Catalog",
            PlaybackMode::LocalFile => "Local Music",
            PlaybackMode::InternetRadio => "Radio",
            PlaybackMode::LiveStream => "Live",
            PlaybackMode::Idle => "Idle",
        }
    }
}

/// Side of the processed cover art, in pixels.
pub const COVER_SIZE: u32 = 128;

/// A processed 128x128 retro cover. Packed RGB8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverThumbnail {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// One chat message as shown in the live-stream view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub author: String,
    pub text: String,
    pub color: [u8; 3],
    pub is_system: bool,
}

/// Point-in-time view of the session, cloned out to the renderer every
/// frame. Only `NowPlayingSession` writes it.
///
/// `duration_ms`/`progress_ms` are meaningful only in RemoteCatalog mode;
/// the other sources report 0 (unknown) by design.
#[derive(Debug, Clone, Default)]
pub struct NowPlayingSnapshot {
    pub mode: PlaybackMode,
    pub track_title: String,
    pub artist: String,
    pub album: String,
    pub track_index: u32,
    pub track_count: u32,
    pub duration_ms: u64,
    pub progress_ms: u64,
    pub is_playing: bool,
    pub theme: ThemeColor,
    /// Cover view vs. detail-text view. Orthogonal to the mode; mode
    /// transitions never reset it.
    pub detail_view: bool,
    pub cover: Option<Arc<CoverThumbnail>>,
}

/// Milliseconds as `MM:SS`, or `H:MM:SS` past the hour.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds % 3600) / 60;
    let hours = total_seconds / 3600;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
