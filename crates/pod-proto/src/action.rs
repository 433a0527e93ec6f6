use serde::{Deserialize, Serialize};

/// An activated item from the navigation layer, as a closed tagged set.
/// Every variant names the one payload shape its backend expects; the
/// console matches these exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum SelectionAction {
    /// Play a catalog item on the remote transport.
    PlayRemoteItem { uri: String },
    /// Play a local file. Tag metadata comes from the library indexer;
    /// `cover` carries embedded art bytes when the file has any.
    PlayLocalTrack {
        path: String,
        title: String,
        artist: String,
        album: String,
        #[serde(default)]
        cover: Option<Vec<u8>>,
    },
    /// Tune an internet radio station.
    TuneRadio { name: String, url: String },
    /// Join a live channel (audio + chat). `cover` is the channel's
    /// profile image when the directory already fetched it.
    JoinLiveChannel {
        handle: String,
        #[serde(default)]
        category: String,
        #[serde(default)]
        cover: Option<Vec<u8>>,
    },
    /// Stop whatever is playing and go idle.
    StopPlayback,
    /// Host-level action; playback is stopped before the host acts on it.
    System { command: SystemCommand },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemCommand {
    Shutdown,
    Reboot,
}
