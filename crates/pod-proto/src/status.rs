//! Process-wide device health flags (connectivity, Bluetooth audio),
//! published as a snapshot instead of free-floating globals. External
//! pollers write through the board on a timer; everyone else reads a copy.

use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemStatus {
    pub online: bool,
    pub bluetooth_audio: bool,
}

/// Single-writer board: only the status pollers call the setters, readers
/// take a copy. Cheap to clone and hand to a background task.
#[derive(Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<SystemStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SystemStatus {
        *self.inner.read().expect("status board poisoned")
    }

    pub fn set_online(&self, online: bool) {
        self.inner.write().expect("status board poisoned").online = online;
    }

    pub fn set_bluetooth_audio(&self, connected: bool) {
        self.inner
            .write()
            .expect("status board poisoned")
            .bluetooth_audio = connected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_snapshot_tracks_writes() {
        let board = StatusBoard::new();
        assert_eq!(board.snapshot(), SystemStatus::default());

        board.set_online(true);
        board.set_bluetooth_audio(true);
        let snap = board.snapshot();
        assert!(snap.online);
        assert!(snap.bluetooth_audio);

        board.set_online(false);
        assert!(!board.snapshot().online);
        assert!(board.snapshot().bluetooth_audio);
    }
}
