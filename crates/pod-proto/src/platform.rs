use std::path::PathBuf;

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pod")
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".local")
        .join("share")
        .join("pod")
}

/// IPC socket path for one named engine instance.
pub fn engine_socket_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pod-{}.sock", name))
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var("PATH").ok()?;
    for dir in path.split(':') {
        let p = PathBuf::from(dir).join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_beside_exe(name: &str) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    let p = dir.join(name);
    p.exists().then_some(p)
}

/// Find the mpv binary: beside the executable first, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    find_beside_exe("mpv").or_else(|| find_on_path("mpv"))
}

/// Find the streamlink binary for live-channel resolution.
pub fn find_streamlink_binary() -> Option<PathBuf> {
    find_beside_exe("streamlink").or_else(|| find_on_path("streamlink"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_socket_paths_are_distinct() {
        assert_ne!(engine_socket_path("local"), engine_socket_path("radio"));
        assert!(engine_socket_path("live")
            .to_string_lossy()
            .ends_with("pod-live.sock"));
    }
}
