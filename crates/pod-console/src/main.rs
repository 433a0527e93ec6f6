use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pod_console::arbiter::PlaybackArbiter;
use pod_console::backend::drivers::{LiveStreamBackend, LocalFileBackend, RadioStreamBackend};
use pod_console::backend::engine::AudioEngine;
use pod_console::backend::BackendHandle;
use pod_console::chat::{ChatFeed, TlsChatDial};
use pod_console::console::Console;
use pod_console::cover::HttpCoverFetch;
use pod_console::remote::{RemoteCatalogBackend, RemotePlayback, RemoteTransport};
use pod_console::session::NowPlayingSession;
use pod_console::tasks::RepeatingTask;
use pod_proto::action::SelectionAction;
use pod_proto::config::Config;
use pod_proto::platform;
use pod_proto::status::StatusBoard;

/// Stand-in until the catalog client is wired up: reports nothing
/// playing and refuses playback. The `RemoteTransport` seam is where the
/// real client plugs in.
struct DetachedRemote;

#[async_trait::async_trait]
impl RemoteTransport for DetachedRemote {
    async fn current_playback(&self) -> anyhow::Result<Option<RemotePlayback>> {
        Ok(None)
    }

    async fn start_playback(&self, _uri: &str) -> anyhow::Result<()> {
        anyhow::bail!("remote catalog client not configured")
    }

    async fn stop_playback(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // File logging under the data dir; RUST_LOG overrides the filter.
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("console.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,pod_console=debug")),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let mpv = config
        .engine
        .mpv_binary
        .clone()
        .or_else(platform::find_mpv_binary)
        .context("mpv binary not found")?;
    let streamlink = config
        .live
        .streamlink_binary
        .clone()
        .or_else(platform::find_streamlink_binary)
        .context("streamlink binary not found")?;
    let volume = config.engine.volume;

    let remote: Arc<dyn RemoteTransport> = Arc::new(DetachedRemote);
    let backends: Vec<Arc<dyn BackendHandle>> = vec![
        Arc::new(RemoteCatalogBackend::new(Arc::clone(&remote))),
        Arc::new(LocalFileBackend::new(AudioEngine::new(
            "local",
            mpv.clone(),
            volume,
        ))),
        Arc::new(RadioStreamBackend::new(AudioEngine::new(
            "radio",
            mpv.clone(),
            volume,
        ))),
        Arc::new(LiveStreamBackend::new(
            AudioEngine::new("live", mpv, volume),
            streamlink,
            config.live.url_base.clone(),
        )),
    ];
    let arbiter = PlaybackArbiter::new(backends);

    let chat = Arc::new(ChatFeed::new(config.chat.clone(), Arc::new(TlsChatDial)));
    let fetcher = Arc::new(HttpCoverFetch::new(Duration::from_millis(
        config.cover.fetch_timeout_ms,
    ))?);
    let session = NowPlayingSession::new(
        Arc::clone(&remote),
        Arc::clone(&chat),
        fetcher,
        Duration::from_millis(config.remote.poll_interval_ms),
    );
    let console = Console::new(arbiter, session);

    // Connectivity flag for the header icon, refreshed off the event loop.
    let status = StatusBoard::new();
    let status_probe = {
        let status = status.clone();
        RepeatingTask::spawn(Duration::from_secs(10), move || {
            let status = status.clone();
            async move {
                let online = tokio::time::timeout(
                    Duration::from_secs(1),
                    tokio::net::TcpStream::connect(("8.8.8.8", 53)),
                )
                .await
                .map(|r| r.is_ok())
                .unwrap_or(false);
                status.set_online(online);
            }
        })
    };

    info!("Console initialised, reading actions from stdin");

    // The navigation layer feeds one JSON SelectionAction per line.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<SelectionAction>(line) {
                    Ok(action) => {
                        let is_system = matches!(action, SelectionAction::System { .. });
                        if let Err(e) = console.handle_action(action).await {
                            warn!("action failed: {}", e);
                        }
                        if is_system {
                            break;
                        }
                    }
                    Err(e) => warn!("unparseable action line: {}", e),
                }
            }
            _ = tick.tick() => console.tick().await,
        }
    }

    status_probe.stop();
    info!("Console shutting down");
    Ok(())
}
