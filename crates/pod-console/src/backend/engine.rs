//! mpv line-IPC playback engine.
//!
//! Each engine owns one mpv process (`--no-video --idle=yes`) and its
//! unix IPC socket. Commands are serialized by the arbiter, so a single
//! locked connection suffices: write one request line, read reply lines
//! until the matching `request_id` comes back, skipping unsolicited
//! event lines. The process is spawned lazily on first use and respawned
//! if it dies.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const IPC_TIMEOUT: Duration = Duration::from_secs(5);

struct EngineConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

struct EngineInner {
    process: Option<tokio::process::Child>,
    conn: Option<EngineConn>,
}

pub struct AudioEngine {
    name: &'static str,
    binary: PathBuf,
    socket_path: PathBuf,
    volume: f32,
    inner: Mutex<EngineInner>,
    next_req: AtomicU64,
}

impl AudioEngine {
    pub fn new(name: &'static str, binary: PathBuf, volume: f32) -> Self {
        Self {
            name,
            binary,
            socket_path: pod_proto::platform::engine_socket_path(name),
            volume,
            inner: Mutex::new(EngineInner {
                process: None,
                conn: None,
            }),
            next_req: AtomicU64::new(1),
        }
    }

    /// Load and play a target (file path or stream URL).
    pub async fn load(&self, target: &str) -> anyhow::Result<()> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        self.ensure_running(inner).await?;
        self.command(inner, json!(["loadfile", target])).await?;
        let vol = (self.volume * 100.0).clamp(0.0, 100.0);
        if let Err(e) = self.command(inner, json!(["set_property", "volume", vol])).await {
            warn!("engine {}: volume set failed: {}", self.name, e);
        }
        Ok(())
    }

    /// Stop playback. A no-op when the engine was never started.
    pub async fn stop(&self) -> anyhow::Result<()> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if inner.conn.is_none() {
            return Ok(());
        }
        self.command(inner, json!(["stop"])).await?;
        Ok(())
    }

    async fn ensure_running(&self, inner: &mut EngineInner) -> anyhow::Result<()> {
        let alive = match inner.process.as_mut() {
            Some(child) => child.try_wait()?.is_none(),
            None => false,
        };
        if alive && inner.conn.is_some() {
            return Ok(());
        }

        // Kill stale process
        if let Some(mut old) = inner.process.take() {
            let _ = old.kill().await;
        }
        inner.conn = None;
        let _ = tokio::fs::remove_file(&self.socket_path).await;

        info!("engine {}: spawning player process", self.name);
        let child = tokio::process::Command::new(&self.binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(format!(
                "--volume={}",
                (self.volume * 100.0).clamp(0.0, 100.0).round() as i64
            ))
            .arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .with_context(|| format!("spawning {}", self.binary.display()))?;
        inner.process = Some(child);

        // Wait for the IPC socket to appear
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if self.socket_path.exists() {
                break;
            }
        }
        if !self.socket_path.exists() {
            bail!("engine {}: IPC socket did not appear", self.name);
        }

        let stream = UnixStream::connect(&self.socket_path).await?;
        let (read_half, write_half) = stream.into_split();
        inner.conn = Some(EngineConn {
            reader: BufReader::new(read_half),
            writer: write_half,
        });
        debug!("engine {}: connected to IPC socket", self.name);
        Ok(())
    }

    async fn command(&self, inner: &mut EngineInner, cmd: Value) -> anyhow::Result<Value> {
        let conn = inner
            .conn
            .as_mut()
            .ok_or_else(|| anyhow!("engine {}: not connected", self.name))?;
        let req_id = self.next_req.fetch_add(1, Ordering::Relaxed);
        let mut payload = serde_json::to_string(&json!({ "command": cmd, "request_id": req_id }))?;
        payload.push('\n');
        debug!("engine {}: send req={} {}", self.name, req_id, payload.trim());

        // Inner result: Ok(reply) or Err(engine error string) — the
        // connection stays healthy for those. Outer errors are IO-level
        // and drop the connection so the next call reconnects.
        let exchange = tokio::time::timeout(IPC_TIMEOUT, async {
            conn.writer.write_all(payload.as_bytes()).await?;
            let mut line = String::new();
            loop {
                line.clear();
                let n = conn.reader.read_line(&mut line).await?;
                if n == 0 {
                    bail!("engine {}: IPC connection closed", self.name);
                }
                let val: Value = match serde_json::from_str(line.trim()) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                if val.get("request_id").and_then(Value::as_u64) != Some(req_id) {
                    // unsolicited event; nothing observes these here
                    continue;
                }
                if val["error"].as_str() == Some("success") {
                    return Ok(Ok(val));
                }
                let err = val["error"].as_str().unwrap_or("unknown error").to_string();
                return Ok(Err(err));
            }
        })
        .await;

        match exchange {
            Ok(Ok(Ok(reply))) => Ok(reply),
            Ok(Ok(Err(engine_err))) => Err(anyhow!("engine {}: {}", self.name, engine_err)),
            Ok(Err(io_err)) => {
                inner.conn = None;
                Err(io_err)
            }
            Err(_) => {
                inner.conn = None;
                Err(anyhow!("engine {}: IPC timeout for req={}", self.name, req_id))
            }
        }
    }
}
