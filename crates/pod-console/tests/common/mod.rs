#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pod_console::backend::{BackendError, BackendHandle};
use pod_console::chat::{ChatDial, ChatStream};
use pod_console::cover::CoverFetch;
use pod_console::remote::{RemotePlayback, RemoteTransport};
use pod_proto::now_playing::PlaybackMode;
use tokio::sync::Notify;

#[derive(Clone, Copy)]
pub enum FailKind {
    Unavailable,
    Fault,
}

pub struct FakeBackend {
    mode: PlaybackMode,
    active: AtomicBool,
    fail: Mutex<Option<FailKind>>,
    pub starts: Mutex<Vec<String>>,
    pub stops: AtomicUsize,
}

impl FakeBackend {
    pub fn new(mode: PlaybackMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            active: AtomicBool::new(false),
            fail: Mutex::new(None),
            starts: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn fail_with(&self, kind: FailKind) {
        *self.fail.lock().unwrap() = Some(kind);
    }
}

#[async_trait]
impl BackendHandle for FakeBackend {
    fn mode(&self) -> PlaybackMode {
        self.mode
    }

    async fn start(&self, target: &str) -> Result<(), BackendError> {
        self.starts.lock().unwrap().push(target.to_string());
        match *self.fail.lock().unwrap() {
            Some(FailKind::Unavailable) => Err(BackendError::Unavailable(target.to_string())),
            Some(FailKind::Fault) => Err(BackendError::Fault(anyhow::anyhow!("driver exploded"))),
            None => {
                self.active.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Scripted remote transport: each poll consumes one queued response;
/// an empty queue polls as a transport error (which the session retains
/// through).
#[derive(Default)]
pub struct FakeRemote {
    responses: Mutex<VecDeque<Option<RemotePlayback>>>,
    pub started: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn script(&self, response: Option<RemotePlayback>) {
        self.responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl RemoteTransport for FakeRemote {
    async fn current_playback(&self) -> anyhow::Result<Option<RemotePlayback>> {
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => Ok(response),
            None => Err(anyhow::anyhow!("no scripted response")),
        }
    }

    async fn start_playback(&self, uri: &str) -> anyhow::Result<()> {
        self.started.lock().unwrap().push(uri.to_string());
        Ok(())
    }

    async fn stop_playback(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeFetch {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetch {
    pub fn insert(&self, url: &str, body: Vec<u8>) {
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }

    /// Make fetches of `url` block until the returned gate is notified.
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CoverFetch for FakeFetch {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        let gate = self.gates.lock().unwrap().get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no body for {}", url))
    }
}

/// Chat dialer that hands out one side of an in-memory pipe and keeps
/// the other so the connection stays open.
#[derive(Default)]
pub struct LoopbackDial {
    pub servers: Mutex<Vec<tokio::io::DuplexStream>>,
}

#[async_trait]
impl ChatDial for LoopbackDial {
    async fn dial(&self, _host: &str, _port: u16) -> anyhow::Result<Box<dyn ChatStream>> {
        let (client, server) = tokio::io::duplex(4096);
        self.servers.lock().unwrap().push(server);
        Ok(Box::new(client))
    }
}

pub fn png_of(color: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb(color));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
