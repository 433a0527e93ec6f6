//! Live-chat feed over the platform's line-oriented IRC-style protocol.
//!
//! One listener task per connection, Disconnected → Connecting →
//! Connected and back to Disconnected on any read error or peer close.
//! The feed owns a bounded FIFO ring of entries; the render layer reads
//! a snapshot copy. The transport sits behind a dialer trait so tests
//! drive the listener over in-memory pipes.

pub mod parse;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pod_proto::config::ChatConfig;
use pod_proto::now_playing::ChatEntry;
use pod_proto::theme::ThemeColor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_rustls::rustls;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

use parse::{
    is_liveness_probe, normalize_channel, parse_chat_line, user_color, LineAssembler,
    LIVENESS_REPLY,
};

/// Entries kept on screen; the oldest drops first.
pub const CHAT_BUFFER_CAP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Anything the listener can run over.
pub trait ChatStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> ChatStream for T {}

#[async_trait]
pub trait ChatDial: Send + Sync {
    async fn dial(&self, host: &str, port: u16) -> anyhow::Result<Box<dyn ChatStream>>;
}

/// Production dialer: TCP + TLS against the web trust roots.
pub struct TlsChatDial;

#[async_trait]
impl ChatDial for TlsChatDial {
    async fn dial(&self, host: &str, port: u16) -> anyhow::Result<Box<dyn ChatStream>> {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let connector = TlsConnector::from(Arc::new(config));
        let tcp = TcpStream::connect((host, port)).await?;
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())?;
        let tls = connector.connect(server_name, tcp).await?;
        Ok(Box::new(tls))
    }
}

struct ChatShared {
    state: Mutex<ChatState>,
    buffer: Mutex<VecDeque<ChatEntry>>,
    channel: Mutex<Option<String>>,
    /// Bumped on every connect/disconnect; a listener that notices a
    /// newer generation stops touching the buffer and exits.
    generation: AtomicU64,
}

impl ChatShared {
    fn push_entry(&self, entry: ChatEntry) {
        let mut buffer = self.buffer.lock().expect("chat buffer poisoned");
        if buffer.len() == CHAT_BUFFER_CAP {
            buffer.pop_front();
        }
        buffer.push_back(entry);
    }

    fn push_system(&self, text: &str) {
        self.push_entry(ChatEntry {
            author: "SYSTEM".to_string(),
            text: text.to_string(),
            color: ThemeColor::LiveStream.accent(),
            is_system: true,
        });
    }

    fn set_state(&self, state: ChatState) {
        *self.state.lock().expect("chat state poisoned") = state;
    }
}

pub struct ChatFeed {
    shared: Arc<ChatShared>,
    config: ChatConfig,
    dialer: Arc<dyn ChatDial>,
    listener: Mutex<Option<JoinHandle<()>>>,
    epoch: AtomicU64,
}

impl ChatFeed {
    pub fn new(config: ChatConfig, dialer: Arc<dyn ChatDial>) -> Self {
        Self {
            shared: Arc::new(ChatShared {
                state: Mutex::new(ChatState::Disconnected),
                buffer: Mutex::new(VecDeque::with_capacity(CHAT_BUFFER_CAP)),
                channel: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            config,
            dialer,
            listener: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ChatState {
        *self.shared.state.lock().expect("chat state poisoned")
    }

    /// Snapshot copy of the buffer, oldest first.
    pub fn entries(&self) -> Vec<ChatEntry> {
        self.shared
            .buffer
            .lock()
            .expect("chat buffer poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Normalized name of the channel a listener currently serves.
    pub fn current_channel(&self) -> Option<String> {
        self.shared
            .channel
            .lock()
            .expect("chat channel poisoned")
            .clone()
    }

    /// Number of listener connections spawned so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Join a channel. An existing connection is torn down first and the
    /// buffer restarts empty for the new channel.
    pub fn connect(&self, channel: &str) {
        self.disconnect();

        let channel = normalize_channel(channel);
        self.shared
            .buffer
            .lock()
            .expect("chat buffer poisoned")
            .clear();
        *self
            .shared
            .channel
            .lock()
            .expect("chat channel poisoned") = Some(channel.clone());
        self.shared.set_state(ChatState::Connecting);
        let my_gen = self.shared.generation.load(Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let dialer = Arc::clone(&self.dialer);
        let config = self.config.clone();
        let handle = tokio::spawn(async move {
            shared.push_system(&format!("Connecting to #{}...", channel));
            let stream = match dialer.dial(&config.server, config.port).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(
                        "chat: connection to {}:{} failed: {}",
                        config.server, config.port, e
                    );
                    if shared.generation.load(Ordering::SeqCst) == my_gen {
                        shared.push_system("Chat disconnected.");
                        shared.set_state(ChatState::Disconnected);
                    }
                    return;
                }
            };
            run_listener(stream, shared, my_gen, channel, config).await;
        });
        *self.listener.lock().expect("chat listener poisoned") = Some(handle);
    }

    /// Idempotent; safe from any state including Disconnected. Does not
    /// wait for listener teardown beyond closing the transport.
    pub fn disconnect(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self
            .listener
            .lock()
            .expect("chat listener poisoned")
            .take()
        {
            handle.abort();
        }
        *self
            .shared
            .channel
            .lock()
            .expect("chat channel poisoned") = None;
        self.shared.set_state(ChatState::Disconnected);
    }
}

impl Drop for ChatFeed {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn run_listener(
    mut stream: Box<dyn ChatStream>,
    shared: Arc<ChatShared>,
    my_gen: u64,
    channel: String,
    config: ChatConfig,
) {
    // Handshake: credential line, identity line, channel-join line.
    let handshake = format!(
        "PASS {}\nNICK {}\nJOIN #{}\n",
        config.token, config.nickname, channel
    );
    if stream.write_all(handshake.as_bytes()).await.is_err() {
        if shared.generation.load(Ordering::SeqCst) == my_gen {
            shared.push_system("Chat disconnected.");
            shared.set_state(ChatState::Disconnected);
        }
        return;
    }
    if shared.generation.load(Ordering::SeqCst) == my_gen {
        shared.set_state(ChatState::Connected);
        info!("chat: joined #{}", channel);
    }

    let mut assembler = LineAssembler::new();
    let mut buf = [0u8; 2048];
    'read: loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break 'read, // peer closed
            Ok(n) => n,
            Err(e) => {
                debug!("chat: read error: {}", e);
                break 'read;
            }
        };
        if shared.generation.load(Ordering::SeqCst) != my_gen {
            // superseded; a newer connection owns the buffer now
            return;
        }
        for line in assembler.push(&buf[..n]) {
            if is_liveness_probe(&line) {
                let reply = format!("{}\n", LIVENESS_REPLY);
                if stream.write_all(reply.as_bytes()).await.is_err() {
                    break 'read;
                }
            } else if let Some((author, text)) = parse_chat_line(&line) {
                let color = user_color(&author);
                shared.push_entry(ChatEntry {
                    author,
                    text,
                    color,
                    is_system: false,
                });
            }
            // every other line kind is protocol noise; drop it
        }
    }

    if shared.generation.load(Ordering::SeqCst) == my_gen {
        shared.push_system("Chat disconnected.");
        shared.set_state(ChatState::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;

    fn test_shared() -> Arc<ChatShared> {
        Arc::new(ChatShared {
            state: Mutex::new(ChatState::Connecting),
            buffer: Mutex::new(VecDeque::new()),
            channel: Mutex::new(Some("chan".to_string())),
            generation: AtomicU64::new(0),
        })
    }

    fn entry(author: &str) -> ChatEntry {
        ChatEntry {
            author: author.to_string(),
            text: "hi".to_string(),
            color: [255, 255, 255],
            is_system: false,
        }
    }

    #[test]
    fn test_ring_eviction_is_fifo() {
        let shared = test_shared();
        for i in 1..=17 {
            shared.push_entry(entry(&format!("u{}", i)));
        }
        let buffer = shared.buffer.lock().unwrap();
        assert_eq!(buffer.len(), CHAT_BUFFER_CAP);
        assert_eq!(buffer.front().unwrap().author, "u2");
        assert_eq!(buffer.back().unwrap().author, "u17");
        // order of the survivors is preserved
        for (i, e) in buffer.iter().enumerate() {
            assert_eq!(e.author, format!("u{}", i + 2));
        }
    }

    #[tokio::test]
    async fn test_listener_handshake_and_split_message() {
        let (client, mut server) = duplex(4096);
        let shared = test_shared();
        let task = tokio::spawn(run_listener(
            Box::new(client),
            Arc::clone(&shared),
            0,
            "chan".to_string(),
            ChatConfig::default(),
        ));

        let mut hs = [0u8; 256];
        let n = server.read(&mut hs).await.unwrap();
        let text = String::from_utf8_lossy(&hs[..n]).to_string();
        assert!(text.contains("PASS oauth:"));
        assert!(text.contains("NICK justinfan12345"));
        assert!(text.contains("JOIN #chan"));
        assert_eq!(*shared.state.lock().unwrap(), ChatState::Connected);

        // A message split across two reads must come through once, intact.
        server
            .write_all(b":waffle!w@w.tmi PRIVMSG #chan :first ha")
            .await
            .unwrap();
        server.write_all(b"lf\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let buffer = shared.buffer.lock().unwrap();
            assert_eq!(buffer.len(), 1);
            assert_eq!(buffer[0].author, "waffle");
            assert_eq!(buffer[0].text, "first half");
            assert_eq!(buffer[0].color, user_color("waffle"));
        }

        // Peer close: one system entry, then Disconnected.
        drop(server);
        task.await.unwrap();
        assert_eq!(*shared.state.lock().unwrap(), ChatState::Disconnected);
        let buffer = shared.buffer.lock().unwrap();
        let last = buffer.back().unwrap();
        assert!(last.is_system);
        assert_eq!(last.text, "Chat disconnected.");
    }

    #[tokio::test]
    async fn test_listener_answers_liveness_probe() {
        let (client, mut server) = duplex(4096);
        let shared = test_shared();
        let _task = tokio::spawn(run_listener(
            Box::new(client),
            Arc::clone(&shared),
            0,
            "chan".to_string(),
            ChatConfig::default(),
        ));

        let mut hs = [0u8; 256];
        server.read(&mut hs).await.unwrap();

        server.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
        let mut reply = [0u8; 16];
        let n = server.read(&mut reply).await.unwrap();
        assert_eq!(&reply[..n], b"PONG\n");
        // no chat entry for the probe
        assert!(shared.buffer.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listener_drops_unknown_lines_silently() {
        let (client, mut server) = duplex(4096);
        let shared = test_shared();
        let _task = tokio::spawn(run_listener(
            Box::new(client),
            Arc::clone(&shared),
            0,
            "chan".to_string(),
            ChatConfig::default(),
        ));
        let mut hs = [0u8; 256];
        server.read(&mut hs).await.unwrap();

        server
            .write_all(b":tmi.twitch.tv 001 justinfan12345 :Welcome\r\n:w!w@w JOIN #chan\r\n")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(shared.buffer.lock().unwrap().is_empty());
    }

    struct LoopbackDial {
        servers: Mutex<Vec<tokio::io::DuplexStream>>,
    }

    #[async_trait]
    impl ChatDial for LoopbackDial {
        async fn dial(&self, _host: &str, _port: u16) -> anyhow::Result<Box<dyn ChatStream>> {
            let (client, server) = duplex(4096);
            self.servers.lock().unwrap().push(server);
            Ok(Box::new(client))
        }
    }

    #[tokio::test]
    async fn test_feed_normalizes_channel_and_counts_epochs() {
        let feed = ChatFeed::new(
            ChatConfig::default(),
            Arc::new(LoopbackDial {
                servers: Mutex::new(Vec::new()),
            }),
        );
        assert_eq!(feed.state(), ChatState::Disconnected);

        feed.connect("  WaffleChan ");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(feed.current_channel().as_deref(), Some("wafflechan"));
        assert_eq!(feed.state(), ChatState::Connected);
        assert_eq!(feed.epoch(), 1);

        feed.disconnect();
        feed.disconnect(); // idempotent
        assert_eq!(feed.state(), ChatState::Disconnected);
        assert!(feed.current_channel().is_none());
    }

    #[tokio::test]
    async fn test_connect_clears_previous_buffer() {
        let feed = ChatFeed::new(
            ChatConfig::default(),
            Arc::new(LoopbackDial {
                servers: Mutex::new(Vec::new()),
            }),
        );
        feed.connect("one");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!feed.entries().is_empty()); // "Connecting to #one..."

        feed.connect("two");
        tokio::time::sleep(Duration::from_millis(50)).await;
        let entries = feed.entries();
        assert!(entries.iter().all(|e| !e.text.contains("#one")));
        assert_eq!(feed.epoch(), 2);
    }
}
