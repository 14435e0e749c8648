//! Live channel: one WebSocket connection per open chat room.
//!
//! A driver task owns the socket. The channel hands inbound messages and
//! state transitions to a single consumer through [`LiveChannel::next_event`];
//! outbound frames go through a clonable [`ChannelSender`].

pub mod frame;
#[cfg(test)]
pub mod testing;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::auth::RoomPass;
use crate::error::SendError;
use crate::models::{ChatId, ChatMessage};
use frame::OutboundFrame;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

const CHAT_ID_PLACEHOLDER: &str = "{chat_id}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        })
    }
}

/// What the channel reports to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    State(ConnectionState),
    Message(ChatMessage),
}

/// WebSocket address, optionally scoped per room with a `{chat_id}`
/// placeholder (e.g. `ws://host:9000/rooms/{chat_id}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    template: String,
}

impl Endpoint {
    pub fn new(template: &str) -> Result<Self> {
        let sample = template.replace(CHAT_ID_PLACEHOLDER, "0");
        let url = url::Url::parse(&sample)
            .with_context(|| format!("Invalid live channel URL: {}", template))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            bail!("Live channel URL must use ws:// or wss://, got {}", template);
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn for_chat(&self, chat_id: ChatId) -> String {
        self.template
            .replace(CHAT_ID_PLACEHOLDER, &chat_id.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Interval between WebSocket pings while open.
    pub ping_interval: Duration,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
        }
    }
}

enum Command {
    Send {
        text: String,
        reply: oneshot::Sender<Result<(), SendError>>,
    },
    Close,
}

/// Outbound half of a live channel.
#[derive(Clone)]
pub struct ChannelSender {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl ChannelSender {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Transmit one frame. Resolves once the socket accepted it.
    pub async fn send(&self, frame: &OutboundFrame) -> Result<(), SendError> {
        let state = self.state();
        if state != ConnectionState::Open {
            return Err(SendError::NotOpen(state));
        }

        let text = frame.encode().map_err(|e| SendError::Encode(e.to_string()))?;
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Send { text, reply })
            .map_err(|_| SendError::ChannelGone)?;
        rx.await.map_err(|_| SendError::ChannelGone)?
    }
}

pub struct LiveChannel {
    chat_id: ChatId,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    sender: ChannelSender,
    dropped: Arc<AtomicU64>,
    driver: Option<JoinHandle<()>>,
}

impl LiveChannel {
    /// Start connecting to the room's live endpoint.
    ///
    /// Returns immediately in `Connecting`; the outcome arrives as a
    /// [`ChannelEvent::State`].
    pub fn open(endpoint: &Endpoint, pass: &RoomPass, settings: &ChannelSettings) -> Self {
        let chat_id = pass.chat_id();
        let url = endpoint.for_chat(chat_id);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let dropped = Arc::new(AtomicU64::new(0));

        let driver = Driver {
            chat_id,
            events: event_tx,
            state: state_tx,
            dropped: Arc::clone(&dropped),
        };
        let handle = tokio::spawn(driver.run(url, settings.ping_interval, cmd_rx));

        Self {
            chat_id,
            events: event_rx,
            sender: ChannelSender {
                commands: cmd_tx,
                state: state_rx,
            },
            dropped,
            driver: Some(handle),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.sender.state()
    }

    pub fn sender(&self) -> ChannelSender {
        self.sender.clone()
    }

    /// Number of inbound frames discarded as malformed.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Next event in arrival order. `None` once the driver has finished and
    /// every event has been consumed.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Close the connection and wait for the driver to finish.
    /// Calling it again is a no-op.
    pub async fn close(&mut self) {
        let Some(driver) = self.driver.take() else {
            return;
        };
        let _ = self.sender.commands.send(Command::Close);
        if let Err(e) = driver.await {
            tracing::warn!("Live channel driver for chat {} failed: {}", self.chat_id, e);
        }
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        if self.driver.is_some() {
            let _ = self.sender.commands.send(Command::Close);
        }
    }
}

/// Owns the socket for one channel.
struct Driver {
    chat_id: ChatId,
    events: mpsc::UnboundedSender<ChannelEvent>,
    state: watch::Sender<ConnectionState>,
    dropped: Arc<AtomicU64>,
}

impl Driver {
    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
        let _ = self.events.send(ChannelEvent::State(state));
    }

    async fn run(
        self,
        url: String,
        ping_interval: Duration,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        tracing::info!("Connecting live channel for chat {} to {}", self.chat_id, url);

        let Some(mut stream) = self.connect(&url, &mut commands).await else {
            drain(&mut commands, self.current_state());
            return;
        };

        self.set_state(ConnectionState::Open);

        let outcome = self.event_loop(&mut stream, ping_interval, &mut commands).await;
        tracing::info!("Live channel for chat {} is {}", self.chat_id, outcome);
        self.set_state(outcome);
        drain(&mut commands, outcome);
    }

    fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Handshake, while still answering commands.
    async fn connect(
        &self,
        url: &str,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Option<WsStream> {
        let connect = connect_async(url);
        tokio::pin!(connect);

        loop {
            tokio::select! {
                result = &mut connect => {
                    return match result {
                        Ok((stream, response)) => {
                            tracing::info!(
                                "Live channel for chat {} connected (status={})",
                                self.chat_id,
                                response.status()
                            );
                            Some(stream)
                        }
                        Err(e) => {
                            tracing::warn!("Live channel for chat {} failed to connect: {}", self.chat_id, e);
                            self.set_state(ConnectionState::Errored);
                            None
                        }
                    };
                }
                cmd = commands.recv() => match cmd {
                    Some(Command::Send { reply, .. }) => {
                        let _ = reply.send(Err(SendError::NotOpen(ConnectionState::Connecting)));
                    }
                    Some(Command::Close) | None => {
                        tracing::debug!("Live channel for chat {} closed while connecting", self.chat_id);
                        self.set_state(ConnectionState::Closed);
                        return None;
                    }
                },
            }
        }
    }

    async fn event_loop(
        &self,
        stream: &mut WsStream,
        ping_interval: Duration,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> ConnectionState {
        let mut ping = time::interval(ping_interval.max(Duration::from_secs(1)));
        ping.tick().await; // skip first immediate tick

        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("WS recv: {}", text);
                        self.deliver(frame::decode(&text), || text.clone());
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        self.deliver(frame::decode_bytes(&bytes), || {
                            format!("<{} binary bytes>", bytes.len())
                        });
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = stream.send(Message::Pong(data)).await {
                            tracing::warn!("Failed to send pong: {}", e);
                            return ConnectionState::Errored;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!("WebSocket closed by peer: {:?}", frame);
                        return ConnectionState::Closed;
                    }
                    Some(Ok(other)) => {
                        tracing::debug!("WS frame (ignored): {:?}", other);
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket receive error on chat {}: {}", self.chat_id, e);
                        return ConnectionState::Errored;
                    }
                    None => return ConnectionState::Closed,
                },
                cmd = commands.recv() => match cmd {
                    Some(Command::Send { text, reply }) => {
                        tracing::debug!("WS send: {}", text);
                        match stream.send(Message::Text(text)).await {
                            Ok(()) => {
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                tracing::warn!("Failed to send on chat {}: {}", self.chat_id, e);
                                let _ = reply.send(Err(SendError::Transport(e.to_string())));
                                return ConnectionState::Errored;
                            }
                        }
                    }
                    Some(Command::Close) | None => {
                        if let Err(e) = stream.close(None).await {
                            tracing::debug!("WebSocket close handshake failed: {}", e);
                        }
                        return ConnectionState::Closed;
                    }
                },
                _ = ping.tick() => {
                    if let Err(e) = stream.send(Message::Ping(Vec::new())).await {
                        tracing::warn!("Keepalive ping failed on chat {}: {}", self.chat_id, e);
                        return ConnectionState::Errored;
                    }
                }
            }
        }
    }

    /// Forward a decoded message, or count and log a malformed frame.
    fn deliver(
        &self,
        decoded: Result<ChatMessage, frame::FrameError>,
        raw: impl FnOnce() -> String,
    ) {
        match decoded {
            Ok(msg) => {
                let _ = self.events.send(ChannelEvent::Message(msg));
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Dropping malformed frame on chat {}: {} ({})", self.chat_id, e, raw());
            }
        }
    }
}

/// Refuse whatever is still queued once the socket is gone.
fn drain(commands: &mut mpsc::UnboundedReceiver<Command>, state: ConnectionState) {
    commands.close();
    while let Ok(cmd) = commands.try_recv() {
        if let Command::Send { reply, .. } = cmd {
            let _ = reply.send(Err(SendError::NotOpen(state)));
        }
    }
}
