//! Local WebSocket peer standing in for the chat server in tests.

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

use super::Endpoint;
use crate::api::memory::MemoryStore;
use crate::auth::{authorize, Access, RoomPass};
use crate::models::{ChatId, UserId};

pub struct Peer {
    listener: TcpListener,
}

impl Peer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn endpoint(&self) -> Endpoint {
        let addr = self.listener.local_addr().unwrap();
        Endpoint::new(&format!("ws://{}", addr)).unwrap()
    }

    /// An address nothing listens on.
    pub async fn unused_endpoint() -> Endpoint {
        let peer = Self::bind().await;
        let endpoint = peer.endpoint();
        drop(peer);
        endpoint
    }

    pub async fn accept(&self) -> PeerConn {
        let (stream, _) = self.listener.accept().await.unwrap();
        PeerConn {
            ws: accept_async(stream).await.unwrap(),
        }
    }
}

pub struct PeerConn {
    ws: WebSocketStream<TcpStream>,
}

impl PeerConn {
    pub async fn send_text(&mut self, text: &str) {
        self.ws.send(Message::Text(text.to_string())).await.unwrap();
    }

    /// Send without caring whether the client is still there.
    pub async fn try_send_text(&mut self, text: &str) -> bool {
        self.ws.send(Message::Text(text.to_string())).await.is_ok()
    }

    /// Next text frame from the client, skipping control frames.
    pub async fn recv_text(&mut self) -> String {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("peer expected a text frame, got {:?}", other),
            }
        }
    }

    /// Echo every text frame back until the client goes away, like the
    /// server's broadcast does for a single connection.
    pub async fn echo_until_closed(mut self) {
        while let Some(Ok(msg)) = self.ws.next().await {
            if msg.is_text() && self.ws.send(msg).await.is_err() {
                break;
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        // Let the closing handshake finish.
        while let Some(Ok(_)) = self.ws.next().await {}
    }
}

/// Pass for `caller` into `chat`, obtained the only way there is.
pub async fn room_pass(chat: i32, caller: i32) -> RoomPass {
    let store = MemoryStore::new().with_chat(chat, caller, caller + 1);
    match authorize(&store, ChatId(chat), UserId(caller)).await {
        Access::Allow(pass) => pass,
        Access::Deny => panic!("test pass was denied"),
    }
}
