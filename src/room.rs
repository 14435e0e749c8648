//! Terminal view of one chat room.
//!
//! Runs the route guards, then prints the timeline as it changes and sends
//! what the user types.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::WatchStream;

use crate::api::client::ChatClient;
use crate::api::{self, ChatStore};
use crate::auth::{RoomPass, Session};
use crate::config::Config;
use crate::live::frame::{Attachment, MessageDraft};
use crate::live::ConnectionState;
use crate::models::{ChatId, ChatMessage, MessageType, UserId};
use crate::router::{self, Navigation, Route};
use crate::sync::{self, HistoryStatus, TimelineHandle, TimelineView};

/// Run both guards; on redirect, show where the user ends up instead.
async fn enter(config: &Config, client: &ChatClient, chat_id: ChatId) -> Result<Option<RoomPass>> {
    let session = Session::from_store(config);
    match router::enter_room(client, &session, chat_id).await {
        Navigation::Proceed(pass) => Ok(Some(pass)),
        Navigation::Redirect(Route::Chats) => {
            println!("Chat {} is not available to you.", chat_id);
            api::list_chats(config).await?;
            Ok(None)
        }
        Navigation::Redirect(route) => {
            println!("Not signed in (redirected to {}). Run `pairchat login` first.", route);
            Ok(None)
        }
    }
}

/// Print a room's history once.
pub async fn show_history(config: &Config, chat_id: ChatId) -> Result<()> {
    let client = ChatClient::from_config(config);
    let Some(pass) = enter(config, &client, chat_id).await? else {
        return Ok(());
    };

    let messages = client
        .get_messages_by_chat(chat_id)
        .await
        .context("Failed to load messages")?;

    if messages.is_empty() {
        println!("(no messages)");
    }
    for msg in &messages {
        println!("{}", format_message(msg, pass.caller()));
    }
    Ok(())
}

/// Open a room and stay in it until `/quit`, EOF or Ctrl-C.
pub async fn run(config: &Config, chat_id: ChatId) -> Result<()> {
    let options = config.sync_options()?;
    let client = Arc::new(ChatClient::from_config(config));
    let Some(pass) = enter(config, &client, chat_id).await? else {
        return Ok(());
    };
    let me = pass.caller();

    let mut handle = sync::start(client, pass, options);
    println!("Chat {} (type a message, /attach <path>, /quit)", handle.chat_id());

    let input = BufReader::new(tokio::io::stdin());
    follow(&handle, me, input, tokio::signal::ctrl_c(), &config.upload_dir).await;

    handle.dispose().await;
    Ok(())
}

/// Print timeline changes and send input lines until `/quit`, end of input,
/// revoked access or `interrupt`.
async fn follow<R, I>(handle: &TimelineHandle, me: UserId, input: R, interrupt: I, upload_dir: &str)
where
    R: AsyncBufRead + Unpin,
    I: Future,
{
    let mut updates = WatchStream::new(handle.subscribe());
    let mut lines = input.lines();
    let mut printer = Printer::new(me);
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            view = updates.next() => match view {
                Some(view) => {
                    printer.show(&view);
                    if view.access_revoked {
                        println!("You no longer have access to this chat.");
                        break;
                    }
                }
                None => break,
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line == "/quit" {
                        break;
                    }
                    match draft_from_input(line, upload_dir).await {
                        Ok(Some(draft)) => {
                            if let Err(e) = handle.send_message(draft).await {
                                println!("! Message not sent: {}", e);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => println!("! {:#}", e),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = &mut interrupt => {
                println!("Leaving chat...");
                break;
            }
        }
    }
}

/// Prints only what changed since the last view.
struct Printer {
    me: UserId,
    shown: usize,
    connection: Option<ConnectionState>,
    history: HistoryStatus,
    anomalies: u64,
}

impl Printer {
    fn new(me: UserId) -> Self {
        Self {
            me,
            shown: 0,
            connection: None,
            history: HistoryStatus::Pending,
            anomalies: 0,
        }
    }

    fn show(&mut self, view: &TimelineView) {
        if view.history != self.history {
            if let HistoryStatus::Failed(ref e) = view.history {
                println!("! History unavailable: {}", e);
            }
            self.history = view.history.clone();
        }
        if view.history == HistoryStatus::Pending && view.pending_live > 0 {
            tracing::debug!("{} live messages waiting for history", view.pending_live);
        }
        if view.anomalies > self.anomalies {
            tracing::warn!(
                "Ignored {} messages addressed to another chat while in chat {}",
                view.anomalies - self.anomalies,
                view.chat_id
            );
            self.anomalies = view.anomalies;
        }
        for msg in view.messages.iter().skip(self.shown) {
            println!("{}", format_message(msg, self.me));
        }
        self.shown = view.messages.len();

        if self.connection != Some(view.connection) {
            match view.connection {
                ConnectionState::Connecting => println!("-- connecting"),
                ConnectionState::Open => println!("-- connected"),
                ConnectionState::Closed => println!("-- disconnected"),
                ConnectionState::Errored => println!("-- connection error"),
            }
            self.connection = Some(view.connection);
        }
    }
}

fn format_message(msg: &ChatMessage, me: UserId) -> String {
    let who = if msg.sender_id == me {
        "you".to_string()
    } else {
        format!("user {}", msg.sender_id)
    };
    let time = msg
        .created_at
        .map(|t| format!("[{}] ", t.format("%H:%M")))
        .unwrap_or_default();

    match (msg.message_type, msg.attachment_path.as_deref()) {
        (MessageType::File, Some(path)) => format!("{}{}: {} [file: {}]", time, who, msg.content, path),
        _ => format!("{}{}: {}", time, who, msg.content),
    }
}

/// Turn a line of input into a draft. Blank lines produce nothing.
async fn draft_from_input(line: &str, upload_dir: &str) -> Result<Option<MessageDraft>> {
    if line.is_empty() {
        return Ok(None);
    }
    let Some(path) = line.strip_prefix("/attach ") else {
        return Ok(Some(MessageDraft::text(line)));
    };

    let path = Path::new(path.trim());
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Attachment path has no file name")?;

    let attachment = Attachment {
        path: format!("{}/{}", upload_dir.trim_end_matches('/'), file_name),
        data_url: data_url(mime_for(path), &bytes),
    };
    Ok(Some(MessageDraft::with_attachment(file_name, attachment)))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
