//! Timeline reconciler: merges the history snapshot and the live stream of
//! one chat room into the single view the presentation layer watches.
//!
//! [`start`] spawns one task per open room. It owns the [`Timeline`] and the
//! current [`LiveChannel`], processes one event at a time, and is the only
//! writer of the published [`TimelineView`].

pub mod reconnect;
pub mod timeline;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Sleep};

use crate::api::ChatStore;
use crate::auth::{authorize, Access, RoomPass};
use crate::error::{SendError, StoreError};
use crate::live::frame::{MessageDraft, OutboundFrame};
use crate::live::{ChannelEvent, ChannelSender, ChannelSettings, ConnectionState, Endpoint, LiveChannel};
use crate::models::{ChatId, ChatMessage, UserId};
pub use reconnect::ReconnectPolicy;
use timeline::Timeline;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub endpoint: Endpoint,
    pub channel: ChannelSettings,
    pub reconnect: ReconnectPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStatus {
    Pending,
    Loaded(usize),
    /// Soft failure: the timeline continues with live messages only.
    Failed(String),
}

/// Everything the presentation layer sees of an open room.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineView {
    pub chat_id: ChatId,
    pub messages: Vec<ChatMessage>,
    pub connection: ConnectionState,
    pub history: HistoryStatus,
    /// Live messages held until history arrives.
    pub pending_live: usize,
    /// Messages for other rooms that were refused.
    pub anomalies: u64,
    /// Re-authorization before a reconnect was denied.
    pub access_revoked: bool,
}

impl TimelineView {
    fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            messages: Vec::new(),
            connection: ConnectionState::Connecting,
            history: HistoryStatus::Pending,
            pending_live: 0,
            anomalies: 0,
            access_revoked: false,
        }
    }
}

/// Open a room: load history once and follow the live channel until the
/// returned handle is disposed.
pub fn start<S>(store: Arc<S>, pass: RoomPass, options: SyncOptions) -> TimelineHandle
where
    S: ChatStore + 'static,
{
    let chat_id = pass.chat_id();
    let caller = pass.caller();
    let (view_tx, view_rx) = watch::channel(TimelineView::new(chat_id));
    let (sender_tx, sender_rx) = watch::channel(None);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tracing::info!("Opening chat {} for user {}", chat_id, caller);

    let reconciler = Reconciler {
        store,
        pass,
        options,
        timeline: Timeline::new(chat_id),
        history: HistoryStatus::Pending,
        connection: ConnectionState::Connecting,
        access_revoked: false,
        view: view_tx,
        sender: sender_tx,
    };
    let task = tokio::spawn(reconciler.run(shutdown_rx));

    TimelineHandle {
        chat_id,
        caller,
        view: view_rx,
        sender: sender_rx,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

/// The presentation layer's grip on an open room.
///
/// Dropping the handle shuts the room down in the background; [`dispose`]
/// does the same and waits for the live channel to close.
///
/// [`dispose`]: TimelineHandle::dispose
pub struct TimelineHandle {
    chat_id: ChatId,
    caller: UserId,
    view: watch::Receiver<TimelineView>,
    sender: watch::Receiver<Option<ChannelSender>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TimelineHandle {
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn view(&self) -> TimelineView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimelineView> {
        self.view.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.task.is_none()
    }

    /// Send a message into the room.
    ///
    /// The message is not added to the timeline here; it shows up when the
    /// server echoes it back on the live channel.
    pub async fn send_message(&self, draft: MessageDraft) -> Result<(), SendError> {
        if self.is_disposed() {
            return Err(SendError::Disposed);
        }
        if draft.content.trim().is_empty() {
            return Err(SendError::EmptyContent);
        }

        let sender = self.sender.borrow().clone();
        let Some(sender) = sender else {
            return Err(SendError::NotOpen(self.view.borrow().connection));
        };

        let frame = OutboundFrame::new(self.chat_id, self.caller, draft);
        sender.send(&frame).await.map_err(|e| {
            tracing::warn!("Send to chat {} failed: {}", self.chat_id, e);
            e
        })
    }

    /// Close the live channel and stop applying updates. Idempotent.
    pub async fn dispose(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = task.await {
            tracing::warn!("Reconciler for chat {} ended abnormally: {}", self.chat_id, e);
        }
        tracing::info!("Closed chat {}", self.chat_id);
    }
}

struct Reconciler<S> {
    store: Arc<S>,
    pass: RoomPass,
    options: SyncOptions,
    timeline: Timeline,
    history: HistoryStatus,
    connection: ConnectionState,
    access_revoked: bool,
    view: watch::Sender<TimelineView>,
    sender: watch::Sender<Option<ChannelSender>>,
}

impl<S: ChatStore + 'static> Reconciler<S> {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let chat_id = self.pass.chat_id();

        // The channel opens right away; anything it delivers before the
        // history lands is buffered by the timeline.
        let store = Arc::clone(&self.store);
        let history = async move { store.get_messages_by_chat(chat_id).await };
        tokio::pin!(history);
        let mut history_done = false;

        let mut channel = Some(self.open_channel());
        let mut attempt = 0u32;
        let mut retry: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                result = &mut history, if !history_done => {
                    history_done = true;
                    self.apply_history(result);
                }

                event = next_event(&mut channel) => match event {
                    Some(ChannelEvent::Message(msg)) => {
                        self.timeline.receive_live(msg);
                    }
                    Some(ChannelEvent::State(state)) => {
                        self.connection = state;
                        if state == ConnectionState::Open {
                            attempt = 0;
                        }
                        if state.is_terminal() {
                            if let Some(dropped) = channel.take().map(|c| c.dropped_frames()) {
                                if dropped > 0 {
                                    tracing::info!("Chat {} channel dropped {} malformed frames", chat_id, dropped);
                                }
                            }
                            self.sender.send_replace(None);
                            retry = self.schedule_retry(&mut attempt);
                        }
                    }
                    None => {
                        channel = None;
                        self.sender.send_replace(None);
                    }
                },

                _ = wait_retry(&mut retry) => {
                    retry = None;
                    let access = tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        access = authorize(&*self.store, chat_id, self.pass.caller()) => access,
                    };
                    match access {
                        Access::Allow(pass) => {
                            tracing::info!("Reconnecting live channel for chat {}", chat_id);
                            self.pass = pass;
                            channel = Some(self.open_channel());
                        }
                        Access::Deny => {
                            tracing::warn!("Access to chat {} revoked, not reconnecting", chat_id);
                            self.access_revoked = true;
                        }
                    }
                }
            }

            self.publish();
        }

        // Late history or channel events are dropped with the futures above.
        if let Some(mut channel) = channel {
            channel.close().await;
        }
        self.sender.send_replace(None);
    }

    fn open_channel(&mut self) -> LiveChannel {
        let channel = LiveChannel::open(&self.options.endpoint, &self.pass, &self.options.channel);
        self.connection = channel.state();
        self.sender.send_replace(Some(channel.sender()));
        channel
    }

    fn apply_history(&mut self, result: Result<Vec<ChatMessage>, StoreError>) {
        let chat_id = self.timeline.chat_id();
        let history = match result {
            Ok(messages) => {
                tracing::info!("Loaded {} messages for chat {}", messages.len(), chat_id);
                self.history = HistoryStatus::Loaded(messages.len());
                messages
            }
            Err(e) => {
                tracing::warn!("History for chat {} failed to load: {}", chat_id, e);
                self.history = HistoryStatus::Failed(e.to_string());
                Vec::new()
            }
        };
        self.timeline.apply_snapshot(history);
    }

    fn schedule_retry(&self, attempt: &mut u32) -> Option<Pin<Box<Sleep>>> {
        let delay = self.options.reconnect.delay(*attempt)?;
        *attempt += 1;
        tracing::warn!(
            "Live channel for chat {} is {}. Reconnecting in {:?} (attempt {})...",
            self.timeline.chat_id(),
            self.connection,
            delay,
            attempt
        );
        Some(Box::pin(time::sleep(delay)))
    }

    fn publish(&self) {
        let timeline = &self.timeline;
        self.view.send_if_modified(|view| {
            let next = TimelineView {
                chat_id: timeline.chat_id(),
                messages: timeline.messages().to_vec(),
                connection: self.connection,
                history: self.history.clone(),
                pending_live: timeline.pending(),
                anomalies: timeline.anomalies(),
                access_revoked: self.access_revoked,
            };
            if *view == next {
                return false;
            }
            *view = next;
            true
        });
    }
}

/// Next channel event, or never when there is no channel.
fn next_event(channel: &mut Option<LiveChannel>) -> impl Future<Output = Option<ChannelEvent>> + '_ {
    async move {
        match channel {
            Some(channel) => channel.next_event().await,
            None => std::future::pending().await,
        }
    }
}

/// Fires when the retry timer is armed and elapsed, never otherwise.
async fn wait_retry(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{stored, MemoryStore};
    use crate::live::testing::Peer;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn options(peer: &Peer, reconnect: ReconnectPolicy) -> SyncOptions {
        SyncOptions {
            endpoint: peer.endpoint(),
            channel: ChannelSettings::default(),
            reconnect,
        }
    }

    async fn pass_for(store: &MemoryStore, chat: i32, caller: i32) -> RoomPass {
        match authorize(store, ChatId(chat), UserId(caller)).await {
            Access::Allow(pass) => pass,
            Access::Deny => panic!("caller {} denied", caller),
        }
    }

    async fn wait_for(handle: &TimelineHandle, what: &str, cond: impl Fn(&TimelineView) -> bool) -> TimelineView {
        let mut rx = handle.subscribe();
        let result = time::timeout(WAIT, async {
            loop {
                {
                    let view = rx.borrow_and_update();
                    if cond(&view) {
                        return view.clone();
                    }
                }
                if rx.changed().await.is_err() {
                    panic!("reconciler stopped while waiting for {}", what);
                }
            }
        })
        .await;
        match result {
            Ok(view) => view,
            Err(_) => panic!("timed out waiting for {}: {:?}", what, handle.view()),
        }
    }

    fn contents(view: &TimelineView) -> Vec<&str> {
        view.messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_room_opens_with_history_then_live() {
        let store = Arc::new(
            MemoryStore::new()
                .with_chat(7, 1, 2)
                .with_history(7, vec![stored(1, 7, 2, "hi")]),
        );
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));

        let mut conn = peer.accept().await;
        let view = wait_for(&handle, "history", |v| v.history == HistoryStatus::Loaded(1)).await;
        assert_eq!(contents(&view), vec!["hi"]);

        conn.send_text(r#"{"content":"yo","user_id":1,"chat_id":7}"#).await;
        let view = wait_for(&handle, "live message", |v| v.messages.len() == 2).await;
        assert_eq!(contents(&view), vec!["hi", "yo"]);
        assert_eq!(view.connection, ConnectionState::Open);
        assert_eq!(store.history_loads(), 1);

        handle.dispose().await;
    }

    #[tokio::test]
    async fn test_frame_for_other_room_is_ignored() {
        let store = Arc::new(
            MemoryStore::new()
                .with_chat(7, 1, 2)
                .with_history(7, vec![stored(1, 7, 2, "hi")]),
        );
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));
        let mut conn = peer.accept().await;
        wait_for(&handle, "history", |v| v.history == HistoryStatus::Loaded(1)).await;

        conn.send_text(r#"{"content":"elsewhere","user_id":5,"chat_id":99}"#).await;
        conn.send_text(r#"{"content":"here","user_id":2,"chat_id":7}"#).await;

        let view = wait_for(&handle, "in-scope message", |v| v.messages.len() == 2).await;
        assert_eq!(contents(&view), vec!["hi", "here"]);
        assert_eq!(view.anomalies, 1);
        assert!(view.messages.iter().all(|m| m.chat_id == ChatId(7)));

        handle.dispose().await;
    }

    #[tokio::test]
    async fn test_malformed_frames_leave_timeline_unchanged() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));
        let mut conn = peer.accept().await;
        wait_for(&handle, "history", |v| v.history == HistoryStatus::Loaded(0)).await;

        conn.send_text("not json").await;
        conn.send_text(r#"{"user_id":2,"chat_id":7}"#).await;
        conn.send_text(r#"{"content":"x","chat_id":7}"#).await;
        conn.send_text(r#"{"content":"x","user_id":2}"#).await;
        conn.send_text(r#"{"content":"marker","user_id":2,"chat_id":7}"#).await;

        let view = wait_for(&handle, "marker", |v| !v.messages.is_empty()).await;
        assert_eq!(contents(&view), vec!["marker"]);
        assert_eq!(view.connection, ConnectionState::Open);

        handle.dispose().await;
    }

    #[tokio::test]
    async fn test_live_message_during_history_fetch_is_kept_in_order() {
        let store = Arc::new(
            MemoryStore::new()
                .with_chat(7, 1, 2)
                .with_history(7, vec![stored(1, 7, 2, "m1"), stored(2, 7, 1, "m2")]),
        );
        let release = store.gate_history();
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));
        let mut conn = peer.accept().await;

        conn.send_text(r#"{"content":"m3","user_id":2,"chat_id":7}"#).await;
        let view = wait_for(&handle, "buffered m3", |v| v.pending_live == 1).await;
        assert_eq!(view.history, HistoryStatus::Pending);
        assert!(view.messages.is_empty());

        release.send(()).unwrap();
        wait_for(&handle, "snapshot", |v| v.messages.len() == 3).await;

        conn.send_text(r#"{"content":"m4","user_id":1,"chat_id":7}"#).await;
        let view = wait_for(&handle, "m4", |v| v.messages.len() == 4).await;
        assert_eq!(contents(&view), vec!["m1", "m2", "m3", "m4"]);
        assert_eq!(view.pending_live, 0);

        handle.dispose().await;
    }

    #[tokio::test]
    async fn test_history_failure_is_soft() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2).failing_history());
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));
        let mut conn = peer.accept().await;

        let view = wait_for(&handle, "history failure", |v| {
            matches!(v.history, HistoryStatus::Failed(_))
        })
        .await;
        assert!(view.messages.is_empty());

        conn.send_text(r#"{"content":"still live","user_id":2,"chat_id":7}"#).await;
        let view = wait_for(&handle, "live message", |v| v.messages.len() == 1).await;
        assert_eq!(contents(&view), vec!["still live"]);
        assert_eq!(store.history_loads(), 1);

        handle.dispose().await;
    }

    #[tokio::test]
    async fn test_sent_message_appears_once_echoed() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));
        let conn = peer.accept().await;
        let echo = tokio::spawn(conn.echo_until_closed());

        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;
        handle.send_message(MessageDraft::text("ping")).await.unwrap();

        let view = wait_for(&handle, "echo", |v| v.messages.len() == 1).await;
        let msg = &view.messages[0];
        assert_eq!(msg.content, "ping");
        assert_eq!(msg.chat_id, ChatId(7));
        assert_eq!(msg.sender_id, UserId(1));

        handle.dispose().await;
        time::timeout(WAIT, echo).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_send_failures_are_reported() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));

        // Channel still connecting: nothing accepted the socket yet.
        assert_eq!(
            handle.send_message(MessageDraft::text("early")).await,
            Err(SendError::NotOpen(ConnectionState::Connecting))
        );

        let _conn = peer.accept().await;
        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;
        assert_eq!(
            handle.send_message(MessageDraft::text("   ")).await,
            Err(SendError::EmptyContent)
        );

        handle.dispose().await;
        assert_eq!(
            handle.send_message(MessageDraft::text("late")).await,
            Err(SendError::Disposed)
        );
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_freezes_view() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));
        let mut conn = peer.accept().await;
        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;

        handle.dispose().await;
        let frozen = handle.view();
        handle.dispose().await;
        assert!(handle.is_disposed());

        // The socket is closed from our side; whatever the peer still
        // manages to send goes nowhere.
        conn.try_send_text(r#"{"content":"late","user_id":2,"chat_id":7}"#).await;
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.view(), frozen);
    }

    #[tokio::test]
    async fn test_dispose_discards_pending_history() {
        let store = Arc::new(
            MemoryStore::new()
                .with_chat(7, 1, 2)
                .with_history(7, vec![stored(1, 7, 2, "m1")]),
        );
        let release = store.gate_history();
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));
        let _conn = peer.accept().await;
        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;

        handle.dispose().await;
        let _ = release.send(());
        time::sleep(Duration::from_millis(50)).await;

        let view = handle.view();
        assert_eq!(view.history, HistoryStatus::Pending);
        assert!(view.messages.is_empty());
    }

    #[tokio::test]
    async fn test_dispose_during_reauthorization_opens_nothing() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let policy = ReconnectPolicy::Backoff {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(50),
            max_attempts: None,
        };
        let mut handle = start(Arc::clone(&store), pass, options(&peer, policy));

        let conn = peer.accept().await;
        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;
        let lookups = store.chat_lookups();
        let release = store.gate_chat_lookup();

        conn.close().await;
        time::timeout(WAIT, async {
            while store.chat_lookups() == lookups {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reconnect never re-authorized");

        handle.dispose().await;
        let frozen = handle.view();
        let _ = release.send(());

        assert!(
            time::timeout(Duration::from_millis(200), peer.accept()).await.is_err(),
            "a channel was opened after dispose"
        );
        assert_eq!(handle.view(), frozen);
        assert_eq!(store.chat_lookups(), lookups + 1);
    }

    #[tokio::test]
    async fn test_reconnect_reauthorizes() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let policy = ReconnectPolicy::Backoff {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(50),
            max_attempts: Some(3),
        };
        let mut handle = start(Arc::clone(&store), pass, options(&peer, policy));

        let first = peer.accept().await;
        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;
        let lookups = store.chat_lookups();

        first.close().await;
        let mut second = peer.accept().await;
        wait_for(&handle, "reopened", |v| v.connection == ConnectionState::Open).await;
        assert_eq!(store.chat_lookups(), lookups + 1);

        second.send_text(r#"{"content":"after reconnect","user_id":2,"chat_id":7}"#).await;
        let view = wait_for(&handle, "message", |v| v.messages.len() == 1).await;
        assert!(!view.access_revoked);
        assert_eq!(store.history_loads(), 1);

        handle.dispose().await;
    }

    #[tokio::test]
    async fn test_reconnect_denied_when_membership_is_gone() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let policy = ReconnectPolicy::Backoff {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(50),
            max_attempts: None,
        };
        let mut handle = start(Arc::clone(&store), pass, options(&peer, policy));

        let conn = peer.accept().await;
        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;

        store.remove_chat(7);
        conn.close().await;

        let view = wait_for(&handle, "revocation", |v| v.access_revoked).await;
        assert!(view.connection.is_terminal());
        assert_eq!(
            handle.send_message(MessageDraft::text("hello?")).await,
            Err(SendError::NotOpen(view.connection))
        );

        handle.dispose().await;
    }

    #[tokio::test]
    async fn test_no_reconnect_by_default_policy_never() {
        let store = Arc::new(MemoryStore::new().with_chat(7, 1, 2));
        let peer = Peer::bind().await;
        let pass = pass_for(&store, 7, 1).await;
        let mut handle = start(Arc::clone(&store), pass, options(&peer, ReconnectPolicy::Never));

        let conn = peer.accept().await;
        wait_for(&handle, "open", |v| v.connection == ConnectionState::Open).await;
        let lookups = store.chat_lookups();
        conn.close().await;

        wait_for(&handle, "closed", |v| v.connection == ConnectionState::Closed).await;
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.chat_lookups(), lookups);

        handle.dispose().await;
    }

    #[test]
    fn test_initial_view() {
        let view = TimelineView::new(ChatId(7));
        assert_eq!(view.connection, ConnectionState::Connecting);
        assert_eq!(view.history, HistoryStatus::Pending);
        assert!(view.messages.is_empty());
    }
}
