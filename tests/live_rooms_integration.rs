//! End-to-end tests for live rooms over the in-memory store and the
//! connection hub.
//!
//! These tests verify:
//! 1. The session lifecycle scenario with chat fanout to room members
//! 2. Per-room broadcast order under concurrent posts
//! 3. Disconnect cleanup and signaling after a peer leaves

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use live_rooms::adapters::{ConnectionHub, InMemorySessionStore};
use live_rooms::application::{
    ChatFanout, ChatPolicy, ClientCommand, CommandDispatcher, CreateSessionCommand,
    MembershipRegistry, RelayOutcome, RoomSequencer, SessionRegistry, SignalingRelay,
};
use live_rooms::domain::chat::ChatError;
use live_rooms::domain::foundation::{ConnectionId, RoomId, SessionStatus};
use live_rooms::domain::realtime::{LiveEvent, ParticipantInfo};
use live_rooms::domain::session::{Owner, SessionError};
use live_rooms::ports::{BroadcastBus, SessionStore};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    store: Arc<InMemorySessionStore>,
    hub: Arc<ConnectionHub>,
    registry: SessionRegistry,
    chat: Arc<ChatFanout>,
    relay: Arc<SignalingRelay>,
    dispatcher: CommandDispatcher,
}

impl Harness {
    fn new() -> Self {
        Self::with_policy(ChatPolicy::default())
    }

    fn with_policy(policy: ChatPolicy) -> Self {
        let store = Arc::new(InMemorySessionStore::new());
        let membership = MembershipRegistry::new();
        let hub = Arc::new(ConnectionHub::new(membership.clone(), 512));
        let bus: Arc<dyn BroadcastBus> = hub.clone();
        let sequencer = Arc::new(RoomSequencer::new());
        let store_port: Arc<dyn SessionStore> = store.clone();

        let registry = SessionRegistry::new(store_port.clone(), bus.clone(), sequencer.clone());
        let chat = Arc::new(ChatFanout::new(store_port, bus.clone(), sequencer, policy));
        let relay = Arc::new(SignalingRelay::new(membership, bus));
        let dispatcher = CommandDispatcher::new(chat.clone(), relay.clone());

        Self {
            store,
            hub,
            registry,
            chat,
            relay,
            dispatcher,
        }
    }

    async fn start(&self, username: &str, title: &str, room: &str) -> RoomId {
        let session = self
            .registry
            .create_session(CreateSessionCommand {
                owner: Owner::new("", username).unwrap(),
                title: title.to_string(),
                room_id: Some(RoomId::new(room).unwrap()),
            })
            .await
            .unwrap();
        session.room_id().clone()
    }

    async fn member(&self, room_id: &RoomId) -> (ConnectionId, mpsc::Receiver<LiveEvent>) {
        let (id, rx) = self.hub.register().await;
        self.relay
            .join_room(id, room_id.clone(), ParticipantInfo::default())
            .await;
        (id, rx)
    }
}

fn drain(rx: &mut mpsc::Receiver<LiveEvent>) -> Vec<LiveEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn named<'a>(events: &'a [LiveEvent], name: &str) -> Vec<&'a LiveEvent> {
    events.iter().filter(|e| e.name() == name).collect()
}

// =============================================================================
// Lifecycle scenario
// =============================================================================

#[tokio::test]
async fn session_chat_and_stop_scenario() {
    let h = Harness::new();
    let (_watcher, mut watcher_rx) = h.hub.register().await;

    let room = h.start("a", "demo", "R1").await;
    let (_member, mut member_rx) = h.member(&room).await;

    let message = h.chat.post_message(&room, "a", "hi").await.unwrap();
    assert_eq!(message.sequence(), 0);
    assert_eq!(message.text(), "hi");

    let stopped = h.registry.stop_session(&room, None).await.unwrap();
    assert_eq!(stopped.status(), SessionStatus::Stopped);
    assert!(stopped.end_time().is_some());
    assert_eq!(stopped.chat().len(), 1);

    // chat stays open after the stream stops
    let late = h.chat.post_message(&room, "b", "still here").await.unwrap();
    assert_eq!(late.sequence(), 1);

    let member_events = drain(&mut member_rx);
    let posted = named(&member_events, "new-message");
    assert_eq!(posted.len(), 2);
    assert!(matches!(posted[0], LiveEvent::NewMessage(m) if m.text() == "hi"));

    // global subscribers see the lifecycle but not room chat
    let watcher_events = drain(&mut watcher_rx);
    assert_eq!(named(&watcher_events, "session-started").len(), 1);
    assert_eq!(named(&watcher_events, "session-stopped").len(), 1);
    assert!(named(&watcher_events, "new-message").is_empty());

    let active = h.registry.list_active().await.unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn closed_chat_policy_rejects_posts_after_stop() {
    let h = Harness::with_policy(ChatPolicy {
        chat_after_stop: false,
        ..ChatPolicy::default()
    });
    let room = h.start("a", "demo", "R1").await;
    h.registry.stop_session(&room, None).await.unwrap();

    let err = h.chat.post_message(&room, "a", "hi").await.unwrap_err();
    assert!(matches!(err, ChatError::RoomClosed(_)));
}

#[tokio::test]
async fn duplicate_room_and_unknown_room_are_rejected_quietly() {
    let h = Harness::new();
    let (_watcher, mut rx) = h.hub.register().await;
    h.start("a", "demo", "R1").await;
    drain(&mut rx);

    let dup = h
        .registry
        .create_session(CreateSessionCommand {
            owner: Owner::new("", "b").unwrap(),
            title: "other".to_string(),
            room_id: Some(RoomId::new("R1").unwrap()),
        })
        .await;
    assert!(matches!(dup, Err(SessionError::Conflict(_))));

    let missing = RoomId::new("nope").unwrap();
    assert!(matches!(
        h.registry.stop_session(&missing, None).await,
        Err(SessionError::NotFound(_))
    ));
    assert!(matches!(
        h.chat.post_message(&missing, "a", "hi").await,
        Err(ChatError::RoomNotFound(_))
    ));

    assert!(drain(&mut rx).is_empty());
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn list_active_tracks_store_state() {
    let h = Harness::new();
    h.start("a", "one", "R1").await;
    let two = h.start("b", "two", "R2").await;
    h.start("c", "three", "R3").await;
    h.registry.stop_session(&two, None).await.unwrap();

    let active: Vec<String> = h
        .registry
        .list_active()
        .await
        .unwrap()
        .iter()
        .map(|s| s.room_id().to_string())
        .collect();
    assert_eq!(active.len(), 2);
    assert!(!active.contains(&"R2".to_string()));
    assert_eq!(h.registry.list_sessions().await.unwrap().len(), 3);
}

// =============================================================================
// Ordering under concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_broadcast_in_append_order() {
    let h = Harness::new();
    let room = h.start("a", "demo", "R1").await;
    let (_member, mut rx) = h.member(&room).await;

    let mut tasks = Vec::new();
    for i in 0..64 {
        let chat = h.chat.clone();
        let room = room.clone();
        tasks.push(tokio::spawn(async move {
            chat.post_message(&room, "a", &format!("msg {}", i)).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let sequences: Vec<u64> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            LiveEvent::NewMessage(message) => Some(message.sequence()),
            _ => None,
        })
        .collect();
    assert_eq!(sequences, (0..64).collect::<Vec<u64>>());

    let stored: Vec<u64> = h
        .chat
        .list_messages(&room)
        .await
        .unwrap()
        .iter()
        .map(|m| m.sequence())
        .collect();
    assert_eq!(stored, sequences);
}

// =============================================================================
// Signaling and disconnect
// =============================================================================

#[tokio::test]
async fn signals_flow_between_peers_until_disconnect() {
    let h = Harness::new();
    let room = RoomId::new("R1").unwrap();
    let (alice, mut alice_rx) = h.hub.register().await;
    let (bob, mut bob_rx) = h.hub.register().await;

    let joined = h
        .dispatcher
        .dispatch(
            alice,
            ClientCommand::JoinRoom {
                room_id: room.clone(),
                info: ParticipantInfo::named("alice"),
            },
        )
        .await;
    assert!(matches!(joined, Some(LiveEvent::RoomJoined { ref peers, .. }) if peers.is_empty()));

    let joined = h
        .dispatcher
        .dispatch(
            bob,
            ClientCommand::JoinRoom {
                room_id: room.clone(),
                info: ParticipantInfo::named("bob"),
            },
        )
        .await;
    assert!(matches!(joined, Some(LiveEvent::RoomJoined { ref peers, .. }) if peers.len() == 1));
    assert_eq!(named(&drain(&mut alice_rx), "participant-joined").len(), 1);

    h.dispatcher
        .dispatch(
            alice,
            ClientCommand::RelaySignal {
                to: bob,
                signal: json!({"sdp": "offer"}),
            },
        )
        .await;
    let received = drain(&mut bob_rx);
    assert!(matches!(
        received.as_slice(),
        [LiveEvent::ReceiveSignal { from, signal }] if *from == alice && signal["sdp"] == "offer"
    ));

    h.dispatcher.dispatch(bob, ClientCommand::Disconnect).await;
    h.hub.unregister(&bob).await;

    assert!(h.relay.membership().rooms_of(&bob).await.is_empty());
    assert_eq!(named(&drain(&mut alice_rx), "participant-left").len(), 1);

    let outcome = h.relay.relay_signal(alice, bob, json!({})).await;
    assert_eq!(outcome, RelayOutcome::Dropped);
    assert!(drain(&mut bob_rx).is_empty());

    // disconnecting twice is harmless
    assert!(h.relay.handle_disconnect(&bob).await.is_empty());
}

#[tokio::test]
async fn rejected_chat_command_replies_with_error_event() {
    let h = Harness::new();
    let (conn, _rx) = h.hub.register().await;

    let reply = h
        .dispatcher
        .dispatch(
            conn,
            ClientCommand::PostMessage {
                room_id: RoomId::new("ghost").unwrap(),
                author: "a".to_string(),
                text: "hi".to_string(),
            },
        )
        .await;

    match reply {
        Some(LiveEvent::Error { code, .. }) => assert_eq!(code, "SESSION_NOT_FOUND"),
        other => panic!("expected error event, got {:?}", other),
    }
}
