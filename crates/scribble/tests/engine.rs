//! End-to-end tests: bytes in through the engine, events out of outboxes.

use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use scribble::prelude::*;
use scribble_protocol::{StrokePayload, TurnEndReason};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;

// =========================================================================
// Helpers
// =========================================================================

struct FixedWords;

impl WordBank for FixedWords {
    fn pick_words(
        &self,
        _theme: &str,
        _difficulty: Difficulty,
        count: usize,
        _rng: &mut dyn RngCore,
    ) -> Vec<String> {
        ["cat", "dog", "sun"]
            .iter()
            .take(count)
            .map(|w| w.to_string())
            .collect()
    }
}

type Outbox = UnboundedReceiver<ServerEvent>;

fn engine_with(config: EngineConfig) -> SessionEngine {
    SessionEngine::with_word_bank(&config, Arc::new(FixedWords))
}

fn engine() -> SessionEngine {
    engine_with(EngineConfig::default())
}

/// Everything already delivered to an outbox.
fn drain(rx: &mut Outbox) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn errors(events: &[ServerEvent]) -> Vec<ErrorCode> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::Error { code, .. } => Some(*code),
            _ => None,
        })
        .collect()
}

async fn send_json(engine: &SessionEngine, conn: ConnectionId, json: &str) {
    engine.dispatch_bytes(conn, json.as_bytes()).await;
}

/// Opens a connection and creates a room with it; returns the code.
async fn host_room(engine: &SessionEngine, name: &str) -> (ConnectionId, Outbox, RoomCode) {
    let (conn, mut rx) = engine.open();
    engine
        .dispatch(
            conn,
            ClientCommand::CreateRoom {
                name: name.into(),
                avatar: Avatar::default(),
                settings: RoomSettings::default(),
            },
        )
        .await;
    let code = drain(&mut rx)
        .into_iter()
        .find_map(|e| match e {
            ServerEvent::RoomCreated { code, .. } => Some(code),
            _ => None,
        })
        .expect("roomCreated");
    (conn, rx, code)
}

async fn join(engine: &SessionEngine, code: &RoomCode, name: &str) -> (ConnectionId, Outbox) {
    let (conn, mut rx) = engine.open();
    engine
        .dispatch(
            conn,
            ClientCommand::JoinRoom {
                code: code.clone(),
                name: name.into(),
                avatar: Avatar::default(),
            },
        )
        .await;
    assert!(matches!(
        drain(&mut rx).first(),
        Some(ServerEvent::RoomJoined { .. })
    ));
    (conn, rx)
}

fn guess(code: &RoomCode, text: &str) -> ClientCommand {
    ClientCommand::Guess {
        code: code.clone(),
        text: text.into(),
    }
}

// =========================================================================
// Decoding and errors
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_from_json_bytes() {
    let engine = engine();
    let (conn, mut rx) = engine.open();

    send_json(
        &engine,
        conn,
        r#"{"type":"createRoom","name":"ann","settings":{"rounds":2,"visibility":"private"}}"#,
    )
    .await;

    let events = drain(&mut rx);
    let Some(ServerEvent::RoomCreated { room, .. }) = events.first() else {
        panic!("expected roomCreated, got {events:?}");
    };
    assert_eq!(room.settings.rounds, 2);
    assert_eq!(room.settings.visibility, Visibility::Private);
    assert_eq!(room.players[0].name, "ann");
    assert_eq!(engine.registry().room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_bytes_answered_with_malformed_command() {
    let engine = engine();
    let (conn, mut rx) = engine.open();

    send_json(&engine, conn, "not json").await;
    send_json(&engine, conn, r#"{"type":"teleport"}"#).await;
    send_json(&engine, conn, r#"{"type":"startGame","code":"abc"}"#).await;

    assert_eq!(
        errors(&drain(&mut rx)),
        vec![ErrorCode::MalformedCommand; 3]
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_name_rejected() {
    let engine = engine();
    let (conn, mut rx) = engine.open();

    send_json(&engine, conn, r#"{"type":"createRoom","name":"  <> "}"#).await;

    assert_eq!(errors(&drain(&mut rx)), vec![ErrorCode::MalformedCommand]);
    assert_eq!(engine.registry().room_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_room_not_found() {
    let engine = engine();
    let (conn, mut rx) = engine.open();

    send_json(&engine, conn, r#"{"type":"joinRoom","code":"zzzzzz","name":"ann"}"#).await;

    assert_eq!(errors(&drain(&mut rx)), vec![ErrorCode::RoomNotFound]);
}

#[tokio::test(start_paused = true)]
async fn test_errors_go_to_origin_only() {
    let engine = engine();
    let (_host, mut host_rx, code) = host_room(&engine, "ann").await;
    let (bob, mut bob_rx) = join(&engine, &code, "bob").await;
    drain(&mut host_rx);

    engine
        .dispatch(bob, ClientCommand::StartGame { code: code.clone() })
        .await;

    assert_eq!(errors(&drain(&mut bob_rx)), vec![ErrorCode::NotHost]);
    assert!(drain(&mut host_rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_alone_not_enough_players() {
    let engine = engine();
    let (host, mut rx, code) = host_room(&engine, "ann").await;

    engine.dispatch(host, ClientCommand::StartGame { code }).await;

    assert_eq!(errors(&drain(&mut rx)), vec![ErrorCode::NotEnoughPlayers]);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_connection_rejected() {
    let engine = engine();
    let result = engine.handle(ConnectionId(99), ClientCommand::ListRooms).await;
    assert!(matches!(result, Err(ScribbleError::UnknownConnection(_))));
}

// =========================================================================
// Rate limiting
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_chat_over_limit_dropped_silently() {
    let mut config = EngineConfig::default();
    config.rate_limits.chat = WindowLimit::new(60, 2);
    let engine = engine_with(config);
    let (host, mut rx, code) = host_room(&engine, "ann").await;

    for _ in 0..5 {
        engine.dispatch(host, guess(&code, "hello")).await;
    }

    let events = drain(&mut rx);
    let chats = events
        .iter()
        .filter(|e| matches!(e, ServerEvent::ChatMessage { .. }))
        .count();
    assert_eq!(chats, 2);
    assert!(errors(&events).is_empty());

    // Control commands have their own budget.
    engine.dispatch(host, ClientCommand::ListRooms).await;
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [ServerEvent::RoomList { .. }]
    ));
}

// =========================================================================
// Game flow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_three_player_turn_scoring_and_ranks() {
    let engine = engine();
    let (ann, mut ann_rx, code) = host_room(&engine, "ann").await;
    let (bob, mut bob_rx) = join(&engine, &code, "bob").await;
    let (cy, mut cy_rx) = join(&engine, &code, "cy").await;

    engine
        .dispatch(ann, ClientCommand::StartGame { code: code.clone() })
        .await;
    engine
        .dispatch(
            ann,
            ClientCommand::SelectWord {
                code: code.clone(),
                word: "cat".into(),
            },
        )
        .await;
    let ann_events = drain(&mut ann_rx);
    assert!(ann_events.contains(&ServerEvent::WordChosen { word: "cat".into() }));
    assert!(errors(&ann_events).is_empty());
    // Guessers never see the word before the turn ends.
    assert!(
        !drain(&mut bob_rx)
            .iter()
            .any(|e| matches!(e, ServerEvent::WordChosen { .. }))
    );

    // bob is right straight away.
    engine.dispatch(bob, guess(&code, "CAT")).await;
    let correct = drain(&mut cy_rx)
        .into_iter()
        .find_map(|e| match e {
            ServerEvent::CorrectGuess { player_id, points, .. } => Some((player_id, points)),
            _ => None,
        })
        .expect("correctGuess");
    assert_eq!(correct, (bob, 180));

    // Second guesses and drawer guesses are refused.
    engine.dispatch(bob, guess(&code, "cat")).await;
    engine.dispatch(ann, guess(&code, "cat")).await;
    assert_eq!(errors(&drain(&mut bob_rx)), vec![ErrorCode::AlreadyGuessed]);
    assert_eq!(errors(&drain(&mut ann_rx)), vec![ErrorCode::DrawerCannotGuess]);

    // cy misses once (plain chat), then gets it ten seconds later.
    engine.dispatch(cy, guess(&code, "dog")).await;
    let chat = drain(&mut ann_rx);
    assert!(chat.iter().any(|e| matches!(
        e,
        ServerEvent::ChatMessage { text, is_system: false, .. } if text == "dog"
    )));

    time::advance(Duration::from_secs(10)).await;
    engine.dispatch(cy, guess(&code, "cat")).await;

    let events = drain(&mut ann_rx);
    let ended = events
        .iter()
        .find_map(|e| match e {
            ServerEvent::TurnEnded {
                word,
                reason,
                guess_order,
                players,
            } => Some((word.clone(), *reason, guess_order.clone(), players.clone())),
            _ => None,
        })
        .expect("turnEnded");
    let (word, reason, order, players) = ended;
    assert_eq!(word.as_deref(), Some("cat"));
    assert_eq!(reason, TurnEndReason::AllGuessed);
    assert_eq!(order, vec![bob, cy]);

    let by_id = |id: ConnectionId| players.iter().find(|p| p.id == id).unwrap();
    assert_eq!((by_id(bob).score, by_id(bob).rank), (180, 1));
    assert_eq!((by_id(cy).score, by_id(cy).rank), (170, 2));
    assert_eq!((by_id(ann).score, by_id(ann).rank), (0, 3));
}

#[tokio::test(start_paused = true)]
async fn test_strokes_relayed_to_others_only() {
    let engine = engine();
    let (ann, mut ann_rx, code) = host_room(&engine, "ann").await;
    let (bob, mut bob_rx) = join(&engine, &code, "bob").await;
    engine
        .dispatch(ann, ClientCommand::StartGame { code: code.clone() })
        .await;
    engine
        .dispatch(
            ann,
            ClientCommand::SelectWord {
                code: code.clone(),
                word: "sun".into(),
            },
        )
        .await;
    drain(&mut ann_rx);
    drain(&mut bob_rx);

    let stroke = StrokePayload(serde_json::json!({ "x": [1, 2], "y": [3, 4], "color": "#000" }));
    engine
        .dispatch(
            ann,
            ClientCommand::Draw {
                code: code.clone(),
                stroke: stroke.clone(),
            },
        )
        .await;
    engine
        .dispatch(ann, ClientCommand::ClearCanvas { code: code.clone() })
        .await;
    engine
        .dispatch(
            bob,
            ClientCommand::Draw {
                code: code.clone(),
                stroke: stroke.clone(),
            },
        )
        .await;

    assert_eq!(
        drain(&mut bob_rx),
        vec![
            ServerEvent::Drawing { from: ann, stroke },
            ServerEvent::CanvasCleared { from: ann },
            ServerEvent::Error {
                code: ErrorCode::NotYourTurn,
                message: GameError::NotYourTurn.to_string(),
            },
        ]
    );
    assert!(drain(&mut ann_rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_oversized_stroke_dropped_silently() {
    let engine = engine();
    let (ann, mut ann_rx, code) = host_room(&engine, "ann").await;
    let (_bob, mut bob_rx) = join(&engine, &code, "bob").await;
    engine
        .dispatch(ann, ClientCommand::StartGame { code: code.clone() })
        .await;
    engine
        .dispatch(
            ann,
            ClientCommand::SelectWord {
                code: code.clone(),
                word: "sun".into(),
            },
        )
        .await;
    drain(&mut bob_rx);

    let huge = StrokePayload(serde_json::json!({ "points": "x".repeat(20_000) }));
    engine
        .dispatch(ann, ClientCommand::Draw { code, stroke: huge })
        .await;

    assert!(drain(&mut bob_rx).is_empty());
    assert!(errors(&drain(&mut ann_rx)).is_empty());
}

// =========================================================================
// Membership through the engine
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_disconnect_reassigns_host_then_destroys_room() {
    let engine = engine();
    let (ann, _ann_rx, code) = host_room(&engine, "ann").await;
    let (bob, mut bob_rx) = join(&engine, &code, "bob").await;

    engine.disconnect(ann).await;

    let left = drain(&mut bob_rx);
    assert!(left.iter().any(|e| matches!(
        e,
        ServerEvent::PlayerLeft { player_id, host, .. } if *player_id == ann && *host == bob
    )));
    assert_eq!(engine.registry().room_count(), 1);

    engine.disconnect(bob).await;

    assert_eq!(engine.registry().room_count(), 0);
    assert_eq!(engine.connection_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_kick_player_through_engine() {
    let engine = engine();
    let (ann, mut ann_rx, code) = host_room(&engine, "ann").await;
    let (bob, mut bob_rx) = join(&engine, &code, "bob").await;
    drain(&mut ann_rx);

    engine
        .dispatch(
            ann,
            ClientCommand::KickPlayer {
                code: code.clone(),
                target: bob,
            },
        )
        .await;

    assert_eq!(drain(&mut bob_rx), vec![ServerEvent::Kicked { code: code.clone() }]);
    assert!(matches!(
        drain(&mut ann_rx).as_slice(),
        [ServerEvent::PlayerLeft { player_id, .. }] if *player_id == bob
    ));
    assert_eq!(engine.registry().find_room_of(bob), None);

    // Kicking yourself is not a thing.
    engine
        .dispatch(ann, ClientCommand::KickPlayer { code, target: ann })
        .await;
    assert_eq!(errors(&drain(&mut ann_rx)), vec![ErrorCode::InvalidTarget]);
}

#[tokio::test(start_paused = true)]
async fn test_quick_join_and_list_rooms() {
    let engine = engine();
    let (_ann, _ann_rx, code) = host_room(&engine, "ann").await;

    let (bob, mut bob_rx) = engine.open();
    send_json(&engine, bob, r#"{"type":"quickJoin","name":"bob"}"#).await;
    assert!(matches!(
        drain(&mut bob_rx).first(),
        Some(ServerEvent::RoomJoined { room }) if room.code == code
    ));

    let (cy, mut cy_rx) = engine.open();
    send_json(&engine, cy, r#"{"type":"listRooms"}"#).await;
    let Some(ServerEvent::RoomList { rooms }) = drain(&mut cy_rx).pop() else {
        panic!("expected roomList");
    };
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].code, code);
    assert_eq!(rooms[0].player_count, 2);
    assert_eq!(rooms[0].host_name, "ann");
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_quick_join_leaves_no_ghost() {
    let engine = engine();
    let (_ann, _rx, code) = host_room(&engine, "ann").await;
    let (bob, _bob_rx) = engine.open();

    tokio::join!(
        engine.dispatch(
            bob,
            ClientCommand::QuickJoin {
                name: "bob".into(),
                avatar: Avatar::default(),
            },
        ),
        engine.disconnect(bob),
    );

    assert_eq!(engine.registry().find_room_of(bob), None);
    let info = engine.registry().room_info(&code).await.unwrap();
    assert_eq!(info.player_count, 1);
    assert_eq!(engine.registry().room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_encode_uses_engine_codec() {
    let engine = engine();
    let bytes = engine
        .encode(&ServerEvent::RoomClosed {
            reason: "bye".into(),
        })
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["type"], "roomClosed");
    assert_eq!(json["reason"], "bye");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_rooms() {
    let engine = engine();
    let (_ann, mut ann_rx, _code) = host_room(&engine, "ann").await;

    engine.shutdown().await;
    time::sleep(Duration::from_millis(1)).await;

    assert!(
        drain(&mut ann_rx)
            .iter()
            .any(|e| matches!(e, ServerEvent::RoomClosed { .. }))
    );
    assert_eq!(engine.registry().room_count(), 0);
    assert_eq!(engine.connection_count(), 0);
}
