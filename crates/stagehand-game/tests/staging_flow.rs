//! End-to-end tests for the per-tick pass.
//!
//! Each player is the far end of a `tokio::io::duplex` pipe. Tests write
//! client intents on it, wait until the pump has queued them, run one
//! `Game::step`, and read what the server sent back.

use std::time::Duration;

use stagehand_game::{Game, Phase, PlaceholderActive, Staging, StagingConfig, StepReport};
use stagehand_protocol::{
    ClientId, Frame, Message, MessageType, Role, intent, read_frame, role_request, write_frame,
};
use tokio::io::DuplexStream;

// =========================================================================
// Helpers
// =========================================================================

const DT: Duration = Duration::from_millis(100);

fn game() -> Game {
    Game::new(
        StagingConfig {
            min_players: 2,
            countdown: Duration::from_millis(300),
        },
        PlaceholderActive::new(),
    )
}

async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached within a second");
}

/// The remote end of one client connection.
struct Player {
    id: ClientId,
    peer: DuplexStream,
}

impl Player {
    async fn next_frame(&mut self) -> Frame {
        tokio::time::timeout(Duration::from_secs(1), read_frame(&mut self.peer))
            .await
            .expect("timed out waiting for a frame")
            .expect("read failed")
            .expect("stream closed")
    }

    async fn next(&mut self) -> Message {
        Message::from_frame(&self.next_frame().await).expect("server sent a valid message")
    }

    async fn assert_silent(&mut self) {
        let result =
            tokio::time::timeout(Duration::from_millis(50), read_frame(&mut self.peer)).await;
        assert!(result.is_err(), "expected no frame, got {result:?}");
    }
}

async fn connect(game: &mut Game) -> Player {
    let (server, peer) = tokio::io::duplex(4096);
    let id = game
        .admit(server)
        .expect("admit should succeed")
        .expect("staging accepts connections");
    Player { id, peer }
}

/// Two players, both announced and synced, with their join traffic read.
async fn lobby(game: &mut Game) -> (Player, Player) {
    let mut a = connect(game).await;
    a.next().await;
    let mut b = connect(game).await;
    a.next().await;
    b.next().await;
    (a, b)
}

/// Writes `frame` as `player`, waits for the pump, and runs one tick.
async fn deliver(game: &mut Game, player: &mut Player, frame: Frame) -> StepReport {
    write_frame(&mut player.peer, &frame).await.unwrap();
    let id = player.id;
    eventually(|| {
        game.registry()
            .get(id)
            .is_some_and(|c| c.connection().pending() > 0)
    })
    .await;
    let report = game.step(DT);
    assert_invariants(game);
    report
}

fn assert_invariants(game: &Game) {
    let registry = game.registry();
    let state = game.staging().state();
    assert_eq!(state.unready, registry.count_role(Role::Unassigned));
    assert!(registry.count_role(Role::Robber) <= 1);
    match state.robber {
        Some(id) => assert_eq!(registry.role(id), Some(Role::Robber)),
        None => assert_eq!(registry.count_role(Role::Robber), 0),
    }
}

/// Both players pick roles and the second votes; the countdown is running
/// and every resulting broadcast has been read.
async fn start_countdown(game: &mut Game, a: &mut Player, b: &mut Player) {
    deliver(game, a, role_request(Role::Robber)).await;
    a.next().await;
    b.next().await;
    deliver(game, b, role_request(Role::Cop)).await;
    a.next().await;
    b.next().await;

    deliver(game, b, intent(MessageType::VoteToStart)).await;
    assert_eq!(a.next().await, Message::VoteToStart { id: b.id });
    assert_eq!(b.next().await, Message::VoteToStart { id: b.id });
    assert!(game.staging().state().starting);
}

// =========================================================================
// Joins
// =========================================================================

#[tokio::test]
async fn test_join_sync_and_announce() {
    let mut game = game();

    let mut a = connect(&mut game).await;
    assert_eq!(a.id, ClientId(0));
    assert_eq!(
        a.next().await,
        Message::PlayerSync {
            new_id: ClientId(0),
            roster: vec![],
        }
    );

    let mut b = connect(&mut game).await;
    assert_eq!(b.id, ClientId(1));
    assert_eq!(a.next().await, Message::PlayerConnect { id: ClientId(1) });
    assert_eq!(
        b.next().await,
        Message::PlayerSync {
            new_id: ClientId(1),
            roster: vec![(ClientId(0), Role::Unassigned)],
        }
    );

    assert_eq!(game.staging().state().unready, 2);
    assert_invariants(&game);
}

#[tokio::test]
async fn test_sync_carries_current_roles() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    deliver(&mut game, &mut a, role_request(Role::Robber)).await;
    a.next().await;
    b.next().await;

    let mut c = connect(&mut game).await;
    assert_eq!(
        c.next().await,
        Message::PlayerSync {
            new_id: ClientId(2),
            roster: vec![(ClientId(0), Role::Robber), (ClientId(1), Role::Unassigned)],
        }
    );
}

#[tokio::test]
async fn test_full_session_refuses_more_joins() {
    let mut game = game();
    let mut players = Vec::new();
    for _ in 0..Staging::MAX_CLIENTS {
        players.push(connect(&mut game).await);
    }

    let last = players.last_mut().unwrap();
    match last.next().await {
        Message::PlayerSync { new_id, roster } => {
            assert_eq!(new_id, ClientId(126));
            assert_eq!(roster.len(), Staging::MAX_CLIENTS - 1);
        }
        other => panic!("expected PlayerSync, got {other:?}"),
    }

    for _ in 0..3 {
        let (server, mut extra) = tokio::io::duplex(1024);
        assert!(game.admit(server).unwrap().is_none());
        assert!(read_frame(&mut extra).await.unwrap().is_none());
    }

    assert_eq!(game.registry().len(), Staging::MAX_CLIENTS);
    assert_eq!(game.staging().state().unready, Staging::MAX_CLIENTS);
    assert_invariants(&game);
}

// =========================================================================
// Votes and vetoes
// =========================================================================

#[tokio::test]
async fn test_vote_ignored_while_anyone_unready() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;

    deliver(&mut game, &mut a, role_request(Role::Cop)).await;
    a.next().await;
    b.next().await;

    let report = deliver(&mut game, &mut a, intent(MessageType::VoteToStart)).await;
    assert_eq!(report.handled, 1);
    assert!(!game.staging().state().starting);
    a.assert_silent().await;
    b.assert_silent().await;
}

#[tokio::test]
async fn test_vote_ignored_with_single_player() {
    let mut game = game();
    let mut a = connect(&mut game).await;
    a.next().await;

    deliver(&mut game, &mut a, role_request(Role::Cop)).await;
    a.next().await;
    deliver(&mut game, &mut a, intent(MessageType::VoteToStart)).await;
    assert!(!game.staging().state().starting);
    a.assert_silent().await;
}

#[tokio::test]
async fn test_countdown_then_start_then_placeholder_ticks() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    start_countdown(&mut game, &mut a, &mut b).await;

    // The vote tick counted 100 ms; 300 ms is not yet past the threshold.
    for _ in 0..2 {
        assert!(!game.step(DT).started);
    }
    assert_eq!(game.phase(), Phase::Staging);

    let report = game.step(DT);
    assert!(report.started);
    assert_eq!(game.phase(), Phase::Active);
    assert_eq!(a.next().await, Message::StartGame);
    assert_eq!(b.next().await, Message::StartGame);
    // No gameplay on the transition tick itself.
    a.assert_silent().await;

    game.step(DT);
    assert_eq!(a.next_frame().await.payload(), PlaceholderActive::PAYLOAD);
    assert_eq!(b.next_frame().await.payload(), PlaceholderActive::PAYLOAD);
}

#[tokio::test]
async fn test_veto_cancels_countdown() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    start_countdown(&mut game, &mut a, &mut b).await;

    deliver(&mut game, &mut a, intent(MessageType::VetoStart)).await;
    assert_eq!(a.next().await, Message::VetoStart { id: a.id });
    assert_eq!(b.next().await, Message::VetoStart { id: a.id });
    assert!(!game.staging().state().starting);

    for _ in 0..10 {
        game.step(DT);
    }
    assert_eq!(game.phase(), Phase::Staging);
    a.assert_silent().await;
}

#[tokio::test]
async fn test_veto_without_countdown_is_ignored() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;

    deliver(&mut game, &mut a, intent(MessageType::VetoStart)).await;
    a.assert_silent().await;
    b.assert_silent().await;
}

// =========================================================================
// Roles
// =========================================================================

#[tokio::test]
async fn test_role_change_broadcast_to_everyone() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;

    deliver(&mut game, &mut b, role_request(Role::Robber)).await;
    let expected = Message::RoleChange {
        id: b.id,
        role: Role::Robber,
    };
    assert_eq!(a.next().await, expected);
    assert_eq!(b.next().await, expected);
    assert_eq!(game.registry().role(b.id), Some(Role::Robber));
    assert_eq!(game.staging().state().robber, Some(b.id));
}

#[tokio::test]
async fn test_second_robber_rejected_privately() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;

    deliver(&mut game, &mut a, role_request(Role::Robber)).await;
    a.next().await;
    b.next().await;

    deliver(&mut game, &mut b, role_request(Role::Robber)).await;
    assert_eq!(b.next().await, Message::RoleChangeRejection { holder: a.id });
    a.assert_silent().await;
    assert_eq!(game.registry().role(b.id), Some(Role::Unassigned));
}

#[tokio::test]
async fn test_roles_frozen_during_countdown() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    start_countdown(&mut game, &mut a, &mut b).await;

    deliver(&mut game, &mut a, role_request(Role::Cop)).await;
    a.assert_silent().await;
    b.assert_silent().await;
    assert_eq!(game.registry().role(a.id), Some(Role::Robber));
}

// =========================================================================
// Bad input
// =========================================================================

#[tokio::test]
async fn test_unknown_and_malformed_messages_are_discarded() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    let before = game.staging().state().clone();

    for payload in [vec![42, 1, 2], vec![MessageType::RoleChange.tag()], vec![6, 9]] {
        let report = deliver(&mut game, &mut a, Frame::new(payload).unwrap()).await;
        assert_eq!(report.discarded, 1);
        assert_eq!(report.handled, 0);
    }

    assert_eq!(game.staging().state(), &before);
    assert!(game.registry().get(a.id).unwrap().is_connected());
    a.assert_silent().await;
    b.assert_silent().await;
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_disconnect_during_countdown_cancels_it() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    start_countdown(&mut game, &mut a, &mut b).await;

    let gone = a.id;
    drop(a);
    eventually(|| !game.registry().get(gone).unwrap().is_connected()).await;

    let report = game.step(DT);
    assert_eq!(report.departed, vec![gone]);
    assert_invariants(&game);

    assert_eq!(b.next().await, Message::PlayerDisconnect { id: gone });
    assert_eq!(b.next().await, Message::VetoStart { id: gone });

    let state = game.staging().state();
    assert!(!state.starting);
    assert_eq!(state.robber, None);
    assert_eq!(game.registry().len(), 1);
}

#[tokio::test]
async fn test_ids_are_not_reused() {
    let mut game = game();
    let (a, mut b) = lobby(&mut game).await;

    let gone = a.id;
    drop(a);
    eventually(|| !game.registry().get(gone).unwrap().is_connected()).await;
    game.step(DT);
    assert_eq!(b.next().await, Message::PlayerDisconnect { id: gone });
    assert_eq!(game.staging().state().unready, 1);

    let c = connect(&mut game).await;
    assert_eq!(c.id, ClientId(2));
    assert_eq!(b.next().await, Message::PlayerConnect { id: c.id });
}

#[tokio::test]
async fn test_active_disconnect_is_announced() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    start_countdown(&mut game, &mut a, &mut b).await;
    while !game.step(DT).started {}
    a.next().await;
    b.next().await;

    let gone = b.id;
    drop(b);
    eventually(|| !game.registry().get(gone).unwrap().is_connected()).await;
    game.step(DT);

    assert_eq!(a.next().await, Message::PlayerDisconnect { id: gone });
    assert_eq!(a.next_frame().await.payload(), PlaceholderActive::PAYLOAD);
}

// =========================================================================
// Active phase
// =========================================================================

#[tokio::test]
async fn test_connections_refused_once_active() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    start_countdown(&mut game, &mut a, &mut b).await;
    while !game.step(DT).started {}

    let (server, mut late) = tokio::io::duplex(1024);
    assert!(game.admit(server).unwrap().is_none());
    assert_eq!(game.registry().len(), 2);

    let eof = read_frame(&mut late).await.unwrap();
    assert!(eof.is_none(), "refused stream should be closed");
}

#[tokio::test]
async fn test_staging_messages_ignored_once_active() {
    let mut game = game();
    let (mut a, mut b) = lobby(&mut game).await;
    start_countdown(&mut game, &mut a, &mut b).await;
    while !game.step(DT).started {}

    let report = deliver(&mut game, &mut a, intent(MessageType::VetoStart)).await;
    assert_eq!(report.discarded, 1);
    assert_eq!(game.phase(), Phase::Active);
}
