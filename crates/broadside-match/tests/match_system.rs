//! Integration tests for the match layer: manager, actors, channels.
//!
//! These drive full sessions the way the server does — commands through
//! `MatchManager`, envelopes back over per-player channels — with no
//! network involved.

use std::time::Duration;

use broadside_board::{Ruleset, ShipSpec};
use broadside_match::{MatchConfig, MatchError, MatchManager};
use broadside_protocol::{
    AttackOutcome, CellState, ClientMessage, ErrorCode, Phase, PlayerId,
    ServerMessage,
};
use tokio::sync::mpsc;

type Rx = mpsc::UnboundedReceiver<ServerMessage>;

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

// =========================================================================
// Helpers
// =========================================================================

/// A manager whose sessions play with a single size-3 ship and reap
/// ended sessions immediately.
fn manager() -> MatchManager {
    MatchManager::new(MatchConfig {
        ruleset: Ruleset::with_fleet(vec![ShipSpec::new(
            "cruiser-1",
            "Cruiser",
            3,
        )]),
        extra_turn_on_hit: true,
        end_grace: Duration::from_secs(0),
    })
}

async fn recv(rx: &mut Rx) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for envelope")
        .expect("channel closed")
}

/// Receives until a non-`state` envelope arrives, returning it.
async fn recv_skip_states(rx: &mut Rx) -> ServerMessage {
    loop {
        match recv(rx).await {
            ServerMessage::State { .. } => continue,
            other => return other,
        }
    }
}

/// Receives until a `state` envelope arrives, returning its snapshot.
async fn recv_snapshot(rx: &mut Rx) -> broadside_protocol::Snapshot {
    loop {
        if let ServerMessage::State { snapshot } = recv(rx).await {
            return snapshot;
        }
    }
}

/// Joins both players into one session and drains their join traffic.
async fn paired(mgr: &mut MatchManager) -> (Rx, Rx) {
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();

    let s1 = mgr.join_or_create(P1, "one".into(), tx1).await.unwrap();
    let s2 = mgr.join_or_create(P2, "two".into(), tx2).await.unwrap();
    assert_eq!(s1, s2, "two waiting players pair into one session");

    // P1: Joined + its own snapshot + P2's arrival + refreshed snapshot.
    assert!(matches!(recv(&mut rx1).await, ServerMessage::Joined { .. }));
    assert!(matches!(recv(&mut rx1).await, ServerMessage::State { .. }));
    assert!(matches!(
        recv(&mut rx1).await,
        ServerMessage::OpponentJoined { .. }
    ));
    assert!(matches!(recv(&mut rx1).await, ServerMessage::State { .. }));
    // P2: Joined + snapshot.
    assert!(matches!(recv(&mut rx2).await, ServerMessage::Joined { .. }));
    assert!(matches!(recv(&mut rx2).await, ServerMessage::State { .. }));

    (rx1, rx2)
}

async fn place_and_ready(
    mgr: &MatchManager,
    rx1: &mut Rx,
    rx2: &mut Rx,
) {
    mgr.route_message(
        P1,
        ClientMessage::PlaceShip {
            ship_id: "cruiser-1".into(),
            row: 0,
            col: 0,
            vertical: false,
        },
    )
    .await
    .unwrap();
    let _ = recv_snapshot(rx1).await;

    mgr.route_message(
        P2,
        ClientMessage::PlaceShip {
            ship_id: "cruiser-1".into(),
            row: 5,
            col: 0,
            vertical: false,
        },
    )
    .await
    .unwrap();
    let _ = recv_snapshot(rx2).await;

    mgr.route_message(P1, ClientMessage::Ready).await.unwrap();
    let _ = recv_snapshot(rx1).await; // waiting-for-opponent
    assert!(matches!(
        recv_skip_states(rx2).await,
        ServerMessage::OpponentReady
    ));

    mgr.route_message(P2, ClientMessage::Ready).await.unwrap();
    // Start handoff: waiting-active then active, to both.
    assert!(matches!(
        recv_skip_states(rx1).await,
        ServerMessage::OpponentReady
    ));
    let starting = recv_snapshot(rx1).await;
    assert_eq!(starting.phase, Phase::WaitingActive);
    assert_eq!(starting.your_turn, Some(true), "slot 0 starts");
    let active = recv_snapshot(rx1).await;
    assert_eq!(active.phase, Phase::Active);

    let starting = recv_snapshot(rx2).await;
    assert_eq!(starting.phase, Phase::WaitingActive);
    assert_eq!(starting.your_turn, Some(false));
    let active = recv_snapshot(rx2).await;
    assert_eq!(active.phase, Phase::Active);
}

async fn attack(mgr: &MatchManager, who: PlayerId, row: u8, col: u8) {
    mgr.route_message(who, ClientMessage::Attack { row, col })
        .await
        .unwrap();
}

// =========================================================================
// Pairing
// =========================================================================

#[tokio::test]
async fn test_third_player_opens_second_session() {
    let mut mgr = manager();
    let _ = paired(&mut mgr).await;

    let (tx3, mut rx3) = mpsc::unbounded_channel();
    let s3 = mgr
        .join_or_create(PlayerId(3), "three".into(), tx3)
        .await
        .unwrap();

    assert_eq!(mgr.session_count(), 2);
    assert_eq!(mgr.session_of(&PlayerId(3)), Some(s3));
    assert!(matches!(recv(&mut rx3).await, ServerMessage::Joined { .. }));
}

#[tokio::test]
async fn test_join_while_in_session_rejected() {
    let mut mgr = manager();
    let _ = paired(&mut mgr).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let result = mgr.join_or_create(P1, "one".into(), tx).await;
    assert!(matches!(
        result,
        Err(MatchError::AlreadyInSession(pid, _)) if pid == P1
    ));
}

#[tokio::test]
async fn test_route_message_without_session_rejected() {
    let mgr = manager();
    let result = mgr
        .route_message(P1, ClientMessage::Ready)
        .await;
    assert!(matches!(result, Err(MatchError::NotInSession(_))));
}

// =========================================================================
// Full game
// =========================================================================

#[tokio::test]
async fn test_full_game_to_win() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = paired(&mut mgr).await;
    place_and_ready(&mgr, &mut rx1, &mut rx2).await;

    // P2's ship is at (5,0)..(5,2). Three hits; extra turn on hit keeps
    // P1 on the move throughout.
    attack(&mgr, P1, 5, 0).await;
    let snap = recv_snapshot(&mut rx1).await;
    assert!(matches!(
        snap.last_attack.as_ref().unwrap().outcome,
        AttackOutcome::Hit
    ));
    let _ = recv_snapshot(&mut rx2).await;

    attack(&mgr, P1, 5, 1).await;
    let _ = recv_snapshot(&mut rx1).await;
    let _ = recv_snapshot(&mut rx2).await;

    attack(&mgr, P1, 5, 2).await;
    let snap = recv_snapshot(&mut rx1).await;
    assert_eq!(snap.phase, Phase::Ended);
    assert_eq!(snap.winner, Some(P1));
    assert!(matches!(
        snap.last_attack.as_ref().unwrap().outcome,
        AttackOutcome::Win { ref ship_id } if ship_id == "cruiser-1"
    ));
    assert!(matches!(
        recv_skip_states(&mut rx1).await,
        ServerMessage::GameEnded { winner_id, .. } if winner_id == P1
    ));
    assert!(matches!(
        recv_skip_states(&mut rx2).await,
        ServerMessage::GameEnded { winner_id, .. } if winner_id == P1
    ));
}

#[tokio::test]
async fn test_miss_passes_turn_between_players() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = paired(&mut mgr).await;
    place_and_ready(&mgr, &mut rx1, &mut rx2).await;

    attack(&mgr, P1, 9, 9).await; // miss
    let snap = recv_snapshot(&mut rx1).await;
    assert_eq!(snap.your_turn, Some(false));
    let snap = recv_snapshot(&mut rx2).await;
    assert_eq!(snap.your_turn, Some(true));

    attack(&mgr, P2, 9, 9).await; // miss back
    let snap = recv_snapshot(&mut rx1).await;
    assert_eq!(snap.your_turn, Some(true));
    let _ = recv_snapshot(&mut rx2).await;
}

#[tokio::test]
async fn test_wrong_turn_error_goes_to_sender_only() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = paired(&mut mgr).await;
    place_and_ready(&mgr, &mut rx1, &mut rx2).await;

    attack(&mgr, P2, 0, 0).await; // P1 starts; P2 is out of turn
    assert!(matches!(
        recv(&mut rx2).await,
        ServerMessage::Error {
            code: ErrorCode::NotYourTurn,
            ..
        }
    ));

    // P1 heard nothing about it and can play normally.
    attack(&mgr, P1, 9, 9).await;
    let snap = recv_snapshot(&mut rx1).await;
    assert_eq!(snap.phase, Phase::Active);
}

// =========================================================================
// Reconnection
// =========================================================================

#[tokio::test]
async fn test_rebind_resumes_session_with_exact_state() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = paired(&mut mgr).await;
    place_and_ready(&mgr, &mut rx1, &mut rx2).await;

    attack(&mgr, P1, 5, 0).await; // hit
    let _ = recv_snapshot(&mut rx1).await;
    let _ = recv_snapshot(&mut rx2).await;

    // P1's connection drops and a new one rebinds.
    drop(rx1);
    mgr.disconnected(P1).await;
    assert!(matches!(
        recv_skip_states(&mut rx2).await,
        ServerMessage::OpponentLeft
    ));

    let (tx1b, mut rx1b) = mpsc::unbounded_channel();
    let session = mgr.rebind(P1, tx1b).await.unwrap();
    assert_eq!(mgr.session_of(&P1), Some(session));

    assert!(matches!(
        recv(&mut rx1b).await,
        ServerMessage::Joined { .. }
    ));
    let snap = recv_snapshot(&mut rx1b).await;
    assert_eq!(snap.phase, Phase::Active);
    assert_eq!(snap.your_turn, Some(true), "hit retained the turn");
    assert_eq!(
        snap.opponent.unwrap().grid[5][0].state,
        CellState::Hit,
        "attack history survived the reconnect"
    );
    assert!(matches!(
        recv_skip_states(&mut rx2).await,
        ServerMessage::OpponentJoined { .. }
    ));

    // Still one session, two members, and the game goes on.
    assert_eq!(mgr.session_count(), 1);
    attack(&mgr, P1, 5, 1).await;
    let snap = recv_snapshot(&mut rx1b).await;
    assert!(matches!(
        snap.last_attack.unwrap().outcome,
        AttackOutcome::Hit
    ));
}

#[tokio::test]
async fn test_rebind_without_session_rejected() {
    let mut mgr = manager();
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = mgr.rebind(P1, tx).await;
    assert!(matches!(result, Err(MatchError::NotInSession(_))));
}

// =========================================================================
// Leaving and abandonment
// =========================================================================

#[tokio::test]
async fn test_leave_before_start_disbands_session() {
    let mut mgr = manager();
    let (_rx1, mut rx2) = paired(&mut mgr).await;

    mgr.leave(P1).await.unwrap();

    assert!(matches!(
        recv_skip_states(&mut rx2).await,
        ServerMessage::OpponentLeft
    ));
    assert_eq!(mgr.session_count(), 0);
    assert_eq!(mgr.session_of(&P1), None);
    assert_eq!(
        mgr.session_of(&P2),
        None,
        "remaining player freed for new matchmaking"
    );
}

#[tokio::test]
async fn test_leave_during_game_concedes() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = paired(&mut mgr).await;
    place_and_ready(&mgr, &mut rx1, &mut rx2).await;

    mgr.leave(P1).await.unwrap();

    assert!(matches!(
        recv_skip_states(&mut rx2).await,
        ServerMessage::GameEnded { winner_id, .. } if winner_id == P2
    ));
    // The ended session lingers for the grace period (0 here), then
    // reaping releases the winner too.
    mgr.reap_finished().await;
    assert_eq!(mgr.session_count(), 0);
    assert_eq!(mgr.session_of(&P2), None);
}

#[tokio::test]
async fn test_abandonment_forfeits_to_survivor() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = paired(&mut mgr).await;
    place_and_ready(&mgr, &mut rx1, &mut rx2).await;

    // The grace period expired for P2 (decided by the identity layer);
    // the manager forfeits their session.
    mgr.forfeit(P2).await;

    assert!(matches!(
        recv_skip_states(&mut rx1).await,
        ServerMessage::GameEnded { winner_id, .. } if winner_id == P1
    ));
    assert_eq!(mgr.session_of(&P2), None);

    mgr.reap_finished().await;
    assert_eq!(mgr.session_count(), 0);
}

#[tokio::test]
async fn test_reap_keeps_live_sessions() {
    let mut mgr = manager();
    let (mut rx1, mut rx2) = paired(&mut mgr).await;
    place_and_ready(&mgr, &mut rx1, &mut rx2).await;

    mgr.reap_finished().await;

    assert_eq!(mgr.session_count(), 1, "active session untouched");
}

// =========================================================================
// Chat
// =========================================================================

#[tokio::test]
async fn test_chat_reaches_peer_only() {
    let mut mgr = manager();
    let (_rx1, mut rx2) = paired(&mut mgr).await;

    mgr.route_message(
        P1,
        ClientMessage::Chat {
            text: "gl hf".into(),
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        recv_skip_states(&mut rx2).await,
        ServerMessage::Chat { from, ref text } if from == P1 && text == "gl hf"
    ));
}
