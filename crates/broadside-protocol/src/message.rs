//! The `{ "type": ..., "data": ... }` envelopes themselves.
//!
//! Both directions use the same adjacently tagged layout, so a `ready`
//! envelope is `{"type": "ready"}` and a placement is
//! `{"type": "place-ship", "data": {"shipId": "...", "row": 0, ...}}`.
//! Modeling the envelope as a tagged enum means an envelope with an
//! unknown `type`, or with data of the wrong shape, fails to decode at
//! the protocol boundary — the dispatcher never has to inspect untyped
//! payloads.

use serde::{Deserialize, Serialize};

use crate::{
    AttackReport, ErrorCode, PlayerId, SessionId, Snapshot,
};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Present (or request) a durable identity. Must be the first
    /// envelope on every connection. A valid token rebinds the
    /// connection to the existing player and any in-progress session.
    Identify {
        token: Option<String>,
        name: Option<String>,
    },

    /// Enter matchmaking: join a waiting session or open a new one.
    Join,

    /// Place (or re-place) one ship on the sender's own board.
    PlaceShip {
        ship_id: String,
        row: u8,
        col: u8,
        vertical: bool,
    },

    /// Declare placement complete. Rejected until the whole fleet is
    /// legally placed.
    Ready,

    /// Fire at one cell of the opponent's board.
    Attack { row: u8, col: u8 },

    /// Free-text line relayed to the peer.
    Chat { text: String },

    /// Leave the current session (concede if the game is live).
    Leave,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Reply to `identify`: the durable identity and the token the
    /// client must persist to survive reloads and reconnects.
    Identity {
        player_id: PlayerId,
        token: String,
        name: String,
    },

    /// Reply to `join`: the session the sender now belongs to.
    Joined { session_id: SessionId },

    /// A peer was paired into (or reconnected to) the session.
    OpponentJoined { name: String },

    /// The peer disconnected or left.
    OpponentLeft,

    /// The peer finished placement.
    OpponentReady,

    /// Relayed chat line.
    Chat { from: PlayerId, text: String },

    /// Authoritative snapshot; the client reconciles its local replica
    /// against this, never the other way around.
    State { snapshot: Snapshot },

    /// Terminal notice. Also carried inside the final `state` snapshot;
    /// sent separately so a minimal client can react without diffing.
    GameEnded {
        winner_id: PlayerId,
        last_attack: Option<AttackReport>,
    },

    /// A rejected action, reported to the originating client only.
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    /// Shorthand for an error reply.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is the contract with every client in the wild, so
    //! these tests pin exact JSON shapes, not just round-trip equality.

    use super::*;
    use crate::{BoardView, Phase};

    fn board(size: u8) -> BoardView {
        BoardView {
            size,
            grid: Vec::new(),
            ships: Vec::new(),
            last_attack: None,
        }
    }

    // =====================================================================
    // ClientMessage shapes
    // =====================================================================

    #[test]
    fn test_identify_json_shape() {
        let msg = ClientMessage::Identify {
            token: Some("abc123".into()),
            name: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "identify");
        assert_eq!(json["data"]["token"], "abc123");
        assert!(json["data"]["name"].is_null());
    }

    #[test]
    fn test_identify_without_token_round_trip() {
        let msg = ClientMessage::Identify {
            token: None,
            name: Some("Annija".into()),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_place_ship_json_shape() {
        let msg = ClientMessage::PlaceShip {
            ship_id: "cruiser-1".into(),
            row: 2,
            col: 5,
            vertical: true,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "place-ship");
        assert_eq!(json["data"]["shipId"], "cruiser-1");
        assert_eq!(json["data"]["row"], 2);
        assert_eq!(json["data"]["col"], 5);
        assert_eq!(json["data"]["vertical"], true);
    }

    #[test]
    fn test_ready_is_bare_type_tag() {
        let json = serde_json::to_value(&ClientMessage::Ready).unwrap();
        assert_eq!(json["type"], "ready");
        // Unit variants carry no data member at all.
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_ready_decodes_with_null_data() {
        // Some clients send an explicit `"data": null`; accept it.
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"ready","data":null}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ready);
    }

    #[test]
    fn test_attack_json_shape() {
        let msg = ClientMessage::Attack { row: 9, col: 0 };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "attack");
        assert_eq!(json["data"]["row"], 9);
        assert_eq!(json["data"]["col"], 0);
    }

    #[test]
    fn test_client_message_round_trip_all_variants() {
        let msgs = [
            ClientMessage::Identify {
                token: Some("t".into()),
                name: Some("n".into()),
            },
            ClientMessage::Join,
            ClientMessage::PlaceShip {
                ship_id: "s".into(),
                row: 0,
                col: 0,
                vertical: false,
            },
            ClientMessage::Ready,
            ClientMessage::Attack { row: 3, col: 4 },
            ClientMessage::Chat { text: "gl hf".into() },
            ClientMessage::Leave,
        ];
        for msg in msgs {
            let json = serde_json::to_string(&msg).unwrap();
            let back: ClientMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(msg, back, "round trip failed for {json}");
        }
    }

    #[test]
    fn test_unknown_client_type_fails_to_decode() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"fly-to-moon","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_data_shape_fails_to_decode() {
        // `attack` with a string payload must be rejected, not coerced.
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"attack","data":"(0,0)"}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerMessage shapes
    // =====================================================================

    #[test]
    fn test_identity_json_shape() {
        let msg = ServerMessage::Identity {
            player_id: PlayerId(42),
            token: "deadbeef".into(),
            name: "Captain-42".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "identity");
        assert_eq!(json["data"]["playerId"], 42);
        assert_eq!(json["data"]["token"], "deadbeef");
        assert_eq!(json["data"]["name"], "Captain-42");
    }

    #[test]
    fn test_opponent_joined_json_shape() {
        let msg = ServerMessage::OpponentJoined {
            name: "Captain-7".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "opponent-joined");
        assert_eq!(json["data"]["name"], "Captain-7");
    }

    #[test]
    fn test_opponent_left_is_bare_type_tag() {
        let json =
            serde_json::to_value(&ServerMessage::OpponentLeft).unwrap();
        assert_eq!(json["type"], "opponent-left");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_state_json_shape() {
        let msg = ServerMessage::State {
            snapshot: Snapshot {
                session_id: SessionId(1),
                phase: Phase::Preparing,
                your_turn: None,
                you: board(10),
                opponent: None,
                last_attack: None,
                winner: None,
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["data"]["snapshot"]["phase"], "preparing");
    }

    #[test]
    fn test_game_ended_json_shape() {
        let msg = ServerMessage::GameEnded {
            winner_id: PlayerId(7),
            last_attack: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "game-ended");
        assert_eq!(json["data"]["winnerId"], 7);
    }

    #[test]
    fn test_error_json_shape() {
        let msg =
            ServerMessage::error(ErrorCode::NotYourTurn, "wait for it");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["data"]["code"], "not-your-turn");
        assert_eq!(json["data"]["message"], "wait for it");
    }

    #[test]
    fn test_server_message_round_trip_all_variants() {
        let msgs = [
            ServerMessage::Identity {
                player_id: PlayerId(1),
                token: "t".into(),
                name: "n".into(),
            },
            ServerMessage::Joined {
                session_id: SessionId(2),
            },
            ServerMessage::OpponentJoined { name: "n".into() },
            ServerMessage::OpponentLeft,
            ServerMessage::OpponentReady,
            ServerMessage::Chat {
                from: PlayerId(1),
                text: "hi".into(),
            },
            ServerMessage::GameEnded {
                winner_id: PlayerId(1),
                last_attack: None,
            },
            ServerMessage::error(ErrorCode::Overlap, "taken"),
        ];
        for msg in msgs {
            let json = serde_json::to_string(&msg).unwrap();
            let back: ServerMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(msg, back, "round trip failed for {json}");
        }
    }
}
