//! Session lifecycle for Broadside: pairing, turn order, and the match
//! actors that own game state.
//!
//! Each session (one two-player game) runs as an isolated Tokio task —
//! the actor model. Commands arrive over an mpsc channel, outbound
//! messages leave over per-player channels, and nothing else can touch
//! the boards. Serialized command processing is what guarantees
//! at-most-one in-flight mutation per session, so the game state needs
//! no locking of its own.
//!
//! # Key types
//!
//! - [`MatchState`] — the pure game: two slots, two boards, the turn
//!   machine. Fully synchronous and unit-testable.
//! - [`TurnMachine`] — phase sequencing
//!   (Preparing → WaitingForOpponent → WaitingActive → Active → Ended).
//! - [`MatchHandle`] — send commands to a running match actor.
//! - [`MatchManager`] — pairs players into sessions, routes messages,
//!   reaps finished sessions.
//! - [`MatchConfig`] — ruleset plus the turn and cleanup policies.

mod actor;
mod config;
mod error;
mod manager;
mod state;
mod turn;

pub use actor::{LeaveOutcome, MatchHandle, MatchInfo, PlayerSender};
pub use config::MatchConfig;
pub use error::MatchError;
pub use manager::MatchManager;
pub use state::{MatchState, Outbound};
pub use turn::TurnMachine;
