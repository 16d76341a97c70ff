//! Wire protocol for Broadside.
//!
//! This crate defines the "language" that a game client and the
//! coordination server speak:
//!
//! - **Identity** ([`PlayerId`], [`SessionId`]) — who is talking and
//!   which game they belong to.
//! - **Envelopes** ([`ClientMessage`], [`ServerMessage`]) — every message
//!   on the wire is a `{ "type": ..., "data": ... }` object, modeled as
//!   a tagged enum so unknown shapes are rejected at the boundary
//!   instead of being poked at dynamically.
//! - **Views** ([`Snapshot`], [`BoardView`], [`ShipView`]) — the
//!   server-authoritative projections that `state` envelopes carry.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how envelopes are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`], [`ErrorCode`]) — decode failures and
//!   the rejection taxonomy sent back to clients.
//!
//! The protocol layer sits between transport (raw frames) and the
//! session/board layers. It knows nothing about sockets or game rules;
//! it only knows shapes.

mod codec;
mod error;
mod message;
mod types;
mod view;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, ServerMessage};
pub use types::{ErrorCode, Phase, PlayerId, SessionId};
pub use view::{
    AttackOutcome, AttackReport, BoardView, CellState, CellView, Coord,
    Placement, ShipView, Snapshot,
};
