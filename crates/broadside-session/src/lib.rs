//! Durable player identity for Broadside.
//!
//! Connections are ephemeral; players are not. This crate owns the
//! mapping between the two:
//!
//! 1. **Minting** — a first-time client gets a fresh [`PlayerId`] and a
//!    secret identity token it persists locally (the client keeps it for
//!    around 30 days).
//! 2. **Resolving** — a returning client presents the token and gets its
//!    existing player back, so a tab reload or a dropped connection
//!    rebinds to an in-progress game instead of forfeiting it.
//! 3. **Expiry** — players who stay disconnected past the grace period
//!    are reported to the layer above (which forfeits their sessions),
//!    and identities idle past the token TTL are removed outright.
//!
//! The binder never fabricates a new player for a token it failed to
//! resolve; that case is [`IdentityError::UnknownIdentity`] and the
//! client must start fresh.
//!
//! [`PlayerId`]: broadside_protocol::PlayerId

mod binder;
mod error;
mod player;

pub use binder::IdentityBinder;
pub use error::IdentityError;
pub use player::{BinderConfig, PlayerRecord, Presence};
