//! Identity records: the data the binder keeps per player.

use std::time::Instant;

use broadside_protocol::PlayerId;

// ---------------------------------------------------------------------------
// BinderConfig
// ---------------------------------------------------------------------------

/// Timeouts for the identity binder.
#[derive(Debug, Clone)]
pub struct BinderConfig {
    /// How long (in seconds) a disconnected player keeps their live
    /// session before it is forfeited. Default: 120 seconds.
    pub reconnect_grace_secs: u64,

    /// How long (in seconds) an idle identity survives before the
    /// binder drops it and its token. Default: 30 days, matching the
    /// lifetime clients give the persisted token.
    pub token_ttl_secs: u64,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            reconnect_grace_secs: 120,
            token_ttl_secs: 30 * 24 * 60 * 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Where a player's connection currently stands.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(grace over)──→ Abandoned
///       ↑                            │                             │
///       └──────────(resolve)─────────┴─────────────────────────────┘
/// ```
///
/// `Abandoned` means the reconnect grace elapsed and any live session
/// was forfeited; the identity itself survives until the token TTL, so
/// the player can come back tomorrow and start a new game with the same
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// A connection is currently bound to this player.
    Connected,
    /// The connection dropped at the given instant; a rebind within the
    /// grace period resumes any in-progress session.
    Disconnected { since: Instant },
    /// The grace period elapsed without a rebind.
    Abandoned,
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

/// One player, as the binder knows them.
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    /// Durable identifier, stable across reconnects.
    pub id: PlayerId,

    /// Public display name.
    pub name: String,

    /// The secret the client holds to recover this identity. 32 hex
    /// characters, 128 bits of entropy.
    pub token: String,

    /// Connection state.
    pub presence: Presence,

    /// Bumped every time a connection binds to this player. A stale
    /// connection's disconnect is ignored when its epoch no longer
    /// matches, so an old socket closing cannot knock out the reloaded
    /// tab that replaced it.
    pub epoch: u64,

    /// Last moment the player was seen (bound or disconnected); drives
    /// token TTL expiry.
    pub last_seen: Instant,
}
