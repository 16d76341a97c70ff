//! The identity binder: mints, resolves, and expires player identities.
//!
//! # Concurrency note
//!
//! `IdentityBinder` is not thread-safe by itself; it is owned by the
//! server and accessed through a mutex at that layer. Plain `HashMap`s
//! keep this crate free of hidden locking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use broadside_protocol::PlayerId;
use rand::Rng;

use crate::{BinderConfig, IdentityError, PlayerRecord, Presence};

/// Registry of every known player, connected or not.
pub struct IdentityBinder {
    /// All identity records, keyed by player id.
    players: HashMap<PlayerId, PlayerRecord>,

    /// Index from identity tokens to player ids, kept in sync with
    /// `players` so a reconnect is a single lookup.
    tokens: HashMap<String, PlayerId>,

    config: BinderConfig,
}

impl IdentityBinder {
    /// Creates an empty binder with the given config.
    pub fn new(config: BinderConfig) -> Self {
        Self {
            players: HashMap::new(),
            tokens: HashMap::new(),
            config,
        }
    }

    /// Mints a brand-new identity for a client that presented no token.
    ///
    /// The returned record carries the token the client must persist;
    /// this is the only time the server volunteers it.
    pub fn mint(&mut self, name: Option<String>) -> &PlayerRecord {
        let id = loop {
            let candidate = PlayerId(rand::rng().random_range(1..u64::MAX));
            if !self.players.contains_key(&candidate) {
                break candidate;
            }
        };
        let token = generate_token();
        let name = name.unwrap_or_else(|| format!("Captain-{}", id.0));

        let record = PlayerRecord {
            id,
            name,
            token: token.clone(),
            presence: Presence::Connected,
            epoch: 1,
            last_seen: Instant::now(),
        };
        self.tokens.insert(token, id);
        self.players.insert(id, record);

        tracing::info!(player_id = %id, "identity minted");
        self.players.get(&id).expect("just inserted")
    }

    /// Resolves a returning client's token to its existing player and
    /// binds the new connection (bumping the epoch).
    ///
    /// Works from any presence state: a `Disconnected` player resumes
    /// within the grace window, an `Abandoned` one simply comes back
    /// without a session, and a `Connected` one is a tab reload whose
    /// new connection supersedes the old.
    ///
    /// # Errors
    /// [`IdentityError::UnknownIdentity`] if the token is not on file or
    /// the identity sat idle past the token TTL. A validated token never
    /// produces a fresh player.
    pub fn resolve(
        &mut self,
        token: &str,
    ) -> Result<&PlayerRecord, IdentityError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(IdentityError::UnknownIdentity)?;

        let ttl = Duration::from_secs(self.config.token_ttl_secs);
        let expired = match self.players.get(&player_id) {
            Some(record) => record.last_seen.elapsed() > ttl,
            None => return Err(IdentityError::UnknownIdentity),
        };
        if expired {
            // Idle past the TTL: drop the record now and refuse the
            // token, exactly as if cleanup had already run.
            self.tokens.remove(token);
            self.players.remove(&player_id);
            tracing::info!(%player_id, "identity expired on resolve");
            return Err(IdentityError::UnknownIdentity);
        }

        let record = self
            .players
            .get_mut(&player_id)
            .expect("presence checked above");
        record.presence = Presence::Connected;
        record.epoch += 1;
        record.last_seen = Instant::now();
        tracing::info!(%player_id, epoch = record.epoch, "identity rebound");
        Ok(&*record)
    }

    /// Marks a player disconnected, starting the reconnect grace period.
    ///
    /// `epoch` must be the value handed out when this connection bound;
    /// a stale epoch (the connection was already superseded by a newer
    /// one) is a no-op. Returns whether the disconnect applied, so the
    /// caller knows whether to propagate it to the player's session.
    ///
    /// # Errors
    /// [`IdentityError::NotFound`] if no record exists.
    pub fn disconnect(
        &mut self,
        player_id: PlayerId,
        epoch: u64,
    ) -> Result<bool, IdentityError> {
        let record = self
            .players
            .get_mut(&player_id)
            .ok_or(IdentityError::NotFound(player_id))?;

        if record.epoch != epoch {
            tracing::debug!(
                %player_id,
                stale = epoch,
                current = record.epoch,
                "ignoring disconnect from superseded connection"
            );
            return Ok(false);
        }

        record.presence = Presence::Disconnected {
            since: Instant::now(),
        };
        record.last_seen = Instant::now();
        tracing::info!(%player_id, "player disconnected, grace period started");
        Ok(true)
    }

    /// Moves players disconnected past the grace period to `Abandoned`
    /// and returns them, so the match layer can forfeit their sessions.
    /// Each player is reported exactly once.
    pub fn expire_stale(&mut self) -> Vec<PlayerId> {
        let grace =
            Duration::from_secs(self.config.reconnect_grace_secs);
        let mut abandoned = Vec::new();

        for record in self.players.values_mut() {
            if let Presence::Disconnected { since } = record.presence {
                if since.elapsed() > grace {
                    record.presence = Presence::Abandoned;
                    abandoned.push(record.id);
                    tracing::info!(
                        player_id = %record.id,
                        "player abandoned (grace period elapsed)"
                    );
                }
            }
        }

        abandoned
    }

    /// Drops identities idle past the token TTL, invalidating their
    /// tokens. Connected players are never dropped.
    pub fn cleanup(&mut self) {
        let ttl = Duration::from_secs(self.config.token_ttl_secs);
        self.players.retain(|_, record| {
            let stale = !matches!(record.presence, Presence::Connected)
                && record.last_seen.elapsed() > ttl;
            if stale {
                self.tokens.remove(&record.token);
                tracing::info!(
                    player_id = %record.id,
                    "identity dropped (token TTL elapsed)"
                );
            }
            !stale
        });
    }

    /// Looks up a record by player id.
    pub fn get(&self, player_id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.get(player_id)
    }

    /// Number of known identities (any presence).
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Generates a random 32-character hex token (128 bits of entropy),
/// enough that guessing a live token is not a realistic attack.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
