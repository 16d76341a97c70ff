//! Match configuration: ruleset plus turn and cleanup policies.

use std::time::Duration;

use broadside_board::Ruleset;

/// Configuration shared by every session a server creates.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Board size, fleet, and the contact rule.
    pub ruleset: Ruleset,

    /// When `true` (the default), a hit keeps the turn with the
    /// attacker and only a miss passes it to the opponent. When
    /// `false`, every legal attack passes the turn.
    pub extra_turn_on_hit: bool,

    /// How long an `Ended` session stays addressable so both clients
    /// can receive and render the result before it is destroyed.
    pub end_grace: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ruleset: Ruleset::default(),
            extra_turn_on_hit: true,
            end_grace: Duration::from_secs(30),
        }
    }
}
