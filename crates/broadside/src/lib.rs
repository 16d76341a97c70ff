//! # Broadside
//!
//! The real-time coordination server for a two-player naval-combat
//! game: it binds ephemeral connections to durable player identities,
//! pairs players into sessions, keeps two private gameboards consistent
//! across an unreliable connection, enforces turn order and placement
//! legality, and resolves attacks to a terminal win/loss outcome.
//!
//! The server is the single source of truth; clients are replicas that
//! reconcile against the `state` snapshots it broadcasts.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use broadside::prelude::*;
//!
//! # async fn run() -> Result<(), BroadsideError> {
//! let server = BroadsideServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::BroadsideError;
pub use server::{BroadsideServer, BroadsideServerBuilder};

/// The common imports for running or testing a server.
pub mod prelude {
    pub use crate::{
        BroadsideError, BroadsideServer, BroadsideServerBuilder,
    };
    pub use broadside_board::{Ruleset, ShipSpec};
    pub use broadside_match::MatchConfig;
    pub use broadside_protocol::{
        AttackOutcome, CellState, ClientMessage, ErrorCode, Phase,
        PlayerId, ServerMessage, SessionId, Snapshot,
    };
    pub use broadside_session::BinderConfig;
}
