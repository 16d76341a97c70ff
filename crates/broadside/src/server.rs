//! `BroadsideServer` builder, shared state, and the accept loop.

use std::sync::Arc;
use std::time::Duration;

use broadside_match::{MatchConfig, MatchManager};
use broadside_protocol::{Codec, JsonCodec};
use broadside_session::{BinderConfig, IdentityBinder};
use broadside_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::BroadsideError;
use crate::handler::handle_connection;

/// Shared server state, one per process, handed to every connection
/// handler task behind an `Arc`.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) binder: Mutex<IdentityBinder>,
    pub(crate) matches: Mutex<MatchManager>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Broadside server.
pub struct BroadsideServerBuilder {
    bind_addr: String,
    binder_config: BinderConfig,
    match_config: MatchConfig,
    sweep_interval: Duration,
}

impl BroadsideServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            binder_config: BinderConfig::default(),
            match_config: MatchConfig::default(),
            sweep_interval: Duration::from_secs(5),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the identity binder configuration (grace period, token TTL).
    pub fn binder_config(mut self, config: BinderConfig) -> Self {
        self.binder_config = config;
        self
    }

    /// Sets the match configuration (ruleset, turn policy, end grace).
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Sets how often the abandonment sweep runs.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Binds the listener and builds the server (JSON codec over
    /// WebSockets).
    pub async fn build(
        self,
    ) -> Result<BroadsideServer<JsonCodec>, BroadsideError> {
        let transport =
            WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            binder: Mutex::new(IdentityBinder::new(self.binder_config)),
            matches: Mutex::new(MatchManager::new(self.match_config)),
            codec: JsonCodec,
        });

        Ok(BroadsideServer {
            transport,
            state,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for BroadsideServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Broadside server.
pub struct BroadsideServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    sweep_interval: Duration,
}

impl<C> BroadsideServer<C>
where
    C: Codec + Clone + 'static,
{
    pub fn builder() -> BroadsideServerBuilder {
        BroadsideServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop (and the background abandonment sweep)
    /// until the process is terminated.
    pub async fn run(mut self) -> Result<(), BroadsideError> {
        tracing::info!("Broadside server running");

        tokio::spawn(sweep_loop(
            Arc::clone(&self.state),
            self.sweep_interval,
        ));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Periodic housekeeping: abandoned players forfeit their sessions,
/// idle identities age out, finished sessions get reaped.
async fn sweep_loop<C: Codec>(
    state: Arc<ServerState<C>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it.
    ticker.tick().await;
    loop {
        ticker.tick().await;

        let abandoned = {
            let mut binder = state.binder.lock().await;
            let abandoned = binder.expire_stale();
            binder.cleanup();
            abandoned
        };

        let mut matches = state.matches.lock().await;
        for player_id in abandoned {
            matches.forfeit(player_id).await;
        }
        matches.reap_finished().await;
    }
}
