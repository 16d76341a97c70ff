//! Per-connection handler: identity binding and envelope dispatch.
//!
//! Each accepted connection gets its own task running this handler. The
//! flow is:
//!
//!   1. First envelope must be `identify` — mint a fresh identity or
//!      resolve the presented token to an existing player.
//!   2. If that player has a live session, rebind this connection as its
//!      endpoint (the client gets a full snapshot, losing nothing).
//!   3. Loop: inbound envelopes route by type to the match manager or
//!      the player's session actor; outbound envelopes from the session
//!      drain onto the socket. Unknown envelope types are dropped with a
//!      logged warning and an error reply — never a closed connection.
//!
//! All outbound traffic after identification funnels through one
//! per-player channel, so replies and session broadcasts stay ordered
//! relative to each other.

use std::sync::Arc;

use broadside_match::MatchError;
use broadside_protocol::{
    ClientMessage, Codec, ErrorCode, PlayerId, ServerMessage,
};
use broadside_transport::{Connection, ServerConnection};
use tokio::sync::mpsc;

use crate::BroadsideError;
use crate::server::ServerState;

/// The identity a connection authenticated as.
struct BoundIdentity {
    player_id: PlayerId,
    name: String,
    /// Binder epoch for this connection; lets the drop guard tell a
    /// stale socket from the live one.
    epoch: u64,
}

/// Drop guard that marks the player disconnected when the handler exits
/// on any path. `Drop` is synchronous, so the async work is spawned.
struct ConnectionGuard<C: Codec> {
    player_id: PlayerId,
    epoch: u64,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let epoch = self.epoch;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let applied = {
                let mut binder = state.binder.lock().await;
                binder.disconnect(player_id, epoch).unwrap_or(false)
            };
            // Only the connection that currently owns the identity may
            // report the player gone to their session.
            if applied {
                state.matches.lock().await.disconnected(player_id).await;
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: ServerConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), BroadsideError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: identity binding ---
    let Some((bound, identity_reply)) =
        identify(&conn, &state).await?
    else {
        // Closed before identifying; nothing to clean up.
        return Ok(());
    };
    let player_id = bound.player_id;
    tracing::info!(%conn_id, %player_id, "player identified");

    // From here on the identity is bound, so the disconnect guard must
    // be in place before anything can fail.
    let _guard = ConnectionGuard {
        player_id,
        epoch: bound.epoch,
        state: Arc::clone(&state),
    };
    send_now(&conn, &state, identity_reply).await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // --- Step 2: resume an in-progress session, if any ---
    {
        let mut matches = state.matches.lock().await;
        match matches.rebind(player_id, tx.clone()).await {
            Ok(session_id) => {
                tracing::info!(
                    %player_id, %session_id, "rebound to live session"
                );
            }
            Err(MatchError::NotInSession(_)) => {}
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "rebind failed");
            }
        }
    }

    // --- Step 3: dispatch loop ---
    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    dispatch(&data, &bound, &tx, &state).await;
                }
                Ok(None) => {
                    tracing::info!(%player_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%player_id, error = %e, "recv error");
                    break;
                }
            },
            outbound = rx.recv() => {
                // The handler holds a sender, so the channel can't be
                // closed out from under us.
                let Some(msg) = outbound else { break };
                let bytes = state.codec.encode(&msg)?;
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(
                        %player_id, error = %e,
                        "send failed, dropping connection"
                    );
                    break;
                }
            }
        }
    }

    // _guard drops here → disconnect propagates.
    Ok(())
}

/// Runs the identify exchange. Returns `None` if the connection closed
/// before a successful bind, otherwise the bound identity plus the
/// `identity` reply for the caller to send once its cleanup guard is in
/// place.
///
/// Failed attempts (bad token, wrong first envelope, undecodable bytes)
/// reply with an error and keep listening — an `unknown-identity` in
/// particular must leave the client free to retry tokenless on the same
/// connection.
async fn identify<C: Codec>(
    conn: &ServerConnection,
    state: &Arc<ServerState<C>>,
) -> Result<Option<(BoundIdentity, ServerMessage)>, BroadsideError> {
    loop {
        let Some(data) = conn.recv().await? else {
            return Ok(None);
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable envelope dropped");
                send_now(
                    conn,
                    state,
                    ServerMessage::error(
                        ErrorCode::UnknownMessageType,
                        "unrecognized envelope",
                    ),
                )
                .await?;
                continue;
            }
        };

        let (token, name) = match msg {
            ClientMessage::Identify { token, name } => (token, name),
            other => {
                tracing::debug!(?other, "envelope before identify");
                send_now(
                    conn,
                    state,
                    ServerMessage::error(
                        ErrorCode::InvalidPhase,
                        "identify first",
                    ),
                )
                .await?;
                continue;
            }
        };

        let mut binder = state.binder.lock().await;
        let record = match token {
            Some(ref token) => match binder.resolve(token) {
                Ok(record) => record,
                Err(e) => {
                    drop(binder);
                    tracing::info!(error = %e, "identity token rejected");
                    send_now(
                        conn,
                        state,
                        ServerMessage::error(
                            ErrorCode::UnknownIdentity,
                            "token does not resolve, start fresh",
                        ),
                    )
                    .await?;
                    continue;
                }
            },
            None => binder.mint(name),
        };

        let bound = BoundIdentity {
            player_id: record.id,
            name: record.name.clone(),
            epoch: record.epoch,
        };
        let reply = ServerMessage::Identity {
            player_id: record.id,
            token: record.token.clone(),
            name: record.name.clone(),
        };
        return Ok(Some((bound, reply)));
    }
}

/// Routes one inbound envelope. Rejections become error replies to this
/// connection only; nothing here ever tears the connection down.
async fn dispatch<C: Codec>(
    data: &[u8],
    bound: &BoundIdentity,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    state: &Arc<ServerState<C>>,
) {
    let player_id = bound.player_id;

    let msg: ClientMessage = match state.codec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(
                %player_id, error = %e,
                "undecodable envelope dropped"
            );
            reply(
                tx,
                ServerMessage::error(
                    ErrorCode::UnknownMessageType,
                    "unrecognized envelope",
                ),
            );
            return;
        }
    };

    match msg {
        ClientMessage::Identify { .. } => {
            reply(
                tx,
                ServerMessage::error(
                    ErrorCode::InvalidPhase,
                    "already identified",
                ),
            );
        }

        ClientMessage::Join => {
            let result = {
                let mut matches = state.matches.lock().await;
                matches
                    .join_or_create(
                        player_id,
                        bound.name.clone(),
                        tx.clone(),
                    )
                    .await
            };
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "join rejected");
                reply(
                    tx,
                    ServerMessage::error(
                        ErrorCode::InvalidPhase,
                        e.to_string(),
                    ),
                );
            }
        }

        ClientMessage::Leave => {
            let result =
                state.matches.lock().await.leave(player_id).await;
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "leave rejected");
                reply(
                    tx,
                    ServerMessage::error(
                        ErrorCode::InvalidPhase,
                        e.to_string(),
                    ),
                );
            }
        }

        // Game envelopes go to the player's session actor; its replies
        // come back on the player channel.
        game @ (ClientMessage::PlaceShip { .. }
        | ClientMessage::Ready
        | ClientMessage::Attack { .. }
        | ClientMessage::Chat { .. }) => {
            let result = state
                .matches
                .lock()
                .await
                .route_message(player_id, game)
                .await;
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "no session for envelope");
                reply(
                    tx,
                    ServerMessage::error(
                        ErrorCode::InvalidPhase,
                        "join a game first",
                    ),
                );
            }
        }
    }
}

/// Sends an envelope on the player channel (delivery handled by the
/// handler's select loop).
fn reply(
    tx: &mpsc::UnboundedSender<ServerMessage>,
    msg: ServerMessage,
) {
    let _ = tx.send(msg);
}

/// Direct socket send, used only before the player channel exists.
async fn send_now<C: Codec>(
    conn: &ServerConnection,
    state: &Arc<ServerState<C>>,
    msg: ServerMessage,
) -> Result<(), BroadsideError> {
    let bytes = state.codec.encode(&msg)?;
    conn.send(&bytes).await.map_err(BroadsideError::Transport)
}
