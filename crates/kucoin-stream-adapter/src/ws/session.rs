/*
[INPUT]:  A fresh endpoint token, the stream kind, and a consumer callback
[OUTPUT]: One supervised physical connection: keepalive, receive, dispatch
[POS]:    WebSocket layer - connection supervisor and dispatch loop
[UPDATE]: When changing connection lifecycle or message handling
*/

use crate::error::{KucoinError, Result};
use crate::http::KucoinClient;
use crate::ws::message::{self, PingFrame};
use crate::ws::queue::frame_queue;
use crate::ws::state::{RunState, SessionState};
use crate::ws::stream::{MessageCallback, StreamConfig};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

/// How a connection that reached the streaming phase ended
#[derive(Debug)]
pub(crate) enum SessionExit {
    /// Local stop request observed
    Stopped,
    /// Socket died or the receive loop ended; candidate for reconnection
    ConnectionLost(KucoinError),
    /// Consumer callback failed; the session stops without reconnecting
    CallbackFailed(KucoinError),
}

/// Run one physical connection end to end.
///
/// Fetches a fresh single-use token, opens the socket, replays the
/// subscriptions, then runs the keepalive and dispatch loops until the
/// connection dies or a stop is requested. Errors returned here occurred
/// before the streaming phase and are judged for retry by the caller.
pub(crate) async fn run_connection(
    client: &KucoinClient,
    config: &StreamConfig,
    state: &Arc<SessionState>,
    callback: &MessageCallback,
    handle: &Handle,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<SessionExit> {
    state.set_run_state(RunState::Connecting);

    // Tokens are single-use: fetched fresh for every attempt, never cached
    let endpoint = client.ws_endpoint(config.kind.scope()).await?;
    debug!("ws endpoint acquired");

    let (ws_stream, _response) = match timeout(config.connect_timeout, connect_async(endpoint.url.as_str())).await
    {
        Ok(Ok(pair)) => pair,
        Ok(Err(err)) => {
            return Err(KucoinError::UpstreamUnavailable { message: err.to_string() });
        }
        Err(_) => {
            return Err(KucoinError::Timeout { duration: config.connect_timeout.as_secs() });
        }
    };
    state.set_connected(true);
    info!("ws connected");

    let (mut write, mut read) = ws_stream.split();
    let (frame_tx, mut frame_rx) = frame_queue(config.queue_capacity);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<WsMessage>(32);

    // Socket task: sole owner of the physical socket. Inbound frames go
    // through the bounded queue; a full queue blocks further reads, which
    // is the system's backpressure.
    let socket_state = Arc::clone(state);
    let socket_task = handle.spawn(async move {
        loop {
            tokio::select! {
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            if write.send(message).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            break;
                        }
                    }
                }
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(WsMessage::Close(_))) => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            break;
                        }
                        Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                        Some(Ok(WsMessage::Text(text))) => {
                            if frame_tx.push(text.to_string()).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            match String::from_utf8(bytes.to_vec()) {
                                Ok(text) => {
                                    if frame_tx.push(text).await.is_err() {
                                        break;
                                    }
                                }
                                Err(_) => warn!("dropping non-UTF8 binary frame"),
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(error = %err, "ws receive failed");
                            break;
                        }
                        None => {
                            debug!("ws stream ended");
                            break;
                        }
                    }
                }
            }
        }
        socket_state.set_connected(false);
        // frame_tx drops here, closing the queue and waking the dispatch loop
    });

    // Subscriptions are replayed in full before dispatch starts consuming
    state.set_run_state(RunState::Subscribing);
    for frame in config.kind.subscribe_frames() {
        let text = serde_json::to_string(&frame)?;
        outbound_tx
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|_| KucoinError::ConnectionLost {
                message: "socket closed during subscribe".to_string(),
            })?;
        info!(topic = %frame.topic, id = %frame.id, "subscription sent");
    }

    // Keepalive task: a failed ping is logged, not a teardown trigger; the
    // socket task observes the dead connection itself.
    let keepalive_outbound = outbound_tx.clone();
    let ping_interval = config.ping_interval;
    let keepalive_task = handle.spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let ping = PingFrame::new();
            let text = match serde_json::to_string(&ping) {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "ping serialization failed");
                    continue;
                }
            };
            if keepalive_outbound.send(WsMessage::Text(text.into())).await.is_err() {
                warn!("keepalive send failed, socket task gone");
                break;
            }
            debug!(id = %ping.id, "ping sent");
        }
    });

    state.set_run_state(RunState::Streaming);
    info!(topics = ?config.kind.topics(), "streaming");

    // Dispatch loop: single consumer, so callback order matches socket order
    let exit = loop {
        if *shutdown.borrow() {
            break SessionExit::Stopped;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break SessionExit::Stopped;
                }
            }
            frame = frame_rx.pop() => {
                let Some(frame) = frame else {
                    break SessionExit::ConnectionLost(KucoinError::ConnectionLost {
                        message: "socket receive loop ended".to_string(),
                    });
                };
                match serde_json::from_str::<serde_json::Value>(&frame.payload) {
                    Err(err) => {
                        // Per-message failure: drop this frame, keep streaming
                        warn!(error = %err, bytes = frame.payload.len(), "frame parse failed, message dropped");
                    }
                    Ok(value) => {
                        if let Some(control) = message::control_type(&value) {
                            if control == "error" {
                                warn!(frame = %value, "exchange error frame");
                            } else {
                                debug!(control, "control frame");
                            }
                        } else if let Err(err) = callback(value).await {
                            // Policy: a failed callback stops the session
                            error!(error = %err, "consumer callback failed");
                            break SessionExit::CallbackFailed(KucoinError::Callback {
                                message: err.to_string(),
                            });
                        } else if !config.pacing.is_zero() {
                            tokio::time::sleep(config.pacing).await;
                        }
                    }
                }
            }
        }
    };

    state.set_run_state(RunState::Stopping);
    drop(frame_rx);
    drop(outbound_tx);
    keepalive_task.abort();
    let _ = socket_task.await;
    state.set_connected(false);

    Ok(exit)
}
