//! [`StreamSupervisor`] – lifecycle owner of the telemetry WebSocket.
//!
//! The supervisor runs for the application's lifetime and walks the link
//! through `Idle → Connecting → Open → {Closed, Errored}`, publishing every
//! transition to the [`StateStore`]. Neither `Closed` nor `Errored` is
//! terminal: the supervisor reconnects with bounded exponential backoff,
//! and after a configured number of consecutive failed attempts surfaces
//! [`LinkStatus::Down`] so the presentation shell can show a persistent
//! disconnection while retries continue at the capped interval.
//!
//! Inbound text frames are validated with [`StreamEvent::parse`] at the
//! transport boundary; well-formed events go into a bounded channel drained
//! by the state layer's single consumer task (arrival order preserved,
//! back-pressure when the consumer lags), malformed frames are logged and
//! dropped without touching prior state.
//!
//! Outbound traffic flows through the [`OutboundLink`] seam: the
//! supervisor's [`StreamLink`] handle queues command frames for the socket
//! writer and reports `NotConnected` / `QueueFull` instead of silently
//! dropping anything.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use mowerlink_state::StateStore;
use mowerlink_types::{CommandMessage, LinkError, LinkStatus, StreamEvent};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning knobs for one supervised stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL, e.g. `ws://robot-mower.local:8088/ws`.
    pub url: String,
    /// First reconnect delay; doubles on every consecutive failure.
    pub reconnect_initial: Duration,
    /// Cap on the reconnect delay.
    pub reconnect_max: Duration,
    /// Consecutive failed attempts before [`LinkStatus::Down`] is surfaced.
    pub attempts_before_down: u32,
    /// Capacity of the outbound command queue.
    pub outbound_buffer: usize,
}

impl StreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(30),
            attempts_before_down: 5,
            outbound_buffer: 32,
        }
    }
}

/// Backoff schedule: `initial * 2^(n-1)`, capped at `reconnect_max`.
fn backoff_delay(config: &StreamConfig, failed_attempts: u32) -> Duration {
    let exponent = failed_attempts.saturating_sub(1).min(16);
    config
        .reconnect_initial
        .saturating_mul(2u32.saturating_pow(exponent))
        .min(config.reconnect_max)
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound seam
// ─────────────────────────────────────────────────────────────────────────────

/// The dispatcher's view of the transmit path.
#[async_trait]
pub trait OutboundLink: Send + Sync {
    /// Queue one command frame for transmission.
    ///
    /// # Errors
    ///
    /// * [`LinkError::NotConnected`] – the stream is not open.
    /// * [`LinkError::QueueFull`] – the bounded outbound queue is full.
    async fn send(&self, message: CommandMessage) -> Result<(), LinkError>;
}

/// Sending handle onto a supervised stream. Cheap to clone.
#[derive(Clone)]
pub struct StreamLink {
    outbound: mpsc::Sender<CommandMessage>,
    status: watch::Receiver<LinkStatus>,
}

#[async_trait]
impl OutboundLink for StreamLink {
    async fn send(&self, message: CommandMessage) -> Result<(), LinkError> {
        if !self.status.borrow().is_open() {
            return Err(LinkError::NotConnected);
        }
        self.outbound.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => LinkError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => LinkError::NotConnected,
        })
    }
}

/// Stand-in link used when discovery produced no stream URL. Every send
/// reports `NotConnected` so callers still learn their command went nowhere.
pub struct NullLink;

#[async_trait]
impl OutboundLink for NullLink {
    async fn send(&self, _message: CommandMessage) -> Result<(), LinkError> {
        Err(LinkError::NotConnected)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StreamSupervisor
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to the background task supervising the stream.
pub struct StreamSupervisor {
    task: JoinHandle<()>,
    link: StreamLink,
    shutdown: watch::Sender<bool>,
}

impl StreamSupervisor {
    /// Spawn the supervisor. `events` receives every validated inbound
    /// event; link-status transitions land in `store`.
    pub fn spawn(
        config: StreamConfig,
        store: Arc<StateStore>,
        events: mpsc::Sender<StreamEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_buffer.max(1));
        let link = StreamLink {
            outbound: outbound_tx,
            status: store.watch_link_status(),
        };
        let task = tokio::spawn(run(config, store, events, outbound_rx, shutdown_rx));
        Self {
            task,
            link,
            shutdown: shutdown_tx,
        }
    }

    /// A cloneable sending handle for the dispatcher.
    pub fn link(&self) -> StreamLink {
        self.link.clone()
    }

    /// Ask the supervisor to stop. Inbound events stop being dispatched as
    /// soon as the signal is observed.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for the supervisor task to finish.
    pub async fn closed(self) {
        let _ = self.task.await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Supervision loop
// ─────────────────────────────────────────────────────────────────────────────

/// Why an open connection stopped being driven.
enum Exit {
    Closed,
    Errored,
    Shutdown,
    ConsumerGone,
}

async fn run(
    config: StreamConfig,
    store: Arc<StateStore>,
    events: mpsc::Sender<StreamEvent>,
    mut outbound: mpsc::Receiver<CommandMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    // Counts consecutive failed connection attempts; reset on every open.
    let mut attempt: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        attempt += 1;
        if attempt <= config.attempts_before_down {
            store.set_link_status(LinkStatus::Connecting { attempt });
        }
        debug!(url = %config.url, attempt, "connecting to stream");

        match connect_async(config.url.as_str()).await {
            Ok((socket, _response)) => {
                attempt = 0;
                store.set_link_status(LinkStatus::Open);
                info!(url = %config.url, "stream open");

                match drive(socket, &events, &mut outbound, &mut shutdown).await {
                    Exit::Closed => {
                        info!(url = %config.url, "stream closed by peer");
                        store.set_link_status(LinkStatus::Closed);
                    }
                    Exit::Errored => {
                        warn!(url = %config.url, "stream errored");
                        store.set_link_status(LinkStatus::Errored);
                    }
                    Exit::Shutdown => break,
                    Exit::ConsumerGone => {
                        warn!("event consumer gone, stopping stream supervisor");
                        break;
                    }
                }
            }
            Err(e) => {
                warn!(url = %config.url, attempt, error = %e, "stream connect failed");
                store.set_link_status(if attempt >= config.attempts_before_down {
                    LinkStatus::Down
                } else {
                    LinkStatus::Errored
                });
            }
        }

        let delay = backoff_delay(&config, attempt.max(1));
        debug!(delay_ms = delay.as_millis() as u64, "reconnect backoff");
        tokio::select! {
            _ = sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    store.set_link_status(LinkStatus::Idle);
    debug!("stream supervisor stopped");
}

/// Drive one open connection until it drops, the consumer disappears, or
/// shutdown is requested.
async fn drive(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: &mpsc::Sender<StreamEvent>,
    outbound: &mut mpsc::Receiver<CommandMessage>,
    shutdown: &mut watch::Receiver<bool>,
) -> Exit {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut outbound_open = true;

    loop {
        tokio::select! {
            // ── Inbound: socket → state layer ───────────────────────────────
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match StreamEvent::parse(text.as_str()) {
                            Ok(event) => {
                                // Bounded send: back-pressure on a slow consumer.
                                if events.send(event).await.is_err() {
                                    return Exit::ConsumerGone;
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "rejecting malformed frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            return Exit::Errored;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Exit::Closed,
                    Some(Err(e)) => {
                        warn!(error = %e, "stream read error");
                        return Exit::Errored;
                    }
                    _ => {}
                }
            }
            // ── Outbound: dispatcher → socket ───────────────────────────────
            command = outbound.recv(), if outbound_open => {
                match command {
                    Some(message) => {
                        debug!(method = %message.method, "sending command frame");
                        let frame = Message::Text(message.to_json().into());
                        if ws_tx.send(frame).await.is_err() {
                            return Exit::Errored;
                        }
                    }
                    None => outbound_open = false,
                }
            }
            // ── Shutdown ────────────────────────────────────────────────────
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return Exit::Shutdown;
                }
            }
        }
    }
}
