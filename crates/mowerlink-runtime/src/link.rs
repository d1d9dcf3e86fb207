//! [`MowerLink`] – the assembled client.
//!
//! Construction order mirrors the data flow: the state store and its
//! consumer task come up first, then endpoints are resolved (the stream
//! URL is unknown until discovery answers), and only then is the stream
//! supervisor started. When discovery fell back there is no stream URL;
//! the dispatcher gets a [`NullLink`] so command delivery failures are
//! still reported instead of silently dropped.
//!
//! The presentation shell holds a `MowerLink` and uses exactly two
//! surfaces: [`MowerLink::store`] for reads and [`MowerLink::dispatcher`]
//! for writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use mowerlink_net::CommandDispatcher;
use mowerlink_net::discovery::{DEFAULT_DISCOVERY_PORT, EndpointResolver};
use mowerlink_net::stream::{NullLink, OutboundLink, StreamConfig, StreamSupervisor};
use mowerlink_state::StateStore;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to bring the client up.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Host the mower's configuration endpoint lives on.
    pub mower_host: String,
    pub discovery_port: u16,
    /// Full discovery URL override; takes precedence over host/port when
    /// set. Used by tests and unconventional deployments.
    pub discovery_url: Option<String>,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
    pub reconnect_attempts_before_down: u32,
    /// Capacity of the outbound command queue.
    pub outbound_buffer: usize,
    /// Capacity of the inbound event queue feeding the state consumer.
    pub event_buffer: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mower_host: "robot-mower.local".to_string(),
            discovery_port: DEFAULT_DISCOVERY_PORT,
            discovery_url: None,
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(30),
            reconnect_attempts_before_down: 5,
            outbound_buffer: 32,
            event_buffer: 64,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MowerLink
// ─────────────────────────────────────────────────────────────────────────────

/// The running synchronization layer.
pub struct MowerLink {
    store: Arc<StateStore>,
    dispatcher: CommandDispatcher,
    supervisor: Option<StreamSupervisor>,
    consumer: JoinHandle<()>,
}

impl MowerLink {
    /// Resolve endpoints and start the client.
    ///
    /// Never fails: discovery failure degrades to the fallback endpoint
    /// set (no stream, placeholder camera) rather than erroring out.
    pub async fn init(config: LinkConfig) -> Self {
        let store = StateStore::init();
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
        let consumer = StateStore::spawn_consumer(Arc::clone(&store), events_rx);

        let resolver = match &config.discovery_url {
            Some(url) => EndpointResolver::from_url(url.clone()),
            None => EndpointResolver::new(&config.mower_host, config.discovery_port),
        };
        let endpoints = resolver.resolve().await;
        store.set_endpoints(endpoints.clone());

        let (supervisor, link): (Option<StreamSupervisor>, Arc<dyn OutboundLink>) =
            if endpoints.ws.is_empty() {
                warn!("no stream url resolved; running degraded, commands will not be delivered");
                (None, Arc::new(NullLink))
            } else {
                let stream_config = StreamConfig {
                    url: endpoints.ws.clone(),
                    reconnect_initial: config.reconnect_initial,
                    reconnect_max: config.reconnect_max,
                    attempts_before_down: config.reconnect_attempts_before_down,
                    outbound_buffer: config.outbound_buffer,
                };
                let supervisor =
                    StreamSupervisor::spawn(stream_config, Arc::clone(&store), events_tx);
                let link: Arc<dyn OutboundLink> = Arc::new(supervisor.link());
                (Some(supervisor), link)
            };

        let dispatcher = CommandDispatcher::new(Arc::clone(&store), link);

        Self {
            store,
            dispatcher,
            supervisor,
            consumer,
        }
    }

    /// Read access to the reconciled state tree.
    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    /// The shell's write path.
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// `true` when discovery fell back and no stream supervisor is running.
    pub fn is_degraded(&self) -> bool {
        self.supervisor.is_none()
    }

    /// Stop the stream and the state consumer.
    pub async fn shutdown(self) {
        if let Some(supervisor) = self.supervisor {
            supervisor.shutdown();
            supervisor.closed().await;
        }
        // The supervisor owned the last event sender, so the consumer
        // drains whatever is queued and finishes on its own.
        let _ = self.consumer.await;
    }
}
