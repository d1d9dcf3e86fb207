//! [`StateStore`] – the single mutation authority over client state.
//!
//! Built on [`tokio::sync::watch`] channels so that:
//!
//! * every mutation is applied atomically with respect to observers – a
//!   reader sees the tree before or after a multi-field replace, never
//!   mid-way through;
//! * the presentation shell can either poll (`telemetry()`) or await
//!   changes (`watch_telemetry()`) without holding any lock across reads.
//!
//! There is deliberately no global singleton: [`StateStore::init`] returns
//! an `Arc` that the caller threads through to whoever needs it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use mowerlink_types::state::Direction;
use mowerlink_types::{EndpointSet, LinkStatus, StreamEvent, TelemetryState};

// ─────────────────────────────────────────────────────────────────────────────
// StateStore
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide client state: telemetry tree, endpoint set, link status.
///
/// # Example
///
/// ```
/// use mowerlink_state::StateStore;
///
/// let store = StateStore::init();
/// assert_eq!(store.telemetry().drive.speed, 100);
/// store.set_drive_speed(42);
/// assert_eq!(store.telemetry().drive.speed, 42);
/// ```
pub struct StateStore {
    telemetry: watch::Sender<TelemetryState>,
    endpoints: watch::Sender<EndpointSet>,
    link: watch::Sender<LinkStatus>,
    last_telemetry: watch::Sender<Option<DateTime<Utc>>>,
}

impl StateStore {
    /// Build a store pre-populated with the sentinel telemetry tree, an
    /// empty endpoint set, and an [`LinkStatus::Idle`] link.
    pub fn init() -> Arc<Self> {
        let (telemetry, _) = watch::channel(TelemetryState::default());
        let (endpoints, _) = watch::channel(EndpointSet::default());
        let (link, _) = watch::channel(LinkStatus::Idle);
        let (last_telemetry, _) = watch::channel(None);
        Arc::new(Self {
            telemetry,
            endpoints,
            link,
            last_telemetry,
        })
    }

    // ─── Reads ───────────────────────────────────────────────────────────────

    /// Snapshot of the current telemetry tree.
    pub fn telemetry(&self) -> TelemetryState {
        self.telemetry.borrow().clone()
    }

    /// The current endpoint set.
    pub fn endpoints(&self) -> EndpointSet {
        self.endpoints.borrow().clone()
    }

    /// The current stream link status.
    pub fn link_status(&self) -> LinkStatus {
        *self.link.borrow()
    }

    /// Wall-clock time the most recent telemetry snapshot was applied, or
    /// `None` before the first one arrives.
    pub fn last_telemetry_at(&self) -> Option<DateTime<Utc>> {
        *self.last_telemetry.borrow()
    }

    /// Subscribe to telemetry changes.
    pub fn watch_telemetry(&self) -> watch::Receiver<TelemetryState> {
        self.telemetry.subscribe()
    }

    /// Subscribe to endpoint-set changes.
    pub fn watch_endpoints(&self) -> watch::Receiver<EndpointSet> {
        self.endpoints.subscribe()
    }

    /// Subscribe to link-status transitions.
    pub fn watch_link_status(&self) -> watch::Receiver<LinkStatus> {
        self.link.subscribe()
    }

    /// CSS background expression for the camera feed, recomputed from the
    /// current camera URL on every call.
    pub fn camera_background(&self) -> String {
        let camera = &self.endpoints.borrow().camera;
        format!("url('{camera}') no-repeat center center fixed")
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    /// Apply one validated inbound event.
    ///
    /// `MowerState` replaces every telemetry domain wholesale – domains the
    /// snapshot left at their defaults overwrite whatever was there before.
    /// The backend always sends complete snapshots, so this trades merge
    /// complexity for consistency.
    pub fn apply(&self, event: StreamEvent) {
        match event {
            StreamEvent::MowerState(snapshot) => {
                self.telemetry.send_replace(*snapshot);
                self.last_telemetry.send_replace(Some(Utc::now()));
            }
        }
    }

    /// Replace the endpoint set wholesale.
    pub fn set_endpoints(&self, endpoints: EndpointSet) {
        info!(
            camera = %endpoints.camera,
            ws = %endpoints.ws,
            fallback = endpoints.is_fallback,
            "endpoints resolved"
        );
        self.endpoints.send_replace(endpoints);
    }

    /// Optimistic local mutation: drive throttle cap.
    pub fn set_drive_speed(&self, speed: u8) {
        self.telemetry.send_modify(|state| state.drive.speed = speed);
    }

    /// Optimistic local mutation: drive direction (`None` = stopped).
    pub fn set_direction(&self, direction: Option<Direction>) {
        self.telemetry
            .send_modify(|state| state.drive.direction = direction);
    }

    /// Optimistic local mutation: cutter deck speed.
    pub fn set_cutter_speed(&self, speed: u8) {
        self.telemetry.send_modify(|state| state.cutter.speed = speed);
    }

    /// Record a stream lifecycle transition.
    pub fn set_link_status(&self, status: LinkStatus) {
        self.link.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            debug!(from = ?current, to = ?status, "link status");
            *current = status;
            true
        });
    }

    // ─── Consumer task ───────────────────────────────────────────────────────

    /// Spawn the dedicated task that drains inbound events into the store.
    ///
    /// Events are applied strictly in channel order, which is transport
    /// arrival order; the bounded channel gives the transport back-pressure
    /// when the consumer falls behind. The task finishes when every sender
    /// is dropped.
    pub fn spawn_consumer(
        store: Arc<StateStore>,
        mut events: mpsc::Receiver<StreamEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                debug!(mutation = event.mutation(), "applying stream event");
                store.apply(event);
            }
            debug!("event channel closed, state consumer stopping");
        })
    }
}
