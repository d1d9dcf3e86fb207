//! [`CommandDispatcher`] – optimistic local mutation + outbound forwarding.
//!
//! Dispatching a [`Command`] does two things, in order:
//!
//! 1. applies the matching single-field mutation to the [`StateStore`]
//!    synchronously, before any network round-trip, so the UI reacts
//!    immediately;
//! 2. forwards the encoded frame through the [`OutboundLink`].
//!
//! A delivery failure is reported to the caller and does **not** roll back
//! the optimistic mutation. The returned receipt carries the command id so
//! a future acknowledgement protocol can confirm or reconcile it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use mowerlink_state::StateStore;
use mowerlink_types::{Command, CommandEnvelope, LinkError};

use crate::stream::OutboundLink;

/// Highest accepted drive/cutter speed, in percent.
const MAX_SPEED: u8 = 100;

/// A command the dispatcher refused or could not deliver.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The value failed validation; no mutation was applied.
    #[error("speed {0} is out of range 0-{MAX_SPEED}")]
    SpeedOutOfRange(u8),

    /// The local mutation was applied but the frame was not delivered.
    #[error("command {id} applied locally but not delivered: {source}")]
    Delivery {
        id: Uuid,
        #[source]
        source: LinkError,
    },
}

/// Proof of a dispatched and queued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub command_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// CommandDispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// The presentation shell's only write path besides startup endpoint
/// resolution.
pub struct CommandDispatcher {
    store: Arc<StateStore>,
    link: Arc<dyn OutboundLink>,
}

impl CommandDispatcher {
    pub fn new(store: Arc<StateStore>, link: Arc<dyn OutboundLink>) -> Self {
        Self { store, link }
    }

    /// Validate, optimistically apply, and forward one command.
    ///
    /// # Errors
    ///
    /// * [`DispatchError::SpeedOutOfRange`] – rejected before any mutation.
    /// * [`DispatchError::Delivery`] – the optimistic mutation stands; the
    ///   error carries the command id for later reconciliation.
    pub async fn dispatch(&self, command: Command) -> Result<DispatchReceipt, DispatchError> {
        validate(command)?;
        let envelope = CommandEnvelope::new(command);

        match command {
            Command::DriveSpeed(speed) => self.store.set_drive_speed(speed),
            Command::Direction(direction) => self.store.set_direction(direction),
            Command::CutterSpeed(speed) => self.store.set_cutter_speed(speed),
        }

        if let Err(source) = self.link.send(envelope.command.to_wire()).await {
            warn!(id = %envelope.id, error = %source, "command applied locally but not delivered");
            return Err(DispatchError::Delivery {
                id: envelope.id,
                source,
            });
        }

        debug!(id = %envelope.id, ?command, "command dispatched");
        Ok(DispatchReceipt {
            command_id: envelope.id,
            issued_at: envelope.issued_at,
        })
    }
}

fn validate(command: Command) -> Result<(), DispatchError> {
    match command {
        Command::DriveSpeed(speed) | Command::CutterSpeed(speed) if speed > MAX_SPEED => {
            Err(DispatchError::SpeedOutOfRange(speed))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mowerlink_types::state::Direction;
    use mowerlink_types::wire::{METHOD_DIRECTION_START, METHOD_SET_DRIVE_SPEED};
    use mowerlink_types::CommandMessage;

    /// Test double for the outbound seam: records frames, optionally fails.
    struct RecordingLink {
        sent: Mutex<Vec<CommandMessage>>,
        fail_with: Option<fn() -> LinkError>,
    }

    impl RecordingLink {
        fn working() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_with: None,
            })
        }

        fn broken() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(|| LinkError::NotConnected),
            })
        }

        fn sent(&self) -> Vec<CommandMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutboundLink for RecordingLink {
        async fn send(&self, message: CommandMessage) -> Result<(), LinkError> {
            if let Some(make_err) = self.fail_with {
                return Err(make_err());
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn make_dispatcher(link: Arc<RecordingLink>) -> (Arc<StateStore>, CommandDispatcher) {
        let store = StateStore::init();
        let dispatcher = CommandDispatcher::new(Arc::clone(&store), link);
        (store, dispatcher)
    }

    #[tokio::test]
    async fn dispatch_updates_store_and_forwards_frame() {
        let link = RecordingLink::working();
        let (store, dispatcher) = make_dispatcher(Arc::clone(&link));

        let receipt = dispatcher.dispatch(Command::DriveSpeed(42)).await.unwrap();

        assert_eq!(store.telemetry().drive.speed, 42);
        let sent = link.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, METHOD_SET_DRIVE_SPEED);
        assert_eq!(sent[0].value, "42");
        assert!(!receipt.command_id.is_nil());
    }

    #[tokio::test]
    async fn optimistic_mutation_survives_delivery_failure() {
        let link = RecordingLink::broken();
        let (store, dispatcher) = make_dispatcher(link);

        let err = dispatcher.dispatch(Command::DriveSpeed(42)).await.unwrap_err();

        // The local update already happened, before any network round-trip.
        assert_eq!(store.telemetry().drive.speed, 42);
        // And the failure is reported, id included, rather than swallowed.
        match err {
            DispatchError::Delivery { id, source } => {
                assert!(!id.is_nil());
                assert!(matches!(source, LinkError::NotConnected));
            }
            other => panic!("expected Delivery error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn out_of_range_speed_is_rejected_before_mutation() {
        let link = RecordingLink::working();
        let (store, dispatcher) = make_dispatcher(Arc::clone(&link));

        let err = dispatcher.dispatch(Command::CutterSpeed(101)).await.unwrap_err();

        assert!(matches!(err, DispatchError::SpeedOutOfRange(101)));
        // Neither the store nor the wire saw anything.
        assert_eq!(store.telemetry().cutter.speed, 0);
        assert!(link.sent().is_empty());
    }

    #[tokio::test]
    async fn direction_dispatch_encodes_start_request() {
        let link = RecordingLink::working();
        let (store, dispatcher) = make_dispatcher(Arc::clone(&link));

        dispatcher
            .dispatch(Command::Direction(Some(Direction::Left)))
            .await
            .unwrap();

        assert_eq!(store.telemetry().drive.direction, Some(Direction::Left));
        let sent = link.sent();
        assert_eq!(sent[0].method, METHOD_DIRECTION_START);
        assert_eq!(sent[0].value, "left");
    }

    #[tokio::test]
    async fn distinct_dispatches_get_distinct_ids() {
        let link = RecordingLink::working();
        let (_store, dispatcher) = make_dispatcher(link);

        let a = dispatcher.dispatch(Command::DriveSpeed(10)).await.unwrap();
        let b = dispatcher.dispatch(Command::DriveSpeed(20)).await.unwrap();
        assert_ne!(a.command_id, b.command_id);
    }
}
