//! `mowerlink-types` – Shared Vocabulary
//!
//! Data types spoken by every MowerLink crate: the telemetry state tree,
//! the wire protocol (inbound mutation events, outbound command frames),
//! endpoint discovery results, link lifecycle status, and the error types
//! that span the whole client.
//!
//! # Modules
//!
//! - [`state`] – the typed [`TelemetryState`][state::TelemetryState] tree
//!   and its fully-defaulted sentinel values.
//! - [`wire`] – frame parsing/encoding: [`StreamEvent`][wire::StreamEvent]
//!   for inbound mutations, [`CommandMessage`][wire::CommandMessage] for
//!   outbound commands.
//! - [`command`] – local user intents ([`Command`][command::Command]) and
//!   the id-carrying [`CommandEnvelope`][command::CommandEnvelope].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod command;
pub mod state;
pub mod wire;

pub use command::{Command, CommandEnvelope};
pub use state::{
    BatteryState, CompassState, CutterState, DeviceStatus, Direction, DriveState, GpsState,
    PlatformState, TelemetryState,
};
pub use wire::{CommandMessage, StreamEvent};

// ─────────────────────────────────────────────────────────────────────────────
// Endpoint set
// ─────────────────────────────────────────────────────────────────────────────

/// The backend's resolved network locations.
///
/// Produced exactly once at startup by the endpoint resolver and replaced
/// wholesale, never patched field-by-field.
///
/// Invariant: `is_fallback == true` implies `camera` holds the constant
/// placeholder image URL and `ws` is empty – both fields are always present,
/// never null.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndpointSet {
    /// URL of the MJPEG camera feed.
    pub camera: String,
    /// URL of the bidirectional telemetry/control WebSocket.
    pub ws: String,
    /// `true` when discovery failed and these are the placeholder values.
    #[serde(default)]
    pub is_fallback: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Link status
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the persistent streaming connection, as observed by the
/// presentation shell.
///
/// `Closed` and `Errored` are transient: the stream supervisor re-enters
/// `Connecting` with exponential backoff after either. `Down` is the
/// persistent-disconnection state reached after a configured number of
/// consecutive failed attempts; retries continue at the capped interval
/// while `Down` is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No stream URL known, or the supervisor has not started.
    Idle,
    /// A connection attempt is in flight. `attempt` counts consecutive
    /// attempts since the last successful open, starting at 1.
    Connecting { attempt: u32 },
    /// The stream is open; inbound events flow and commands can be sent.
    Open,
    /// The peer closed the connection cleanly.
    Closed,
    /// The connection failed or dropped with an error.
    Errored,
    /// Too many consecutive failures; the link is considered down.
    Down,
}

impl LinkStatus {
    /// `true` only while the stream is open and commands can be delivered.
    pub fn is_open(&self) -> bool {
        matches!(self, LinkStatus::Open)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A frame that failed boundary validation. The prior state is always left
/// intact when one of these is raised.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    Json(String),

    #[error("frame is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unknown namespace `{0}`")]
    UnknownNamespace(String),

    #[error("unknown mutation `{0}`")]
    UnknownMutation(String),

    #[error("malformed `{mutation}` payload: {detail}")]
    Payload { mutation: String, detail: String },
}

/// Errors spanning discovery, the stream transport, and outbound delivery.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("endpoint discovery failed: {0}")]
    Discovery(String),

    #[error("stream transport error: {0}")]
    Transport(String),

    #[error("stream is not connected")]
    NotConnected,

    #[error("outbound command queue is full")]
    QueueFull,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_set_roundtrip() {
        let set = EndpointSet {
            camera: "http://mower.local:8088/camera".to_string(),
            ws: "ws://mower.local:8088/ws".to_string(),
            is_fallback: false,
        };
        let json = serde_json::to_string(&set).unwrap();
        let back: EndpointSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
    }

    #[test]
    fn endpoint_set_tolerates_missing_fallback_flag() {
        // The discovery endpoint only sends `camera` and `ws`.
        let back: EndpointSet =
            serde_json::from_str(r#"{"camera":"http://h/cam","ws":"ws://h/ws"}"#).unwrap();
        assert!(!back.is_fallback);
        assert_eq!(back.camera, "http://h/cam");
    }

    #[test]
    fn only_open_status_is_open() {
        assert!(LinkStatus::Open.is_open());
        for status in [
            LinkStatus::Idle,
            LinkStatus::Connecting { attempt: 1 },
            LinkStatus::Closed,
            LinkStatus::Errored,
            LinkStatus::Down,
        ] {
            assert!(!status.is_open(), "{status:?} must not count as open");
        }
    }

    #[test]
    fn protocol_error_display_names_the_field() {
        let err = ProtocolError::MissingField("namespace");
        assert!(err.to_string().contains("namespace"));

        let err = ProtocolError::UnknownMutation("dropTable".to_string());
        assert!(err.to_string().contains("dropTable"));
    }

    #[test]
    fn link_error_wraps_protocol_error_transparently() {
        let err: LinkError = ProtocolError::UnknownNamespace("garden".to_string()).into();
        assert!(err.to_string().contains("garden"));
    }
}
