//! Frame parsing and encoding for the streaming channel.
//!
//! Inbound text frames are Vuex-style mutation envelopes:
//!
//! ```json
//! { "namespace": "mower", "mutation": "setMowerState",
//!   "platform": {...}, "battery": {...}, "compass": {...},
//!   "gps": {...}, "drive": {...}, "cutter": {...} }
//! ```
//!
//! [`StreamEvent::parse`] validates the envelope at the transport boundary
//! and produces a tagged variant; anything malformed is rejected with a
//! [`ProtocolError`] so the prior state is never partially overwritten.
//!
//! Outbound frames are [`CommandMessage`] values, `{"method": ..,
//! "value": ..}`, matching what the mower's command loop decodes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;
use crate::state::TelemetryState;

/// Namespace the mower publishes all mutations under.
pub const NAMESPACE_MOWER: &str = "mower";

/// Mutation name of the full-state replacement event.
pub const MUTATION_SET_MOWER_STATE: &str = "setMowerState";

/// Outbound command method names the backend dispatches on.
pub const METHOD_SET_DRIVE_SPEED: &str = "setMowerDriveSpeed";
pub const METHOD_SET_CUTTER_SPEED: &str = "setMowerCutterSpeed";
pub const METHOD_DIRECTION_START: &str = "requestDirectionStart";
pub const METHOD_DIRECTION_STOP: &str = "requestDirectionStop";

// ─────────────────────────────────────────────────────────────────────────────
// Inbound events
// ─────────────────────────────────────────────────────────────────────────────

/// A validated inbound event from the streaming channel.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Full telemetry snapshot replacing every domain of the local tree.
    MowerState(Box<TelemetryState>),
}

impl StreamEvent {
    /// Parse and validate one inbound text frame.
    ///
    /// # Errors
    ///
    /// * [`ProtocolError::Json`] – the frame is not JSON.
    /// * [`ProtocolError::MissingField`] – no `namespace` or `mutation`.
    /// * [`ProtocolError::UnknownNamespace`] – namespace is not `"mower"`.
    /// * [`ProtocolError::UnknownMutation`] – unrecognised mutation name.
    /// * [`ProtocolError::Payload`] – the state payload has the wrong shape
    ///   (e.g. a string where a voltage belongs).
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Json(e.to_string()))?;

        let namespace = value
            .get("namespace")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingField("namespace"))?;
        if namespace != NAMESPACE_MOWER {
            return Err(ProtocolError::UnknownNamespace(namespace.to_string()));
        }

        let mutation = value
            .get("mutation")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingField("mutation"))?
            .to_string();

        match mutation.as_str() {
            MUTATION_SET_MOWER_STATE => {
                let state: TelemetryState =
                    serde_json::from_value(value).map_err(|e| ProtocolError::Payload {
                        mutation,
                        detail: e.to_string(),
                    })?;
                Ok(StreamEvent::MowerState(Box::new(state)))
            }
            _ => Err(ProtocolError::UnknownMutation(mutation)),
        }
    }

    /// Mutation name of this event, for logging.
    pub fn mutation(&self) -> &'static str {
        match self {
            StreamEvent::MowerState(_) => MUTATION_SET_MOWER_STATE,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound commands
// ─────────────────────────────────────────────────────────────────────────────

/// One outbound command frame.
///
/// `value` is always a string – the backend parses numbers out of it – so
/// the frame shape stays identical across command kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub method: String,
    pub value: String,
}

impl CommandMessage {
    pub fn new(method: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            value: value.into(),
        }
    }

    /// Serialize to the JSON text the socket carries.
    pub fn to_json(&self) -> String {
        // A struct of two strings cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
