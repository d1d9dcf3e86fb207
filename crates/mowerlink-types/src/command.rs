//! Local user intents and their wire encoding.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::state::Direction;
use crate::wire::{
    CommandMessage, METHOD_DIRECTION_START, METHOD_DIRECTION_STOP, METHOD_SET_CUTTER_SPEED,
    METHOD_SET_DRIVE_SPEED,
};

/// A user intent the dispatcher can apply locally and forward to the mower.
///
/// This is a closed enum: a command kind the backend does not understand is
/// unrepresentable, so "unknown command" is a compile error rather than a
/// runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the drive throttle cap, 0–100 percent.
    DriveSpeed(u8),
    /// Start moving in a direction, or stop (`None`).
    Direction(Option<Direction>),
    /// Set the cutter deck speed, 0–100 percent.
    CutterSpeed(u8),
}

impl Command {
    /// Encode this command as the frame the backend's command loop decodes.
    pub fn to_wire(&self) -> CommandMessage {
        match self {
            Command::DriveSpeed(speed) => {
                CommandMessage::new(METHOD_SET_DRIVE_SPEED, speed.to_string())
            }
            Command::CutterSpeed(speed) => {
                CommandMessage::new(METHOD_SET_CUTTER_SPEED, speed.to_string())
            }
            Command::Direction(Some(direction)) => {
                CommandMessage::new(METHOD_DIRECTION_START, direction.as_str())
            }
            // The stop request carries no meaningful value; the backend
            // ignores it and forces direction to "stopped".
            Command::Direction(None) => CommandMessage::new(METHOD_DIRECTION_STOP, ""),
        }
    }
}

/// A [`Command`] stamped with an id and issue time.
///
/// The id never goes on the wire today. It exists so a future
/// acknowledgement protocol can confirm or roll back the optimistic local
/// mutation without changing the dispatch interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub command: Command,
}

impl CommandEnvelope {
    pub fn new(command: Command) -> Self {
        Self {
            id: Uuid::new_v4(),
            issued_at: Utc::now(),
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_speed_encodes_as_decimal_string() {
        let msg = Command::DriveSpeed(42).to_wire();
        assert_eq!(msg.method, METHOD_SET_DRIVE_SPEED);
        assert_eq!(msg.value, "42");
    }

    #[test]
    fn cutter_speed_encodes_as_decimal_string() {
        let msg = Command::CutterSpeed(0).to_wire();
        assert_eq!(msg.method, METHOD_SET_CUTTER_SPEED);
        assert_eq!(msg.value, "0");
    }

    #[test]
    fn direction_start_carries_direction_name() {
        let msg = Command::Direction(Some(Direction::Reverse)).to_wire();
        assert_eq!(msg.method, METHOD_DIRECTION_START);
        assert_eq!(msg.value, "reverse");
    }

    #[test]
    fn direction_stop_carries_empty_value() {
        let msg = Command::Direction(None).to_wire();
        assert_eq!(msg.method, METHOD_DIRECTION_STOP);
        assert_eq!(msg.value, "");
    }

    #[test]
    fn envelopes_get_distinct_ids() {
        let a = CommandEnvelope::new(Command::DriveSpeed(10));
        let b = CommandEnvelope::new(Command::DriveSpeed(10));
        assert_ne!(a.id, b.id);
        assert_eq!(a.command, b.command);
    }
}
