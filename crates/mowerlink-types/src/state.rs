//! The typed telemetry state tree held client-side.
//!
//! Every leaf defaults to an explicit sentinel (`None`, or
//! [`DeviceStatus::Unknown`]) before the first telemetry snapshot arrives,
//! so observers never have to guard against absent fields. The tree is
//! replaced wholesale by each `setMowerState` event – a full replace, not a
//! merge.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

/// Health of a sensor subsystem as reported by the mower.
///
/// Deserialization is deliberately forgiving here: a `null` status or a
/// string the backend grows later degrades to `Unknown` instead of failing
/// the whole snapshot. Statuses are informational; directions are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum DeviceStatus {
    Ok,
    Warn,
    Fault,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for DeviceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("Ok") => DeviceStatus::Ok,
            Some("Warn") => DeviceStatus::Warn,
            Some("Fault") => DeviceStatus::Fault,
            _ => DeviceStatus::Unknown,
        })
    }
}

/// Drive direction requested by the operator or reported by the mower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
    Left,
    Right,
    Stopped,
}

impl Direction {
    /// Wire name of this direction, as the backend expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Platform domain
// ─────────────────────────────────────────────────────────────────────────────

/// 1/5/15-minute load averages of the mower's onboard computer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadAverage {
    pub load1: Option<f64>,
    pub load5: Option<f64>,
    pub load15: Option<f64>,
}

/// CPU utilisation. `cores` carries one entry per core, so the same
/// snapshot shape works on any board.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuLoad {
    pub count: Option<u32>,
    /// Aggregate utilisation percentage across all cores.
    pub total: Option<f64>,
    /// Per-core utilisation percentages, `count` entries long.
    pub cores: Vec<f64>,
}

/// Memory totals in bytes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryUsage {
    pub total: Option<u64>,
    pub available: Option<u64>,
}

/// Root-filesystem usage in bytes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskUsage {
    pub total: Option<u64>,
    pub free: Option<u64>,
}

/// Identity and health of the computer the mower runs on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformState {
    pub hostname: Option<String>,
    pub operating_system: Option<String>,
    pub platform: Option<String>,
    pub load_average: LoadAverage,
    pub cpu_load: CpuLoad,
    pub memory_usage: MemoryUsage,
    pub disk_usage: DiskUsage,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sensor and actuator domains
// ─────────────────────────────────────────────────────────────────────────────

/// Battery pack telemetry. Voltages in volts, current in amps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatteryState {
    pub status: DeviceStatus,
    /// Pack voltage when fully charged.
    pub voltage_nominal: Option<f32>,
    /// Voltage below which the shell should warn the operator.
    pub voltage_warn: Option<f32>,
    pub voltage: Option<f32>,
    pub current: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassState {
    pub status: DeviceStatus,
    /// Cardinal bearing as reported, e.g. `"NE"`.
    pub bearing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsState {
    pub status: DeviceStatus,
    /// `"lat, lon"` as reported, e.g. `"40.780715, -78.007729"`.
    pub coordinates: Option<String>,
}

/// Drive train setpoints. `speed` is a percentage throttle cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveState {
    pub speed: u8,
    pub direction: Option<Direction>,
}

impl Default for DriveState {
    fn default() -> Self {
        Self {
            speed: 100,
            direction: None,
        }
    }
}

/// Cutter deck setpoint. `speed` is a percentage, 0 = blades stopped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CutterState {
    pub speed: u8,
}

// ─────────────────────────────────────────────────────────────────────────────
// The tree
// ─────────────────────────────────────────────────────────────────────────────

/// The full mower telemetry snapshot.
///
/// `TelemetryState::default()` is the pre-telemetry sentinel tree: every
/// status is `Unknown`, every reading is `None`, drive speed is 100 and
/// cutter speed is 0. Domains missing from a deserialized snapshot come out
/// as these same defaults, which is what makes applying a snapshot a full
/// replace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryState {
    pub platform: PlatformState,
    pub battery: BatteryState,
    pub compass: CompassState,
    pub gps: GpsState,
    pub drive: DriveState,
    pub cutter: CutterState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tree_is_fully_defined_sentinels() {
        let state = TelemetryState::default();

        assert_eq!(state.battery.status, DeviceStatus::Unknown);
        assert_eq!(state.compass.status, DeviceStatus::Unknown);
        assert_eq!(state.gps.status, DeviceStatus::Unknown);

        assert!(state.platform.hostname.is_none());
        assert!(state.platform.load_average.load1.is_none());
        assert!(state.platform.cpu_load.cores.is_empty());
        assert!(state.battery.voltage.is_none());
        assert!(state.compass.bearing.is_none());
        assert!(state.gps.coordinates.is_none());
        assert!(state.drive.direction.is_none());

        assert_eq!(state.drive.speed, 100);
        assert_eq!(state.cutter.speed, 0);
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut state = TelemetryState::default();
        state.battery.status = DeviceStatus::Ok;
        state.battery.voltage = Some(24.3);
        state.battery.current = Some(1.4);
        state.compass.bearing = Some("NE".to_string());
        state.drive.speed = 80;
        state.drive.direction = Some(Direction::Forward);
        state.platform.cpu_load.cores = vec![12.5, 3.0, 0.0, 41.0];

        let json = serde_json::to_string(&state).unwrap();
        let back: TelemetryState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let mut state = TelemetryState::default();
        state.battery.voltage_nominal = Some(24.3);
        state.platform.operating_system = Some("linux".to_string());

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("voltageNominal"));
        assert!(json.contains("operatingSystem"));
        assert!(json.contains("cpuLoad"));
        assert!(json.contains("diskUsage"));
    }

    #[test]
    fn missing_domains_deserialize_to_sentinels() {
        // A snapshot carrying only the drive domain: everything else must
        // come out as the default sentinels, not an error.
        let back: TelemetryState =
            serde_json::from_str(r#"{"drive":{"speed":55,"direction":"left"}}"#).unwrap();
        assert_eq!(back.drive.speed, 55);
        assert_eq!(back.drive.direction, Some(Direction::Left));
        assert_eq!(back.battery.status, DeviceStatus::Unknown);
        assert!(back.gps.coordinates.is_none());
    }

    #[test]
    fn unexpected_status_string_degrades_to_unknown() {
        let back: BatteryState =
            serde_json::from_str(r#"{"status":"Recalibrating","voltage":23.9}"#).unwrap();
        assert_eq!(back.status, DeviceStatus::Unknown);
        assert_eq!(back.voltage, Some(23.9));
    }

    #[test]
    fn null_status_degrades_to_unknown() {
        let back: GpsState =
            serde_json::from_str(r#"{"status":null,"coordinates":"40.78, -78.00"}"#).unwrap();
        assert_eq!(back.status, DeviceStatus::Unknown);
        assert_eq!(back.coordinates.as_deref(), Some("40.78, -78.00"));
    }

    #[test]
    fn direction_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Forward).unwrap(), "\"forward\"");
        assert_eq!(Direction::Stopped.to_string(), "stopped");
        let back: Direction = serde_json::from_str("\"reverse\"").unwrap();
        assert_eq!(back, Direction::Reverse);
    }

    #[test]
    fn unknown_direction_is_rejected() {
        // Directions are commands, not free-form labels; typos must fail
        // validation rather than silently steer the mower.
        assert!(serde_json::from_str::<Direction>("\"sideways\"").is_err());
    }
}
