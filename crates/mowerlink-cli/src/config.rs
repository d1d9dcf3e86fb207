//! User configuration – reads/writes `~/.mowerlink/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use mowerlink_runtime::LinkConfig;

/// Persisted user configuration stored in `~/.mowerlink/config.toml`.
///
/// Every field is serde-defaulted so a partial (or absent) file still
/// yields a working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Host the mower's configuration endpoint lives on.
    #[serde(default = "default_mower_host")]
    pub mower_host: String,

    /// Port of the configuration endpoint.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,

    /// First reconnect delay after the stream drops, in milliseconds.
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    /// Cap on the reconnect delay, in milliseconds.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    /// Consecutive failed reconnects before the link is reported down.
    #[serde(default = "default_reconnect_attempts_before_down")]
    pub reconnect_attempts_before_down: u32,
}

fn default_mower_host() -> String {
    "robot-mower.local".to_string()
}
fn default_discovery_port() -> u16 {
    8088
}
fn default_reconnect_initial_ms() -> u64 {
    500
}
fn default_reconnect_max_ms() -> u64 {
    30_000
}
fn default_reconnect_attempts_before_down() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mower_host: default_mower_host(),
            discovery_port: default_discovery_port(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            reconnect_attempts_before_down: default_reconnect_attempts_before_down(),
        }
    }
}

impl Config {
    /// Translate into the runtime's [`LinkConfig`].
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            mower_host: self.mower_host.clone(),
            discovery_port: self.discovery_port,
            reconnect_initial: Duration::from_millis(self.reconnect_initial_ms),
            reconnect_max: Duration::from_millis(self.reconnect_max_ms),
            reconnect_attempts_before_down: self.reconnect_attempts_before_down,
            ..LinkConfig::default()
        }
    }
}

/// Return the path to `~/.mowerlink/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".mowerlink").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `MOWERLINK_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `MOWERLINK_HOST` | `mower_host` |
/// | `MOWERLINK_DISCOVERY_PORT` | `discovery_port` |
/// | `MOWERLINK_RECONNECT_MAX_MS` | `reconnect_max_ms` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MOWERLINK_HOST") {
        cfg.mower_host = v;
    }
    if let Ok(v) = std::env::var("MOWERLINK_DISCOVERY_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.discovery_port = port;
    }
    if let Ok(v) = std::env::var("MOWERLINK_RECONNECT_MAX_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.reconnect_max_ms = ms;
    }
}

/// Save the config to disk, creating `~/.mowerlink/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_conventional_mower() {
        let cfg = Config::default();
        assert_eq!(cfg.mower_host, "robot-mower.local");
        assert_eq!(cfg.discovery_port, 8088);
        assert_eq!(cfg.reconnect_attempts_before_down, 5);
    }

    #[test]
    fn link_config_translation_converts_durations() {
        let cfg = Config {
            reconnect_initial_ms: 250,
            reconnect_max_ms: 10_000,
            ..Config::default()
        };
        let link = cfg.link_config();
        assert_eq!(link.reconnect_initial, Duration::from_millis(250));
        assert_eq!(link.reconnect_max, Duration::from_secs(10));
        assert_eq!(link.mower_host, "robot-mower.local");
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "mower_host = \"10.0.0.42\"\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.mower_host, "10.0.0.42");
        assert_eq!(loaded.discovery_port, 8088);
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_mowerlink_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".mowerlink"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn apply_env_overrides_changes_host() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("MOWERLINK_HOST", "mower-dev.local") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.mower_host, "mower-dev.local");
        unsafe { std::env::remove_var("MOWERLINK_HOST") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_port() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("MOWERLINK_DISCOVERY_PORT", "not-a-port") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.discovery_port, 8088);
        unsafe { std::env::remove_var("MOWERLINK_DISCOVERY_PORT") };
    }
}
