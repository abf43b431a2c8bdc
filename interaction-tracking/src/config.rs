use serde::{Deserialize, Serialize};

/// Master switch for tracking. `0`, `false`, `off` or `no` disable it.
pub const ENV_TRACKING: &str = "INTERACTION_TRACKING";
/// Switch for subscriber notifications and pending-work counters.
pub const ENV_OBSERVER: &str = "INTERACTION_TRACKING_OBSERVER";

/// Capability flags for a [`Tracker`](crate::Tracker).
///
/// With `enabled` off every operation passes straight through to its callback.
/// With `observer` off, interactions still stack but no counters are kept and no
/// subscriber is ever notified. `observer` has no effect unless `enabled` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrackingConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default = "enabled_by_default")]
    pub observer: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            observer: true,
        }
    }
}

impl TrackingConfig {
    pub const DISABLED: TrackingConfig = TrackingConfig {
        enabled: false,
        observer: false,
    };

    /// Context stacking without subscriber notifications.
    pub const WITHOUT_OBSERVER: TrackingConfig = TrackingConfig {
        enabled: true,
        observer: false,
    };

    pub fn observer_enabled(&self) -> bool {
        self.enabled && self.observer
    }

    /// Read both flags from the environment, defaulting to enabled.
    pub fn from_env() -> Self {
        Self {
            enabled: env_flag(ENV_TRACKING).unwrap_or(true),
            observer: env_flag(ENV_OBSERVER).unwrap_or(true),
        }
    }
}

impl TryFrom<serde_json::Value> for TrackingConfig {
    type Error = serde_json::Error;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(json)
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    let flag = parse_flag(&value);
    if flag.is_none() {
        tracing::warn!(
            target: "interaction_tracking",
            variable = name,
            value = %value,
            "Ignoring unrecognized flag value"
        );
    }
    flag
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
