use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name of the configuration inside the application directory.
pub const CONFIG_FILE: &str = "config.json";

/// Per-user settings. Every field has a default so a partial (or absent)
/// config file still yields a working setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkdayConfig {
    /// Daily target, in decimal hours.
    #[serde(default = "default_required_hours")]
    pub required_hours: f64,
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_seconds: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_summary_interval")]
    pub summary_interval_seconds: u64,
    /// SSID that identifies the office network.
    #[serde(default)]
    pub office_wifi_name: String,
    /// Strings that must all appear in the network configuration output for
    /// the machine to count as connected over the company VPN.
    #[serde(default)]
    pub vpn_identifiers: Vec<String>,
}

fn default_required_hours() -> f64 {
    8.8
}

fn default_idle_threshold() -> u32 {
    300
}

fn default_poll_interval() -> u64 {
    5
}

fn default_summary_interval() -> u64 {
    60
}

impl Default for WorkdayConfig {
    fn default() -> Self {
        Self {
            required_hours: default_required_hours(),
            idle_threshold_seconds: default_idle_threshold(),
            poll_interval_seconds: default_poll_interval(),
            summary_interval_seconds: default_summary_interval(),
            office_wifi_name: String::new(),
            vpn_identifiers: Vec::new(),
        }
    }
}

impl WorkdayConfig {
    /// Daily target in whole minutes. Converted once when a day entry is
    /// created; the entry keeps its own copy from then on.
    pub fn required_minutes(&self) -> u32 {
        (self.required_hours * 60.0).round() as u32
    }

    pub fn load_or_default(application_data_path: &Path) -> Result<Self> {
        let path = application_data_path.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).with_context(|| format!("parsing {path:?}"))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {path:?}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading {path:?}")),
        }
    }
}
