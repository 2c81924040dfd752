//! Best-effort detection of where the user is working from, based on the
//! machine's network configuration. Failures never block the start-of-day
//! flow; they just degrade the answer to [WorkLocation::Unknown].

use std::{fmt::Display, process::Command};

use tracing::{debug, error, info};

use crate::config::WorkdayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkLocation {
    Home,
    Office,
    Unknown,
}

impl WorkLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLocation::Home => "Home",
            WorkLocation::Office => "Office",
            WorkLocation::Unknown => "unknown",
        }
    }
}

impl Display for WorkLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct LocationDetector {
    office_wifi_name: String,
    vpn_identifiers: Vec<String>,
}

impl LocationDetector {
    pub fn new(config: &WorkdayConfig) -> Self {
        Self {
            office_wifi_name: config.office_wifi_name.clone(),
            vpn_identifiers: config.vpn_identifiers.clone(),
        }
    }

    /// VPN beats office wifi: a VPN connection from the office still means
    /// the traffic is routed like home office work.
    pub fn detect(&self) -> WorkLocation {
        if self.is_connected_to_vpn() {
            info!("Found company VPN markers, working from home");
            WorkLocation::Home
        } else if self.is_connected_to_office_wifi() {
            info!("Found office network");
            WorkLocation::Office
        } else {
            info!("Failed to find a known work network");
            WorkLocation::Unknown
        }
    }

    fn is_connected_to_vpn(&self) -> bool {
        let output = if cfg!(windows) {
            command_output("ipconfig", &["/all"])
        } else {
            command_output("ip", &["addr"])
        };
        output.is_some_and(|output| self.vpn_markers_present(&output))
    }

    fn vpn_markers_present(&self, output: &str) -> bool {
        !self.vpn_identifiers.is_empty()
            && self
                .vpn_identifiers
                .iter()
                .all(|identifier| output.contains(identifier))
    }

    fn is_connected_to_office_wifi(&self) -> bool {
        let output = if cfg!(windows) {
            command_output("netsh", &["wlan", "show", "interfaces"])
        } else {
            command_output("nmcli", &["-t", "-f", "ACTIVE,SSID", "device", "wifi"])
        };
        output.is_some_and(|output| self.office_ssid_present(&output))
    }

    fn office_ssid_present(&self, output: &str) -> bool {
        !self.office_wifi_name.is_empty() && output.contains(&self.office_wifi_name)
    }
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!("{program} exited with {}", output.status);
            None
        }
        Err(e) => {
            error!("Failed to run {program}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::WorkdayConfig;

    use super::{LocationDetector, WorkLocation};

    fn detector(wifi: &str, vpn: &[&str]) -> LocationDetector {
        LocationDetector::new(&WorkdayConfig {
            office_wifi_name: wifi.to_string(),
            vpn_identifiers: vpn.iter().map(ToString::to_string).collect(),
            ..WorkdayConfig::default()
        })
    }

    #[test]
    fn all_vpn_markers_must_match() {
        let detector = detector("", &["tun-corp", "corp.example.com"]);
        assert!(detector.vpn_markers_present("tun-corp up corp.example.com"));
        assert!(!detector.vpn_markers_present("tun-corp up"));
    }

    #[test]
    fn empty_marker_lists_never_match() {
        let detector = detector("", &[]);
        assert!(!detector.vpn_markers_present("anything"));
        assert!(!detector.office_ssid_present("anything"));
    }

    #[test]
    fn ssid_match_is_a_plain_substring() {
        let detector = detector("OfficeNet", &[]);
        assert!(detector.office_ssid_present("yes:OfficeNet"));
        assert!(!detector.office_ssid_present("yes:HomeNet"));
    }

    #[test]
    fn locations_render_like_the_log_format() {
        assert_eq!(WorkLocation::Home.to_string(), "Home");
        assert_eq!(WorkLocation::Office.to_string(), "Office");
        assert_eq!(WorkLocation::Unknown.to_string(), "unknown");
    }
}
