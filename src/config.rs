//! Compiled-in tunables. There is no config file; everything the daemon needs
//! to know about the panel, the cadence and the probes lives here.

use std::path::PathBuf;
use std::time::Duration;

pub const PANEL_WIDTH: u32 = 250;
pub const PANEL_HEIGHT: u32 = 122;

pub const FULL_REFRESH_PERIOD: u32 = 3600;
pub const POLL_INTERVAL_MS: u64 = 1_000;
pub const ERROR_COOLDOWN_MS: u64 = 5_000;

pub const DEFAULT_LOG_FILE: &str = "epaper_stats.log";

pub const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";
pub const UPTIME_PATH: &str = "/proc/uptime";
pub const DISK_MOUNT_POINT: &str = "/";

pub const LAN_PROBE_ADDR: &str = "8.8.8.8:80";
pub const INTERNET_PROBE_ADDR: &str = "8.8.8.8:53";
pub const INTERNET_PROBE_TIMEOUT_MS: u64 = 3_000;

pub const WIRELESS_TOOL: &str = "iwconfig";
pub const WIRELESS_INTERFACE: &str = "wlan0";
pub const SIGNAL_QUERY_TIMEOUT_MS: u64 = 2_000;

const SYSTEM_FONT_CANDIDATES: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

/// Ordered font search list: files shipped next to the binary first, then
/// the usual DejaVu locations.
pub fn font_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
    {
        paths.push(dir.join("pic").join("Font.ttc"));
        paths.push(dir.join("Font.ttc"));
    }
    paths.extend(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));
    paths
}

/// Cadence and refresh policy for the monitor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub full_refresh_period: u32,
    pub poll_interval: Duration,
    pub error_cooldown: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            full_refresh_period: FULL_REFRESH_PERIOD,
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            error_cooldown: Duration::from_millis(ERROR_COOLDOWN_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.full_refresh_period, 3600);
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.error_cooldown, Duration::from_secs(5));
    }

    #[test]
    fn font_candidates_end_with_system_fonts() {
        let paths = font_candidates();
        assert!(paths.len() >= SYSTEM_FONT_CANDIDATES.len());
        let tail: Vec<_> = paths[paths.len() - 3..].to_vec();
        assert_eq!(
            tail,
            SYSTEM_FONT_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        );
    }
}
