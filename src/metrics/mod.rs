//! Host and network readings for one dashboard cycle.
//!
//! Collection never fails as a whole: each source is read independently and
//! a failed read becomes [`Reading::Unavailable`] for that field only.

use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::app::Logger;
use crate::config::{
    DISK_MOUNT_POINT, INTERNET_PROBE_ADDR, INTERNET_PROBE_TIMEOUT_MS, LAN_PROBE_ADDR,
    SIGNAL_QUERY_TIMEOUT_MS, THERMAL_ZONE_PATH, UPTIME_PATH, WIRELESS_INTERFACE, WIRELESS_TOOL,
};

pub mod host;
pub mod network;

use host::HostProbe;

/// A metric value, or the sentinel for a failed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading<T> {
    Available(T),
    Unavailable,
}

impl<T> Reading<T> {
    pub fn from_result<E>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Reading::Available(value),
            Err(_) => Reading::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Available(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Available(value) => Some(value),
            Reading::Unavailable => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Available(value) => Reading::Available(f(value)),
            Reading::Unavailable => Reading::Unavailable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Available(value) => fmt::Display::fmt(value, f),
            Reading::Unavailable => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
}

impl Uptime {
    pub fn from_seconds(seconds: f64) -> Self {
        let whole = seconds.max(0.0) as u64;
        Self {
            days: whole / 86_400,
            hours: (whole % 86_400) / 3_600,
        }
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h", self.days, self.hours)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternetState {
    Connected,
    Disconnected,
}

impl fmt::Display for InternetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternetState::Connected => f.write_str("Connected"),
            InternetState::Disconnected => f.write_str("Disconnected"),
        }
    }
}

/// Everything one frame shows. Always fully populated.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub hostname: String,
    pub captured_at: NaiveDateTime,
    pub cpu_pct: Reading<f32>,
    pub mem_pct: Reading<f32>,
    pub disk_pct: Reading<f32>,
    pub temp_c: Reading<f32>,
    pub uptime: Reading<Uptime>,
    pub lan_ip: Reading<IpAddr>,
    pub internet: InternetState,
    pub wifi_signal: Reading<String>,
}

/// Anything that can produce a snapshot per cycle.
pub trait MetricsSource {
    fn collect(&mut self, logger: &Logger) -> MetricsSnapshot;
}

/// Where the collector looks for each reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    pub thermal_path: PathBuf,
    pub uptime_path: PathBuf,
    pub disk_mount: PathBuf,
    pub lan_probe: String,
    pub internet_probe: String,
    pub internet_timeout: Duration,
    pub wireless_tool: String,
    pub wireless_interface: String,
    pub signal_timeout: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            thermal_path: PathBuf::from(THERMAL_ZONE_PATH),
            uptime_path: PathBuf::from(UPTIME_PATH),
            disk_mount: PathBuf::from(DISK_MOUNT_POINT),
            lan_probe: LAN_PROBE_ADDR.to_string(),
            internet_probe: INTERNET_PROBE_ADDR.to_string(),
            internet_timeout: Duration::from_millis(INTERNET_PROBE_TIMEOUT_MS),
            wireless_tool: WIRELESS_TOOL.to_string(),
            wireless_interface: WIRELESS_INTERFACE.to_string(),
            signal_timeout: Duration::from_millis(SIGNAL_QUERY_TIMEOUT_MS),
        }
    }
}

/// Production collector backed by sysinfo, pseudo-files and network probes.
pub struct MetricsCollector {
    settings: CollectorSettings,
    host: HostProbe,
}

impl MetricsCollector {
    pub fn new(settings: CollectorSettings) -> Self {
        Self {
            settings,
            host: HostProbe::new(),
        }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }
}

impl MetricsSource for MetricsCollector {
    fn collect(&mut self, logger: &Logger) -> MetricsSnapshot {
        let s = &self.settings;
        let cpu_pct = guarded(logger, "cpu", self.host.cpu_percent());
        let mem_pct = guarded(logger, "memory", self.host.memory_percent());
        let disk_pct = guarded(logger, "disk", host::disk_percent(&s.disk_mount));
        let temp_c = guarded(logger, "temperature", host::read_temperature(&s.thermal_path));
        let uptime = guarded(logger, "uptime", host::read_uptime(&s.uptime_path));
        let lan_ip = guarded(logger, "lan ip", network::lan_ip(&s.lan_probe));
        let internet = network::probe_internet(&s.internet_probe, s.internet_timeout);
        let wifi_signal = guarded(
            logger,
            "wifi signal",
            network::wifi_signal(&s.wireless_tool, &s.wireless_interface, s.signal_timeout),
        );

        MetricsSnapshot {
            hostname: host::hostname(),
            captured_at: chrono::Local::now().naive_local(),
            cpu_pct,
            mem_pct,
            disk_pct,
            temp_c,
            uptime,
            lan_ip,
            internet,
            wifi_signal,
        }
    }
}

fn guarded<T>(logger: &Logger, what: &str, result: std::result::Result<T, String>) -> Reading<T> {
    if let Err(err) = &result {
        logger.debug(format!("{what} unavailable: {err}"));
    }
    Reading::from_result(result)
}
