use std::io::Write;
use std::net::{IpAddr, TcpListener};
use std::time::Duration;

use epaper_stat::{
    app::{LogLevel, Logger},
    metrics::{CollectorSettings, InternetState, MetricsCollector, MetricsSource, Reading, Uptime},
    render::{FontSet, FrameRenderer},
};

fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

fn offline_settings(dir: &tempfile::TempDir) -> CollectorSettings {
    let uptime_path = dir.path().join("uptime");
    let mut file = std::fs::File::create(&uptime_path).unwrap();
    writeln!(file, "97200.55 380000.10").unwrap();

    CollectorSettings {
        thermal_path: dir.path().join("missing_temp"),
        uptime_path,
        disk_mount: "/".into(),
        lan_probe: "127.0.0.1:9".into(),
        internet_probe: closed_port(),
        internet_timeout: Duration::from_millis(300),
        wireless_tool: "epaper-stat-no-such-tool".into(),
        wireless_interface: "wlan0".into(),
        signal_timeout: Duration::from_millis(500),
    }
}

#[test]
fn missing_sources_degrade_to_unavailable_individually() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::new(LogLevel::Error, None);
    let mut collector = MetricsCollector::new(offline_settings(&dir));

    let snapshot = collector.collect(&logger);

    assert_eq!(snapshot.temp_c, Reading::Unavailable);
    assert_eq!(snapshot.wifi_signal, Reading::Unavailable);
    assert_eq!(snapshot.internet, InternetState::Disconnected);
    assert_eq!(
        snapshot.uptime,
        Reading::Available(Uptime { days: 1, hours: 3 })
    );
    assert_eq!(
        snapshot.lan_ip,
        Reading::Available("127.0.0.1".parse::<IpAddr>().unwrap())
    );
    assert!(!snapshot.hostname.is_empty());
}

#[test]
fn degraded_snapshot_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::new(LogLevel::Error, None);
    let mut collector = MetricsCollector::new(offline_settings(&dir));
    let renderer = FrameRenderer::new(FontSet::builtin());

    let frame = renderer.render(&collector.collect(&logger));
    assert_eq!((frame.width(), frame.height()), (250, 122));
    assert!(frame.ink_count() > 0);
    assert_eq!(frame.to_panel_buffer().len(), 4000);
}

#[test]
fn missing_thermal_file_leaves_other_host_readings_available() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::new(LogLevel::Error, None);
    let mut collector = MetricsCollector::new(offline_settings(&dir));

    let snapshot = collector.collect(&logger);

    assert_eq!(snapshot.temp_c, Reading::Unavailable);
    assert!(snapshot.cpu_pct.is_available());
    assert!(snapshot.mem_pct.is_available());
    assert!(snapshot.disk_pct.is_available());
    assert!(snapshot.uptime.is_available());
}

#[test]
fn unroutable_lan_probe_reads_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::new(LogLevel::Error, None);
    let settings = CollectorSettings {
        lan_probe: "not-an-addr".into(),
        ..offline_settings(&dir)
    };
    let mut collector = MetricsCollector::new(settings);

    let snapshot = collector.collect(&logger);

    assert_eq!(snapshot.lan_ip, Reading::Unavailable);
    assert_eq!(snapshot.lan_ip.to_string(), "N/A");
    assert_eq!(snapshot.internet, InternetState::Disconnected);
    assert!(snapshot.uptime.is_available());
}
