use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use epaper_stat::{
    app::{LogLevel, Logger, MonitorLoop},
    config::MonitorConfig,
    epd::fake::{FakePanel, PanelCall},
    metrics::{InternetState, MetricsSnapshot, MetricsSource, Reading},
    render::{FontSet, FrameRenderer},
};

/// Produces a fixed snapshot and stops the loop after `limit` collections.
struct StopAfter {
    running: Arc<AtomicBool>,
    collected: usize,
    limit: usize,
}

impl MetricsSource for StopAfter {
    fn collect(&mut self, _logger: &Logger) -> MetricsSnapshot {
        self.collected += 1;
        if self.collected >= self.limit {
            self.running.store(false, Ordering::SeqCst);
        }
        MetricsSnapshot {
            hostname: "stats-pi".into(),
            captured_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(9, 30, self.collected as u32 % 60))
                .unwrap(),
            cpu_pct: Reading::Available(12.5),
            mem_pct: Reading::Available(48.0),
            disk_pct: Reading::Available(61.0),
            temp_c: Reading::Available(47.2),
            uptime: Reading::Unavailable,
            lan_ip: Reading::Available("192.168.1.20".parse().unwrap()),
            internet: InternetState::Connected,
            wifi_signal: Reading::Available("-52".into()),
        }
    }
}

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        full_refresh_period: 3,
        poll_interval: Duration::from_millis(5),
        error_cooldown: Duration::from_millis(5),
    }
}

#[test]
fn loop_stops_and_cleans_up_exactly_once() {
    let logger = Logger::new(LogLevel::Error, None);
    let running = Arc::new(AtomicBool::new(true));
    let panel = FakePanel::new();
    let source = StopAfter {
        running: running.clone(),
        collected: 0,
        limit: 4,
    };

    MonitorLoop::new(
        source,
        FrameRenderer::new(FontSet::builtin()),
        panel.clone(),
        &logger,
        fast_config(),
    )
    .run(&running);

    assert_eq!(
        panel.calls(),
        vec![
            PanelCall::Init,
            PanelCall::Clear,
            PanelCall::Init,
            PanelCall::Display,
            PanelCall::DisplayPartial,
            PanelCall::DisplayPartial,
            PanelCall::Init,
            PanelCall::Display,
            PanelCall::Init,
            PanelCall::Clear,
            PanelCall::Sleep
        ]
    );
}

#[test]
fn failing_cycles_keep_the_loop_alive() {
    let logger = Logger::new(LogLevel::Error, None);
    let running = Arc::new(AtomicBool::new(true));
    let panel = FakePanel::new();
    panel.set_broken(PanelCall::Display, true);
    let source = StopAfter {
        running: running.clone(),
        collected: 0,
        limit: 3,
    };

    MonitorLoop::new(
        source,
        FrameRenderer::new(FontSet::builtin()),
        panel.clone(),
        &logger,
        fast_config(),
    )
    .run(&running);

    // Each failed cycle reinitialises before retrying the full push.
    assert_eq!(panel.count(PanelCall::Display), 3);
    assert_eq!(panel.count(PanelCall::Clear), 4);
    assert_eq!(panel.count(PanelCall::Sleep), 1);
}

#[test]
fn stop_signal_interrupts_long_poll_interval() {
    let logger = Logger::new(LogLevel::Error, None);
    let running = Arc::new(AtomicBool::new(true));
    let panel = FakePanel::new();
    let source = StopAfter {
        running: running.clone(),
        collected: 0,
        limit: usize::MAX,
    };
    let stopper = {
        let running = running.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            running.store(false, Ordering::SeqCst);
        })
    };

    let started = Instant::now();
    MonitorLoop::new(
        source,
        FrameRenderer::new(FontSet::builtin()),
        panel.clone(),
        &logger,
        MonitorConfig {
            poll_interval: Duration::from_secs(30),
            ..fast_config()
        },
    )
    .run(&running);
    stopper.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(panel.count(PanelCall::Display), 1);
    assert_eq!(panel.count(PanelCall::Sleep), 1);
}
