use crate::{
    cli::RunOptions,
    config::{font_candidates, MonitorConfig},
    epd::{rppal_bus::RppalPanelBus, Epd2in13V4},
    metrics::{CollectorSettings, MetricsCollector},
    render::{FontSet, FontSource, FrameRenderer},
    Error, Result,
};
use std::str::FromStr;

mod lifecycle;
mod logger;
mod monitor;

use lifecycle::create_shutdown_flag;
pub use lifecycle::{sleep_while_running, DisplayGuard};
pub use logger::{resolve_log_path, LogLevel, Logger};
pub use monitor::MonitorLoop;

/// Config for the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub monitor: MonitorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_file: None,
            monitor: MonitorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Apply CLI overrides on top of the built-in defaults.
    pub fn from_options(opts: RunOptions) -> Result<Self> {
        let mut cfg = AppConfig::default();
        if let Some(level) = opts.log_level {
            cfg.log_level = LogLevel::from_str(&level)
                .map_err(|_| Error::InvalidArgs(format!("invalid log level '{level}'")))?;
        }
        if let Some(file) = opts.log_file {
            cfg.log_file = Some(file);
        }
        Ok(cfg)
    }
}

pub struct App {
    config: AppConfig,
    logger: Logger,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let log_path = resolve_log_path(config.log_file.clone());
        let logger = Logger::new(config.log_level, Some(log_path));
        Self { config, logger }
    }

    pub fn from_options(opts: RunOptions) -> Result<Self> {
        Ok(Self::new(AppConfig::from_options(opts)?))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Entry point for the daemon. Returns once a shutdown signal arrives and
    /// the panel has been put to sleep.
    pub fn run(&self) -> Result<()> {
        let running = create_shutdown_flag()?;

        let fonts = FontSet::discover(&font_candidates());
        match fonts.source() {
            FontSource::File(path) => self
                .logger
                .info(format!("using font {}", path.display())),
            FontSource::Builtin => self
                .logger
                .warn("no TrueType font found; using built-in bitmap font"),
            FontSource::BuiltinAfterError { path, reason } => self.logger.warn(format!(
                "failed to load font {}: {reason}; using built-in bitmap font",
                path.display()
            )),
        }

        let bus = RppalPanelBus::new_default()?;
        let monitor = MonitorLoop::new(
            MetricsCollector::new(CollectorSettings::default()),
            FrameRenderer::new(fonts),
            Epd2in13V4::new(bus),
            &self.logger,
            self.config.monitor.clone(),
        );
        monitor.run(&running);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_log_file_to_env_or_default() {
        let cfg = AppConfig::from_options(RunOptions::default()).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert_eq!(cfg.log_file, None);
        assert_eq!(cfg.monitor.full_refresh_period, 3600);
    }

    #[test]
    fn cli_overrides_apply() {
        let cfg = AppConfig::from_options(RunOptions {
            log_level: Some("debug".into()),
            log_file: Some("/tmp/other.log".into()),
        })
        .unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.log_file.as_deref(), Some("/tmp/other.log"));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let err = AppConfig::from_options(RunOptions {
            log_level: Some("chatty".into()),
            log_file: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }
}
