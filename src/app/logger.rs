use std::io::Write;
use std::str::FromStr;
use std::time::SystemTime;

use crate::config::DEFAULT_LOG_FILE;

pub const LOG_LEVEL_ENV: &str = "EPAPER_STAT_LOG_LEVEL";
pub const LOG_PATH_ENV: &str = "EPAPER_STAT_LOG_PATH";

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

/// Log file for the daemon: `--log-file`, then `EPAPER_STAT_LOG_PATH`, then
/// `epaper_stats.log` in the working directory.
pub fn resolve_log_path(cli_path: Option<String>) -> String {
    pick_log_path(cli_path, std::env::var(LOG_PATH_ENV).ok())
}

fn pick_log_path(cli_path: Option<String>, env_path: Option<String>) -> String {
    cli_path
        .or(env_path)
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())
}

/// Stderr logger with levels and an optional append-only file sink.
/// Passed explicitly to whatever needs it; there is no global instance.
pub struct Logger {
    level: LogLevel,
    file: Option<std::fs::File>,
}

impl Logger {
    /// `file_path` of `None` logs to stderr only.
    pub fn new(level: LogLevel, file_path: Option<String>) -> Self {
        let env_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|s| LogLevel::from_str(&s).ok());
        let effective_level = env_level.unwrap_or(level);

        let file = file_path.and_then(|p| {
            match std::fs::OpenOptions::new().create(true).append(true).open(&p) {
                Ok(file) => Some(file),
                Err(err) => {
                    eprintln!("cannot open log file {p}: {err}; logging to stderr only");
                    None
                }
            }
        });
        Self {
            level: effective_level,
            file,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn log(&self, level: LogLevel, msg: impl AsRef<str>) {
        if level > self.level {
            return;
        }
        let ts = humantime::format_rfc3339_seconds(SystemTime::now());
        let line = format!("{ts} - {}: {}", level.label(), msg.as_ref());
        eprintln!("{line}");
        if let Some(mut file) = self.file.as_ref() {
            let _ = writeln!(file, "{line}");
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Error, msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Warn, msg);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Info, msg);
    }

    pub fn debug(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Debug, msg);
    }

    pub fn trace(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Trace, msg);
    }
}
