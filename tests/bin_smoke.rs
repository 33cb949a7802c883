use epaper_stat::{
    app::{App, AppConfig, LogLevel},
    cli::{Command, RunOptions},
};
use std::process::Command as Process;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn bare_invocation_runs_with_defaults() {
    let cmd = Command::parse(&[]).unwrap();
    assert_eq!(cmd, Command::Run(RunOptions::default()));
    let Command::Run(opts) = cmd else {
        unreachable!()
    };
    let cfg = AppConfig::from_options(opts).unwrap();
    assert_eq!(cfg, AppConfig::default());
    assert_eq!(cfg.log_file, None);
}

#[test]
fn log_path_env_applies_without_cli_flag() {
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("from_env.log");
    std::env::set_var("EPAPER_STAT_LOG_PATH", &env_path);

    let app = App::from_options(RunOptions::default());
    std::env::remove_var("EPAPER_STAT_LOG_PATH");

    assert_eq!(app.unwrap().config().log_file, None);
    assert!(env_path.exists());
}

#[test]
fn log_file_flag_beats_env_path() {
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("from_env.log");
    let cli_path = dir.path().join("from_cli.log");
    std::env::set_var("EPAPER_STAT_LOG_PATH", &env_path);

    let app = App::from_options(RunOptions {
        log_level: None,
        log_file: Some(cli_path.to_string_lossy().to_string()),
    });
    std::env::remove_var("EPAPER_STAT_LOG_PATH");

    assert!(app.is_ok());
    assert!(cli_path.exists());
    assert!(!env_path.exists());
}

#[test]
fn run_flags_reach_app_config() {
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("stats.log");
    let log_arg = log_path.to_string_lossy().to_string();
    let cmd = Command::parse(&args(&["--log-level", "trace", "--log-file", &log_arg])).unwrap();
    let Command::Run(opts) = cmd else {
        panic!("expected run command");
    };
    let app = App::from_options(opts).unwrap();
    assert_eq!(app.config().log_level, LogLevel::Trace);
    assert_eq!(app.config().log_file.as_deref(), Some(log_arg.as_str()));
    assert!(log_path.exists());
}

#[test]
fn binary_prints_version() {
    let output = Process::new(env!("CARGO_BIN_EXE_epaper-stat"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        env!("CARGO_PKG_VERSION")
    );
}

#[test]
fn binary_rejects_unknown_flag() {
    let output = Process::new(env!("CARGO_BIN_EXE_epaper-stat"))
        .arg("--bogus")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown flag '--bogus'"));
}
