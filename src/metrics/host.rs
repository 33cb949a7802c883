use std::fs;
use std::path::Path;

use sysinfo::System;

use super::Uptime;

/// Keeps the sysinfo handle alive between cycles so CPU usage is measured
/// over the poll interval rather than from boot.
pub struct HostProbe {
    sysinfo: System,
}

impl HostProbe {
    pub fn new() -> Self {
        let mut sysinfo = System::new();
        sysinfo.refresh_cpu_usage();
        Self { sysinfo }
    }

    pub fn cpu_percent(&mut self) -> Result<f32, String> {
        self.sysinfo.refresh_cpu_usage();
        if self.sysinfo.cpus().is_empty() {
            return Err("no cpus reported".into());
        }
        let usage = self.sysinfo.global_cpu_usage();
        if !usage.is_finite() {
            return Err(format!("bogus cpu usage {usage}"));
        }
        Ok(usage.clamp(0.0, 100.0))
    }

    pub fn memory_percent(&mut self) -> Result<f32, String> {
        self.sysinfo.refresh_memory();
        let total = self.sysinfo.total_memory();
        if total == 0 {
            return Err("total memory reported as zero".into());
        }
        let available = self.sysinfo.available_memory().min(total);
        Ok(used_percent(total, available))
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn used_percent(total: u64, available: u64) -> f32 {
    ((total - available) as f64 / total as f64 * 100.0) as f32
}

/// Filesystem usage as `df` reports it: blocks reserved for root count as
/// neither used nor available.
pub fn disk_percent(mount: &Path) -> Result<f32, String> {
    let stat = rustix::fs::statvfs(mount).map_err(|e| format!("{}: {e}", mount.display()))?;
    disk_used_percent(stat.f_blocks, stat.f_bfree, stat.f_bavail)
        .ok_or_else(|| format!("{} reports zero size", mount.display()))
}

fn disk_used_percent(blocks: u64, free: u64, available: u64) -> Option<f32> {
    let used = blocks.saturating_sub(free);
    let visible = used + available.min(free);
    if visible == 0 {
        return None;
    }
    Some((used as f64 / visible as f64 * 100.0) as f32)
}

/// Thermal zone files hold millidegrees Celsius.
pub fn read_temperature(path: &Path) -> Result<f32, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let milli: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{}: not a number: {:?}", path.display(), raw.trim()))?;
    Ok((milli / 1000.0) as f32)
}

/// First field of `/proc/uptime` is seconds since boot.
pub fn read_uptime(path: &Path) -> Result<Uptime, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let seconds: f64 = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| format!("{}: empty", path.display()))?
        .parse()
        .map_err(|_| format!("{}: malformed uptime", path.display()))?;
    Ok(Uptime::from_seconds(seconds))
}

pub fn hostname() -> String {
    let uname = rustix::system::uname();
    let name = uname.nodename().to_string_lossy().trim().to_string();
    if name.is_empty() {
        "localhost".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_millidegree_temperature() {
        let file = file_with("48234\n");
        let temp = read_temperature(file.path()).unwrap();
        assert!((temp - 48.234).abs() < 0.001);
    }

    #[test]
    fn temperature_errors_name_the_file() {
        let err = read_temperature(Path::new("/nonexistent/thermal")).unwrap_err();
        assert!(err.contains("/nonexistent/thermal"));
        let garbage = file_with("hot");
        assert!(read_temperature(garbage.path()).is_err());
    }

    #[test]
    fn reads_uptime_first_field() {
        let file = file_with("273600.52 1000.00\n");
        assert_eq!(
            read_uptime(file.path()).unwrap(),
            Uptime { days: 3, hours: 4 }
        );
        let empty = file_with("");
        assert!(read_uptime(empty.path()).is_err());
    }

    #[test]
    fn used_percent_from_available() {
        assert_eq!(used_percent(200, 50), 75.0);
        assert_eq!(used_percent(100, 100), 0.0);
    }

    #[test]
    fn disk_percent_ignores_reserved_blocks() {
        // 1000 blocks, 300 free of which 50 are reserved for root.
        let pct = disk_used_percent(1000, 300, 250).unwrap();
        assert!((pct - 700.0 / 950.0 * 100.0).abs() < 0.001);
        assert_eq!(disk_used_percent(0, 0, 0), None);
    }

    #[test]
    fn disk_percent_of_root_is_a_percentage() {
        let pct = disk_percent(Path::new("/")).unwrap();
        assert!((0.0..=100.0).contains(&pct));
        assert!(disk_percent(Path::new("/nonexistent/mount")).is_err());
    }

    #[test]
    fn hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }
}
