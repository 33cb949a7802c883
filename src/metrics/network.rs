use std::io::Read;
use std::net::{IpAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};

use super::InternetState;

const SIGNAL_MARKER: &str = "Signal level=";
const REAP_POLL: Duration = Duration::from_millis(10);

/// Local address the kernel would use for the default route. No packet is
/// sent; connecting a UDP socket only selects a route.
pub fn lan_ip(probe: &str) -> Result<IpAddr, String> {
    let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| e.to_string())?;
    socket.connect(probe).map_err(|e| e.to_string())?;
    let addr = socket.local_addr().map_err(|e| e.to_string())?;
    Ok(addr.ip())
}

pub fn probe_internet(target: &str, timeout: Duration) -> InternetState {
    let Ok(addrs) = target.to_socket_addrs() else {
        return InternetState::Disconnected;
    };
    for addr in addrs {
        if TcpStream::connect_timeout(&addr, timeout).is_ok() {
            return InternetState::Connected;
        }
    }
    InternetState::Disconnected
}

/// Query `<tool> <interface>` and pull out the signal level token.
pub fn wifi_signal(tool: &str, interface: &str, timeout: Duration) -> Result<String, String> {
    let mut command = Command::new(tool);
    command.arg(interface);
    let output = run_bounded(command, timeout)?;
    parse_signal_level(&output).ok_or_else(|| format!("no signal level in {tool} output"))
}

pub fn parse_signal_level(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        line.split_once(SIGNAL_MARKER)
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .map(str::to_string)
    })
}

/// Run a command and return its stdout, killing it if it outlives `timeout`.
/// The child is always reaped before returning.
pub fn run_bounded(mut command: Command, timeout: Duration) -> Result<String, String> {
    let deadline = Instant::now() + timeout;
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("spawn failed: {e}"))?;

    let Some(mut stdout) = child.stdout.take() else {
        kill_and_reap(&mut child);
        return Err("child stdout not captured".into());
    };

    let (tx, rx) = channel::bounded(1);
    let reader = thread::Builder::new()
        .name("epaper-stat-subprocess".into())
        .spawn(move || {
            let mut out = String::new();
            let result = stdout.read_to_string(&mut out).map(|_| out);
            let _ = tx.send(result);
        });
    if let Err(err) = reader {
        kill_and_reap(&mut child);
        return Err(format!("reader thread failed: {err}"));
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(Ok(out)) => {
            let status = reap_until(&mut child, deadline)
                .ok_or_else(|| format!("timed out after {}", humantime::format_duration(timeout)))?;
            if status.success() {
                Ok(out)
            } else {
                Err(format!("exited with {status}"))
            }
        }
        Ok(Err(err)) => {
            kill_and_reap(&mut child);
            Err(format!("reading stdout failed: {err}"))
        }
        Err(RecvTimeoutError::Timeout) => {
            kill_and_reap(&mut child);
            Err(format!("timed out after {}", humantime::format_duration(timeout)))
        }
        Err(RecvTimeoutError::Disconnected) => {
            kill_and_reap(&mut child);
            Err("reader thread exited early".into())
        }
    }
}

fn reap_until(child: &mut Child, deadline: Instant) -> Option<std::process::ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => thread::sleep(REAP_POLL),
            _ => {
                kill_and_reap(child);
                return None;
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
