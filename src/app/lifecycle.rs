use crate::{epd::DisplayDriver, refresh::RefreshController, Error, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use super::Logger;

const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Install a ctrl-c/SIGTERM handler that flips the shared running flag instead of exiting
/// immediately.
pub(super) fn create_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let running_handle = running.clone();

    ctrlc::set_handler(move || {
        running_handle.store(false, Ordering::SeqCst);
    })
    .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    Ok(running)
}

/// Sleep for `duration`, waking early once `running` goes false.
/// Returns whether the loop should keep going.
pub fn sleep_while_running(running: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
    false
}

/// Owns the refresh controller and blanks the panel when dropped, including
/// while unwinding.
pub struct DisplayGuard<'a, D: DisplayDriver> {
    controller: RefreshController<D>,
    logger: &'a Logger,
    finished: bool,
}

impl<'a, D: DisplayDriver> DisplayGuard<'a, D> {
    pub fn new(controller: RefreshController<D>, logger: &'a Logger) -> Self {
        Self {
            controller,
            logger,
            finished: false,
        }
    }

    pub fn controller(&self) -> &RefreshController<D> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut RefreshController<D> {
        &mut self.controller
    }

    /// Run cleanup now. Dropping afterwards is a no-op.
    pub fn finish(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.logger.info("cleaning up display");
        self.controller.shutdown(self.logger);
    }
}

impl<D: DisplayDriver> Drop for DisplayGuard<'_, D> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LogLevel;
    use crate::epd::fake::{FakePanel, PanelCall};

    #[test]
    fn sleep_returns_early_when_stopped() {
        let running = AtomicBool::new(false);
        let start = Instant::now();
        assert!(!sleep_while_running(&running, Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_runs_full_duration_while_running() {
        let running = AtomicBool::new(true);
        let start = Instant::now();
        assert!(sleep_while_running(&running, Duration::from_millis(120)));
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn guard_cleans_up_once_on_finish_and_drop() {
        let logger = Logger::new(LogLevel::Error, None);
        let panel = FakePanel::new();
        let guard = DisplayGuard::new(RefreshController::new(panel.clone(), 5), &logger);
        guard.finish();
        assert_eq!(
            panel.calls(),
            vec![PanelCall::Init, PanelCall::Clear, PanelCall::Sleep]
        );
    }

    #[test]
    fn guard_cleans_up_on_drop() {
        let logger = Logger::new(LogLevel::Error, None);
        let panel = FakePanel::new();
        {
            let _guard = DisplayGuard::new(RefreshController::new(panel.clone(), 5), &logger);
        }
        assert_eq!(panel.count(PanelCall::Sleep), 1);
    }
}
