//! Refresh scheduling and recovery for the e-paper panel.
//!
//! Partial refreshes are fast but leave ghosting behind, so a full refresh is
//! forced on the first push and whenever the partial counter would reach the
//! configured period. A failed partial push falls back to a full push in the
//! same cycle. A failed full push leaves the controller degraded: the next
//! cycle reinitialises and clears the panel before drawing again.

use crate::app::Logger;
use crate::epd::DisplayDriver;
use crate::render::Frame;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Full,
    Partial,
}

/// What a successful `submit` actually did to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Full,
    Partial,
    /// Partial push failed and a full push replaced it in the same cycle.
    FallbackFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    FullRefreshInProgress,
    PartialRefreshInProgress,
    /// Reinitialisation pending or in progress.
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshState {
    pub mode: RefreshMode,
    pub cycles_since_full_refresh: u32,
    pub is_first_cycle: bool,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self {
            mode: RefreshMode::Full,
            cycles_since_full_refresh: 0,
            is_first_cycle: true,
        }
    }
}

/// Sole owner of the panel driver for the life of the process.
pub struct RefreshController<D: DisplayDriver> {
    driver: D,
    full_refresh_period: u32,
    state: RefreshState,
    phase: ControllerPhase,
    recovery_pending: bool,
    last_displayed: Option<Frame>,
    shut_down: bool,
}

impl<D: DisplayDriver> RefreshController<D> {
    /// The panel is brought up (init + clear) on the first `submit`.
    pub fn new(driver: D, full_refresh_period: u32) -> Self {
        Self {
            driver,
            full_refresh_period: full_refresh_period.max(1),
            state: RefreshState::default(),
            phase: ControllerPhase::Degraded,
            recovery_pending: true,
            last_displayed: None,
            shut_down: false,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn full_refresh_period(&self) -> u32 {
        self.full_refresh_period
    }

    pub fn last_displayed(&self) -> Option<&Frame> {
        self.last_displayed.as_ref()
    }

    fn full_refresh_due(&self) -> bool {
        self.state.is_first_cycle
            || self.state.cycles_since_full_refresh + 1 >= self.full_refresh_period
    }

    /// Push one frame. `Err` means the cycle was abandoned; the panel will be
    /// reinitialised on the next call.
    pub fn submit(&mut self, frame: Frame, logger: &Logger) -> Result<RefreshKind> {
        if self.recovery_pending {
            self.recover(logger)?;
        }

        let kind = if self.full_refresh_due() {
            logger.info("performing full refresh");
            self.full_push(&frame)?;
            RefreshKind::Full
        } else {
            self.phase = ControllerPhase::PartialRefreshInProgress;
            match self.driver.display_partial(&frame) {
                Ok(()) => {
                    self.state.cycles_since_full_refresh += 1;
                    self.state.mode = RefreshMode::Partial;
                    RefreshKind::Partial
                }
                Err(err) => {
                    logger.error(format!(
                        "partial update failed: {err}; falling back to full refresh"
                    ));
                    self.full_push(&frame)?;
                    RefreshKind::FallbackFull
                }
            }
        };

        self.phase = ControllerPhase::Idle;
        self.remember(frame, logger);
        Ok(kind)
    }

    fn recover(&mut self, logger: &Logger) -> Result<()> {
        self.phase = ControllerPhase::Degraded;
        if let Err(err) = self.driver.init().and_then(|()| self.driver.clear()) {
            logger.error(format!("failed to initialize display: {err}"));
            return Err(err);
        }
        logger.info("display initialized");
        self.recovery_pending = false;
        self.state.is_first_cycle = true;
        Ok(())
    }

    fn full_push(&mut self, frame: &Frame) -> Result<()> {
        self.phase = ControllerPhase::FullRefreshInProgress;
        let pushed = self.driver.init().and_then(|()| self.driver.display(frame));
        if let Err(err) = pushed {
            self.recovery_pending = true;
            self.phase = ControllerPhase::Degraded;
            self.state.cycles_since_full_refresh = 0;
            return Err(err);
        }
        self.state = RefreshState {
            mode: RefreshMode::Full,
            cycles_since_full_refresh: 0,
            is_first_cycle: false,
        };
        Ok(())
    }

    fn remember(&mut self, frame: Frame, logger: &Logger) {
        if let Some(previous) = &self.last_displayed {
            match frame.dirty_region(previous) {
                Some(region) => logger.debug(format!(
                    "changed region {}x{} at ({}, {})",
                    region.width, region.height, region.x, region.y
                )),
                None => {
                    logger.debug(format!("frame unchanged (crc {:08x})", frame.checksum()))
                }
            }
        }
        self.last_displayed = Some(frame);
    }

    /// Reinitialise, blank and power down the panel. Runs at most once;
    /// failures are logged, never returned.
    pub fn shutdown(&mut self, logger: &Logger) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        let result = self
            .driver
            .init()
            .and_then(|()| self.driver.clear())
            .and_then(|()| self.driver.sleep());
        match result {
            Ok(()) => logger.info("display cleanup completed"),
            Err(err) => logger.error(format!("error during display cleanup: {err}")),
        }
    }
}
