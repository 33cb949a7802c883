use std::sync::atomic::{AtomicBool, Ordering};

use super::lifecycle::{sleep_while_running, DisplayGuard};
use super::Logger;
use crate::{
    config::MonitorConfig,
    epd::DisplayDriver,
    metrics::MetricsSource,
    refresh::{RefreshController, RefreshKind},
    render::FrameRenderer,
    Result,
};

/// Collect, render and push once per poll interval until asked to stop.
pub struct MonitorLoop<'a, S: MetricsSource, D: DisplayDriver> {
    source: S,
    renderer: FrameRenderer,
    display: DisplayGuard<'a, D>,
    logger: &'a Logger,
    config: MonitorConfig,
}

impl<'a, S: MetricsSource, D: DisplayDriver> MonitorLoop<'a, S, D> {
    pub fn new(
        source: S,
        renderer: FrameRenderer,
        driver: D,
        logger: &'a Logger,
        config: MonitorConfig,
    ) -> Self {
        let controller = RefreshController::new(driver, config.full_refresh_period);
        Self {
            source,
            renderer,
            display: DisplayGuard::new(controller, logger),
            logger,
            config,
        }
    }

    pub fn controller(&self) -> &RefreshController<D> {
        self.display.controller()
    }

    /// One collect → render → submit pass.
    pub fn run_cycle(&mut self) -> Result<RefreshKind> {
        let snapshot = self.source.collect(self.logger);
        let frame = self.renderer.render(&snapshot);
        self.display.controller_mut().submit(frame, self.logger)
    }

    /// Loop until `running` goes false, then clean the panel up exactly once.
    /// Cycle errors are logged and followed by the error cooldown.
    pub fn run(mut self, running: &AtomicBool) {
        self.logger.info(format!(
            "starting e-paper stats monitor (full refresh every {} cycles)",
            self.controller().full_refresh_period()
        ));
        let mut cycles: u64 = 0;
        while running.load(Ordering::SeqCst) {
            cycles += 1;
            let pause = match self.run_cycle() {
                Ok(kind) => {
                    self.logger.debug(format!("cycle {cycles}: {kind:?} refresh"));
                    self.config.poll_interval
                }
                Err(err) => {
                    self.logger.error(format!("error in main loop: {err}"));
                    self.config.error_cooldown
                }
            };
            if !sleep_while_running(running, pause) {
                break;
            }
        }
        self.logger.info("shutdown requested");
        self.display.finish();
    }
}
