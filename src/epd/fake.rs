use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::epd::DisplayDriver;
use crate::render::Frame;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelCall {
    Init,
    Clear,
    Display,
    DisplayPartial,
    Sleep,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<PanelCall>,
    one_shot_failures: VecDeque<PanelCall>,
    broken: Vec<PanelCall>,
    last_frame: Option<Frame>,
}

/// In-memory panel used in tests to script driver failures and record the
/// call sequence. Clone the handle before moving the panel into a controller.
#[derive(Clone, Default)]
pub struct FakePanel {
    state: Arc<Mutex<FakeState>>,
}

impl FakePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `call` fail once. Queue several to fail several times.
    pub fn fail_next(&self, call: PanelCall) {
        self.lock().one_shot_failures.push_back(call);
    }

    /// Make every `call` fail until cleared.
    pub fn set_broken(&self, call: PanelCall, broken: bool) {
        let mut state = self.lock();
        state.broken.retain(|c| *c != call);
        if broken {
            state.broken.push(call);
        }
    }

    /// Every attempted call, including the ones that failed.
    pub fn calls(&self) -> Vec<PanelCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: PanelCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Last frame accepted by a successful full or partial push.
    pub fn last_frame(&self) -> Option<Frame> {
        self.lock().last_frame.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panic while holding the lock only happens inside a failing test.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: PanelCall) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.broken.contains(&call) {
            return Err(Error::Panel(format!("{call:?} failed (broken)")));
        }
        if let Some(pos) = state.one_shot_failures.iter().position(|c| *c == call) {
            state.one_shot_failures.remove(pos);
            return Err(Error::Panel(format!("{call:?} failed")));
        }
        Ok(())
    }
}

impl DisplayDriver for FakePanel {
    fn init(&mut self) -> Result<()> {
        self.record(PanelCall::Init)
    }

    fn clear(&mut self) -> Result<()> {
        self.record(PanelCall::Clear)
    }

    fn display(&mut self, frame: &Frame) -> Result<()> {
        self.record(PanelCall::Display)?;
        self.lock().last_frame = Some(frame.clone());
        Ok(())
    }

    fn display_partial(&mut self, frame: &Frame) -> Result<()> {
        self.record(PanelCall::DisplayPartial)?;
        self.lock().last_frame = Some(frame.clone());
        Ok(())
    }

    fn sleep(&mut self) -> Result<()> {
        self.record(PanelCall::Sleep)
    }
}
