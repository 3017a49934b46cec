//! Hand-driven clock and recording actuator for tests and dry runs.

use std::cell::Cell;

use crate::{
    ports::{Actuator, Clock},
    types::OutputChannel,
};

/// A clock that only moves when told to. Shared by reference, so a test can
/// advance it while a controller holds `&ManualClock`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(delta_ms));
    }

    /// Jumps to an arbitrary value, including backwards to mimic a counter wrap.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// Remembers every output command in order.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    calls: Vec<OutputChannel>,
}

impl RecordingActuator {
    pub fn calls(&self) -> &[OutputChannel] {
        &self.calls
    }

    pub fn last(&self) -> Option<OutputChannel> {
        self.calls.last().copied()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Actuator for RecordingActuator {
    fn set_output(&mut self, channel: OutputChannel) {
        self.calls.push(channel);
    }
}
