use std::time::Instant;

use tracing::info;

use climate_common::{Actuator, Clock, OutputChannel};

/// Milliseconds since process start, optionally folded modulo `wrap_ms` so the
/// rollover path can be exercised the way a 32-bit tick counter would hit it.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
    wrap_ms: Option<u64>,
}

impl MonotonicClock {
    pub fn new(wrap_ms: Option<u64>) -> Self {
        Self {
            start: Instant::now(),
            wrap_ms: wrap_ms.filter(|wrap| *wrap > 0),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        let elapsed: u64 = self
            .start
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX);
        match self.wrap_ms {
            Some(wrap) => elapsed % wrap,
            None => elapsed,
        }
    }
}

/// Stand-in for relay outputs on a development host: records the energized
/// channel and logs every change.
#[derive(Debug)]
pub struct LoggingActuator {
    zone: String,
    channel: OutputChannel,
}

impl LoggingActuator {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            channel: OutputChannel::None,
        }
    }

    pub fn channel(&self) -> OutputChannel {
        self.channel
    }
}

impl Actuator for LoggingActuator {
    fn set_output(&mut self, channel: OutputChannel) {
        if self.channel != channel {
            info!(
                zone = %self.zone,
                from = self.channel.as_str(),
                to = channel.as_str(),
                "output changed"
            );
        }
        self.channel = channel;
    }
}
