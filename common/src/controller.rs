use crate::{
    config::ControllerConfig,
    ports::{Actuator, Clock},
    setting::Setting,
    types::{ClimateMode, OutputChannel},
};

/// How a mode interacts with the short-cycle guard and transition bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePolicy {
    /// Output energized when the mode calls for it.
    pub channel: OutputChannel,
    /// Whether the short-cycle guard gates evaluation.
    pub guarded: bool,
    /// Whether an on/off flip stamps the transition time.
    pub records_transition: bool,
}

impl ModePolicy {
    pub fn for_mode(mode: ClimateMode, uses_heat_pump: bool) -> Self {
        let (channel, guarded, records_transition) = match mode {
            ClimateMode::Cool => (OutputChannel::Cool, true, true),
            ClimateMode::HumidityControl => (OutputChannel::Cool, true, true),
            ClimateMode::Heat => (OutputChannel::Heat, uses_heat_pump, uses_heat_pump),
            ClimateMode::FanOnly => (OutputChannel::Fan, false, false),
            // Leaving a compressor mode must still start the off timer.
            ClimateMode::Off => (OutputChannel::None, false, true),
        };
        Self {
            channel,
            guarded,
            records_transition,
        }
    }
}

/// Setpoints after idle hysteresis has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSetpoints {
    pub temp: i32,
    pub humidity: i32,
}

impl EffectiveSetpoints {
    pub fn for_config(config: &ControllerConfig, running: bool) -> Self {
        let mut setpoints = Self {
            temp: config.temp_setpoint,
            humidity: config.humidity_setpoint,
        };
        if running {
            return setpoints;
        }

        setpoints.humidity = setpoints.humidity.saturating_add(config.humidity_hysteresis);
        match config.mode {
            ClimateMode::Cool => {
                setpoints.temp = setpoints.temp.saturating_add(config.temp_hysteresis);
            }
            ClimateMode::Heat => {
                setpoints.temp = setpoints.temp.saturating_sub(config.temp_hysteresis);
            }
            _ => {}
        }
        setpoints
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The short-cycle guard refused; the current output is kept.
    Held(OutputChannel),
    /// Evaluated, and the output already matched the decision.
    Unchanged(OutputChannel),
    Switched {
        from: OutputChannel,
        to: OutputChannel,
    },
}

/// Closed-loop controller for one zone.
///
/// Call [`Controller::control`] once per sample. Calls must be serialized by
/// the caller; the guard and transition bookkeeping assume exclusive access.
#[derive(Debug)]
pub struct Controller<C, A> {
    config: ControllerConfig,
    clock: C,
    actuator: A,

    output: OutputChannel,
    last_transition_ms: u64,
    last_decision_allowed: bool,
}

impl<C: Clock, A: Actuator> Controller<C, A> {
    /// Starts idle with every output off. The transition timer starts now, so
    /// a compressor mode waits out `min_off_ms` before its first start.
    pub fn new(config: ControllerConfig, clock: C, mut actuator: A) -> Self {
        actuator.set_output(OutputChannel::None);
        let last_transition_ms = clock.now_ms();
        Self {
            config,
            clock,
            actuator,
            output: OutputChannel::None,
            last_transition_ms,
            last_decision_allowed: false,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ControllerConfig {
        &mut self.config
    }

    pub fn set_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    pub fn apply_setting(&mut self, setting: Setting) -> bool {
        setting.apply_to(&mut self.config)
    }

    pub fn is_running(&self) -> bool {
        self.output.is_energized()
    }

    pub fn was_last_change_allowed(&self) -> bool {
        self.last_decision_allowed
    }

    pub fn output(&self) -> OutputChannel {
        self.output
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn control(&mut self, temperature: f32, humidity: f32) -> ControlOutcome {
        let now_ms = self.clock.now_ms();
        let policy = ModePolicy::for_mode(self.config.mode, self.config.uses_heat_pump);

        self.last_decision_allowed = !policy.guarded || self.short_cycle_allows(now_ms);
        if !self.last_decision_allowed {
            return ControlOutcome::Held(self.output);
        }

        let setpoints = EffectiveSetpoints::for_config(&self.config, self.is_running());
        let target = if self.demand(setpoints, temperature, humidity) {
            policy.channel
        } else {
            OutputChannel::None
        };

        self.commit(target, policy, now_ms)
    }

    /// De-energizes every output immediately, bypassing the short-cycle guard.
    /// The stop is committed like an `Off` decision, so the off timer starts now.
    pub fn shutdown(&mut self) -> ControlOutcome {
        let now_ms = self.clock.now_ms();
        let policy = ModePolicy::for_mode(ClimateMode::Off, self.config.uses_heat_pump);
        self.commit(OutputChannel::None, policy, now_ms)
    }

    fn elapsed_in_state(&mut self, now_ms: u64) -> u64 {
        // A backward step means the counter wrapped; restart the timer.
        if now_ms < self.last_transition_ms {
            self.last_transition_ms = now_ms;
        }
        now_ms - self.last_transition_ms
    }

    fn short_cycle_allows(&mut self, now_ms: u64) -> bool {
        let elapsed = self.elapsed_in_state(now_ms);
        let minimum = if self.is_running() {
            self.config.min_run_ms
        } else {
            self.config.min_off_ms
        };
        elapsed > minimum
    }

    fn demand(&self, setpoints: EffectiveSetpoints, temperature: f32, humidity: f32) -> bool {
        let temperature = rounded(temperature);
        let humidity = rounded(humidity);

        match self.config.mode {
            ClimateMode::Cool => {
                let mut temp_setpoint = setpoints.temp;
                if humidity > f64::from(setpoints.humidity) {
                    temp_setpoint = temp_setpoint.saturating_sub(self.config.humidity_over_cooling);
                }
                temperature > f64::from(temp_setpoint)
            }
            ClimateMode::HumidityControl => humidity > f64::from(setpoints.humidity),
            ClimateMode::Heat => temperature < f64::from(setpoints.temp),
            ClimateMode::FanOnly => true,
            ClimateMode::Off => false,
        }
    }

    fn commit(
        &mut self,
        target: OutputChannel,
        policy: ModePolicy,
        now_ms: u64,
    ) -> ControlOutcome {
        let previous = self.output;
        if target == previous {
            return ControlOutcome::Unchanged(previous);
        }

        self.actuator.set_output(target);
        self.output = target;
        if previous.is_energized() != target.is_energized() && policy.records_transition {
            self.last_transition_ms = now_ms;
        }

        ControlOutcome::Switched {
            from: previous,
            to: target,
        }
    }
}

// NaN stays NaN, so it never satisfies a threshold comparison.
fn rounded(value: f32) -> f64 {
    f64::from(value.round())
}
