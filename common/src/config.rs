use serde::{Deserialize, Serialize};

use crate::types::ClimateMode;

/// Caller-owned control parameters. Nothing here is validated; negative bands
/// or zero durations are taken as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub mode: ClimateMode,
    pub temp_setpoint: i32,
    pub humidity_setpoint: i32,
    /// Applied only while idle: above setpoint for cooling, below for heating.
    pub temp_hysteresis: i32,
    /// Applied only while idle, above setpoint.
    pub humidity_hysteresis: i32,
    /// Degrees below setpoint cooling may run to pull humidity down.
    pub humidity_over_cooling: i32,
    pub min_run_ms: u64,
    pub min_off_ms: u64,
    pub uses_heat_pump: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: ClimateMode::Off,
            temp_setpoint: 77,
            humidity_setpoint: 55,
            temp_hysteresis: 2,
            humidity_hysteresis: 2,
            humidity_over_cooling: 5,
            min_run_ms: 600_000,
            min_off_ms: 180_000,
            uses_heat_pump: false,
        }
    }
}
