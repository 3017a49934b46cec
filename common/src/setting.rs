use std::str::FromStr;

use thiserror::Error;

use crate::{config::ControllerConfig, types::ClimateMode};

/// A single configuration change, as delivered on a `settings/<key>` topic or
/// the HTTP settings endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Mode(ClimateMode),
    TempSetpoint(i32),
    HumiditySetpoint(i32),
    TempHysteresis(i32),
    HumidityHysteresis(i32),
    HumidityOverCooling(i32),
    MinRunMs(u64),
    MinOffMs(u64),
    UsesHeatPump(bool),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingError {
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidValue { key: &'static str, value: String },
}

impl Setting {
    pub const KEYS: [&'static str; 9] = [
        "mode",
        "temp_setpoint",
        "humidity_setpoint",
        "temp_hysteresis",
        "humidity_hysteresis",
        "humidity_over_cooling",
        "min_run_ms",
        "min_off_ms",
        "uses_heat_pump",
    ];

    pub fn parse(key: &str, value: &str) -> Result<Self, SettingError> {
        let key = Self::KEYS
            .into_iter()
            .find(|candidate| *candidate == key.trim())
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
        let value = value.trim();

        let setting = match key {
            "mode" => Self::Mode(parse_mode(key, value)?),
            "temp_setpoint" => Self::TempSetpoint(parse_number(key, value)?),
            "humidity_setpoint" => Self::HumiditySetpoint(parse_number(key, value)?),
            "temp_hysteresis" => Self::TempHysteresis(parse_number(key, value)?),
            "humidity_hysteresis" => Self::HumidityHysteresis(parse_number(key, value)?),
            "humidity_over_cooling" => Self::HumidityOverCooling(parse_number(key, value)?),
            "min_run_ms" => Self::MinRunMs(parse_number(key, value)?),
            "min_off_ms" => Self::MinOffMs(parse_number(key, value)?),
            _ => Self::UsesHeatPump(parse_flag(key, value)?),
        };
        Ok(setting)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Mode(_) => "mode",
            Self::TempSetpoint(_) => "temp_setpoint",
            Self::HumiditySetpoint(_) => "humidity_setpoint",
            Self::TempHysteresis(_) => "temp_hysteresis",
            Self::HumidityHysteresis(_) => "humidity_hysteresis",
            Self::HumidityOverCooling(_) => "humidity_over_cooling",
            Self::MinRunMs(_) => "min_run_ms",
            Self::MinOffMs(_) => "min_off_ms",
            Self::UsesHeatPump(_) => "uses_heat_pump",
        }
    }

    /// Writes the setting into `config`, returning whether anything changed.
    pub fn apply_to(self, config: &mut ControllerConfig) -> bool {
        fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        }

        match self {
            Self::Mode(mode) => replace(&mut config.mode, mode),
            Self::TempSetpoint(value) => replace(&mut config.temp_setpoint, value),
            Self::HumiditySetpoint(value) => replace(&mut config.humidity_setpoint, value),
            Self::TempHysteresis(value) => replace(&mut config.temp_hysteresis, value),
            Self::HumidityHysteresis(value) => replace(&mut config.humidity_hysteresis, value),
            Self::HumidityOverCooling(value) => {
                replace(&mut config.humidity_over_cooling, value)
            }
            Self::MinRunMs(value) => replace(&mut config.min_run_ms, value),
            Self::MinOffMs(value) => replace(&mut config.min_off_ms, value),
            Self::UsesHeatPump(value) => replace(&mut config.uses_heat_pump, value),
        }
    }
}

fn invalid(key: &'static str, value: &str) -> SettingError {
    SettingError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, SettingError> {
    value.parse::<T>().map_err(|_| invalid(key, value))
}

// Numeric codes outside the known set fall back to Off; unknown names are rejected.
fn parse_mode(key: &'static str, value: &str) -> Result<ClimateMode, SettingError> {
    ClimateMode::parse(value).ok_or_else(|| invalid(key, value))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, SettingError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
