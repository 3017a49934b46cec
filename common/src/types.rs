use serde::{Deserialize, Serialize};

use crate::setting::SettingError;

/// Serialized by name; deserialized from a name or a legacy numeric code,
/// the same values a `mode` setting accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "ModeValue")]
pub enum ClimateMode {
    Cool,
    HumidityControl,
    Heat,
    FanOnly,
    #[default]
    Off,
}

impl ClimateMode {
    /// Maps the legacy numeric mode codes (0 cool, 1 humidity, 5 heat, 8 fan).
    /// Every other code is `Off`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Cool,
            1 => Self::HumidityControl,
            5 => Self::Heat,
            8 => Self::FanOnly,
            _ => Self::Off,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "COOL" => Some(Self::Cool),
            "HUMIDITY" | "HUMIDITY_CONTROL" | "DRY" => Some(Self::HumidityControl),
            "HEAT" => Some(Self::Heat),
            "FAN" | "FAN_ONLY" => Some(Self::FanOnly),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    /// A numeric code or a mode name. Unknown names are `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<i64>() {
            Ok(code) => Some(Self::from_code(code)),
            Err(_) => Self::from_name(value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cool => "COOL",
            Self::HumidityControl => "HUMIDITY_CONTROL",
            Self::Heat => "HEAT",
            Self::FanOnly => "FAN_ONLY",
            Self::Off => "OFF",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeValue {
    Code(i64),
    Name(String),
}

impl TryFrom<ModeValue> for ClimateMode {
    type Error = SettingError;

    fn try_from(value: ModeValue) -> Result<Self, Self::Error> {
        match value {
            ModeValue::Code(code) => Ok(Self::from_code(code)),
            ModeValue::Name(name) => Self::parse(&name).ok_or(SettingError::InvalidValue {
                key: "mode",
                value: name,
            }),
        }
    }
}

/// Which actuator circuit is energized. `None` means every output is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputChannel {
    #[default]
    None,
    Cool,
    Heat,
    Fan,
}

impl OutputChannel {
    pub fn is_energized(self) -> bool {
        self != Self::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Cool => "COOL",
            Self::Heat => "HEAT",
            Self::Fan => "FAN",
        }
    }
}
