pub mod config;
pub mod controller;
pub mod ports;
pub mod setting;
pub mod sim;
pub mod topics;
pub mod types;

pub use config::ControllerConfig;
pub use controller::{ControlOutcome, Controller, EffectiveSetpoints, ModePolicy};
pub use ports::{Actuator, Clock};
pub use setting::{Setting, SettingError};
pub use topics::*;
pub use types::{ClimateMode, OutputChannel};
