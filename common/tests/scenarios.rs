use climate_common::{
    sim::{ManualClock, RecordingActuator},
    ClimateMode, ControlOutcome, Controller, ControllerConfig, OutputChannel, Setting,
};
use pretty_assertions::assert_eq;

const MIN_OFF_MS: u64 = 180_000;
const MIN_RUN_MS: u64 = 600_000;

fn zone_config(mode: ClimateMode) -> ControllerConfig {
    ControllerConfig {
        mode,
        temp_setpoint: 72,
        humidity_setpoint: 50,
        temp_hysteresis: 2,
        humidity_hysteresis: 2,
        humidity_over_cooling: 5,
        min_run_ms: MIN_RUN_MS,
        min_off_ms: MIN_OFF_MS,
        uses_heat_pump: false,
    }
}

#[test]
fn cooling_cycle_from_power_up() {
    let clock = ManualClock::new(0);
    let mut controller = Controller::new(
        zone_config(ClimateMode::Cool),
        &clock,
        RecordingActuator::default(),
    );

    // Power-up rest period.
    assert_eq!(
        controller.control(75.0, 40.0),
        ControlOutcome::Held(OutputChannel::None)
    );

    clock.advance(MIN_OFF_MS + 1);
    assert_eq!(
        controller.control(75.0, 40.0),
        ControlOutcome::Switched {
            from: OutputChannel::None,
            to: OutputChannel::Cool
        }
    );

    clock.advance(MIN_RUN_MS + 1);
    assert_eq!(
        controller.control(73.0, 40.0),
        ControlOutcome::Unchanged(OutputChannel::Cool)
    );

    controller.control(71.6, 40.0);
    assert!(!controller.is_running());

    assert_eq!(
        controller.actuator().calls(),
        &[OutputChannel::None, OutputChannel::Cool, OutputChannel::None]
    );
}

#[test]
fn dehumidifies_below_temperature_setpoint() {
    let clock = ManualClock::new(0);
    let mut controller = Controller::new(
        zone_config(ClimateMode::Cool),
        &clock,
        RecordingActuator::default(),
    );
    clock.advance(MIN_OFF_MS + 1);

    controller.control(70.0, 60.0);

    assert_eq!(controller.output(), OutputChannel::Cool);
    assert!(controller.was_last_change_allowed());
}

#[test]
fn guarded_modes_ignore_readings_inside_the_window() {
    let guarded = [
        (ClimateMode::Cool, false, 99.0, 99.0),
        (ClimateMode::HumidityControl, false, 70.0, 99.0),
        (ClimateMode::Heat, true, 40.0, 40.0),
    ];

    for (mode, uses_heat_pump, temperature, humidity) in guarded {
        let clock = ManualClock::new(10_000);
        let config = ControllerConfig {
            uses_heat_pump,
            ..zone_config(mode)
        };
        let mut controller = Controller::new(config, &clock, RecordingActuator::default());

        for step in [0, 1_000, MIN_OFF_MS - 2_000, 1_000] {
            clock.advance(step);
            controller.control(temperature, humidity);
            assert!(!controller.is_running(), "{mode:?}");
            assert!(!controller.was_last_change_allowed(), "{mode:?}");
        }
        assert_eq!(controller.actuator().calls(), &[OutputChannel::None]);

        clock.advance(1);
        controller.control(temperature, humidity);
        assert!(controller.is_running(), "{mode:?}");
    }
}

#[test]
fn settings_drive_mode_changes() {
    let clock = ManualClock::new(0);
    let mut controller = Controller::new(
        ControllerConfig::default(),
        &clock,
        RecordingActuator::default(),
    );

    controller.control(80.0, 80.0);
    assert!(!controller.is_running());

    let setting = Setting::parse("mode", "8").unwrap();
    assert!(controller.apply_setting(setting));
    controller.control(80.0, 80.0);
    assert_eq!(controller.output(), OutputChannel::Fan);

    // Unknown legacy code degrades to Off.
    controller.apply_setting(Setting::parse("mode", "3").unwrap());
    assert_eq!(controller.config().mode, ClimateMode::Off);
    controller.control(80.0, 80.0);
    assert_eq!(controller.output(), OutputChannel::None);
}
