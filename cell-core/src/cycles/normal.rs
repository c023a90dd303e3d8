//! Duty cycles for a cell inside its safe band.
//!
//! A plain normal tick closes the loop, flashes the indicator for 20 ms and
//! sleeps for a second. After a recent cutoff the flash is inverted: the LED
//! stays lit and blinks dark instead. While shunting the module never sleeps
//! with the bypass engaged; it holds the shunt for one second, releases it,
//! and re-samples.

use core::time::Duration;

use super::{DutyCycle, DutyCycleKind, OutputLine, OutputStep, Rest, SleepDuration};

/// Length of the heartbeat flash.
pub const HEARTBEAT_FLASH: Duration = Duration::from_millis(20);
/// Half period of the shunting blink; the shunt stays engaged for two of these.
pub const SHUNT_BLINK_HALF_PERIOD: Duration = Duration::from_millis(500);
/// Settling time after releasing the shunt before the next measurement.
pub const SHUNT_RELEASE_SETTLE: Duration = Duration::from_millis(100);
/// Sleep between ticks while the cell is stable.
pub const NORMAL_SLEEP: SleepDuration = SleepDuration::Ms1000;

const CLOSE_LOOP_RELEASE_SHUNT: [OutputStep; 2] = [
    OutputStep::set(OutputLine::Loop, true),
    OutputStep::set(OutputLine::Shunt, false),
];

const HEARTBEAT: [OutputStep; 2] = [
    OutputStep::new(OutputLine::Indicator, true, HEARTBEAT_FLASH),
    OutputStep::set(OutputLine::Indicator, false),
];

const INVERTED_HEARTBEAT: [OutputStep; 2] = [
    OutputStep::new(OutputLine::Indicator, false, HEARTBEAT_FLASH),
    OutputStep::set(OutputLine::Indicator, true),
];

const SHUNT_ENGAGE: [OutputStep; 2] = [
    OutputStep::set(OutputLine::Loop, true),
    OutputStep::set(OutputLine::Shunt, true),
];

const SHUNT_BLINK: [OutputStep; 2] = [
    OutputStep::new(OutputLine::Indicator, false, SHUNT_BLINK_HALF_PERIOD),
    OutputStep::new(OutputLine::Indicator, true, SHUNT_BLINK_HALF_PERIOD),
];

const SHUNT_RELEASE: [OutputStep; 2] = [
    OutputStep::new(OutputLine::Shunt, false, SHUNT_RELEASE_SETTLE),
    OutputStep::set(OutputLine::Indicator, false),
];

/// Normal cell, no recent cutoff.
pub const NORMAL_CYCLE: DutyCycle = DutyCycle::new(
    DutyCycleKind::Normal,
    &CLOSE_LOOP_RELEASE_SHUNT,
    &HEARTBEAT,
    1,
    &[],
    Rest::DeepSleep(NORMAL_SLEEP),
);

/// Normal cell shortly after a cutoff.
pub const NORMAL_RECENT_CUTOFF_CYCLE: DutyCycle = DutyCycle::new(
    DutyCycleKind::NormalRecentCutoff,
    &CLOSE_LOOP_RELEASE_SHUNT,
    &INVERTED_HEARTBEAT,
    1,
    &[],
    Rest::DeepSleep(NORMAL_SLEEP),
);

/// Normal cell with the bypass engaged.
pub const SHUNTING_CYCLE: DutyCycle = DutyCycle::new(
    DutyCycleKind::Shunting,
    &SHUNT_ENGAGE,
    &SHUNT_BLINK,
    1,
    &SHUNT_RELEASE,
    Rest::Resample,
);
