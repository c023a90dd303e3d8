//! Duty cycles for the two cutoff states.
//!
//! Under-voltage opens the loop, turns every load off and sleeps. Over-voltage
//! opens the loop and bleeds charge through the shunt while fast-blinking the
//! indicator, then releases the shunt and re-samples without sleeping.

use core::time::Duration;

use super::{DutyCycle, DutyCycleKind, OutputLine, OutputStep, Rest, SleepDuration};

/// Sleep between ticks while the cell is too low to power anything else.
pub const UNDER_VOLTAGE_SLEEP: SleepDuration = SleepDuration::Ms1000;
/// Half period of the over-voltage blink.
pub const OVER_VOLTAGE_BLINK_HALF_PERIOD: Duration = Duration::from_millis(50);
/// Number of over-voltage blinks per tick.
pub const OVER_VOLTAGE_BLINKS: u8 = 10;
/// Settling time after releasing the shunt before the next measurement.
pub const OVER_VOLTAGE_RELEASE_SETTLE: Duration = Duration::from_millis(100);

const OPEN_LOOP_ALL_OFF: [OutputStep; 3] = [
    OutputStep::set(OutputLine::Loop, false),
    OutputStep::set(OutputLine::Indicator, false),
    OutputStep::set(OutputLine::Shunt, false),
];

const OPEN_LOOP_BLEED: [OutputStep; 2] = [
    OutputStep::set(OutputLine::Loop, false),
    OutputStep::set(OutputLine::Shunt, true),
];

const FAST_BLINK: [OutputStep; 2] = [
    OutputStep::new(OutputLine::Indicator, false, OVER_VOLTAGE_BLINK_HALF_PERIOD),
    OutputStep::new(OutputLine::Indicator, true, OVER_VOLTAGE_BLINK_HALF_PERIOD),
];

const BLEED_RELEASE: [OutputStep; 1] = [OutputStep::new(
    OutputLine::Shunt,
    false,
    OVER_VOLTAGE_RELEASE_SETTLE,
)];

/// Under-voltage cutoff.
pub const UNDER_VOLTAGE_CYCLE: DutyCycle = DutyCycle::new(
    DutyCycleKind::UnderVoltage,
    &OPEN_LOOP_ALL_OFF,
    &[],
    0,
    &[],
    Rest::DeepSleep(UNDER_VOLTAGE_SLEEP),
);

/// Over-voltage cutoff.
pub const OVER_VOLTAGE_CYCLE: DutyCycle = DutyCycle::new(
    DutyCycleKind::OverVoltage,
    &OPEN_LOOP_BLEED,
    &FAST_BLINK,
    OVER_VOLTAGE_BLINKS,
    &BLEED_RELEASE,
    Rest::Resample,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_voltage_switches_everything_off_and_sleeps() {
        assert_eq!(UNDER_VOLTAGE_CYCLE.final_level(OutputLine::Loop), Some(false));
        assert_eq!(UNDER_VOLTAGE_CYCLE.final_level(OutputLine::Shunt), Some(false));
        assert_eq!(
            UNDER_VOLTAGE_CYCLE.final_level(OutputLine::Indicator),
            Some(false)
        );
        assert_eq!(UNDER_VOLTAGE_CYCLE.active_duration(), Duration::ZERO);
        assert_eq!(
            UNDER_VOLTAGE_CYCLE.rest_duration(),
            Duration::from_millis(1_000)
        );
    }

    #[test]
    fn over_voltage_bleeds_for_the_whole_blink_train() {
        assert_eq!(OVER_VOLTAGE_CYCLE.step_count(), 2 + 20 + 1);
        assert_eq!(
            OVER_VOLTAGE_CYCLE.active_duration(),
            Duration::from_millis(1_100)
        );
        assert_eq!(OVER_VOLTAGE_CYCLE.rest, Rest::Resample);

        let first_blink = OVER_VOLTAGE_CYCLE.steps().nth(2).copied();
        assert_eq!(
            first_blink,
            Some(OutputStep::new(
                OutputLine::Indicator,
                false,
                OVER_VOLTAGE_BLINK_HALF_PERIOD
            ))
        );
    }
}
