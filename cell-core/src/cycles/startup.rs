//! Duty cycle while no classification has been committed yet.
//!
//! The loop is left conducting so a healthy string keeps working while the
//! filter settles, and a slow triple blink marks the unresolved state.

use core::time::Duration;

use super::{DutyCycle, DutyCycleKind, OutputLine, OutputStep, Rest};

/// Half period of the startup blink.
pub const STARTUP_BLINK_HALF_PERIOD: Duration = Duration::from_millis(166);
/// Number of startup blinks per tick.
pub const STARTUP_BLINKS: u8 = 3;

const CLOSE_LOOP_RELEASE_SHUNT: [OutputStep; 2] = [
    OutputStep::set(OutputLine::Loop, true),
    OutputStep::set(OutputLine::Shunt, false),
];

const SLOW_BLINK: [OutputStep; 2] = [
    OutputStep::new(OutputLine::Indicator, true, STARTUP_BLINK_HALF_PERIOD),
    OutputStep::new(OutputLine::Indicator, false, STARTUP_BLINK_HALF_PERIOD),
];

/// Power-up or otherwise unclassified cell.
pub const STARTUP_CYCLE: DutyCycle = DutyCycle::new(
    DutyCycleKind::Startup,
    &CLOSE_LOOP_RELEASE_SHUNT,
    &SLOW_BLINK,
    STARTUP_BLINKS,
    &[],
    Rest::Resample,
);
