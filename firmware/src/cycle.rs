#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Async execution of duty-cycle templates.
//!
//! Holds and rests are awaited on the embassy timer so the executor can park
//! the core between steps.

use core::convert::TryFrom;

use cell_core::cycles::{DutyCycle, Rest};
use cell_core::scheduler::OutputDriver;
use embassy_time::{Duration, TICK_HZ, Timer};

/// Converts to timer ticks, rounding up and saturating at [`Duration::MAX`].
pub fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let ticks = duration
        .as_micros()
        .saturating_mul(u128::from(TICK_HZ))
        .div_ceil(1_000_000);
    u64::try_from(ticks).map_or(Duration::MAX, Duration::from_ticks)
}

/// Drives every step of `cycle` on `outputs`, then rests as the cycle asks.
pub async fn run_cycle<D>(cycle: &DutyCycle, outputs: &mut D)
where
    D: OutputDriver,
{
    for step in cycle.steps() {
        outputs.apply(step);
        if !step.hold_for.is_zero() {
            Timer::after(core_duration_to_embassy(step.hold_for)).await;
        }
    }

    if let Rest::DeepSleep(sleep) = cycle.rest {
        Timer::after(core_duration_to_embassy(sleep.as_duration())).await;
    }
}

/// Total time `cycle` keeps the core busy before its rest.
pub fn active_time(cycle: &DutyCycle) -> Duration {
    core_duration_to_embassy(cycle.active_duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_core::cycles::{OVER_VOLTAGE_CYCLE, STARTUP_CYCLE};

    #[test]
    fn converts_core_durations_without_rounding() {
        let converted = core_duration_to_embassy(core::time::Duration::from_micros(200));
        assert_eq!(converted.as_micros(), 200);
    }

    #[test]
    fn oversized_durations_saturate() {
        let converted = core_duration_to_embassy(core::time::Duration::MAX);
        assert_eq!(converted, Duration::MAX);

        let edge = core::time::Duration::from_micros(u64::MAX);
        assert_eq!(core_duration_to_embassy(edge).as_ticks(), Duration::MAX.as_ticks());
    }

    #[test]
    fn sub_tick_durations_round_up() {
        let converted = core_duration_to_embassy(core::time::Duration::from_nanos(1));
        assert_eq!(converted.as_ticks(), 1);
        assert_eq!(core_duration_to_embassy(core::time::Duration::ZERO).as_ticks(), 0);
    }

    #[test]
    fn active_time_matches_template() {
        assert_eq!(active_time(&STARTUP_CYCLE).as_millis(), 996);
        assert_eq!(active_time(&OVER_VOLTAGE_CYCLE).as_millis(), 1_100);
    }
}
