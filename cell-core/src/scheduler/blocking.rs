//! Blocking executor for one full tick.
//!
//! Used by the emulator and the scenario tests; the firmware runs the same
//! sequence from an async task so the timer can park the core.

use crate::cycles::{DutyCycle, Rest};
use crate::telemetry::{DiagnosticSink, TelemetryRecorder};

use super::{CellController, CellSensor, MEASUREMENT_SETTLE, OutputDriver, PowerControl, TickOutcome};

/// Measures, decides, and runs the selected duty cycle.
pub fn run_tick<H, D, const WINDOW: usize, const CAPACITY: usize>(
    controller: &mut CellController<WINDOW>,
    hardware: &mut H,
    telemetry: &mut TelemetryRecorder<CAPACITY>,
    diagnostics: &mut D,
) -> TickOutcome
where
    H: CellSensor + OutputDriver + PowerControl,
    D: DiagnosticSink,
{
    hardware.quiesce();
    hardware.delay(MEASUREMENT_SETTLE);
    let raw_mv = hardware.sample_millivolts();

    let outcome = controller.tick(raw_mv, telemetry);
    diagnostics.emit(&outcome.report);
    run_cycle(outcome.cycle, hardware);
    outcome
}

/// Drives every step of `cycle`, then rests as the cycle asks.
pub fn run_cycle<H>(cycle: &DutyCycle, hardware: &mut H)
where
    H: OutputDriver + PowerControl,
{
    for step in cycle.steps() {
        hardware.apply(step);
        if !step.hold_for.is_zero() {
            hardware.delay(step.hold_for);
        }
    }

    if let Rest::DeepSleep(duration) = cycle.rest {
        hardware.sleep_for(duration);
    }
}
