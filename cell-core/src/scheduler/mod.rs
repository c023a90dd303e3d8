//! Duty-cycle scheduler: the per-tick control loop.
//!
//! [`CellController`] owns every piece of protection state (filter window,
//! debounced classifications, cutoff recency) and turns one raw reading into
//! a [`TickOutcome`]. It never touches hardware itself; the traits below are
//! the seams where the firmware and the emulator plug in their outputs,
//! sensor, and sleep implementations. [`blocking::run_tick`] sequences one
//! full tick against those traits for targets that can block.

use core::time::Duration;

use crate::config::{ConfigError, FILTER_WINDOW, Millivolts, ProtectionConfig};
use crate::cycles::{self, DutyCycle, OutputLine, OutputStep, SleepDuration};
use crate::filter::MovingAverage;
use crate::protection::{CellClassifier, CellState, CutoffRecency, ShuntController};
use crate::telemetry::{TelemetryEventKind, TelemetryRecorder, TickReport, TickStamp};

pub mod blocking;

/// Time the rail is left unloaded before sampling.
pub const MEASUREMENT_SETTLE: Duration = Duration::from_micros(200);

/// Source of calibrated supply readings.
pub trait CellSensor {
    /// One blocking conversion of the cell voltage.
    fn sample_millivolts(&mut self) -> Millivolts;
}

/// Abstraction over the loop, shunt, and indicator outputs.
pub trait OutputDriver {
    fn set_loop_closed(&mut self, closed: bool);

    fn set_shunt_engaged(&mut self, engaged: bool);

    fn set_indicator(&mut self, lit: bool);

    /// Applies a duty-cycle step.
    fn apply(&mut self, step: &OutputStep) {
        match step.line {
            OutputLine::Loop => self.set_loop_closed(step.asserted),
            OutputLine::Shunt => self.set_shunt_engaged(step.asserted),
            OutputLine::Indicator => self.set_indicator(step.asserted),
        }
    }

    /// Removes every load the module itself puts on the cell.
    fn quiesce(&mut self) {
        self.set_indicator(false);
        self.set_shunt_engaged(false);
    }
}

/// Output driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopOutputDriver;

impl NoopOutputDriver {
    /// Creates a new no-op output driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OutputDriver for NoopOutputDriver {
    fn set_loop_closed(&mut self, _: bool) {}

    fn set_shunt_engaged(&mut self, _: bool) {}

    fn set_indicator(&mut self, _: bool) {}
}

/// Busy waits and low-power sleep.
pub trait PowerControl {
    /// Stays awake for `duration` with outputs held.
    fn delay(&mut self, duration: Duration);

    /// Enters low-power sleep until the wake timer fires.
    fn sleep_for(&mut self, duration: SleepDuration);
}

/// Result of one controller tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickOutcome {
    pub report: TickReport,
    pub cycle: &'static DutyCycle,
}

/// Owned protection state for one cell module.
#[derive(Clone, Debug)]
pub struct CellController<const WINDOW: usize = FILTER_WINDOW> {
    config: ProtectionConfig,
    filter: MovingAverage<WINDOW>,
    cell: CellClassifier,
    shunt: ShuntController,
    recency: CutoffRecency,
    tick: TickStamp,
    filtered_mv: Millivolts,
}

impl CellController<FILTER_WINDOW> {
    /// Controller running the production configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::build(ProtectionConfig::DEFAULT)
    }
}

impl<const WINDOW: usize> CellController<WINDOW> {
    /// Creates a controller after checking the threshold ordering.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(config: ProtectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ProtectionConfig) -> Self {
        Self {
            config,
            filter: MovingAverage::new(config.nominal_millivolts),
            cell: CellClassifier::new(config.settle_ticks),
            shunt: ShuntController::new(config.settle_ticks),
            recency: CutoffRecency::new(config.recent_cutoff_ticks),
            tick: 0,
            filtered_mv: config.nominal_millivolts,
        }
    }

    /// Runs the decision half of a tick for one raw reading.
    ///
    /// Committed transitions are written to `telemetry`; the returned
    /// outcome names the duty cycle the caller must run before the next tick.
    pub fn tick<const CAPACITY: usize>(
        &mut self,
        raw_mv: Millivolts,
        telemetry: &mut TelemetryRecorder<CAPACITY>,
    ) -> TickOutcome {
        self.tick = self.tick.wrapping_add(1);
        let filtered = self.filter.push(raw_mv);
        self.filtered_mv = filtered;
        let thresholds = &self.config.thresholds;

        if let Some(engaged) = self.shunt.advance(filtered, thresholds) {
            let event = if engaged {
                TelemetryEventKind::ShuntEngaged
            } else {
                TelemetryEventKind::ShuntReleased
            };
            telemetry.record(event, self.tick, filtered);
        }

        if let Some(state) = self.cell.advance(filtered, thresholds) {
            telemetry.record(
                TelemetryEventKind::CellStateCommitted(state),
                self.tick,
                filtered,
            );
        }

        let state = self.cell.state();
        let was_recent = self.recency.is_recent();
        self.recency.on_tick(state);
        if was_recent && !self.recency.is_recent() {
            telemetry.record(TelemetryEventKind::RecentCutoffCleared, self.tick, filtered);
        }

        let cycle = cycles::select(state, self.shunt.is_shunting(), self.recency.is_recent());
        TickOutcome {
            report: self.report(raw_mv, cycle),
            cycle,
        }
    }

    fn report(&self, raw_mv: Millivolts, cycle: &DutyCycle) -> TickReport {
        TickReport {
            tick: self.tick,
            raw_mv,
            filtered_mv: self.filtered_mv,
            state: self.cell.state(),
            pending_state: self.cell.pending(),
            pending_age: self.cell.pending_age(),
            shunting: self.shunt.is_shunting(),
            shunt_pending: self.shunt.pending(),
            shunt_pending_age: self.shunt.pending_age(),
            cutoff_age: self.recency.ticks_since(),
            cycle: cycle.kind,
        }
    }

    /// Committed cell state.
    #[must_use]
    pub const fn state(&self) -> CellState {
        self.cell.state()
    }

    /// Whether the bypass is currently wanted.
    #[must_use]
    pub const fn is_shunting(&self) -> bool {
        self.shunt.is_shunting()
    }

    /// Filtered voltage computed on the last tick.
    #[must_use]
    pub const fn filtered_millivolts(&self) -> Millivolts {
        self.filtered_mv
    }

    /// Ticks since the last cutoff while it still counts as recent.
    #[must_use]
    pub const fn cutoff_age(&self) -> Option<u16> {
        self.recency.ticks_since()
    }

    /// Number of ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> TickStamp {
        self.tick
    }

    /// Configuration the controller was built with.
    #[must_use]
    pub const fn config(&self) -> &ProtectionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Thresholds;
    use crate::cycles::DutyCycleKind;

    #[test]
    fn misordered_thresholds_are_rejected() {
        let config = ProtectionConfig::DEFAULT.with_thresholds(Thresholds {
            high_disengage: 3_650,
            ..Thresholds::DEFAULT
        });
        assert!(CellController::<FILTER_WINDOW>::new(config).is_err());
    }

    #[test]
    fn first_ticks_run_the_startup_cycle() {
        let mut controller = CellController::with_defaults();
        let mut telemetry = TelemetryRecorder::<8>::new();

        let outcome = controller.tick(3_200, &mut telemetry);
        assert_eq!(outcome.report.tick, 1);
        assert_eq!(outcome.report.state, CellState::Invalid);
        assert_eq!(outcome.report.pending_state, CellState::Normal);
        assert_eq!(outcome.cycle.kind, DutyCycleKind::Startup);
        assert!(telemetry.is_empty());
    }

    #[test]
    fn commit_is_recorded_on_the_committing_tick() {
        let mut controller = CellController::with_defaults();
        let mut telemetry = TelemetryRecorder::<8>::new();

        for _ in 0..5 {
            controller.tick(3_200, &mut telemetry);
        }
        assert_eq!(controller.state(), CellState::Normal);
        let record = telemetry.latest().copied().expect("commit should be recorded");
        assert_eq!(record.tick, 5);
        assert_eq!(
            record.event,
            TelemetryEventKind::CellStateCommitted(CellState::Normal)
        );
    }

    #[test]
    fn power_up_counts_as_a_recent_cutoff() {
        let mut controller = CellController::with_defaults();
        let mut telemetry = TelemetryRecorder::<8>::new();

        let mut outcome = controller.tick(3_200, &mut telemetry);
        for _ in 0..5 {
            outcome = controller.tick(3_200, &mut telemetry);
        }
        assert_eq!(outcome.cycle.kind, DutyCycleKind::NormalRecentCutoff);
        assert_eq!(controller.cutoff_age(), Some(6));
    }
}
