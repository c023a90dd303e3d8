//! Duty-cycle templates shared by firmware and host targets.
//!
//! Each tick ends by running exactly one [`DutyCycle`]: a short, ordered list
//! of output steps followed by a [`Rest`]. Stable states rest in deep sleep;
//! any state that needs supervision re-samples as soon as its steps finish.
//! Everything here is `const` data so the same templates compile for the
//! MCU and for the emulator.

use core::fmt;
use core::time::Duration;

use crate::protection::CellState;

pub mod cutoff;
pub mod normal;
pub mod startup;

pub use cutoff::{OVER_VOLTAGE_CYCLE, UNDER_VOLTAGE_CYCLE};
pub use normal::{NORMAL_CYCLE, NORMAL_RECENT_CUTOFF_CYCLE, SHUNTING_CYCLE};
pub use startup::STARTUP_CYCLE;

/// Digital outputs driven by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputLine {
    /// Series loop switch; asserted closes the loop.
    Loop,
    /// Bypass resistor; asserted diverts current around the cell.
    Shunt,
    /// Status LED; asserted lights it.
    Indicator,
}

impl OutputLine {
    /// Short label used in transcripts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            OutputLine::Loop => "loop",
            OutputLine::Shunt => "shunt",
            OutputLine::Indicator => "led",
        }
    }
}

/// Drive one output, then hold for `hold_for` before the next step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutputStep {
    pub line: OutputLine,
    pub asserted: bool,
    pub hold_for: Duration,
}

impl OutputStep {
    #[must_use]
    pub const fn new(line: OutputLine, asserted: bool, hold_for: Duration) -> Self {
        Self {
            line,
            asserted,
            hold_for,
        }
    }

    /// Step that changes an output without waiting afterwards.
    #[must_use]
    pub const fn set(line: OutputLine, asserted: bool) -> Self {
        Self::new(line, asserted, Duration::ZERO)
    }
}

/// Coarse low-power sleep intervals offered by the wake timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SleepDuration {
    Ms64,
    Ms125,
    Ms250,
    Ms500,
    Ms1000,
    Ms2000,
}

impl SleepDuration {
    /// Nominal length of the sleep.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        match self {
            SleepDuration::Ms64 => Duration::from_millis(64),
            SleepDuration::Ms125 => Duration::from_millis(125),
            SleepDuration::Ms250 => Duration::from_millis(250),
            SleepDuration::Ms500 => Duration::from_millis(500),
            SleepDuration::Ms1000 => Duration::from_millis(1_000),
            SleepDuration::Ms2000 => Duration::from_millis(2_000),
        }
    }
}

/// What happens after the output steps of a cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rest {
    /// Enter low-power sleep before the next tick.
    DeepSleep(SleepDuration),
    /// Start the next tick immediately.
    Resample,
}

/// Identifies which template a tick selected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DutyCycleKind {
    Startup,
    Normal,
    NormalRecentCutoff,
    Shunting,
    UnderVoltage,
    OverVoltage,
}

impl fmt::Display for DutyCycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DutyCycleKind::Startup => "startup",
            DutyCycleKind::Normal => "normal",
            DutyCycleKind::NormalRecentCutoff => "normal-recent-cutoff",
            DutyCycleKind::Shunting => "shunting",
            DutyCycleKind::UnderVoltage => "under-voltage",
            DutyCycleKind::OverVoltage => "over-voltage",
        })
    }
}

/// Immutable output template run once per tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DutyCycle {
    pub kind: DutyCycleKind,
    /// Steps run once before the indicator pattern.
    pub setup: &'static [OutputStep],
    /// Indicator pattern, run `repeats` times.
    pub pattern: &'static [OutputStep],
    pub repeats: u8,
    /// Steps run once after the pattern.
    pub teardown: &'static [OutputStep],
    pub rest: Rest,
}

impl DutyCycle {
    #[must_use]
    pub const fn new(
        kind: DutyCycleKind,
        setup: &'static [OutputStep],
        pattern: &'static [OutputStep],
        repeats: u8,
        teardown: &'static [OutputStep],
        rest: Rest,
    ) -> Self {
        Self {
            kind,
            setup,
            pattern,
            repeats,
            teardown,
            rest,
        }
    }

    /// Every step in execution order, with the pattern expanded.
    pub fn steps(&self) -> impl Iterator<Item = &'static OutputStep> + use<> {
        let setup = self.setup;
        let pattern = self.pattern;
        let teardown = self.teardown;
        let pattern_steps = pattern.len() * usize::from(self.repeats);
        setup
            .iter()
            .chain(pattern.iter().cycle().take(pattern_steps))
            .chain(teardown.iter())
    }

    /// Number of steps [`Self::steps`] yields.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.setup.len() + self.pattern.len() * usize::from(self.repeats) + self.teardown.len()
    }

    /// Time spent awake running the steps.
    #[must_use]
    pub fn active_duration(&self) -> Duration {
        self.steps()
            .fold(Duration::ZERO, |total, step| total + step.hold_for)
    }

    /// Time spent asleep after the steps.
    #[must_use]
    pub const fn rest_duration(&self) -> Duration {
        match self.rest {
            Rest::DeepSleep(sleep) => sleep.as_duration(),
            Rest::Resample => Duration::ZERO,
        }
    }

    /// Last level each line is left at once the cycle completes, if the cycle drives it.
    #[must_use]
    pub fn final_level(&self, line: OutputLine) -> Option<bool> {
        self.steps()
            .filter(|step| step.line == line)
            .last()
            .map(|step| step.asserted)
    }
}

/// Every template, for lookups and exhaustive checks.
pub const ALL_CYCLES: [&DutyCycle; 6] = [
    &STARTUP_CYCLE,
    &NORMAL_CYCLE,
    &NORMAL_RECENT_CUTOFF_CYCLE,
    &SHUNTING_CYCLE,
    &UNDER_VOLTAGE_CYCLE,
    &OVER_VOLTAGE_CYCLE,
];

/// Picks the template for the committed state of this tick.
#[must_use]
pub const fn select(state: CellState, shunting: bool, recent_cutoff: bool) -> &'static DutyCycle {
    match state {
        CellState::Invalid => &STARTUP_CYCLE,
        CellState::UnderVoltageCutoff => &UNDER_VOLTAGE_CYCLE,
        CellState::OverVoltageCutoff => &OVER_VOLTAGE_CYCLE,
        CellState::Normal if shunting => &SHUNTING_CYCLE,
        CellState::Normal if recent_cutoff => &NORMAL_RECENT_CUTOFF_CYCLE,
        CellState::Normal => &NORMAL_CYCLE,
    }
}
