//! Cell condition classification.
//!
//! [`classify`] turns one filtered reading into a proposed [`CellState`]; the
//! [`CellClassifier`] debounces those proposals before they drive outputs.
//! Shunt engagement and cutoff recency live in their own submodules because
//! they evolve independently of the committed cell state.

use core::fmt;

use crate::config::{Millivolts, Thresholds};
use crate::debounce::Debounced;

pub mod recency;
pub mod shunt;

pub use recency::CutoffRecency;
pub use shunt::ShuntController;

/// Protection state of the cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CellState {
    /// Power-up value before the first committed classification.
    Invalid,
    Normal,
    UnderVoltageCutoff,
    OverVoltageCutoff,
}

impl CellState {
    /// Returns `true` for the states that open the series loop.
    #[must_use]
    pub const fn is_cutoff(self) -> bool {
        matches!(
            self,
            CellState::UnderVoltageCutoff | CellState::OverVoltageCutoff
        )
    }

    /// Short label used in diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            CellState::Invalid => "n/a",
            CellState::Normal => "OK",
            CellState::UnderVoltageCutoff => "LVC",
            CellState::OverVoltageCutoff => "HVC",
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Proposes the next cell state for `voltage` given the committed `current` state.
///
/// Rules are applied in order and later rules override earlier ones:
/// cutoff exits need the voltage to recover past the disengage threshold,
/// the safe band between the disengage thresholds always proposes
/// [`CellState::Normal`], and the hard limits win over everything with the
/// under-voltage floor taking precedence.
#[must_use]
pub fn classify(voltage: Millivolts, current: CellState, thresholds: &Thresholds) -> CellState {
    let mut proposed = current;

    if current == CellState::OverVoltageCutoff && voltage < thresholds.high_disengage {
        proposed = CellState::Normal;
    }

    if current == CellState::UnderVoltageCutoff && voltage > thresholds.low_disengage {
        proposed = CellState::Normal;
    }

    // Leave the power-up state as soon as the reading is anywhere inside the hard limits.
    if current == CellState::Invalid
        && voltage > thresholds.low_engage
        && voltage < thresholds.high_engage
    {
        proposed = CellState::Normal;
    }

    if voltage > thresholds.low_disengage && voltage < thresholds.high_disengage {
        proposed = CellState::Normal;
    }

    if voltage >= thresholds.high_engage {
        proposed = CellState::OverVoltageCutoff;
    }

    if voltage <= thresholds.low_engage {
        proposed = CellState::UnderVoltageCutoff;
    }

    proposed
}

/// Debounced cell classification.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CellClassifier {
    state: Debounced<CellState>,
}

impl CellClassifier {
    /// Starts in [`CellState::Invalid`].
    #[must_use]
    pub const fn new(settle_ticks: u8) -> Self {
        Self {
            state: Debounced::new(CellState::Invalid, settle_ticks),
        }
    }

    /// Classifies `voltage` and ages the proposal. Returns the newly committed state, if any.
    pub fn advance(&mut self, voltage: Millivolts, thresholds: &Thresholds) -> Option<CellState> {
        let proposed = classify(voltage, self.state.committed(), thresholds);
        if proposed == CellState::Invalid {
            return None;
        }
        self.state.observe(proposed)
    }

    /// State currently driving outputs.
    #[must_use]
    pub const fn state(&self) -> CellState {
        self.state.committed()
    }

    /// State waiting to be committed.
    #[must_use]
    pub const fn pending(&self) -> CellState {
        self.state.pending()
    }

    /// Ticks the pending state has repeated.
    #[must_use]
    pub const fn pending_age(&self) -> u16 {
        self.state.age()
    }
}
