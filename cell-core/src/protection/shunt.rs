//! Bypass (shunt) engagement.
//!
//! The shunt band sits inside the over-voltage hysteresis window so charge is
//! diverted around the cell before a hard cutoff becomes necessary.

use crate::config::{Millivolts, Thresholds};
use crate::debounce::Debounced;

/// Proposes the next shunt state for `voltage`.
#[must_use]
pub fn propose(voltage: Millivolts, shunting: bool, thresholds: &Thresholds) -> bool {
    if !shunting && voltage > thresholds.shunt_engage {
        return true;
    }
    if shunting && voltage < thresholds.shunt_disengage {
        return false;
    }
    shunting
}

/// Debounced shunt decision.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShuntController {
    shunting: Debounced<bool>,
}

impl ShuntController {
    /// Starts with the shunt released.
    #[must_use]
    pub const fn new(settle_ticks: u8) -> Self {
        Self {
            shunting: Debounced::new(false, settle_ticks),
        }
    }

    /// Ages the proposal for `voltage`. Returns the new shunt state when it commits.
    pub fn advance(&mut self, voltage: Millivolts, thresholds: &Thresholds) -> Option<bool> {
        let proposed = propose(voltage, self.shunting.committed(), thresholds);
        self.shunting.observe(proposed)
    }

    /// Whether the bypass is currently wanted.
    #[must_use]
    pub const fn is_shunting(&self) -> bool {
        self.shunting.committed()
    }

    /// Shunt state waiting to be committed.
    #[must_use]
    pub const fn pending(&self) -> bool {
        self.shunting.pending()
    }

    /// Ticks the pending shunt state has repeated.
    #[must_use]
    pub const fn pending_age(&self) -> u16 {
        self.shunting.age()
    }
}
