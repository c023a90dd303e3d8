//! Tracks how long ago the last cutoff happened.
//!
//! Only the indicator pattern consumes this; classification never does.

use super::CellState;

/// Ticks since the last cutoff, or `None` once the cell has been normal long enough.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CutoffRecency {
    ticks_since: Option<u16>,
    window: u16,
}

impl CutoffRecency {
    /// Power-up counts as a cutoff that just happened.
    #[must_use]
    pub const fn new(window: u16) -> Self {
        Self {
            ticks_since: Some(0),
            window,
        }
    }

    /// Updates the tracker with the committed state of this tick.
    pub fn on_tick(&mut self, state: CellState) -> Option<u16> {
        if state.is_cutoff() {
            self.ticks_since = Some(0);
        } else if let Some(ticks) = self.ticks_since {
            let ticks = ticks.saturating_add(1);
            self.ticks_since = if state == CellState::Normal && ticks >= self.window {
                None
            } else {
                Some(ticks)
            };
        }
        self.ticks_since
    }

    /// Ticks since the last cutoff while it is still considered recent.
    #[must_use]
    pub const fn ticks_since(&self) -> Option<u16> {
        self.ticks_since
    }

    /// Returns `true` while the indicator should show a recent cutoff.
    #[must_use]
    pub const fn is_recent(&self) -> bool {
        self.ticks_since.is_some()
    }
}
