//! Settle-time debouncing shared by the cell classifier and the shunt controller.
//!
//! A proposal only replaces the committed value after it has been observed
//! on more than `settle_ticks` consecutive ticks following its first
//! appearance. Any different proposal in between restarts the count.

/// Committed value plus the proposal currently being aged.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Debounced<T> {
    committed: T,
    pending: T,
    age: u16,
    settle_ticks: u8,
}

impl<T> Debounced<T>
where
    T: Copy + PartialEq,
{
    /// Starts with `initial` both committed and pending.
    #[must_use]
    pub const fn new(initial: T, settle_ticks: u8) -> Self {
        Self {
            committed: initial,
            pending: initial,
            age: 0,
            settle_ticks,
        }
    }

    /// Feeds one tick's proposal. Returns the new committed value when it changes.
    pub fn observe(&mut self, proposal: T) -> Option<T> {
        if proposal != self.pending {
            self.pending = proposal;
            self.age = 0;
            return None;
        }

        self.age = self.age.saturating_add(1);
        if self.age > u16::from(self.settle_ticks) && self.committed != self.pending {
            self.committed = self.pending;
            return Some(self.committed);
        }
        None
    }

    /// Value currently driving outputs.
    #[must_use]
    pub const fn committed(&self) -> T {
        self.committed
    }

    /// Proposal being aged.
    #[must_use]
    pub const fn pending(&self) -> T {
        self.pending
    }

    /// Consecutive ticks the pending proposal has repeated.
    #[must_use]
    pub const fn age(&self) -> u16 {
        self.age
    }

    /// Configured settle threshold.
    #[must_use]
    pub const fn settle_ticks(&self) -> u8 {
        self.settle_ticks
    }
}
