//! Moving-average filter applied to every supply reading.
//!
//! The window is a fixed ring of the last `N` readings backed by
//! [`heapless::HistoryBuf`]. It starts full of the nominal cell voltage so the
//! first real readings are not dragged toward zero.

use heapless::HistoryBuf;

use crate::config::{FILTER_WINDOW, Millivolts};

/// Integer moving average over the last `N` readings.
#[derive(Clone, Debug)]
pub struct MovingAverage<const N: usize = FILTER_WINDOW> {
    window: HistoryBuf<Millivolts, N>,
}

impl<const N: usize> MovingAverage<N> {
    /// Creates a filter with every slot seeded to `nominal`.
    #[must_use]
    pub fn new(nominal: Millivolts) -> Self {
        const { assert!(N > 0, "filter window must hold at least one reading") };
        Self {
            window: HistoryBuf::new_with(nominal),
        }
    }

    /// Replaces the oldest reading and returns the updated mean.
    pub fn push(&mut self, reading: Millivolts) -> Millivolts {
        self.window.write(reading);
        self.average()
    }

    /// Truncated mean of the readings currently in the window.
    #[must_use]
    pub fn average(&self) -> Millivolts {
        let sum: u32 = self.window.as_slice().iter().copied().map(u32::from).sum();
        #[allow(clippy::cast_possible_truncation)]
        let mean = sum / N as u32;
        Millivolts::try_from(mean).unwrap_or(Millivolts::MAX)
    }

    /// Most recent raw reading pushed into the window.
    #[must_use]
    pub fn latest(&self) -> Option<Millivolts> {
        self.window.recent().copied()
    }

    /// Number of readings averaged.
    #[must_use]
    pub const fn window_len(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_window_reports_nominal() {
        let filter = MovingAverage::<5>::new(3_200);
        assert_eq!(filter.average(), 3_200);
        assert_eq!(filter.window_len(), 5);
    }

    #[test]
    fn identical_readings_fill_the_window_exactly() {
        let mut filter = MovingAverage::<5>::new(3_200);
        let mut filtered = 0;
        for _ in 0..5 {
            filtered = filter.push(3_333);
        }
        assert_eq!(filtered, 3_333);
    }

    #[test]
    fn oldest_slot_is_overwritten_first() {
        let mut filter = MovingAverage::<5>::new(3_200);
        assert_eq!(filter.push(2_850), 3_130);
        assert_eq!(filter.push(2_850), 3_060);
        assert_eq!(filter.push(2_850), 2_990);
        assert_eq!(filter.push(2_850), 2_920);
        assert_eq!(filter.push(2_850), 2_850);
        assert_eq!(filter.push(3_200), 2_920);
        assert_eq!(filter.latest(), Some(3_200));
    }

    #[test]
    fn mean_truncates_toward_zero() {
        let mut filter = MovingAverage::<3>::new(1_000);
        assert_eq!(filter.push(1_002), 1_000);
        assert_eq!(filter.push(1_002), 1_001);
    }

    #[test]
    fn extreme_readings_do_not_overflow() {
        let mut filter = MovingAverage::<5>::new(Millivolts::MAX);
        assert_eq!(filter.push(Millivolts::MAX), Millivolts::MAX);
        assert_eq!(filter.push(0), 52_428);
    }
}
