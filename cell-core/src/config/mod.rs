//! Build-time protection configuration shared by firmware and host targets.
//!
//! Every threshold is expressed in calibrated millivolts. The controller
//! depends on the strict ordering
//! `low_engage < low_disengage < shunt_disengage < shunt_engage < high_disengage < high_engage`;
//! [`ProtectionConfig::DEFAULT`] is checked at compile time and any other
//! configuration goes through [`ProtectionConfig::validate`].

use core::fmt;

/// Calibrated cell voltage in millivolts.
pub type Millivolts = u16;

/// Number of readings averaged by the voltage filter.
pub const FILTER_WINDOW: usize = 5;
/// Plausible resting voltage used to seed the filter window at power-up.
pub const NOMINAL_CELL_MILLIVOLTS: Millivolts = 3_200;
/// Consecutive ticks (~1 s each) a new classification must hold before it is committed.
pub const DEFAULT_SETTLE_TICKS: u8 = 3;
/// Ticks after a cutoff during which the indicator signals a recent cutoff (~30 minutes).
pub const RECENT_CUTOFF_TICKS: u16 = 30 * 60;

/// Identifies a single threshold in diagnostics and configuration errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ThresholdName {
    LowEngage,
    LowDisengage,
    ShuntDisengage,
    ShuntEngage,
    HighDisengage,
    HighEngage,
}

impl ThresholdName {
    /// Short label used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ThresholdName::LowEngage => "low-engage",
            ThresholdName::LowDisengage => "low-disengage",
            ThresholdName::ShuntDisengage => "shunt-disengage",
            ThresholdName::ShuntEngage => "shunt-engage",
            ThresholdName::HighDisengage => "high-disengage",
            ThresholdName::HighEngage => "high-engage",
        }
    }
}

impl fmt::Display for ThresholdName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Voltage bands used by the cell classifier and the shunt controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Thresholds {
    /// At or below this voltage the cell enters under-voltage cutoff.
    pub low_engage: Millivolts,
    /// An under-voltage cutoff is left only above this voltage.
    pub low_disengage: Millivolts,
    /// A running shunt is released below this voltage.
    pub shunt_disengage: Millivolts,
    /// The shunt is engaged above this voltage.
    pub shunt_engage: Millivolts,
    /// An over-voltage cutoff is left only below this voltage.
    pub high_disengage: Millivolts,
    /// At or above this voltage the cell enters over-voltage cutoff.
    pub high_engage: Millivolts,
}

impl Thresholds {
    /// Thresholds for a LiFePO4 cell.
    pub const DEFAULT: Self = Self {
        low_engage: 2_900,
        low_disengage: 2_950,
        shunt_disengage: 3_450,
        shunt_engage: 3_500,
        high_disengage: 3_550,
        high_engage: 3_600,
    };

    /// Thresholds paired with their names, lowest first.
    #[must_use]
    pub const fn ordered(&self) -> [(ThresholdName, Millivolts); 6] {
        [
            (ThresholdName::LowEngage, self.low_engage),
            (ThresholdName::LowDisengage, self.low_disengage),
            (ThresholdName::ShuntDisengage, self.shunt_disengage),
            (ThresholdName::ShuntEngage, self.shunt_engage),
            (ThresholdName::HighDisengage, self.high_disengage),
            (ThresholdName::HighEngage, self.high_engage),
        ]
    }

    /// Verifies the strict ordering the classifier relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ThresholdOrder`] naming the first adjacent pair
    /// that is not strictly increasing.
    pub const fn check_order(&self) -> Result<(), ConfigError> {
        let ordered = self.ordered();
        let mut index = 1;
        while index < ordered.len() {
            let (lower, lower_mv) = ordered[index - 1];
            let (upper, upper_mv) = ordered[index];
            if lower_mv >= upper_mv {
                return Err(ConfigError::ThresholdOrder { lower, upper });
            }
            index += 1;
        }
        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete set of tunables consumed by [`crate::scheduler::CellController`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ProtectionConfig {
    pub thresholds: Thresholds,
    pub settle_ticks: u8,
    pub recent_cutoff_ticks: u16,
    pub nominal_millivolts: Millivolts,
}

impl ProtectionConfig {
    /// Configuration flashed onto production modules.
    pub const DEFAULT: Self = Self {
        thresholds: Thresholds::DEFAULT,
        settle_ticks: DEFAULT_SETTLE_TICKS,
        recent_cutoff_ticks: RECENT_CUTOFF_TICKS,
        nominal_millivolts: NOMINAL_CELL_MILLIVOLTS,
    };

    /// Returns a copy with a different settle-tick count.
    #[must_use]
    pub const fn with_settle_ticks(mut self, settle_ticks: u8) -> Self {
        self.settle_ticks = settle_ticks;
        self
    }

    /// Returns a copy with a different recent-cutoff duration.
    #[must_use]
    pub const fn with_recent_cutoff_ticks(mut self, ticks: u16) -> Self {
        self.recent_cutoff_ticks = ticks;
        self
    }

    /// Returns a copy with different thresholds.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Checks every invariant the controller depends on.
    ///
    /// # Errors
    ///
    /// Propagates the threshold ordering failure from [`Thresholds::check_order`].
    pub const fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.check_order()
    }
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = assert!(
    ProtectionConfig::DEFAULT.validate().is_ok(),
    "default thresholds must be strictly ordered"
);

/// Reasons a [`ProtectionConfig`] is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// `lower` must sit strictly below `upper`.
    ThresholdOrder {
        lower: ThresholdName,
        upper: ThresholdName,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ThresholdOrder { lower, upper } => {
                write!(f, "threshold {lower} must be below {upper}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_strictly_ordered() {
        assert_eq!(Thresholds::DEFAULT.check_order(), Ok(()));
        let ordered = Thresholds::DEFAULT.ordered();
        assert!(ordered.windows(2).all(|pair| pair[0].1 < pair[1].1));
    }

    #[test]
    fn overlapping_shunt_band_is_rejected() {
        let thresholds = Thresholds {
            shunt_engage: 3_560,
            ..Thresholds::DEFAULT
        };
        assert_eq!(
            thresholds.check_order(),
            Err(ConfigError::ThresholdOrder {
                lower: ThresholdName::ShuntEngage,
                upper: ThresholdName::HighDisengage,
            })
        );
    }

    #[test]
    fn equal_thresholds_are_rejected() {
        let config = ProtectionConfig::DEFAULT.with_thresholds(Thresholds {
            low_disengage: 2_900,
            ..Thresholds::DEFAULT
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_error_names_the_pair() {
        use core::fmt::Write;

        let error = ConfigError::ThresholdOrder {
            lower: ThresholdName::LowEngage,
            upper: ThresholdName::LowDisengage,
        };
        let mut rendered: heapless::String<64> = heapless::String::new();
        write!(rendered, "{error}").unwrap();
        assert_eq!(
            rendered.as_str(),
            "threshold low-engage must be below low-disengage"
        );
    }
}
