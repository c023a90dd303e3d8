//! Supply-rail calibration math.
//!
//! The module measures its own supply by converting a fixed internal
//! reference against the rail, so the rail voltage is inversely proportional
//! to the raw reading: `millivolts = factor / reading`. The factor starts
//! from the reference product of the converter and is scaled by a
//! per-module correction taken with an external meter during manufacturing.
//!
//! Calibration procedure:
//! 1. Build the firmware with the `calibration` feature and flash it.
//! 2. Power the board from a stable 3.1-3.4 V supply and wait at least 8 s.
//! 3. Measure the supply as close to the MCU as possible ("metered").
//! 4. Note the uncalibrated value logged by the firmware ("reported").
//! 5. Enter both numbers in the firmware calibration constant and rebuild
//!    without the feature.

use crate::config::Millivolts;

/// Per-module correction between the metered and the reported supply voltage.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SupplyCalibration {
    pub metered_mv: u32,
    pub reported_mv: u32,
}

impl SupplyCalibration {
    /// No correction.
    pub const UNITY: Self = Self::new(3_200, 3_200);

    #[must_use]
    pub const fn new(metered_mv: u32, reported_mv: u32) -> Self {
        Self {
            metered_mv,
            reported_mv,
        }
    }

    /// Scales the converter's reference product by this correction.
    ///
    /// The division happens first to keep the product inside `u32`; a zero
    /// `reported_mv` leaves the reference unscaled.
    #[must_use]
    pub const fn factor(&self, reference_product: u32) -> u32 {
        match reference_product.checked_div(self.reported_mv) {
            Some(per_mv) => per_mv.saturating_mul(self.metered_mv),
            None => reference_product,
        }
    }
}

impl Default for SupplyCalibration {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Uncorrected and corrected factors for one converter, logged when entering
/// calibration mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CalibrationFactors {
    pub uncalibrated: u32,
    pub calibrated: u32,
}

impl CalibrationFactors {
    #[must_use]
    pub const fn new(reference_product: u32, calibration: SupplyCalibration) -> Self {
        Self {
            uncalibrated: SupplyCalibration::UNITY.factor(reference_product),
            calibrated: calibration.factor(reference_product),
        }
    }
}

/// Converts a raw reference reading into rail millivolts.
///
/// Returns `None` for a zero reading, which the converter never produces on a
/// working board.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn millivolts(factor: u32, reading: u16) -> Option<Millivolts> {
    let Some(millivolts) = factor.checked_div(reading as u32) else {
        return None;
    };
    if millivolts > Millivolts::MAX as u32 {
        Some(Millivolts::MAX)
    } else {
        #[allow(clippy::cast_possible_truncation)]
        Some(millivolts as Millivolts)
    }
}
