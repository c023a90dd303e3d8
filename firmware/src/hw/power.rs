//! VREFINT sampling of the cell supply.
//!
//! The MCU runs straight from the cell, so converting the internal reference
//! against VDDA measures the cell itself: the reading falls as the supply
//! rises. The factory constant `VREFINT_CAL` was taken at 3.0 V, which gives
//! the reference product fed into [`SupplyCalibration::factor`].

use core::ptr;

use cell_core::calibration::{self, SupplyCalibration};
use cell_core::config::Millivolts;
use embassy_stm32::adc::{Adc, SampleTime, VrefInt};
use embassy_stm32::peripherals::ADC1;

use crate::telemetry::log_invalid_sample;

/// Factory-programmed calibration constant sampled at 3.0 V.
const VREFINT_CAL_ADDR: *const u16 = 0x1FFF_75AA as *const u16;

/// Supply voltage at which `VREFINT_CAL` was taken.
const VREFINT_CAL_MILLIVOLTS: u32 = 3_000;

/// Per-module correction; see [`cell_core::calibration`] for the procedure.
pub const SUPPLY_CALIBRATION: SupplyCalibration = SupplyCalibration::UNITY;

/// Reads the factory-trimmed VREFINT calibration constant.
pub fn read_vrefint_calibration() -> u16 {
    unsafe { ptr::read_volatile(VREFINT_CAL_ADDR) }
}

/// Reference product for this chip.
pub fn reference_product() -> u32 {
    VREFINT_CAL_MILLIVOLTS * u32::from(read_vrefint_calibration())
}

/// Embassy ADC wrapper that converts VREFINT readings into supply millivolts.
pub struct SupplySampler<'d> {
    adc: Adc<'d, ADC1>,
    channel: VrefInt,
    discard_next: bool,
    factor: u32,
}

impl<'d> SupplySampler<'d> {
    /// Enables the internal reference and applies `calibration`.
    pub fn new(mut adc: Adc<'d, ADC1>, calibration: SupplyCalibration) -> Self {
        adc.set_sample_time(SampleTime::CYCLES160_5);
        let channel = adc.enable_vrefint();
        Self {
            adc,
            channel,
            discard_next: true,
            factor: calibration.factor(reference_product()),
        }
    }

    /// One raw conversion. The first conversion after enabling the reference is thrown away.
    pub fn read_raw(&mut self) -> u16 {
        if self.discard_next {
            let _ = self.adc.blocking_read(&mut self.channel);
            self.discard_next = false;
        }
        self.adc.blocking_read(&mut self.channel)
    }

    /// Converts `raw` with this sampler's calibration.
    pub fn to_millivolts(&self, raw: u16) -> Millivolts {
        calibration::millivolts(self.factor, raw).unwrap_or_else(|| {
            log_invalid_sample(raw);
            0
        })
    }

    /// Samples and converts in one step.
    pub fn read_millivolts(&mut self) -> Millivolts {
        let raw = self.read_raw();
        self.to_millivolts(raw)
    }
}
