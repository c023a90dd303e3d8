//! Board wiring for the cell module.
//!
//! Three push-pull outputs (loop switch, shunt, LED) plus the supply sampler.
//! Every output powers up low: loop open, shunt off, LED dark.

pub mod power;

use cell_core::config::Millivolts;
use cell_core::scheduler::{CellSensor, OutputDriver};
use embassy_stm32::gpio::Output;

use power::SupplySampler;

pub struct CellBoard<'d> {
    loop_switch: Output<'d>,
    shunt: Output<'d>,
    indicator: Output<'d>,
    supply: SupplySampler<'d>,
}

impl<'d> CellBoard<'d> {
    pub fn new(
        loop_switch: Output<'d>,
        shunt: Output<'d>,
        indicator: Output<'d>,
        supply: SupplySampler<'d>,
    ) -> Self {
        Self {
            loop_switch,
            shunt,
            indicator,
            supply,
        }
    }

    pub fn supply_mut(&mut self) -> &mut SupplySampler<'d> {
        &mut self.supply
    }
}

fn drive(output: &mut Output<'_>, high: bool) {
    if high {
        output.set_high();
    } else {
        output.set_low();
    }
}

impl OutputDriver for CellBoard<'_> {
    fn set_loop_closed(&mut self, closed: bool) {
        drive(&mut self.loop_switch, closed);
    }

    fn set_shunt_engaged(&mut self, engaged: bool) {
        drive(&mut self.shunt, engaged);
    }

    fn set_indicator(&mut self, lit: bool) {
        drive(&mut self.indicator, lit);
    }
}

impl CellSensor for CellBoard<'_> {
    fn sample_millivolts(&mut self) -> Millivolts {
        self.supply.read_millivolts()
    }
}
