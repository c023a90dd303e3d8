use cell_core::calibration::{self, CalibrationFactors};
use cell_core::cycles::SleepDuration;
use cell_core::cycles::normal::HEARTBEAT_FLASH;
use cell_core::filter::MovingAverage;
use cell_core::scheduler::OutputDriver;
use embassy_time::Timer;

use crate::cycle::core_duration_to_embassy;
use crate::hw::CellBoard;
use crate::hw::power::{SUPPLY_CALIBRATION, reference_product};
use crate::telemetry::{log_calibration, log_calibration_factors};

const CALIBRATION_PERIOD: SleepDuration = SleepDuration::Ms2000;

#[embassy_executor::task]
pub async fn run(mut board: CellBoard<'static>) -> ! {
    board.set_loop_closed(false);
    board.quiesce();

    let factors = CalibrationFactors::new(reference_product(), SUPPLY_CALIBRATION);
    log_calibration_factors(&factors);

    let first = board.supply_mut().read_raw();
    let mut raw_average: MovingAverage = MovingAverage::new(first);

    loop {
        let raw = raw_average.push(board.supply_mut().read_raw());
        let calibrated_mv = board.supply_mut().to_millivolts(raw);
        let uncalibrated_mv = calibration::millivolts(factors.uncalibrated, raw).unwrap_or(0);
        log_calibration(uncalibrated_mv, calibrated_mv, raw);

        board.set_indicator(true);
        Timer::after(core_duration_to_embassy(HEARTBEAT_FLASH)).await;
        board.set_indicator(false);
        Timer::after(core_duration_to_embassy(CALIBRATION_PERIOD.as_duration())).await;
    }
}
