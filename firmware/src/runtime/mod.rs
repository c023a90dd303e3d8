use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::Adc;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_sync::channel::Channel;

use crate::hw::CellBoard;
use crate::hw::power::{SUPPLY_CALIBRATION, SupplySampler};
use crate::telemetry::ReportQueue;

#[cfg(feature = "calibration")]
mod calibration_task;
#[cfg(not(feature = "calibration"))]
mod cell_task;
mod telemetry_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static REPORT_QUEUE: ReportQueue = Channel::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA4,
        PA5,
        PA6,
        ADC1,
        ..
    } = hal::init(config);

    let supply = SupplySampler::new(Adc::new(ADC1), SUPPLY_CALIBRATION);
    let board = CellBoard::new(
        Output::new(PA4, Level::Low, Speed::Low),
        Output::new(PA5, Level::Low, Speed::Low),
        Output::new(PA6, Level::Low, Speed::Low),
        supply,
    );

    #[cfg(not(feature = "calibration"))]
    spawner
        .spawn(cell_task::run(board, REPORT_QUEUE.sender()))
        .expect("failed to spawn cell task");

    #[cfg(feature = "calibration")]
    spawner
        .spawn(calibration_task::run(board))
        .expect("failed to spawn calibration task");

    spawner
        .spawn(telemetry_task::run(REPORT_QUEUE.receiver()))
        .expect("failed to spawn telemetry task");

    core::future::pending::<()>().await;
}
