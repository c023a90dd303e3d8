use cell_core::cycles::{DutyCycle, DutyCycleKind};
use cell_core::scheduler::{CellController, CellSensor, MEASUREMENT_SETTLE, OutputDriver};
use cell_core::telemetry::{DiagnosticSink, TelemetryRecorder};
use embassy_time::Timer;

use crate::cycle::{active_time, core_duration_to_embassy, run_cycle};
use crate::hw::CellBoard;
use crate::telemetry::{ReportPublisher, ReportSender, log_transition};

#[embassy_executor::task]
pub async fn run(mut board: CellBoard<'static>, reports: ReportSender<'static>) -> ! {
    let mut controller = CellController::with_defaults();
    let mut telemetry: TelemetryRecorder = TelemetryRecorder::new();
    let mut publisher = ReportPublisher::new(reports);
    let mut last_cycle: Option<DutyCycleKind> = None;

    loop {
        board.quiesce();
        Timer::after(core_duration_to_embassy(MEASUREMENT_SETTLE)).await;
        let raw_mv = board.sample_millivolts();

        let outcome = controller.tick(raw_mv, &mut telemetry);
        publisher.emit(&outcome.report);
        for record in telemetry.recorded_on(outcome.report.tick) {
            log_transition(record);
        }
        if last_cycle != Some(outcome.cycle.kind) {
            log_cycle_change(outcome.cycle);
            last_cycle = Some(outcome.cycle.kind);
        }

        run_cycle(outcome.cycle, &mut board).await;
    }
}

fn log_cycle_change(cycle: &DutyCycle) {
    defmt::info!(
        "cell: cycle {} active={}ms rest={}ms",
        defmt::Display2Format(&cycle.kind),
        active_time(cycle).as_millis(),
        core_duration_to_embassy(cycle.rest_duration()).as_millis()
    );
}
