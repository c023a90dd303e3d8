use crate::telemetry::{
    DropWatch, ReportReceiver, dropped_reports, log_dropped_reports, log_tick_report,
};

#[embassy_executor::task]
pub async fn run(reports: ReportReceiver<'static>) -> ! {
    let mut drops = DropWatch::default();
    loop {
        let report = reports.receive().await;
        if let Some(count) = drops.newly_dropped() {
            log_dropped_reports(count, dropped_reports());
        }
        log_tick_report(&report);
    }
}
