#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Report queue and logging helpers.
//!
//! The cell task publishes one [`TickReport`] per tick into a bounded channel
//! and never waits on it; the telemetry task drains the channel and logs each
//! report. Reports that do not fit are counted instead of blocking the
//! protection loop.

use cell_core::calibration::CalibrationFactors;
use cell_core::telemetry::{DiagnosticSink, TelemetryRecord, TickReport};
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use portable_atomic::{AtomicU32, Ordering};

/// Reports buffered between the cell task and the telemetry task.
pub const REPORT_QUEUE_DEPTH: usize = 4;

#[cfg(target_os = "none")]
type ReportMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type ReportMutex = NoopRawMutex;

/// Channel carrying per-tick reports.
pub type ReportQueue = Channel<ReportMutex, TickReport, REPORT_QUEUE_DEPTH>;

/// Sender handle for the report queue.
pub type ReportSender<'a> = Sender<'a, ReportMutex, TickReport, REPORT_QUEUE_DEPTH>;

/// Receiver handle for the report queue.
pub type ReportReceiver<'a> = Receiver<'a, ReportMutex, TickReport, REPORT_QUEUE_DEPTH>;

/// Number of reports discarded because the queue was full.
static DROPPED_REPORTS: AtomicU32 = AtomicU32::new(0);

/// Returns the running count of dropped reports.
pub fn dropped_reports() -> u32 {
    DROPPED_REPORTS.load(Ordering::Relaxed)
}

/// [`DiagnosticSink`] that forwards reports without ever blocking.
pub struct ReportPublisher<'a> {
    sender: ReportSender<'a>,
}

impl<'a> ReportPublisher<'a> {
    pub fn new(sender: ReportSender<'a>) -> Self {
        Self { sender }
    }
}

impl DiagnosticSink for ReportPublisher<'_> {
    fn emit(&mut self, report: &TickReport) {
        if self.sender.try_send(*report).is_err() {
            DROPPED_REPORTS.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Tracks the drop counter so only changes get logged.
#[derive(Default)]
pub struct DropWatch {
    last_seen: u32,
}

impl DropWatch {
    /// Returns the number of reports dropped since the previous call.
    pub fn newly_dropped(&mut self) -> Option<u32> {
        let total = dropped_reports();
        let delta = total.wrapping_sub(self.last_seen);
        self.last_seen = total;
        (delta > 0).then_some(delta)
    }
}

#[cfg(target_os = "none")]
pub fn log_tick_report(report: &TickReport) {
    defmt::info!("cell: {}", defmt::Display2Format(report));
}

#[cfg(not(target_os = "none"))]
pub fn log_tick_report(report: &TickReport) {
    println!("cell: {report}");
}

#[cfg(target_os = "none")]
pub fn log_transition(record: &TelemetryRecord) {
    defmt::info!(
        "telemetry:#{} tick={} {} vcc={}mV",
        record.id,
        record.tick,
        defmt::Display2Format(&record.event),
        record.filtered_mv
    );
}

#[cfg(not(target_os = "none"))]
pub fn log_transition(record: &TelemetryRecord) {
    println!(
        "telemetry:#{} tick={} {} vcc={}mV",
        record.id, record.tick, record.event, record.filtered_mv
    );
}

#[cfg(target_os = "none")]
pub fn log_dropped_reports(count: u32, total: u32) {
    defmt::warn!("telemetry: dropped {} reports ({} total)", count, total);
}

#[cfg(not(target_os = "none"))]
pub fn log_dropped_reports(count: u32, total: u32) {
    println!("telemetry: dropped {count} reports ({total} total)");
}

#[cfg(target_os = "none")]
pub fn log_invalid_sample(raw: u16) {
    defmt::warn!("supply: unusable reference reading {}, reporting 0mV", raw);
}

#[cfg(not(target_os = "none"))]
pub fn log_invalid_sample(raw: u16) {
    println!("supply: unusable reference reading {raw}, reporting 0mV");
}

#[cfg(target_os = "none")]
pub fn log_calibration_factors(factors: &CalibrationFactors) {
    defmt::info!(
        "calibration: default factor={} custom factor={}",
        factors.uncalibrated,
        factors.calibrated
    );
}

#[cfg(not(target_os = "none"))]
pub fn log_calibration_factors(factors: &CalibrationFactors) {
    println!(
        "calibration: default factor={} custom factor={}",
        factors.uncalibrated, factors.calibrated
    );
}

#[cfg(target_os = "none")]
pub fn log_calibration(uncalibrated_mv: u16, calibrated_mv: u16, raw: u16) {
    defmt::info!(
        "calibration: uncalibrated={}mV calibrated={}mV raw={}",
        uncalibrated_mv,
        calibrated_mv,
        raw
    );
}

#[cfg(not(target_os = "none"))]
pub fn log_calibration(uncalibrated_mv: u16, calibrated_mv: u16, raw: u16) {
    println!("calibration: uncalibrated={uncalibrated_mv}mV calibrated={calibrated_mv}mV raw={raw}");
}
