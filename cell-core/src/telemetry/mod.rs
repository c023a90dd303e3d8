//! Tick reports and transition history shared by firmware and host targets.
//!
//! A [`TickReport`] is produced on every tick and renders as the one-line
//! diagnostic emitted by the firmware and the emulator. Committed transitions
//! are additionally kept in a fixed-size [`TelemetryRecorder`] ring so the
//! most recent history survives between diagnostics reads.

use core::fmt;

use heapless::HistoryBuf;

use crate::config::Millivolts;
use crate::cycles::DutyCycleKind;
use crate::protection::CellState;

/// Identifier assigned to every recorded transition.
pub type EventId = u32;

/// Tick counter value; wraps after ~136 years of one-second ticks.
pub type TickStamp = u32;

/// Total number of transitions retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 32;

/// Committed changes worth keeping in the history.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    CellStateCommitted(CellState),
    ShuntEngaged,
    ShuntReleased,
    /// The cell has been normal long enough that the last cutoff no longer counts as recent.
    RecentCutoffCleared,
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::CellStateCommitted(state) => write!(f, "cell-state {state}"),
            TelemetryEventKind::ShuntEngaged => f.write_str("shunt-engaged"),
            TelemetryEventKind::ShuntReleased => f.write_str("shunt-released"),
            TelemetryEventKind::RecentCutoffCleared => f.write_str("recent-cutoff-cleared"),
        }
    }
}

/// Entry stored in the transition ring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub tick: TickStamp,
    pub event: TelemetryEventKind,
    pub filtered_mv: Millivolts,
}

/// Records transitions into a fixed-size ring buffer.
pub struct TelemetryRecorder<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord, CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> TelemetryRecorder<CAPACITY> {
    /// Creates a recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records `event` observed on `tick`.
    pub fn record(
        &mut self,
        event: TelemetryEventKind,
        tick: TickStamp,
        filtered_mv: Millivolts,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(TelemetryRecord {
            id,
            tick,
            event,
            filtered_mv,
        });
        id
    }

    /// Recorded transitions in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.ring.oldest_ordered()
    }

    /// Transitions recorded on `tick`, oldest first.
    pub fn recorded_on(&self, tick: TickStamp) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.oldest_first().filter(move |record| record.tick == tick)
    }

    /// Returns the most recent record, if available.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<const CAPACITY: usize> Default for TelemetryRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of one tick, rendered as the diagnostic line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickReport {
    pub tick: TickStamp,
    pub raw_mv: Millivolts,
    pub filtered_mv: Millivolts,
    pub state: CellState,
    pub pending_state: CellState,
    pub pending_age: u16,
    pub shunting: bool,
    pub shunt_pending: bool,
    pub shunt_pending_age: u16,
    pub cutoff_age: Option<u16>,
    pub cycle: DutyCycleKind,
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick={} vcc={}mV raw={}mV [cell {} pend={} age={}] [shunt {} pend={} age={}] cutoff-age=",
            self.tick,
            self.filtered_mv,
            self.raw_mv,
            self.state,
            self.pending_state,
            self.pending_age,
            on_off(self.shunting),
            on_off(self.shunt_pending),
            self.shunt_pending_age,
        )?;
        match self.cutoff_age {
            Some(ticks) => write!(f, "{ticks}")?,
            None => f.write_str("none")?,
        }
        write!(f, " cycle={}", self.cycle)
    }
}

const fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Destination for per-tick diagnostics. Never read back by the controller.
pub trait DiagnosticSink {
    fn emit(&mut self, report: &TickReport);
}

/// Sink that discards every report.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDiagnostics;

impl DiagnosticSink for NoDiagnostics {
    fn emit(&mut self, _: &TickReport) {}
}

#[cfg(test)]
mod tests {
    use core::fmt::Write;

    use super::*;

    fn report() -> TickReport {
        TickReport {
            tick: 12,
            raw_mv: 2_850,
            filtered_mv: 2_920,
            state: CellState::Normal,
            pending_state: CellState::UnderVoltageCutoff,
            pending_age: 1,
            shunting: false,
            shunt_pending: false,
            shunt_pending_age: 9,
            cutoff_age: None,
            cycle: DutyCycleKind::Normal,
        }
    }

    #[test]
    fn report_renders_as_single_diagnostic_line() {
        let mut line: heapless::String<160> = heapless::String::new();
        write!(line, "{}", report()).unwrap();
        assert_eq!(
            line.as_str(),
            "tick=12 vcc=2920mV raw=2850mV [cell OK pend=LVC age=1] [shunt off pend=off age=9] cutoff-age=none cycle=normal"
        );
    }

    #[test]
    fn recorder_assigns_sequential_ids_and_keeps_order() {
        let mut recorder = TelemetryRecorder::<4>::new();
        assert!(recorder.is_empty());

        let first = recorder.record(TelemetryEventKind::ShuntEngaged, 3, 3_520);
        let second = recorder.record(
            TelemetryEventKind::CellStateCommitted(CellState::OverVoltageCutoff),
            3,
            3_610,
        );
        assert_eq!((first, second), (0, 1));
        assert_eq!(recorder.recorded_on(3).count(), 2);
        assert_eq!(recorder.recorded_on(4).count(), 0);
        assert_eq!(
            recorder.latest().map(|record| record.event),
            Some(TelemetryEventKind::CellStateCommitted(
                CellState::OverVoltageCutoff
            ))
        );
    }

    #[test]
    fn recorder_overwrites_oldest_when_full() {
        let mut recorder = TelemetryRecorder::<2>::new();
        recorder.record(TelemetryEventKind::ShuntEngaged, 1, 3_510);
        recorder.record(TelemetryEventKind::ShuntReleased, 2, 3_440);
        recorder.record(TelemetryEventKind::RecentCutoffCleared, 3, 3_300);

        assert_eq!(recorder.len(), 2);
        let ticks: heapless::Vec<TickStamp, 2> =
            recorder.oldest_first().map(|record| record.tick).collect();
        assert_eq!(ticks.as_slice(), &[2, 3]);
    }
}
