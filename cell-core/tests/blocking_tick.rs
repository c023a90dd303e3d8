use core::time::Duration;

use cell_core::config::Millivolts;
use cell_core::cycles::{SleepDuration, startup::STARTUP_BLINK_HALF_PERIOD};
use cell_core::protection::CellState;
use cell_core::scheduler::blocking::run_tick;
use cell_core::scheduler::{
    CellController, CellSensor, MEASUREMENT_SETTLE, OutputDriver, PowerControl,
};
use cell_core::telemetry::{DiagnosticSink, NoDiagnostics, TelemetryRecorder, TickReport};
use heapless::Vec as HeaplessVec;

#[test]
fn tick_quiesces_before_sampling() {
    let mut controller = CellController::with_defaults();
    let mut board = MockBoard::new(3_200);
    let mut telemetry = TelemetryRecorder::<8>::new();

    run_tick(&mut controller, &mut board, &mut telemetry, &mut NoDiagnostics);

    assert_eq!(
        &board.events[..4],
        &[
            BoardEvent::Indicator(false),
            BoardEvent::Shunt(false),
            BoardEvent::Delay(MEASUREMENT_SETTLE),
            BoardEvent::Sample(3_200),
        ]
    );
}

#[test]
fn startup_cycle_blinks_three_times_without_sleeping() {
    let mut controller = CellController::with_defaults();
    let mut board = MockBoard::new(3_200);
    let mut telemetry = TelemetryRecorder::<8>::new();

    let outcome = run_tick(&mut controller, &mut board, &mut telemetry, &mut NoDiagnostics);
    assert_eq!(outcome.report.state, CellState::Invalid);

    let cycle_events = &board.events[4..];
    assert_eq!(
        &cycle_events[..2],
        &[BoardEvent::Loop(true), BoardEvent::Shunt(false)]
    );
    let blinks = cycle_events
        .iter()
        .filter(|event| **event == BoardEvent::Indicator(true))
        .count();
    assert_eq!(blinks, 3);
    assert_eq!(board.awake_for(), MEASUREMENT_SETTLE + STARTUP_BLINK_HALF_PERIOD * 6);
    assert!(board.sleeps().next().is_none(), "startup must re-sample immediately");
}

#[test]
fn normal_cycle_pulses_then_sleeps() {
    let mut controller = CellController::with_defaults();
    let mut board = MockBoard::new(3_200);
    let mut telemetry = TelemetryRecorder::<8>::new();
    for _ in 0..5 {
        board.events.clear();
        run_tick(&mut controller, &mut board, &mut telemetry, &mut NoDiagnostics);
    }
    assert_eq!(controller.state(), CellState::Normal);

    let cycle_events = &board.events[4..];
    assert_eq!(cycle_events.first(), Some(&BoardEvent::Loop(true)));
    // Power-up still counts as a recent cutoff, so the heartbeat is inverted.
    assert_eq!(
        cycle_events.iter().rev().nth(1),
        Some(&BoardEvent::Indicator(true))
    );
    assert_eq!(cycle_events.last(), Some(&BoardEvent::Sleep(SleepDuration::Ms1000)));
}

#[test]
fn under_voltage_opens_loop_and_sleeps() {
    let mut controller = CellController::with_defaults();
    let mut board = MockBoard::new(2_800);
    let mut telemetry = TelemetryRecorder::<8>::new();
    let mut reports = ReportLog::default();

    for _ in 0..8 {
        board.events.clear();
        run_tick(&mut controller, &mut board, &mut telemetry, &mut reports);
    }

    assert_eq!(controller.state(), CellState::UnderVoltageCutoff);
    assert_eq!(reports.reports.len(), 8);
    assert_eq!(
        &board.events[4..],
        &[
            BoardEvent::Loop(false),
            BoardEvent::Indicator(false),
            BoardEvent::Shunt(false),
            BoardEvent::Sleep(SleepDuration::Ms1000),
        ]
    );
}

#[test]
fn over_voltage_leaves_the_shunt_released() {
    let mut controller = CellController::with_defaults();
    let mut board = MockBoard::new(3_700);
    let mut telemetry = TelemetryRecorder::<8>::new();

    for _ in 0..8 {
        board.events.clear();
        run_tick(&mut controller, &mut board, &mut telemetry, &mut NoDiagnostics);
    }

    assert_eq!(controller.state(), CellState::OverVoltageCutoff);
    assert_eq!(board.shunt, Some(false));
    assert_eq!(board.looped, Some(false));
    assert_eq!(board.awake_for(), MEASUREMENT_SETTLE + Duration::from_millis(1_100));
    assert!(board.sleeps().next().is_none());
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BoardEvent {
    Loop(bool),
    Shunt(bool),
    Indicator(bool),
    Delay(Duration),
    Sleep(SleepDuration),
    Sample(Millivolts),
}

struct MockBoard {
    reading: Millivolts,
    looped: Option<bool>,
    shunt: Option<bool>,
    events: HeaplessVec<BoardEvent, 64>,
}

impl MockBoard {
    fn new(reading: Millivolts) -> Self {
        Self {
            reading,
            looped: None,
            shunt: None,
            events: HeaplessVec::new(),
        }
    }

    fn log(&mut self, event: BoardEvent) {
        self.events.push(event).expect("event log overflow");
    }

    fn awake_for(&self) -> Duration {
        self.events
            .iter()
            .filter_map(|event| match event {
                BoardEvent::Delay(duration) => Some(*duration),
                _ => None,
            })
            .sum()
    }

    fn sleeps(&self) -> impl Iterator<Item = SleepDuration> + '_ {
        self.events.iter().filter_map(|event| match event {
            BoardEvent::Sleep(duration) => Some(*duration),
            _ => None,
        })
    }
}

impl CellSensor for MockBoard {
    fn sample_millivolts(&mut self) -> Millivolts {
        let reading = self.reading;
        self.log(BoardEvent::Sample(reading));
        reading
    }
}

impl OutputDriver for MockBoard {
    fn set_loop_closed(&mut self, closed: bool) {
        self.looped = Some(closed);
        self.log(BoardEvent::Loop(closed));
    }

    fn set_shunt_engaged(&mut self, engaged: bool) {
        self.shunt = Some(engaged);
        self.log(BoardEvent::Shunt(engaged));
    }

    fn set_indicator(&mut self, lit: bool) {
        self.log(BoardEvent::Indicator(lit));
    }
}

impl PowerControl for MockBoard {
    fn delay(&mut self, duration: Duration) {
        self.log(BoardEvent::Delay(duration));
    }

    fn sleep_for(&mut self, duration: SleepDuration) {
        self.log(BoardEvent::Sleep(duration));
    }
}

#[derive(Default)]
struct ReportLog {
    reports: HeaplessVec<TickReport, 16>,
}

impl DiagnosticSink for ReportLog {
    fn emit(&mut self, report: &TickReport) {
        self.reports.push(*report).expect("report log overflow");
    }
}
