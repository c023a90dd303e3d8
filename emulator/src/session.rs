use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant as HostInstant};

use cell_core::config::Millivolts;
use cell_core::cycles::SleepDuration;
use cell_core::protection::CellState;
use cell_core::scheduler::blocking::run_tick;
use cell_core::scheduler::{CellController, CellSensor, OutputDriver, PowerControl};
use cell_core::telemetry::{
    DiagnosticSink, TELEMETRY_RING_CAPACITY, TelemetryRecord, TelemetryRecorder, TickReport,
};
use winnow::ascii::{Caseless, digit1, space1};
use winnow::combinator::{alt, cut_err, eof, opt, peek, preceded, terminated};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::token::{literal, take_till};
use winnow::{ModalResult, Parser};

/// Upper bound for `hold` and `ramp` so a typo cannot spin forever.
pub const MAX_BATCH_TICKS: u32 = 100_000;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "sample",
        "<mv> | sample <mv>             - run one tick with the given cell voltage",
    ),
    (
        "hold",
        "hold <mv> <ticks>              - run several ticks at a constant voltage",
    ),
    (
        "ramp",
        "ramp <from> <to> <ticks>       - sweep the voltage linearly across ticks",
    ),
    (
        "status",
        "status                         - show the last tick report",
    ),
    (
        "outputs",
        "outputs                        - show output levels and duty-cycle time",
    ),
    (
        "history",
        "history                        - list recorded transitions",
    ),
    (
        "help",
        "help [topic]                   - show help for a command",
    ),
];

/// Scripted scenarios recorded by `capture_transcripts`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    Startup,
    UnderVoltage,
    OverVoltage,
    Spike,
}

impl TranscriptProfile {
    pub const ALL: [Self; 4] = [
        Self::Startup,
        Self::UnderVoltage,
        Self::OverVoltage,
        Self::Spike,
    ];

    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::Startup => "transcripts/emulator-startup.log",
            TranscriptProfile::UnderVoltage => "transcripts/emulator-under-voltage.log",
            TranscriptProfile::OverVoltage => "transcripts/emulator-over-voltage.log",
            TranscriptProfile::Spike => "transcripts/emulator-spike.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::Startup => "Cell emulator startup transcript",
            TranscriptProfile::UnderVoltage => "Cell emulator under-voltage transcript",
            TranscriptProfile::OverVoltage => "Cell emulator over-voltage transcript",
            TranscriptProfile::Spike => "Cell emulator spike rejection transcript",
        }
    }
}

/// How a response line should be highlighted on the console.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tone {
    Plain,
    Healthy,
    Warning,
    Alarm,
}

impl Tone {
    fn for_report(report: &TickReport) -> Self {
        match report.state {
            CellState::Invalid => Tone::Plain,
            CellState::Normal if report.shunting => Tone::Warning,
            CellState::Normal => Tone::Healthy,
            CellState::UnderVoltageCutoff | CellState::OverVoltageCutoff => Tone::Alarm,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub tone: Tone,
    pub text: String,
}

impl Response {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Plain,
            text: text.into(),
        }
    }

    fn report(report: &TickReport) -> Self {
        Self {
            tone: Tone::for_report(report),
            text: report.to_string(),
        }
    }

    fn error(error: &CommandError) -> Self {
        Self {
            tone: Tone::Alarm,
            text: format!("ERR {error}"),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    UnexpectedArgument(String),
    InvalidMillivolts(String),
    InvalidTickCount(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(word) => {
                write!(f, "unknown command `{word}` (try `help`)")
            }
            CommandError::MissingArgument(name) => write!(f, "missing argument <{name}>"),
            CommandError::UnexpectedArgument(word) => write!(f, "unexpected argument `{word}`"),
            CommandError::InvalidMillivolts(word) => {
                write!(f, "`{word}` is not a voltage in millivolts (0-65535)")
            }
            CommandError::InvalidTickCount(word) => {
                write!(f, "`{word}` is not a tick count (1-{MAX_BATCH_TICKS})")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Command<'a> {
    Sample(Millivolts),
    Hold(Millivolts, u32),
    Ramp(Millivolts, Millivolts, u32),
    Status,
    Outputs,
    History,
    Help(Option<&'a str>),
}

/// Grammar labels attached with [`StrContext::Label`] and mapped back onto
/// [`CommandError`] when a line fails to parse.
const COMMAND: &str = "command";
const END: &str = "end";
const TICKS: &str = "ticks";

fn parse_command(line: &str) -> Result<Command<'_>, CommandError> {
    let line = line.trim();
    terminated(command, cut_err(eof.context(StrContext::Label(END))))
        .parse(line)
        .map_err(|error| command_error(line, error.offset(), error.inner()))
}

fn command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    alt((
        bare_sample,
        preceded(keyword("sample"), cut_err(argument(millivolts, "mv"))).map(Command::Sample),
        preceded(
            keyword("hold"),
            cut_err((argument(millivolts, "mv"), argument(ticks, TICKS))),
        )
        .map(|(level, count)| Command::Hold(level, count)),
        preceded(
            keyword("ramp"),
            cut_err((
                argument(millivolts, "from"),
                argument(millivolts, "to"),
                argument(ticks, TICKS),
            )),
        )
        .map(|(from, to, count)| Command::Ramp(from, to, count)),
        keyword("status").value(Command::Status),
        keyword("outputs").value(Command::Outputs),
        keyword("history").value(Command::History),
        preceded(keyword("help"), opt(preceded(space1, word))).map(Command::Help),
    ))
    .context(StrContext::Label(COMMAND))
    .parse_next(input)
}

/// A line starting with a digit is a voltage, with or without `sample`.
fn bare_sample<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    preceded(
        peek(digit1),
        cut_err(terminated(millivolts, peek(boundary)).context(StrContext::Label("mv"))),
    )
    .map(Command::Sample)
    .parse_next(input)
}

fn keyword<'a>(name: &'static str) -> impl Parser<&'a str, &'a str, ErrMode<ContextError>> {
    terminated(literal(Caseless(name)), peek(boundary))
}

fn argument<'a, O>(
    value: impl Parser<&'a str, O, ErrMode<ContextError>>,
    label: &'static str,
) -> impl Parser<&'a str, O, ErrMode<ContextError>> {
    preceded(space1, terminated(value, peek(boundary))).context(StrContext::Label(label))
}

fn boundary<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((space1, eof)).parse_next(input)
}

fn word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., |c: char| c.is_whitespace()).parse_next(input)
}

fn millivolts(input: &mut &str) -> ModalResult<Millivolts> {
    terminated(digit1.try_map(str::parse::<Millivolts>), opt(literal(Caseless("mV"))))
        .parse_next(input)
}

fn ticks(input: &mut &str) -> ModalResult<u32> {
    digit1
        .try_map(str::parse::<u32>)
        .verify(|count: &u32| (1..=MAX_BATCH_TICKS).contains(count))
        .parse_next(input)
}

fn command_error(line: &str, offset: usize, error: &ContextError) -> CommandError {
    let label = error
        .context()
        .find_map(|context| match context {
            StrContext::Label(label) => Some(*label),
            _ => None,
        })
        .unwrap_or(COMMAND);

    match (label, word_at(line, offset)) {
        (COMMAND, _) => line
            .split_whitespace()
            .next()
            .map_or(CommandError::MissingArgument(COMMAND), |head| {
                CommandError::UnknownCommand(head.to_string())
            }),
        (END, Some(extra)) => CommandError::UnexpectedArgument(extra.to_string()),
        (TICKS, Some(word)) => CommandError::InvalidTickCount(word.to_string()),
        (name, None) => CommandError::MissingArgument(name),
        (_, Some(word)) => CommandError::InvalidMillivolts(word.to_string()),
    }
}

/// Whole word covering byte `offset`, or the next word when `offset` sits on whitespace.
fn word_at(line: &str, offset: usize) -> Option<&str> {
    let (before, after) = line.split_at(offset);
    if after.is_empty() {
        return None;
    }
    let start = if after.starts_with(char::is_whitespace) {
        offset
    } else {
        before.trim_end_matches(|c: char| !c.is_whitespace()).len()
    };
    line[start..].split_whitespace().next()
}

/// Voltage for step `index` of a linear sweep over `ticks` samples.
fn ramp_point(from: Millivolts, to: Millivolts, index: u32, ticks: u32) -> Millivolts {
    if ticks <= 1 {
        return to;
    }
    let span = i64::from(to) - i64::from(from);
    let offset = span * i64::from(index) / i64::from(ticks - 1);
    Millivolts::try_from(i64::from(from) + offset).unwrap_or(to)
}

/// Host stand-in for the cell board.
///
/// Output changes are only latched; holds count as active time and deep
/// sleeps as sleep time, so the duty-cycle split is reported without waiting.
#[derive(Debug, Default)]
pub struct SimulatedBoard {
    cell_mv: Millivolts,
    loop_closed: bool,
    shunt_engaged: bool,
    indicator_lit: bool,
    indicator_toggles: u64,
    active: Duration,
    asleep: Duration,
}

impl SimulatedBoard {
    pub fn set_cell_millivolts(&mut self, millivolts: Millivolts) {
        self.cell_mv = millivolts;
    }

    pub fn loop_closed(&self) -> bool {
        self.loop_closed
    }

    pub fn shunt_engaged(&self) -> bool {
        self.shunt_engaged
    }

    pub fn active_time(&self) -> Duration {
        self.active
    }

    pub fn sleep_time(&self) -> Duration {
        self.asleep
    }

    /// Percentage of simulated time spent awake.
    pub fn duty_percent(&self) -> f64 {
        let total = self.active + self.asleep;
        if total.is_zero() {
            0.0
        } else {
            100.0 * self.active.as_secs_f64() / total.as_secs_f64()
        }
    }

    fn describe(&self) -> String {
        format!(
            "loop={} shunt={} led={} led-toggles={} active={} asleep={} duty={:.1}%",
            if self.loop_closed { "closed" } else { "open" },
            on_off(self.shunt_engaged),
            on_off(self.indicator_lit),
            self.indicator_toggles,
            format_duration_short(self.active),
            format_duration_short(self.asleep),
            self.duty_percent(),
        )
    }
}

impl CellSensor for SimulatedBoard {
    fn sample_millivolts(&mut self) -> Millivolts {
        self.cell_mv
    }
}

impl OutputDriver for SimulatedBoard {
    fn set_loop_closed(&mut self, closed: bool) {
        self.loop_closed = closed;
    }

    fn set_shunt_engaged(&mut self, engaged: bool) {
        self.shunt_engaged = engaged;
    }

    fn set_indicator(&mut self, lit: bool) {
        if lit != self.indicator_lit {
            self.indicator_toggles += 1;
        }
        self.indicator_lit = lit;
    }
}

impl PowerControl for SimulatedBoard {
    fn delay(&mut self, duration: Duration) {
        self.active += duration;
    }

    fn sleep_for(&mut self, duration: SleepDuration) {
        self.asleep += duration.as_duration();
    }
}

/// Keeps the most recent report for `status`.
#[derive(Default)]
struct LastReport {
    report: Option<TickReport>,
}

impl DiagnosticSink for LastReport {
    fn emit(&mut self, report: &TickReport) {
        self.report = Some(*report);
    }
}

pub struct Session {
    controller: CellController,
    board: SimulatedBoard,
    telemetry: TelemetryRecorder<TELEMETRY_RING_CAPACITY>,
    last: LastReport,
    transcript: Option<TranscriptLogger>,
    started_at: HostInstant,
}

impl Session {
    pub fn new(transcript: Option<TranscriptLogger>) -> Self {
        Self {
            controller: CellController::with_defaults(),
            board: SimulatedBoard::default(),
            telemetry: TelemetryRecorder::new(),
            last: LastReport::default(),
            transcript,
            started_at: HostInstant::now(),
        }
    }

    /// Session writing to the transcript file of `profile`.
    pub fn recording(profile: TranscriptProfile) -> io::Result<Self> {
        let logger = TranscriptLogger::create(Path::new(profile.log_path()), profile.header())?;
        Ok(Self::new(Some(logger)))
    }

    pub fn board(&self) -> &SimulatedBoard {
        &self.board
    }

    pub fn controller(&self) -> &CellController {
        &self.controller
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<Response>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let elapsed = self.started_at.elapsed();
        self.log(elapsed, TranscriptRole::Host, trimmed)?;

        let responses = match parse_command(trimmed) {
            Ok(command) => self.execute(command),
            Err(error) => vec![Response::error(&error)],
        };

        for response in &responses {
            self.log(elapsed, TranscriptRole::Emulator, &response.text)?;
        }
        Ok(responses)
    }

    fn execute(&mut self, command: Command<'_>) -> Vec<Response> {
        match command {
            Command::Sample(millivolts) => {
                let mut lines = Vec::new();
                self.tick(millivolts, &mut lines);
                if let Some(report) = self.last.report {
                    lines.push(Response::report(&report));
                }
                lines
            }
            Command::Hold(millivolts, ticks) => {
                self.run_batch(ticks, |_| millivolts, format!("held {millivolts}mV"))
            }
            Command::Ramp(from, to, ticks) => self.run_batch(
                ticks,
                |index| ramp_point(from, to, index, ticks),
                format!("ramped {from}mV to {to}mV"),
            ),
            Command::Status => self.status(),
            Command::Outputs => vec![Response::plain(self.board.describe())],
            Command::History => self.history(),
            Command::Help(topic) => help(topic),
        }
    }

    fn run_batch<F>(&mut self, ticks: u32, reading: F, label: String) -> Vec<Response>
    where
        F: Fn(u32) -> Millivolts,
    {
        let mut lines = Vec::new();
        for index in 0..ticks {
            self.tick(reading(index), &mut lines);
        }
        lines.push(Response::plain(format!("{label} for {ticks} ticks")));
        if let Some(report) = self.last.report {
            lines.push(Response::report(&report));
        }
        lines
    }

    /// Runs one tick and appends a line per transition it committed.
    fn tick(&mut self, millivolts: Millivolts, lines: &mut Vec<Response>) {
        self.board.set_cell_millivolts(millivolts);
        let outcome = run_tick(
            &mut self.controller,
            &mut self.board,
            &mut self.telemetry,
            &mut self.last,
        );
        let tone = Tone::for_report(&outcome.report);
        lines.extend(
            self.telemetry
                .recorded_on(outcome.report.tick)
                .map(|record| Response {
                    tone,
                    text: describe_record(record),
                }),
        );
    }

    fn status(&self) -> Vec<Response> {
        let thresholds = &self.controller.config().thresholds;
        let mut lines = Vec::new();
        match self.last.report {
            Some(report) => lines.push(Response::report(&report)),
            None => lines.push(Response::plain("no ticks run yet")),
        }
        lines.push(Response::plain(format!(
            "thresholds lvc={}/{} shunt={}/{} hvc={}/{} settle={} recent={}",
            thresholds.low_engage,
            thresholds.low_disengage,
            thresholds.shunt_disengage,
            thresholds.shunt_engage,
            thresholds.high_disengage,
            thresholds.high_engage,
            self.controller.config().settle_ticks,
            self.controller.config().recent_cutoff_ticks,
        )));
        lines
    }

    fn history(&self) -> Vec<Response> {
        if self.telemetry.is_empty() {
            return vec![Response::plain("no transitions recorded")];
        }
        self.telemetry
            .oldest_first()
            .map(|record| Response::plain(describe_record(record)))
            .collect()
    }

    fn log(&mut self, elapsed: Duration, role: TranscriptRole, line: &str) -> io::Result<()> {
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(elapsed, role, line),
            None => Ok(()),
        }
    }
}

fn help(topic: Option<&str>) -> Vec<Response> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push(Response::plain(*detail));
            } else {
                lines.push(Response::plain(format!("No help available for `{target}`.")));
                lines.push(Response::plain(format!(
                    "Available topics: {}",
                    help_topic_list()
                )));
            }
        }
        None => {
            lines.push(Response::plain("Available commands:"));
            for (_, detail) in HELP_TOPICS {
                lines.push(Response::plain(format!("  {detail}")));
            }
            lines.push(Response::plain("  exit | quit                    - leave the emulator"));
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_record(record: &TelemetryRecord) -> String {
    format!(
        "#{} tick={} {} vcc={}mV",
        record.id, record.tick, record.event, record.filtered_mv
    )
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

pub struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    pub fn create(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(responses: &[Response]) -> Vec<&str> {
        responses.iter().map(|response| response.text.as_str()).collect()
    }

    #[test]
    fn bare_number_runs_one_tick() {
        let mut session = Session::new(None);
        let responses = session.handle_command("3200").expect("command");

        assert_eq!(responses.len(), 1);
        assert!(responses[0].text.starts_with("tick=1 vcc=3200mV raw=3200mV [cell n/a"));
        assert_eq!(responses[0].tone, Tone::Plain);
    }

    #[test]
    fn hold_commits_normal_and_reports_transition() {
        let mut session = Session::new(None);
        let responses = session.handle_command("hold 3300 6").expect("command");

        assert!(
            texts(&responses)
                .iter()
                .any(|line| line.contains("cell-state OK")),
            "expected a commit line in {responses:?}"
        );
        assert_eq!(session.controller().state(), CellState::Normal);
        assert!(session.board().loop_closed());
        assert_eq!(responses.last().map(|response| response.tone), Some(Tone::Healthy));
    }

    #[test]
    fn under_voltage_opens_the_loop_and_sleeps() {
        let mut session = Session::new(None);
        session.handle_command("hold 2800 8").expect("command");

        assert_eq!(session.controller().state(), CellState::UnderVoltageCutoff);
        assert!(!session.board().loop_closed());
        assert!(!session.board().shunt_engaged());
        assert_eq!(session.board().sleep_time(), Duration::from_secs(1));

        let outputs = session.handle_command("outputs").expect("command");
        assert!(outputs[0].text.starts_with("loop=open shunt=off"));
    }

    #[test]
    fn ramp_interpolates_endpoints() {
        assert_eq!(ramp_point(3_200, 2_800, 0, 5), 3_200);
        assert_eq!(ramp_point(3_200, 2_800, 2, 5), 3_000);
        assert_eq!(ramp_point(3_200, 2_800, 4, 5), 2_800);
        assert_eq!(ramp_point(3_000, 3_600, 0, 1), 3_600);

        let mut session = Session::new(None);
        let responses = session.handle_command("ramp 3200 3700 20").expect("command");
        assert!(texts(&responses).contains(&"ramped 3200mV to 3700mV for 20 ticks"));
        assert_eq!(session.controller().ticks(), 20);

        session.handle_command("hold 3700 8").expect("command");
        assert_eq!(session.controller().state(), CellState::OverVoltageCutoff);
    }

    #[test]
    fn parse_errors_are_reported_not_fatal() {
        let mut session = Session::new(None);

        let responses = session.handle_command("hold 3300").expect("command");
        assert_eq!(texts(&responses), ["ERR missing argument <ticks>"]);

        let responses = session.handle_command("hold 3300 0").expect("command");
        assert_eq!(
            texts(&responses),
            ["ERR `0` is not a tick count (1-100000)"]
        );

        let responses = session.handle_command("sample 70000").expect("command");
        assert_eq!(responses[0].tone, Tone::Alarm);

        let responses = session.handle_command("status now").expect("command");
        assert_eq!(texts(&responses), ["ERR unexpected argument `now`"]);

        let responses = session.handle_command("reboot").expect("command");
        assert!(responses[0].text.contains("unknown command `reboot`"));
    }

    #[test]
    fn millivolt_suffix_is_accepted_with_and_without_sample() {
        assert_eq!(parse_command("3200mV"), Ok(Command::Sample(3_200)));
        assert_eq!(parse_command("sample 3200mV"), Ok(Command::Sample(3_200)));
        assert_eq!(parse_command("SAMPLE 3200"), Ok(Command::Sample(3_200)));
        assert_eq!(
            parse_command("ramp 3200mV 2800 5"),
            Ok(Command::Ramp(3_200, 2_800, 5))
        );

        let mut session = Session::new(None);
        let bare = session.handle_command("3200mV").expect("command");
        assert!(bare[0].text.starts_with("tick=1 vcc=3200mV"));
        let keyed = session.handle_command("sample 3200mV").expect("command");
        assert!(keyed[0].text.starts_with("tick=2 vcc=3200mV"));
    }

    #[test]
    fn grammar_errors_name_the_offending_word() {
        assert_eq!(
            parse_command("sample"),
            Err(CommandError::MissingArgument("mv"))
        );
        assert_eq!(
            parse_command("ramp 3200"),
            Err(CommandError::MissingArgument("to"))
        );
        assert_eq!(
            parse_command("70000"),
            Err(CommandError::InvalidMillivolts("70000".to_string()))
        );
        assert_eq!(
            parse_command("hold 3200x 5"),
            Err(CommandError::InvalidMillivolts("3200x".to_string()))
        );
        assert_eq!(
            parse_command("hold 3200 many"),
            Err(CommandError::InvalidTickCount("many".to_string()))
        );
        assert_eq!(
            parse_command("3200 3300"),
            Err(CommandError::UnexpectedArgument("3300".to_string()))
        );
        assert_eq!(
            parse_command("statusreport"),
            Err(CommandError::UnknownCommand("statusreport".to_string()))
        );
        assert_eq!(parse_command("help hold"), Ok(Command::Help(Some("hold"))));
        assert_eq!(parse_command("  history  "), Ok(Command::History));
    }

    #[test]
    fn history_lists_transitions_in_order() {
        let mut session = Session::new(None);
        assert_eq!(
            texts(&session.handle_command("history").expect("command")),
            ["no transitions recorded"]
        );

        session.handle_command("hold 3300 6").expect("command");
        session.handle_command("hold 2800 10").expect("command");

        let history = session.handle_command("history").expect("command");
        assert_eq!(history.len(), 2);
        assert!(history[0].text.starts_with("#0 tick=5 cell-state OK"));
        assert!(history[1].text.contains("cell-state LVC"));
    }

    #[test]
    fn help_lists_topics_and_unknown_topics() {
        let mut session = Session::new(None);
        let all = session.handle_command("help").expect("command");
        assert_eq!(all.len(), HELP_TOPICS.len() + 2);

        let unknown = session.handle_command("help reboot").expect("command");
        assert_eq!(unknown[0].text, "No help available for `reboot`.");
        assert!(unknown[1].text.contains("sample, hold, ramp"));
    }

    #[test]
    fn duty_statistics_accumulate_holds_and_sleeps() {
        let mut session = Session::new(None);
        session.handle_command("hold 3300 5").expect("command");
        assert_eq!(session.board().sleep_time(), Duration::from_secs(1));
        assert!(session.board().active_time() > Duration::from_secs(3));
        assert!(session.board().duty_percent() > 50.0);
    }
}
