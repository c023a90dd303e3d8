mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use crossterm::style::{Stylize, style};
use session::{Response, Session, Tone, TranscriptLogger};

fn main() -> io::Result<()> {
    let transcript_path = parse_transcript_path().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: cell-emulator [--transcript <path>]");
        process::exit(2);
    });

    let transcript = match transcript_path {
        Some(path) => Some(TranscriptLogger::create(
            &path,
            "Cell emulator interactive transcript",
        )?),
        None => None,
    };

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(transcript);
    let mut line = String::new();

    writeln!(
        writer,
        "Cell Module Emulator ready. Enter a voltage in mV, `help` for commands, or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(
                writer,
                "Session closed after {} ticks ({:.1}% awake).",
                session.controller().ticks(),
                session.board().duty_percent()
            )?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            write_response(&mut writer, &response)?;
        }
    }

    Ok(())
}

fn write_response(writer: &mut impl Write, response: &Response) -> io::Result<()> {
    let text = response.text.as_str();
    match response.tone {
        Tone::Plain => writeln!(writer, "{text}"),
        Tone::Healthy => writeln!(writer, "{}", style(text).green()),
        Tone::Warning => writeln!(writer, "{}", style(text).yellow()),
        Tone::Alarm => writeln!(writer, "{}", style(text).red().bold()),
    }
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_transcript_path() -> Result<Option<PathBuf>, String> {
    let mut args = env::args().skip(1);
    let Some(arg) = args.next() else {
        return Ok(None);
    };

    let path = if let Some(value) = arg.strip_prefix("--transcript=") {
        PathBuf::from(value)
    } else if arg == "--transcript" {
        match args.next() {
            Some(value) => PathBuf::from(value),
            None => return Err("Expected value after --transcript".to_string()),
        }
    } else {
        return Err(format!("Unknown argument `{arg}`"));
    };

    match args.next() {
        Some(extra) => Err(format!("Unexpected argument `{extra}`")),
        None => Ok(Some(path)),
    }
}
