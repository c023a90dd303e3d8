use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    for profile in TranscriptProfile::ALL {
        record_profile(profile)?;
        println!("recorded {}", profile.log_path());
    }
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::recording(profile)?;
    match profile {
        TranscriptProfile::Startup => record_startup(&mut session),
        TranscriptProfile::UnderVoltage => record_under_voltage(&mut session),
        TranscriptProfile::OverVoltage => record_over_voltage(&mut session),
        TranscriptProfile::Spike => record_spike(&mut session),
    }
}

fn record_startup(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("help")?;
    for _ in 0..6 {
        let _ = session.handle_command("3200")?;
    }
    let _ = session.handle_command("outputs")?;
    let _ = session.handle_command("status")?;
    Ok(())
}

fn record_under_voltage(session: &mut Session) -> io::Result<()> {
    for reading in [3200, 3200, 3200, 2850, 2850, 2850, 2850, 2850, 2850, 2850, 2850, 2850] {
        let _ = session.handle_command(&format!("sample {reading}"))?;
    }
    let _ = session.handle_command("outputs")?;
    let _ = session.handle_command("ramp 2850 3300 10")?;
    let _ = session.handle_command("hold 3300 5")?;
    let _ = session.handle_command("history")?;
    Ok(())
}

fn record_over_voltage(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("hold 3300 6")?;
    let _ = session.handle_command("hold 3501 10")?;
    let _ = session.handle_command("outputs")?;
    let _ = session.handle_command("hold 3700 10")?;
    let _ = session.handle_command("hold 3575 10")?;
    let _ = session.handle_command("hold 3540 8")?;
    let _ = session.handle_command("hold 3300 10")?;
    let _ = session.handle_command("history")?;
    Ok(())
}

fn record_spike(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("hold 3300 6")?;
    let _ = session.handle_command("4000")?;
    let _ = session.handle_command("hold 3300 6")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("history")?;
    Ok(())
}
