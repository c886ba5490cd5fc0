use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    for profile in TranscriptProfile::SCENARIOS {
        record_profile(profile)?;
        println!("wrote {}", profile.log_path().display());
    }
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::new(profile)?;
    for line in script(profile) {
        session.handle_command(line)?;
    }
    Ok(())
}

fn script(profile: TranscriptProfile) -> &'static [&'static str] {
    match profile {
        TranscriptProfile::Interactive => &[],
        TranscriptProfile::PowerOn => &["status", "1C", "status"],
        TranscriptProfile::Ramp => &[
            "1C", "1H", "1H", "1H", "1H", "1H", "1H", "1H", "1H", "1H", "1H", "status",
        ],
        TranscriptProfile::SimpleUi => &["3C", "history 2", "status"],
        TranscriptProfile::StrobeResume => &[
            "10H", "3H", "2C", "2C", "1C", "3H", "status", "history 4",
        ],
        TranscriptProfile::FactoryReset => &[
            "2C", "1C", "13H", "1C", "4C", "status", "wait 3s", "status",
        ],
        TranscriptProfile::Diagnostics => &[
            "10H",
            "3C",
            "wait 2500ms",
            "2C",
            "wait 1s",
            "status",
            "1C",
            "wait 2s",
            "help wait",
        ],
    }
}
