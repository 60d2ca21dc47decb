use desk_clock::color::THEME_PRESETS;
use desk_clock::{Clock, ClockCommand, ClockConfig};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClockConfig::builder()
        .title("Theme cycle".to_string())
        .window_width(360)
        .window_height(360)
        .build();

    let clock = Clock::new(config);

    let (sender, receiver) = mpsc::channel();

    // Walk through the presets and zones from a second thread.
    thread::spawn(move || {
        let zones = [None, Some("UTC"), Some("Asia/Kolkata"), Some("America/New_York")];
        for step in 0.. {
            let commands = [
                ClockCommand::SetThemeColor(THEME_PRESETS[step % THEME_PRESETS.len()]),
                ClockCommand::SetTimezone(zones[step % zones.len()].map(str::to_string)),
                ClockCommand::SetShowTicks(step % 3 != 0),
            ];
            if commands.iter().any(|cmd| sender.send(cmd.clone()).is_err()) {
                break;
            }
            thread::sleep(Duration::from_secs(2));
        }
    });

    println!("Cycling themes and timezones every two seconds. Press Esc to exit.");
    clock.show_with_commands(receiver)?;
    Ok(())
}
