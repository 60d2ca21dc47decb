use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;

use clap::Parser;
use desk_clock::{Clock, ClockCommand, ClockConfig, Color};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Translucent analog desk clock with a battery ring.
///
/// Keys: C cycle theme, R reset, B battery ring, T ticks, Z timezone,
/// A always on top, Esc/Q quit. Drag with the left mouse button; the
/// bottom-right corner resizes. Lines on stdin such as `tz Asia/Kolkata`,
/// `tz local`, `theme #88c0d0` or `ticks off` change settings while running.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// IANA zone name, e.g. Asia/Kolkata. Local time when omitted.
    #[arg(long)]
    timezone: Option<String>,

    /// Base color the palette is derived from, as #RRGGBB.
    #[arg(long, value_parser = parse_color)]
    theme: Option<Color>,

    /// Initial window side in logical pixels.
    #[arg(long, default_value_t = 460)]
    size: u32,

    /// TrueType/OpenType font for numerals and labels.
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long)]
    no_battery: bool,

    #[arg(long)]
    no_ticks: bool,

    #[arg(long)]
    always_on_top: bool,
}

fn parse_color(s: &str) -> Result<Color, String> {
    s.parse().map_err(|e: desk_clock::ClockError| e.to_string())
}

/// Forward stdin lines to the clock until stdin closes or the window exits.
fn read_commands(sender: Sender<ClockCommand>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<ClockCommand>() {
            Ok(command) => {
                if sender.send(command).is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "ignoring stdin line"),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ClockConfig::builder()
        .window_width(args.size)
        .window_height(args.size)
        .maybe_timezone(args.timezone)
        .maybe_theme_color(args.theme)
        .maybe_font_path(args.font)
        .show_battery(!args.no_battery)
        .show_ticks(!args.no_ticks)
        .always_on_top(args.always_on_top)
        .build();

    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || read_commands(sender))?;

    Clock::new(config).show_with_commands(receiver)?;
    Ok(())
}
