use thiserror::Error;

/// Errors surfaced by the clock core and its window shell.
#[derive(Debug, Error)]
pub enum ClockError {
    /// The zone identifier is not in the IANA database.
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    /// The output has no pixels to draw into; the frame is skipped.
    #[error("empty render surface ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    /// A color string could not be parsed.
    #[error("invalid color {0:?}, expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    /// A text command line that does not name a known action.
    #[error("unrecognized command {0:?}")]
    InvalidCommand(String),

    /// Reported by battery sources; the gauge falls back instead of failing.
    #[error("battery status unavailable: {0}")]
    Battery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error(transparent)]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Pixels(#[from] pixels::Error),
}

pub type Result<T> = std::result::Result<T, ClockError>;
