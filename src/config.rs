use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::color::Color;
use crate::state::{CHARGE_DECAY, CHARGE_STEP_DEGREES};

/// Side of the square logical space every shape is authored in.
pub const LOGICAL_SIZE: f64 = 400.0;

/// Placement and proportions of the clock face, in logical units.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub tick_radius: f64,
    pub major_tick_length: f64,
    pub minor_tick_length: f64,
    pub tick_width: f64,

    pub numeral_distance: f64,
    pub numeral_font_size: f64,
    pub numeral_glow_offset: f64,
    /// Per-numeral nudge so the glyphs sit visually centered: (angle, dx, dy).
    pub numeral_nudges: [(f64, f64, f64); 3],

    pub date_y: f64,
    pub date_font_size: f64,

    pub battery_y: f64,
    pub battery_radius: f64,
    pub battery_thickness: f64,
    /// Clock angle where the gauge starts (eight o'clock).
    pub battery_start_angle: f64,
    pub battery_sweep: f64,
    pub charge_arc_span: f64,
    pub battery_font_size: f64,

    /// Hand rectangles as (x, y, width, height) before rotation, pointing along +x.
    pub hour_hand: (f64, f64, f64, f64),
    pub minute_hand: (f64, f64, f64, f64),
    pub hand_corner_radius: f64,
    pub second_hand_length: f64,
    pub second_hand_width: f64,

    pub hub_radius: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            tick_radius: 184.0,
            major_tick_length: 12.0,
            minor_tick_length: 6.0,
            tick_width: 3.0,

            numeral_distance: 136.0,
            numeral_font_size: 122.0,
            numeral_glow_offset: 4.0,
            numeral_nudges: [(0.0, 0.0, 8.0), (90.0, -6.0, 0.0), (270.0, 6.0, 0.0)],

            date_y: -60.0,
            date_font_size: 27.0,

            battery_y: 110.0,
            battery_radius: 46.0,
            battery_thickness: 10.0,
            battery_start_angle: 240.0,
            battery_sweep: 240.0,
            charge_arc_span: 50.0,
            battery_font_size: 27.0,

            hour_hand: (-8.0, -9.0, 92.0, 18.0),
            minute_hand: (-7.0, -8.0, 145.0, 16.0),
            hand_corner_radius: 10.0,
            second_hand_length: 160.0,
            second_hand_width: 3.0,

            hub_radius: 8.0,
        }
    }
}

/// Font files tried in order when no font path is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\segoeuib.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

#[derive(Debug, Clone, Builder)]
pub struct ClockConfig {
    #[builder(default = "Desk Clock".to_string())]
    pub title: String,

    // Window configuration
    #[builder(default = 460)]
    pub window_width: u32,
    #[builder(default = 460)]
    pub window_height: u32,
    #[builder(default = 320)]
    pub min_window_size: u32,
    #[builder(default = false)]
    pub always_on_top: bool,
    #[builder(default = Duration::from_millis(40))]
    pub frame_interval: Duration,

    // Initial render state
    pub theme_color: Option<Color>,
    pub timezone: Option<String>,
    #[builder(default = true)]
    pub show_battery: bool,
    #[builder(default = true)]
    pub show_ticks: bool,

    // Charge animation
    #[builder(default = CHARGE_STEP_DEGREES)]
    pub charge_step_degrees: f64,
    #[builder(default = CHARGE_DECAY)]
    pub charge_decay: f64,

    // Battery polling
    #[builder(default = true)]
    pub poll_battery: bool,
    #[builder(default = Duration::from_secs(2))]
    pub battery_poll_interval: Duration,

    // Fonts
    pub font_path: Option<PathBuf>,

    #[builder(default)]
    pub geometry: Geometry,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
