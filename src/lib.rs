// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod battery;
pub mod color;
pub mod config;
pub mod error;
pub mod raster;
pub mod scene;
pub mod state;
pub mod time;

// External crate imports
use chrono::{DateTime, Utc};
use pixels::{PixelsBuilder, SurfaceTexture};
use tracing::{debug, info, warn};

// Standard library imports
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use std::time::Instant;

// Window management imports
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{ResizeDirection, Window, WindowBuilder, WindowLevel};

pub use battery::{BatteryMonitor, BatteryReading, BatterySource};
pub use color::{Color, Palette};
pub use config::{ClockConfig, Geometry};
pub use error::{ClockError, Result};
pub use scene::{compute_frame, Scene};
pub use state::{ChargeAnimation, RenderState};
pub use time::ClockTime;

use battery::NoBattery;
use color::THEME_PRESETS;
use raster::PixelCanvas;

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Zones the shell cycles through; `None` is local time.
pub const TIMEZONE_PRESETS: [Option<&str>; 6] = [
    None,
    Some("UTC"),
    Some("Asia/Kolkata"),
    Some("America/New_York"),
    Some("Europe/London"),
    Some("Asia/Tokyo"),
];

/// Command enum for type-safe clock updates
#[derive(Debug, Clone, PartialEq)]
pub enum ClockCommand {
    SetThemeColor(Color),
    ResetColors,
    /// Colors and visibility back to defaults.
    Reset,
    /// `None` switches back to local time.
    SetTimezone(Option<String>),
    SetShowBattery(bool),
    SetShowTicks(bool),
    ToggleBattery,
    ToggleTicks,
}

impl FromStr for ClockCommand {
    type Err = ClockError;

    /// Text form used on stdin: `tz Asia/Kolkata`, `tz local`, `theme #88c0d0`,
    /// `reset`, `reset colors`, `battery on|off|toggle`, `ticks on|off|toggle`.
    fn from_str(line: &str) -> Result<Self> {
        let invalid = || ClockError::InvalidCommand(line.trim().to_string());
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };
        let switch = |arg: &str, set: fn(bool) -> ClockCommand, toggle: ClockCommand| match arg {
            "on" => Ok(set(true)),
            "off" => Ok(set(false)),
            "" | "toggle" => Ok(toggle),
            _ => Err(invalid()),
        };
        match verb.to_ascii_lowercase().as_str() {
            "tz" | "timezone" => match arg {
                "" => Err(invalid()),
                a if a.eq_ignore_ascii_case("local") => Ok(ClockCommand::SetTimezone(None)),
                a => Ok(ClockCommand::SetTimezone(Some(a.to_string()))),
            },
            "theme" => Ok(ClockCommand::SetThemeColor(arg.parse()?)),
            "reset" => match arg {
                "" => Ok(ClockCommand::Reset),
                "colors" => Ok(ClockCommand::ResetColors),
                _ => Err(invalid()),
            },
            "battery" => switch(arg, ClockCommand::SetShowBattery, ClockCommand::ToggleBattery),
            "ticks" => switch(arg, ClockCommand::SetShowTicks, ClockCommand::ToggleTicks),
            _ => Err(invalid()),
        }
    }
}

/// The clock: render state, configuration and battery feed.
pub struct Clock {
    config: ClockConfig,
    state: RenderState,
    battery: BatteryMonitor,
}

impl Clock {
    /// Clock polling the platform battery in the background.
    pub fn new(config: ClockConfig) -> Self {
        let battery = if config.poll_battery {
            BatteryMonitor::spawn(battery::system_source(), config.battery_poll_interval)
        } else {
            BatteryMonitor::inline(Box::new(NoBattery))
        };
        Self::with_battery(config, battery)
    }

    pub fn with_battery(config: ClockConfig, battery: BatteryMonitor) -> Self {
        let mut state = RenderState::new(ChargeAnimation::new(
            config.charge_step_degrees,
            config.charge_decay,
        ));
        state.show_battery = config.show_battery;
        state.show_ticks = config.show_ticks;
        if let Some(base) = config.theme_color {
            state.set_theme_color(base);
        }
        if let Err(e) = state.try_set_timezone(config.timezone.as_deref()) {
            warn!(error = %e, "keeping local time");
        }
        Self { config, state, battery }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    /// Apply one command. Returns false only for a timezone that did not resolve.
    pub fn apply(&mut self, command: ClockCommand) -> bool {
        debug!(?command, "applying command");
        match command {
            ClockCommand::SetThemeColor(base) => self.state.set_theme_color(base),
            ClockCommand::ResetColors => self.state.reset_colors(),
            ClockCommand::Reset => self.state.reset(),
            ClockCommand::SetTimezone(name) => {
                return match self.state.try_set_timezone(name.as_deref()) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "timezone unchanged");
                        false
                    }
                };
            }
            ClockCommand::SetShowBattery(show) => self.state.show_battery = show,
            ClockCommand::SetShowTicks(show) => self.state.show_ticks = show,
            ClockCommand::ToggleBattery => self.state.show_battery = !self.state.show_battery,
            ClockCommand::ToggleTicks => self.state.show_ticks = !self.state.show_ticks,
        }
        true
    }

    /// Drain pending commands without blocking.
    pub fn apply_pending(&mut self, receiver: &Receiver<ClockCommand>) {
        while let Ok(command) = receiver.try_recv() {
            self.apply(command);
        }
    }

    /// One timer tick: resolve the time, read the battery, advance the charge
    /// animation and lay out the frame. A zero-sized output skips the tick
    /// without touching any state.
    pub fn tick(&mut self, now: DateTime<Utc>, size: (u32, u32)) -> Result<Scene> {
        scene::Transform::fit(size.0, size.1)?;
        let time = ClockTime::resolve(now, self.state.timezone());
        let battery = self.battery.latest();
        self.state.advance_charge_phase(battery.plugged);
        compute_frame(&self.state, &time, battery, size, &self.config.geometry)
    }

    pub fn show(self) -> Result<()> {
        self.run_window(None)
    }

    pub fn show_with_commands(self, receiver: Receiver<ClockCommand>) -> Result<()> {
        self.run_window(Some(receiver))
    }

    fn run_window(mut self, receiver: Option<Receiver<ClockCommand>>) -> Result<()> {
        let font = raster::load_font(self.config.font_path.as_deref());

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(
                self.config.window_width as f64,
                self.config.window_height as f64,
            ))
            .with_min_inner_size(LogicalSize::new(
                self.config.min_window_size as f64,
                self.config.min_window_size as f64,
            ))
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(true)
            .with_window_level(window_level(self.config.always_on_top))
            .build(&event_loop)?;

        let window = std::sync::Arc::new(window);
        let window_clone = window.clone();

        let size = window.inner_size();
        let mut fb_width = size.width;
        let mut fb_height = size.height;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = PixelsBuilder::new(size.width.max(1), size.height.max(1), surface_texture)
            .clear_color(pixels::wgpu::Color::TRANSPARENT)
            .build()?;

        let mut shell = Shell::new(self.config.always_on_top);
        let mut cursor: Option<PhysicalPosition<f64>> = None;
        let frame_interval = self.config.frame_interval;
        let mut last_frame = Instant::now();
        info!(width = fb_width, height = fb_height, "clock window open");

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::WaitUntil(last_frame + frame_interval));
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width;
                        fb_height = new_size.height;
                        if fb_width > 0 && fb_height > 0 {
                            let _ = pixels.resize_buffer(fb_width, fb_height);
                            let _ = pixels.resize_surface(fb_width, fb_height);
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = Some(position);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        cursor = None;
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let grip = cursor.is_some_and(|at| {
                            in_resize_grip(at, window_clone.inner_size(), window_clone.scale_factor())
                        });
                        let dragged = if grip {
                            window_clone.drag_resize_window(ResizeDirection::SouthEast)
                        } else {
                            window_clone.drag_window()
                        };
                        if let Err(e) = dragged {
                            debug!(error = %e, grip, "window drag not supported");
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        match shell.handle_key(&event, &mut self, &window_clone) {
                            KeyOutcome::Exit => window_target.exit(),
                            KeyOutcome::Redraw => window_clone.request_redraw(),
                            KeyOutcome::Handled | KeyOutcome::Ignored => {}
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(ref receiver) = receiver {
                            self.apply_pending(receiver);
                        }
                        match self.tick(Utc::now(), (fb_width, fb_height)) {
                            Ok(scene) => {
                                let frame = pixels.frame_mut();
                                let mut canvas = PixelCanvas::new(
                                    frame,
                                    fb_width as usize,
                                    fb_height as usize,
                                    scene.transform,
                                    font.as_ref(),
                                );
                                canvas.clear();
                                scene.render(&mut canvas);
                                if let Err(e) = pixels.render() {
                                    warn!(error = %e, "frame presentation failed");
                                }
                            }
                            Err(e) => debug!(error = %e, "frame skipped"),
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if last_frame.elapsed() >= frame_interval {
                        window_clone.request_redraw();
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

/// Side of the bottom-right square that resizes instead of moving the window.
const RESIZE_GRIP: f64 = 18.0;

/// Whether a physical cursor position falls in the bottom-right size grip.
fn in_resize_grip(cursor: PhysicalPosition<f64>, size: PhysicalSize<u32>, scale_factor: f64) -> bool {
    let grip = RESIZE_GRIP * scale_factor;
    let (w, h) = (size.width as f64, size.height as f64);
    (w - grip..=w).contains(&cursor.x) && (h - grip..=h).contains(&cursor.y)
}

fn window_level(always_on_top: bool) -> WindowLevel {
    if always_on_top {
        WindowLevel::AlwaysOnTop
    } else {
        WindowLevel::Normal
    }
}

// ============================================================================
// KEYBOARD SHELL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Exit,
    Redraw,
    /// Acted on the window itself; the frame is unchanged.
    Handled,
    Ignored,
}

/// Keyboard stand-in for the widget's menu.
struct Shell {
    theme_index: Option<usize>,
    timezone_index: usize,
    always_on_top: bool,
}

impl Shell {
    fn new(always_on_top: bool) -> Self {
        Self {
            theme_index: None,
            timezone_index: 0,
            always_on_top,
        }
    }

    /// Map a key to a clock command; window-level actions return `None`.
    fn command_for(&mut self, key: &str) -> Option<ClockCommand> {
        match key {
            "c" => {
                let next = self.theme_index.map_or(0, |i| (i + 1) % THEME_PRESETS.len());
                self.theme_index = Some(next);
                Some(ClockCommand::SetThemeColor(THEME_PRESETS[next]))
            }
            "r" => {
                self.theme_index = None;
                Some(ClockCommand::Reset)
            }
            "b" => Some(ClockCommand::ToggleBattery),
            "t" => Some(ClockCommand::ToggleTicks),
            "z" => {
                self.timezone_index = (self.timezone_index + 1) % TIMEZONE_PRESETS.len();
                Some(ClockCommand::SetTimezone(
                    TIMEZONE_PRESETS[self.timezone_index].map(str::to_string),
                ))
            }
            _ => None,
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, clock: &mut Clock, window: &Window) -> KeyOutcome {
        if event.state != ElementState::Pressed || event.repeat {
            return KeyOutcome::Ignored;
        }
        let key = match &event.logical_key {
            Key::Named(NamedKey::Escape) => return KeyOutcome::Exit,
            Key::Character(c) => c.to_lowercase(),
            _ => return KeyOutcome::Ignored,
        };
        let outcome = self.press(&key, clock);
        if outcome == KeyOutcome::Handled {
            window.set_window_level(window_level(self.always_on_top));
        }
        outcome
    }

    /// Act on a lowercased key. `Handled` means only the window level changed.
    fn press(&mut self, key: &str, clock: &mut Clock) -> KeyOutcome {
        match key {
            "q" => KeyOutcome::Exit,
            "a" => {
                self.always_on_top = !self.always_on_top;
                info!(always_on_top = self.always_on_top, "window level changed");
                KeyOutcome::Handled
            }
            other => match self.command_for(other) {
                Some(command) => {
                    clock.apply(command);
                    if key == "z" {
                        info!(
                            timezone = clock.state().timezone_name().unwrap_or("local"),
                            "timezone preset"
                        );
                    }
                    KeyOutcome::Redraw
                }
                None => KeyOutcome::Ignored,
            },
        }
    }
}
