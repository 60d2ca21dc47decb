use crate::battery::BatteryReading;
use crate::color::{Color, CENTER_DOT_COLOR, CHARGE_HIGHLIGHT_COLOR, NUMERAL_GLOW_ALPHA};
use crate::config::{Geometry, LOGICAL_SIZE};
use crate::error::{ClockError, Result};
use crate::state::RenderState;
use crate::time::ClockTime;

// ============================================================================
// GEOMETRY PRIMITIVES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle, `x`/`y` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

impl From<(f64, f64, f64, f64)> for Rect {
    fn from((x, y, width, height): (f64, f64, f64, f64)) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Screen rotation in degrees for a clock angle. Clock angles put zero at
/// twelve o'clock; screen rotations put zero along +x with y pointing down.
pub fn screen_rotation(clock_degrees: f64) -> f64 {
    clock_degrees - 90.0
}

/// Point at distance `r` from the origin in the direction of a clock angle.
pub fn polar(r: f64, clock_degrees: f64) -> Point {
    let rad = screen_rotation(clock_degrees).to_radians();
    Point::new(r * rad.cos(), r * rad.sin())
}

/// Maps logical coordinates onto the output: uniform scale, centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub origin: Point,
}

impl Transform {
    pub fn fit(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ClockError::EmptySurface { width, height });
        }
        Ok(Self {
            scale: width.min(height) as f64 / LOGICAL_SIZE,
            origin: Point::new(width as f64 / 2.0, height as f64 / 2.0),
        })
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.origin.x + p.x * self.scale, self.origin.y + p.y * self.scale)
    }

    pub fn length(&self, len: f64) -> f64 {
        len * self.scale
    }
}

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Flat,
    Round,
}

/// Minimal immediate-mode 2D canvas. Coordinates are logical; the painter owns
/// the mapping to its output. Arc angles are clock degrees, sweeping clockwise.
pub trait Painter {
    fn line(&mut self, from: Point, to: Point, width: f64, cap: LineCap, color: Color);
    fn arc(
        &mut self,
        center: Point,
        radius: f64,
        start: f64,
        sweep: f64,
        width: f64,
        cap: LineCap,
        color: Color,
    );
    /// `rect` is rotated by `rotation` screen degrees about the origin.
    fn rounded_rect(&mut self, rect: Rect, corner_radius: f64, rotation: f64, color: Color);
    fn fill_ellipse(&mut self, center: Point, rx: f64, ry: f64, color: Color);
    /// Text centered on `center`.
    fn text(&mut self, center: Point, text: &str, size: f64, color: Color);
}

/// What a frame is made of, which part of the face each command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Ticks,
    Numerals,
    Date,
    Battery,
    Hands,
    Hub,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line {
        from: Point,
        to: Point,
        width: f64,
        cap: LineCap,
    },
    Arc {
        center: Point,
        radius: f64,
        start: f64,
        sweep: f64,
        width: f64,
        cap: LineCap,
    },
    RoundedRect {
        rect: Rect,
        corner_radius: f64,
        rotation: f64,
    },
    Ellipse {
        center: Point,
        rx: f64,
        ry: f64,
    },
    Text {
        center: Point,
        text: String,
        size: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub layer: Layer,
    pub shape: Shape,
    pub color: Color,
}

/// Hand angles in clock degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    pub hour: f64,
    pub minute: f64,
    pub second: f64,
}

impl From<&ClockTime> for HandAngles {
    fn from(t: &ClockTime) -> Self {
        Self {
            hour: t.hour_angle(),
            minute: t.minute_angle(),
            second: t.second_angle(),
        }
    }
}

/// One fully laid-out frame.
#[derive(Debug, Clone)]
pub struct Scene {
    pub transform: Transform,
    pub hands: HandAngles,
    pub battery: BatteryReading,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    fn add(&mut self, layer: Layer, color: Color, shape: Shape) {
        self.commands.push(DrawCommand { layer, shape, color });
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(move |c| c.layer == layer)
    }

    /// Replay every command onto `painter`, in order.
    pub fn render(&self, painter: &mut dyn Painter) {
        for command in &self.commands {
            let color = command.color;
            match &command.shape {
                Shape::Line { from, to, width, cap } => painter.line(*from, *to, *width, *cap, color),
                Shape::Arc { center, radius, start, sweep, width, cap } => {
                    painter.arc(*center, *radius, *start, *sweep, *width, *cap, color)
                }
                Shape::RoundedRect { rect, corner_radius, rotation } => {
                    painter.rounded_rect(*rect, *corner_radius, *rotation, color)
                }
                Shape::Ellipse { center, rx, ry } => painter.fill_ellipse(*center, *rx, *ry, color),
                Shape::Text { center, text, size } => painter.text(*center, text, *size, color),
            }
        }
    }
}

// ============================================================================
// FRAME LAYOUT
// ============================================================================

/// Sweep of the battery foreground arc in degrees.
pub fn gauge_sweep(percent: f64, full_sweep: f64) -> f64 {
    let reading = BatteryReading { percent, plugged: false };
    full_sweep * reading.clamped_percent() / 100.0
}

/// Lay out one frame. Pure: reads the state, never changes it.
pub fn compute_frame(
    state: &RenderState,
    time: &ClockTime,
    battery: BatteryReading,
    size: (u32, u32),
    geometry: &Geometry,
) -> Result<Scene> {
    let transform = Transform::fit(size.0, size.1)?;
    let mut scene = Scene {
        transform,
        hands: HandAngles::from(time),
        battery,
        commands: Vec::new(),
    };

    if state.show_ticks {
        add_ticks(&mut scene, state, geometry);
    }
    add_numerals(&mut scene, state, geometry);
    scene.add(
        Layer::Date,
        state.colors.numeral,
        Shape::Text {
            center: Point::new(0.0, geometry.date_y),
            text: time.date_label(),
            size: geometry.date_font_size,
        },
    );
    if state.show_battery {
        add_battery(&mut scene, state, battery, geometry);
    }
    add_hands(&mut scene, state, geometry);
    scene.add(
        Layer::Hub,
        CENTER_DOT_COLOR,
        Shape::Ellipse {
            center: Point::ORIGIN,
            rx: geometry.hub_radius,
            ry: geometry.hub_radius,
        },
    );

    Ok(scene)
}

fn add_ticks(scene: &mut Scene, state: &RenderState, geometry: &Geometry) {
    let r = geometry.tick_radius;
    for i in 0..60 {
        let angle = i as f64 * 6.0;
        let length = if i % 5 == 0 {
            geometry.major_tick_length
        } else {
            geometry.minor_tick_length
        };
        scene.add(
            Layer::Ticks,
            state.colors.tick,
            Shape::Line {
                from: polar(r - length, angle),
                to: polar(r, angle),
                width: geometry.tick_width,
                cap: LineCap::Flat,
            },
        );
    }
}

fn add_numerals(scene: &mut Scene, state: &RenderState, geometry: &Geometry) {
    let color = state.colors.numeral;
    let glow = color.with_alpha(NUMERAL_GLOW_ALPHA);
    for ((angle, dx, dy), text) in geometry.numeral_nudges.iter().zip(["12", "3", "9"]) {
        let center = polar(geometry.numeral_distance, *angle).offset(*dx, *dy);
        // Glow first so the solid glyph lands on top of it.
        for (c, color) in [(center.offset(0.0, -geometry.numeral_glow_offset), glow), (center, color)] {
            scene.add(
                Layer::Numerals,
                color,
                Shape::Text {
                    center: c,
                    text: text.to_string(),
                    size: geometry.numeral_font_size,
                },
            );
        }
    }
}

fn add_battery(scene: &mut Scene, state: &RenderState, battery: BatteryReading, geometry: &Geometry) {
    let center = Point::new(0.0, geometry.battery_y);
    let radius = geometry.battery_radius;
    let thickness = geometry.battery_thickness;
    let start = geometry.battery_start_angle;

    scene.add(
        Layer::Battery,
        state.colors.battery_track,
        Shape::Arc {
            center,
            radius,
            start,
            sweep: geometry.battery_sweep,
            width: thickness,
            cap: LineCap::Flat,
        },
    );
    scene.add(
        Layer::Battery,
        state.colors.minute_hand,
        Shape::Arc {
            center,
            radius,
            start,
            sweep: gauge_sweep(battery.percent, geometry.battery_sweep),
            width: thickness + 1.0,
            cap: LineCap::Flat,
        },
    );
    if battery.plugged {
        scene.add(
            Layer::Battery,
            CHARGE_HIGHLIGHT_COLOR,
            Shape::Arc {
                center,
                radius,
                start: start + state.charge_phase().rem_euclid(360.0),
                sweep: geometry.charge_arc_span,
                width: thickness + 2.0,
                cap: LineCap::Round,
            },
        );
    }
    scene.add(
        Layer::Battery,
        state.colors.minute_hand,
        Shape::Text {
            center,
            text: format!("{}%", battery.clamped_percent().trunc() as i64),
            size: geometry.battery_font_size,
        },
    );
}

fn add_hands(scene: &mut Scene, state: &RenderState, geometry: &Geometry) {
    let hands = scene.hands;
    scene.add(
        Layer::Hands,
        state.colors.hour_hand,
        Shape::RoundedRect {
            rect: geometry.hour_hand.into(),
            corner_radius: geometry.hand_corner_radius,
            rotation: screen_rotation(hands.hour),
        },
    );
    scene.add(
        Layer::Hands,
        state.colors.minute_hand,
        Shape::RoundedRect {
            rect: geometry.minute_hand.into(),
            corner_radius: geometry.hand_corner_radius,
            rotation: screen_rotation(hands.minute),
        },
    );
    scene.add(
        Layer::Hands,
        state.colors.second_hand,
        Shape::Line {
            from: Point::ORIGIN,
            to: polar(geometry.second_hand_length, hands.second),
            width: geometry.second_hand_width,
            cap: LineCap::Round,
        },
    );
}
