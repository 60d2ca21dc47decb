use std::fmt;
use std::str::FromStr;

use crate::error::ClockError;

/// RGBA color used for every clock element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn alpha_f32(self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Brighter color; `factor` is a percentage, so 150 means 50% brighter.
    ///
    /// Works in HSV: value is scaled, and whatever would overflow past full
    /// value is taken out of saturation instead, so very bright bases fade
    /// toward white rather than clipping.
    pub fn lighter(self, factor: u32) -> Self {
        if factor == 0 {
            return self;
        }
        if factor < 100 {
            return self.darker(10_000 / factor);
        }
        let (h, mut s, mut v) = rgb_to_hsv(self);
        v *= factor as f64 / 100.0;
        if v > 1.0 {
            s = (s - (v - 1.0)).max(0.0);
            v = 1.0;
        }
        hsv_to_rgb(h, s, v, self.a)
    }

    /// Darker color; `factor` is a percentage, so 300 means a third of the value.
    pub fn darker(self, factor: u32) -> Self {
        if factor == 0 {
            return self;
        }
        if factor < 100 {
            return self.lighter(10_000 / factor);
        }
        let (h, s, v) = rgb_to_hsv(self);
        hsv_to_rgb(h, s, v * 100.0 / factor as f64, self.a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xff {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || ClockError::InvalidColor(s.to_string());
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 0xff };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

/// Hue in degrees, saturation and value in [0, 1].
fn rgb_to_hsv(c: Color) -> (f64, f64, f64) {
    let (r, g, b) = (c.r as f64 / 255.0, c.g as f64 / 255.0, c.b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    (h, s, max)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64, a: u8) -> Color {
    let c = v * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let to_u8 = |ch: f64| ((ch + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::rgba(to_u8(r1), to_u8(g1), to_u8(b1), a)
}

// ============================================================================
// PALETTE
// ============================================================================

pub const CENTER_DOT_COLOR: Color = Color::new(240, 250, 255);
pub const CHARGE_HIGHLIGHT_COLOR: Color = Color::rgba(210, 245, 255, 180);
pub const NUMERAL_GLOW_ALPHA: u8 = 50;

const SECOND_HAND_ALPHA: u8 = 220;
const BATTERY_TRACK_ALPHA: u8 = 120;

/// The six themable color slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub numeral: Color,
    pub tick: Color,
    pub hour_hand: Color,
    pub minute_hand: Color,
    pub second_hand: Color,
    pub battery_track: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            numeral: Color::new(180, 215, 235),
            tick: Color::new(155, 185, 200),
            hour_hand: Color::new(135, 170, 190),
            minute_hand: Color::new(200, 225, 245),
            second_hand: Color::rgba(200, 240, 255, SECOND_HAND_ALPHA),
            battery_track: Color::rgba(95, 125, 145, BATTERY_TRACK_ALPHA),
        }
    }
}

impl Palette {
    /// Derive a full palette from a single base color. The base alpha carries
    /// into every slot except the second hand and battery track.
    pub fn from_base(base: Color) -> Self {
        Self {
            numeral: base.lighter(140),
            tick: base.darker(115),
            hour_hand: base.darker(140),
            minute_hand: base.lighter(110),
            second_hand: base.with_alpha(SECOND_HAND_ALPHA),
            battery_track: base.darker(160).with_alpha(BATTERY_TRACK_ALPHA),
        }
    }
}

/// Base colors the shell cycles through.
pub const THEME_PRESETS: [Color; 6] = [
    Color::new(0x88, 0xc0, 0xd0),
    Color::new(0xbf, 0x61, 0x6a),
    Color::new(0xa3, 0xbe, 0x8c),
    Color::new(0xeb, 0xcb, 0x8b),
    Color::new(0xb4, 0x8e, 0xad),
    Color::new(0xd8, 0xde, 0xe9),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#102030".parse::<Color>().unwrap(), Color::new(0x10, 0x20, 0x30));
        assert_eq!("aabbccdd".parse::<Color>().unwrap(), Color::rgba(0xaa, 0xbb, 0xcc, 0xdd));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
    }

    #[test]
    fn darker_halves_value() {
        let c = Color::new(200, 100, 50).darker(200);
        assert_eq!(c, Color::new(100, 50, 25));
    }

    #[test]
    fn lighter_scales_value_and_keeps_hue() {
        let c = Color::new(100, 50, 0).lighter(150);
        assert_eq!(c, Color::new(150, 75, 0));
    }

    #[test]
    fn lighter_overflow_desaturates() {
        let c = Color::new(255, 0, 0).lighter(150);
        assert_eq!(c.r, 255);
        assert!(c.g > 0 && c.g == c.b);
    }

    #[test]
    fn grey_stays_grey() {
        let c = Color::new(128, 128, 128).darker(160);
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
    }

    #[test]
    fn palette_from_base_uses_fixed_alphas() {
        let p = Palette::from_base(Color::rgba(10, 120, 200, 3));
        assert_eq!(p.second_hand, Color::rgba(10, 120, 200, 220));
        assert_eq!(p.battery_track.a, 120);
        assert_eq!(p.hour_hand, Color::new(10, 120, 200).darker(140).with_alpha(3));
    }

    #[test]
    fn palette_from_base_keeps_base_alpha() {
        let p = Palette::from_base(Color::rgba(90, 160, 210, 128));
        assert_eq!(p.numeral.a, 128);
        assert_eq!(p.tick.a, 128);
        assert_eq!(p.hour_hand.a, 128);
        assert_eq!(p.minute_hand.a, 128);
        assert_eq!(Palette::from_base(Color::new(90, 160, 210)).numeral.a, 255);
    }
}
