use chrono_tz::Tz;
use tracing::{debug, info};

use crate::color::{Color, Palette};
use crate::error::{ClockError, Result};

pub const CHARGE_STEP_DEGREES: f64 = 6.0;
pub const CHARGE_DECAY: f64 = 0.9;

/// Rotating highlight on the battery ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeAnimation {
    phase: f64,
    step: f64,
    decay: f64,
}

impl Default for ChargeAnimation {
    fn default() -> Self {
        Self::new(CHARGE_STEP_DEGREES, CHARGE_DECAY)
    }
}

impl ChargeAnimation {
    pub fn new(step: f64, decay: f64) -> Self {
        let step = if step.is_finite() { step } else { CHARGE_STEP_DEGREES };
        let decay = if decay.is_finite() { decay.clamp(0.0, 1.0) } else { CHARGE_DECAY };
        Self { phase: 0.0, step, decay }
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn advance(&mut self, is_charging: bool) {
        self.phase = if is_charging {
            (self.phase + self.step).rem_euclid(360.0)
        } else {
            self.phase * self.decay
        };
    }
}

/// Everything the renderer reads that the user can change.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub colors: Palette,
    pub show_battery: bool,
    pub show_ticks: bool,
    timezone: Option<Tz>,
    charge: ChargeAnimation,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(ChargeAnimation::default())
    }
}

impl RenderState {
    pub fn new(charge: ChargeAnimation) -> Self {
        Self {
            colors: Palette::default(),
            show_battery: true,
            show_ticks: true,
            timezone: None,
            charge,
        }
    }

    pub fn set_theme_color(&mut self, base: Color) {
        self.colors = Palette::from_base(base);
        debug!(%base, "theme color applied");
    }

    pub fn reset_colors(&mut self) {
        self.colors = Palette::default();
    }

    /// Colors back to defaults and every element visible again.
    pub fn reset(&mut self) {
        self.reset_colors();
        self.show_battery = true;
        self.show_ticks = true;
    }

    /// Returns false and leaves the current zone in place when `name` does not resolve.
    pub fn set_timezone(&mut self, name: Option<&str>) -> bool {
        self.try_set_timezone(name).is_ok()
    }

    pub fn try_set_timezone(&mut self, name: Option<&str>) -> Result<()> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let Some(name) = name else {
            self.timezone = None;
            info!("timezone cleared, using local time");
            return Ok(());
        };
        let tz: Tz = name
            .parse()
            .map_err(|_| ClockError::UnknownTimezone(name.to_string()))?;
        self.timezone = Some(tz);
        info!(timezone = tz.name(), "timezone set");
        Ok(())
    }

    pub fn timezone(&self) -> Option<&Tz> {
        self.timezone.as_ref()
    }

    pub fn timezone_name(&self) -> Option<&'static str> {
        self.timezone.map(|tz| tz.name())
    }

    pub fn charge_phase(&self) -> f64 {
        self.charge.phase()
    }

    pub fn advance_charge_phase(&mut self, is_charging: bool) {
        self.charge.advance(is_charging);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_are_visible_and_local() {
        let state = RenderState::default();
        assert!(state.show_battery);
        assert!(state.show_ticks);
        assert!(state.timezone().is_none());
        assert_eq!(state.charge_phase(), 0.0);
        assert_eq!(state.colors, Palette::default());
    }

    #[test]
    fn unknown_timezone_keeps_previous_zone() {
        let mut state = RenderState::default();
        assert!(state.set_timezone(Some("Asia/Tokyo")));
        assert!(!state.set_timezone(Some("Not/AZone")));
        assert_eq!(state.timezone_name(), Some("Asia/Tokyo"));

        let err = state.try_set_timezone(Some("Not/AZone")).unwrap_err();
        assert!(matches!(err, ClockError::UnknownTimezone(ref n) if n == "Not/AZone"));
    }

    #[test]
    fn unknown_timezone_from_local_stays_local() {
        let mut state = RenderState::default();
        assert!(!state.set_timezone(Some("Not/AZone")));
        assert!(state.timezone().is_none());
    }

    #[test]
    fn utc_and_clearing() {
        let mut state = RenderState::default();
        assert!(state.set_timezone(Some("UTC")));
        assert_eq!(state.timezone(), Some(&Tz::UTC));
        assert!(state.set_timezone(None));
        assert!(state.timezone().is_none());
        assert!(state.set_timezone(Some("UTC")));
        assert!(state.set_timezone(Some("   ")));
        assert!(state.timezone().is_none());
    }

    #[test]
    fn reset_restores_colors_and_toggles_but_not_zone() {
        let mut state = RenderState::default();
        state.set_theme_color(Color::new(200, 30, 30));
        state.show_battery = false;
        state.show_ticks = false;
        state.set_timezone(Some("Europe/London"));
        state.reset();
        assert_eq!(state.colors, Palette::default());
        assert!(state.show_battery && state.show_ticks);
        assert_eq!(state.timezone_name(), Some("Europe/London"));
    }

    #[test]
    fn charging_wraps_at_full_turn() {
        let mut state = RenderState::default();
        for _ in 0..61 {
            state.advance_charge_phase(true);
        }
        assert!((state.charge_phase() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn decay_settles_below_epsilon() {
        let mut state = RenderState::default();
        for _ in 0..50 {
            state.advance_charge_phase(true);
        }
        let mut prev = state.charge_phase();
        let mut ticks = 0;
        while state.charge_phase() > 1e-3 {
            state.advance_charge_phase(false);
            assert!(state.charge_phase() <= prev);
            prev = state.charge_phase();
            ticks += 1;
            assert!(ticks < 200);
        }
    }

    #[test]
    fn configured_constants_are_used() {
        let mut anim = ChargeAnimation::new(10.0, 0.5);
        anim.advance(true);
        anim.advance(true);
        assert_eq!(anim.phase(), 20.0);
        anim.advance(false);
        assert_eq!(anim.phase(), 10.0);
    }

    proptest! {
        #[test]
        fn theme_then_reset_restores_defaults(r: u8, g: u8, b: u8, a: u8) {
            let mut state = RenderState::default();
            state.set_theme_color(Color::rgba(r, g, b, a));
            state.reset_colors();
            prop_assert_eq!(state.colors, Palette::default());
        }

        #[test]
        fn charging_n_ticks_adds_six_each(n in 0usize..500, start_ticks in 0usize..60) {
            let mut state = RenderState::default();
            for _ in 0..start_ticks {
                state.advance_charge_phase(true);
            }
            let p = state.charge_phase();
            for _ in 0..n {
                state.advance_charge_phase(true);
            }
            let expected = (p + 6.0 * n as f64).rem_euclid(360.0);
            let diff = (state.charge_phase() - expected).abs();
            prop_assert!(diff < 1e-6 || (360.0 - diff) < 1e-6);
        }

        #[test]
        fn decay_is_monotone(start_ticks in 0usize..60, n in 1usize..200) {
            let mut state = RenderState::default();
            for _ in 0..start_ticks {
                state.advance_charge_phase(true);
            }
            for _ in 0..n {
                let before = state.charge_phase();
                state.advance_charge_phase(false);
                prop_assert!(state.charge_phase().abs() <= before.abs());
                prop_assert!(state.charge_phase().is_finite());
            }
        }
    }
}
