use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Wall-clock reading used for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
    pub day: u32,
    pub month: u32,
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl ClockTime {
    pub fn from_datetime<T: TimeZone>(dt: &DateTime<T>) -> Self {
        // Leap seconds show up as nanosecond >= 1e9; pin them to the last microsecond.
        let microsecond = (dt.nanosecond() / 1_000).min(999_999);
        Self {
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            microsecond,
            day: dt.day(),
            month: dt.month(),
        }
    }

    /// Convert an instant to the configured zone, or to local time when none is set.
    pub fn resolve(now: DateTime<Utc>, zone: Option<&Tz>) -> Self {
        match zone {
            Some(tz) => Self::from_datetime(&now.with_timezone(tz)),
            None => Self::from_datetime(&now.with_timezone(&Local)),
        }
    }

    /// Hour hand angle in clock degrees (0 = twelve o'clock, clockwise).
    pub fn hour_angle(&self) -> f64 {
        let hours = (self.hour % 12) as f64 + self.minute as f64 / 60.0 + self.second as f64 / 3600.0;
        30.0 * hours
    }

    pub fn minute_angle(&self) -> f64 {
        6.0 * (self.minute as f64 + self.second as f64 / 60.0)
    }

    /// Includes the sub-second fraction so the hand sweeps instead of ticking.
    pub fn second_angle(&self) -> f64 {
        6.0 * (self.second as f64 + self.microsecond as f64 / 1_000_000.0)
    }

    /// Day and abbreviated month, e.g. `24 Jun`.
    pub fn date_label(&self) -> String {
        let month = MONTHS
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("???");
        format!("{:02} {}", self.day, month)
    }
}
