use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ClockError, Result};

/// One battery status sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Charge in percent; not clamped here, the gauge clamps.
    pub percent: f64,
    pub plugged: bool,
}

impl BatteryReading {
    /// What the gauge shows when no battery can be read.
    pub const FALLBACK: Self = Self { percent: 100.0, plugged: false };

    pub fn clamped_percent(&self) -> f64 {
        if self.percent.is_finite() {
            self.percent.clamp(0.0, 100.0)
        } else {
            100.0
        }
    }
}

impl Default for BatteryReading {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Anything that can report battery status. `Ok(None)` means no battery is present.
pub trait BatterySource: Send {
    fn read(&mut self) -> Result<Option<BatteryReading>>;
}

/// Desktop without a battery.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBattery;

impl BatterySource for NoBattery {
    fn read(&mut self) -> Result<Option<BatteryReading>> {
        Ok(None)
    }
}

/// Always reports the same reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedBattery(pub BatteryReading);

impl BatterySource for FixedBattery {
    fn read(&mut self) -> Result<Option<BatteryReading>> {
        Ok(Some(self.0))
    }
}

// ============================================================================
// LINUX SYSFS
// ============================================================================

pub const SYSFS_POWER_SUPPLY: &str = "/sys/class/power_supply";

/// Reads `/sys/class/power_supply`. Capacity is averaged over the system
/// batteries (peripherals with `scope=Device` are ignored); the machine
/// counts as plugged when a mains/USB supply is online or a system battery
/// reports `Charging` or `Full`. A capacity that does not parse is an error.
#[derive(Debug, Clone)]
pub struct SysfsBattery {
    root: PathBuf,
}

impl Default for SysfsBattery {
    fn default() -> Self {
        Self::new(SYSFS_POWER_SUPPLY)
    }
}

impl SysfsBattery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn read_attr(dir: &Path, name: &str) -> Option<String> {
    fs::read_to_string(dir.join(name))
        .ok()
        .map(|s| s.trim().to_string())
}

impl BatterySource for SysfsBattery {
    fn read(&mut self) -> Result<Option<BatteryReading>> {
        let entries = fs::read_dir(&self.root)?;
        let mut capacities = Vec::new();
        let mut plugged = false;

        for entry in entries.flatten() {
            let dir = entry.path();
            match read_attr(&dir, "type").as_deref() {
                // Peripherals such as wireless mice report their own batteries.
                Some("Battery") if read_attr(&dir, "scope").as_deref() == Some("Device") => {
                    debug!(supply = %dir.display(), "skipping peripheral battery");
                }
                Some("Battery") => {
                    if let Some(raw) = read_attr(&dir, "capacity") {
                        let capacity = raw.parse::<f64>().map_err(|_| {
                            ClockError::Battery(format!("{}: bad capacity {raw:?}", dir.display()))
                        })?;
                        capacities.push(capacity);
                    }
                    if matches!(read_attr(&dir, "status").as_deref(), Some("Charging") | Some("Full")) {
                        plugged = true;
                    }
                }
                Some("Mains") | Some("USB") => {
                    if read_attr(&dir, "online").as_deref() == Some("1") {
                        plugged = true;
                    }
                }
                _ => {}
            }
        }

        if capacities.is_empty() {
            return Ok(None);
        }
        let percent = capacities.iter().sum::<f64>() / capacities.len() as f64;
        Ok(Some(BatteryReading { percent, plugged }))
    }
}

/// Battery source for the current platform.
pub fn system_source() -> Box<dyn BatterySource> {
    if cfg!(target_os = "linux") {
        Box::new(SysfsBattery::default())
    } else {
        Box::new(NoBattery)
    }
}

// ============================================================================
// MONITOR
// ============================================================================

enum Feed {
    Worker(Receiver<Option<BatteryReading>>),
    Inline(Box<dyn BatterySource>),
}

/// Hands the render loop a battery reading without ever blocking it.
///
/// In worker mode the source is polled on its own thread and the render side
/// only drains a channel, keeping the last value it saw. The worker exits the
/// next time it tries to send after the monitor is dropped.
pub struct BatteryMonitor {
    feed: Feed,
    last: Option<BatteryReading>,
}

impl BatteryMonitor {
    pub fn spawn(mut source: Box<dyn BatterySource>, interval: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("battery-poll".to_string())
            .spawn(move || loop {
                if sender.send(poll(source.as_mut())).is_err() {
                    break;
                }
                thread::sleep(interval);
            });
        if let Err(e) = spawned {
            warn!(error = %e, "could not start battery thread, gauge shows fallback");
        }
        Self { feed: Feed::Worker(receiver), last: None }
    }

    /// Poll the source directly on every call.
    pub fn inline(source: Box<dyn BatterySource>) -> Self {
        Self { feed: Feed::Inline(source), last: None }
    }

    /// Latest reading, or [`BatteryReading::FALLBACK`] when none is available.
    pub fn latest(&mut self) -> BatteryReading {
        match &mut self.feed {
            Feed::Worker(receiver) => loop {
                match receiver.try_recv() {
                    Ok(reading) => self.last = reading,
                    Err(_) => break,
                }
            },
            Feed::Inline(source) => self.last = poll(source.as_mut()),
        }
        self.last.unwrap_or(BatteryReading::FALLBACK)
    }
}

fn poll(source: &mut dyn BatterySource) -> Option<BatteryReading> {
    match source.read() {
        Ok(reading) => reading,
        Err(e) => {
            debug!(error = %e, "battery read failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct Failing;

    impl BatterySource for Failing {
        fn read(&mut self) -> Result<Option<BatteryReading>> {
            Err(ClockError::Battery("no acpi".into()))
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("desk-clock-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn supply(root: &Path, name: &str, attrs: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (k, v) in attrs {
            fs::write(dir.join(k), format!("{v}\n")).unwrap();
        }
    }

    #[test]
    fn fallback_when_missing_or_failing() {
        assert_eq!(BatteryMonitor::inline(Box::new(NoBattery)).latest(), BatteryReading::FALLBACK);
        assert_eq!(BatteryMonitor::inline(Box::new(Failing)).latest(), BatteryReading::FALLBACK);
    }

    #[test]
    fn clamps_out_of_range_percent() {
        assert_eq!(BatteryReading { percent: -5.0, plugged: false }.clamped_percent(), 0.0);
        assert_eq!(BatteryReading { percent: 150.0, plugged: false }.clamped_percent(), 100.0);
        assert_eq!(BatteryReading { percent: f64::NAN, plugged: false }.clamped_percent(), 100.0);
    }

    #[test]
    fn sysfs_reads_battery_and_mains() {
        let root = scratch_dir("sysfs");
        supply(&root, "BAT0", &[("type", "Battery"), ("capacity", "64"), ("status", "Discharging")]);
        supply(&root, "AC", &[("type", "Mains"), ("online", "1")]);
        let reading = SysfsBattery::new(&root).read().unwrap().unwrap();
        assert_eq!(reading, BatteryReading { percent: 64.0, plugged: true });
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn sysfs_averages_batteries_and_detects_charging() {
        let root = scratch_dir("sysfs-multi");
        supply(&root, "BAT0", &[("type", "Battery"), ("capacity", "40"), ("status", "Charging")]);
        supply(&root, "BAT1", &[("type", "Battery"), ("capacity", "80"), ("status", "Unknown")]);
        supply(&root, "AC", &[("type", "Mains"), ("online", "0")]);
        let reading = SysfsBattery::new(&root).read().unwrap().unwrap();
        assert_eq!(reading, BatteryReading { percent: 60.0, plugged: true });
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn sysfs_ignores_peripheral_batteries() {
        let root = scratch_dir("sysfs-peripheral");
        supply(&root, "BAT0", &[("type", "Battery"), ("capacity", "90"), ("status", "Discharging")]);
        supply(
            &root,
            "hidpp_battery_0",
            &[("type", "Battery"), ("scope", "Device"), ("capacity", "20"), ("status", "Charging")],
        );
        let reading = SysfsBattery::new(&root).read().unwrap().unwrap();
        assert_eq!(reading, BatteryReading { percent: 90.0, plugged: false });
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn sysfs_rejects_garbled_capacity() {
        let root = scratch_dir("sysfs-garbled");
        supply(&root, "BAT0", &[("type", "Battery"), ("capacity", "n/a"), ("status", "Discharging")]);
        let err = SysfsBattery::new(&root).read().unwrap_err();
        assert!(matches!(err, ClockError::Battery(_)));
        assert_eq!(BatteryMonitor::inline(Box::new(SysfsBattery::new(&root))).latest(), BatteryReading::FALLBACK);
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn sysfs_without_battery_is_none() {
        let root = scratch_dir("sysfs-desktop");
        supply(&root, "AC", &[("type", "Mains"), ("online", "1")]);
        assert_eq!(SysfsBattery::new(&root).read().unwrap(), None);
        fs::remove_dir_all(&root).unwrap();
        assert!(SysfsBattery::new(&root).read().is_err());
    }

    #[test]
    fn worker_delivers_readings() {
        let reading = BatteryReading { percent: 42.0, plugged: true };
        let mut monitor = BatteryMonitor::spawn(Box::new(FixedBattery(reading)), Duration::from_millis(5));
        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.latest() != reading {
            assert!(Instant::now() < deadline, "worker never reported");
            thread::sleep(Duration::from_millis(5));
        }
    }
}
