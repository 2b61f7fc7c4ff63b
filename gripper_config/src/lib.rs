#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the gripper controller.
//!
//! `Config` and its tables are deserialized from TOML and validated once at
//! startup. Every table has defaults matching the stock hand, so an empty
//! file is a valid configuration.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ports {
    pub finger_a: String,
    pub finger_b: String,
    pub thumb: String,
    /// Ultrasonic distance sensor
    pub distance: String,
    pub palm: String,
    pub side: String,
    /// Gyro
    pub orientation: String,
    /// Optional GPIO pin wired to a stop button (BCM numbering)
    pub stop_button: Option<u8>,
    /// Treat low level on `stop_button` as pressed when true
    pub stop_active_low: bool,
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            finger_a: "outA".into(),
            finger_b: "outB".into(),
            thumb: "outC".into(),
            distance: "in1".into(),
            palm: "in2".into(),
            side: "in3".into(),
            orientation: "in4".into(),
            stop_button: None,
            stop_active_low: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraspCfg {
    pub finger_speed_percent: i8,
    /// Relative finger travel for a grasp (degrees; sign is direction)
    pub finger_degrees: i32,
    pub thumb_speed_percent: i8,
    pub thumb_degrees: i32,
    /// Pause after every grasp attempt before sensing again
    pub cooldown_ms: u64,
}

impl Default for GraspCfg {
    fn default() -> Self {
        Self {
            finger_speed_percent: 15,
            finger_degrees: -400,
            thumb_speed_percent: 5,
            thumb_degrees: 200,
            cooldown_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReleaseCfg {
    pub speed_percent: i8,
}

impl Default for ReleaseCfg {
    fn default() -> Self {
        Self { speed_percent: 15 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PresenceCfg {
    /// Object counts as present while distance < threshold_cm
    pub threshold_cm: f64,
    /// ...continuously for longer than this
    pub dwell_ms: u64,
}

impl Default for PresenceCfg {
    fn default() -> Self {
        Self {
            threshold_cm: 5.0,
            dwell_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SideButtonCfg {
    /// A click must be held strictly longer than this...
    pub short_min_ms: u64,
    /// ...and strictly shorter than this
    pub short_max_ms: u64,
    /// Holding at least this long triggers a motor rebase
    pub long_hold_ms: u64,
}

impl Default for SideButtonCfg {
    fn default() -> Self {
        Self {
            short_min_ms: 100,
            short_max_ms: 2000,
            long_hold_ms: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SwingStrategy {
    /// Count half-swings across ±threshold every tick
    #[default]
    Threshold,
    /// Compare angle deltas once per interval
    Periodic,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SwingCfg {
    pub strategy: SwingStrategy,
    pub threshold_deg: f64,
    pub target_count: u32,
    /// Sampling interval of the periodic strategy
    pub interval_ms: u64,
}

impl Default for SwingCfg {
    fn default() -> Self {
        Self {
            strategy: SwingStrategy::Threshold,
            threshold_deg: 85.0,
            target_count: 3,
            interval_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// Control loop period
    pub tick_ms: u64,
    /// Pause between detecting a release gesture and moving
    pub settle_ms: u64,
    /// Pause after re-zeroing the gyro following a gesture release
    pub calibration_ms: u64,
    /// Pause after zeroing the gyro at startup
    pub startup_calibration_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            settle_ms: 1500,
            calibration_ms: 3000,
            startup_calibration_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Longest a blocking motor move may take before it is stopped
    pub move_ms: u64,
    /// Sampler mode only: abort when no sensor snapshot arrived for this long (0 disables)
    pub sensor_stall_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            move_ms: 10_000,
            sensor_stall_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Read every sensor inside the control loop
    #[default]
    Direct,
    /// Background sampler thread publishes snapshots
    Sampler,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RunnerCfg {
    pub mode: RunMode,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Root of the ev3dev device classes
    pub sysfs_root: String,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sysfs_root: "/sys/class".into(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub ports: Ports,
    pub grasp: GraspCfg,
    pub release: ReleaseCfg,
    pub presence: PresenceCfg,
    pub side_button: SideButtonCfg,
    pub swing: SwingCfg,
    pub timing: TimingCfg,
    pub timeouts: Timeouts,
    pub runner: RunnerCfg,
    pub hardware: Hardware,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn check_speed(name: &str, v: i8) -> eyre::Result<()> {
    if v == 0 || v.unsigned_abs() > 100 {
        eyre::bail!("{name} must be in -100..=100 and non-zero");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Ports
        let ports = [
            ("ports.finger_a", &self.ports.finger_a),
            ("ports.finger_b", &self.ports.finger_b),
            ("ports.thumb", &self.ports.thumb),
            ("ports.distance", &self.ports.distance),
            ("ports.palm", &self.ports.palm),
            ("ports.side", &self.ports.side),
            ("ports.orientation", &self.ports.orientation),
        ];
        for (i, (name, port)) in ports.iter().enumerate() {
            if port.trim().is_empty() {
                eyre::bail!("{name} must not be empty");
            }
            if let Some((other, _)) = ports[..i].iter().find(|(_, p)| p == port) {
                eyre::bail!("{name} and {other} both use port {port}");
            }
        }

        // Motion
        check_speed("grasp.finger_speed_percent", self.grasp.finger_speed_percent)?;
        check_speed("grasp.thumb_speed_percent", self.grasp.thumb_speed_percent)?;
        check_speed("release.speed_percent", self.release.speed_percent)?;
        if self.grasp.finger_degrees == 0 && self.grasp.thumb_degrees == 0 {
            eyre::bail!("grasp.finger_degrees and grasp.thumb_degrees cannot both be 0");
        }
        if self.grasp.cooldown_ms > 60_000 {
            eyre::bail!("grasp.cooldown_ms is unreasonably large (>60s)");
        }

        // Presence
        if !self.presence.threshold_cm.is_finite()
            || self.presence.threshold_cm <= 0.0
            || self.presence.threshold_cm > 255.0
        {
            eyre::bail!("presence.threshold_cm must be in (0.0, 255.0]");
        }
        if self.presence.dwell_ms > 60_000 {
            eyre::bail!("presence.dwell_ms is unreasonably large (>60s)");
        }

        // Side button
        let sb = &self.side_button;
        if sb.short_min_ms >= sb.short_max_ms {
            eyre::bail!("side_button.short_min_ms must be < side_button.short_max_ms");
        }
        if sb.short_max_ms > sb.long_hold_ms {
            eyre::bail!("side_button.short_max_ms must be <= side_button.long_hold_ms");
        }

        // Swing
        if !self.swing.threshold_deg.is_finite()
            || self.swing.threshold_deg <= 0.0
            || self.swing.threshold_deg >= 360.0
        {
            eyre::bail!("swing.threshold_deg must be in (0.0, 360.0)");
        }
        if self.swing.target_count == 0 {
            eyre::bail!("swing.target_count must be >= 1");
        }
        if self.swing.strategy == SwingStrategy::Periodic && self.swing.interval_ms == 0 {
            eyre::bail!("swing.interval_ms must be >= 1 for the periodic strategy");
        }

        // Timing
        if self.timing.tick_ms == 0 || self.timing.tick_ms > 1000 {
            eyre::bail!("timing.tick_ms must be in 1..=1000");
        }
        for (name, v) in [
            ("timing.settle_ms", self.timing.settle_ms),
            ("timing.calibration_ms", self.timing.calibration_ms),
            ("timing.startup_calibration_ms", self.timing.startup_calibration_ms),
        ] {
            if v > 60_000 {
                eyre::bail!("{name} is unreasonably large (>60s)");
            }
        }

        // Timeouts
        if self.timeouts.move_ms == 0 {
            eyre::bail!("timeouts.move_ms must be >= 1");
        }
        if self.runner.mode == RunMode::Sampler
            && self.timeouts.sensor_stall_ms != 0
            && self.timeouts.sensor_stall_ms < 2 * self.timing.tick_ms
        {
            eyre::bail!("timeouts.sensor_stall_ms must span at least two ticks (or be 0)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_valid_and_matches_stock_hand() {
        let cfg = load_toml("").expect("parse");
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.grasp.finger_degrees, -400);
        assert_eq!(cfg.presence.dwell_ms, 2000);
        assert_eq!(cfg.swing.strategy, SwingStrategy::Threshold);
        assert_eq!(cfg.runner.mode, RunMode::Direct);
    }

    #[test]
    fn strategy_names_are_lowercase() {
        let cfg = load_toml("[swing]\nstrategy = \"periodic\"\n").expect("parse");
        assert_eq!(cfg.swing.strategy, SwingStrategy::Periodic);
        assert!(load_toml("[swing]\nstrategy = \"Periodic\"\n").is_err());
    }
}
