//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config file used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG: &str = "etc/gripper_config.toml";

#[derive(Parser, Debug)]
#[command(name = "gripper", version, about = "Three-motor gripper controller")]
pub struct Cli {
    /// Path to config TOML (defaults to etc/gripper_config.toml, then built-in defaults)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print status, summary and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::Current
        } else {
            RtLock::None
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SwingArg {
    /// Count ±threshold crossings every tick
    Threshold,
    /// Compare angle deltas once per interval
    Periodic,
}

impl From<SwingArg> for gripper_config::SwingStrategy {
    fn from(s: SwingArg) -> Self {
        match s {
            SwingArg::Threshold => Self::Threshold,
            SwingArg::Periodic => Self::Periodic,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the controller until stopped (Ctrl-C or stop button)
    Run {
        /// Sample sensors on a background thread (overrides [runner] mode)
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "direct")]
        sampler: bool,
        /// Read sensors inside the control loop (overrides [runner] mode)
        #[arg(long, action = ArgAction::SetTrue)]
        direct: bool,
        /// Exit after this many control ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Override [swing] strategy
        #[arg(long, value_enum, value_name = "STRATEGY")]
        swing_strategy: Option<SwingArg>,
        /// Enable real-time mode (mlockall, SCHED_FIFO on Linux)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on supported OSes.\n\nLinux: locks memory per --rt-lock and switches to SCHED_FIFO. Usually needs CAP_SYS_NICE and CAP_IPC_LOCK (or root).\n\nmacOS: only memory locking is applied."
        )]
        rt: bool,
        /// SCHED_FIFO priority for --rt (Linux only); defaults to the maximum
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
    },
    /// Open the backends, read every sensor once and stop every motor
    SelfCheck,
    /// Declare the current motor positions to be the new zero references
    Rebase,
}
