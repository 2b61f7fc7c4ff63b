//! Command bodies: config mapping, the control run, self-check and rebase.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use eyre::WrapErr;
use gripper_config::RunMode;
use gripper_core::runner::{RunOptions, RunSummary, SamplingMode, StopReason};
use gripper_core::{Action, GripperCfg, HandState, SensorSample, Timeouts};
use gripper_traits::{Clock, MonotonicClock};

use crate::cli::RtLock;
use crate::hw::{Backend, stop_button};
use crate::rt::setup_rt_once;

/// Options of the `run` subcommand after CLI parsing.
#[derive(Debug, Clone, Copy)]
pub struct RunArgs {
    pub sampler: bool,
    pub direct: bool,
    pub max_ticks: Option<u64>,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub rt_lock: Option<RtLock>,
}

fn reason_str(r: StopReason) -> &'static str {
    match r {
        StopReason::Requested => "requested",
        StopReason::TickLimit => "tick_limit",
    }
}

fn unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Pick the sampling mode: explicit flags, then `[runner] mode`.
///
/// Virtual time only advances when the control loop sleeps, so a sampler
/// thread would never see it move; those runs are always direct.
fn sampling_mode(cfg: &gripper_config::Config, args: &RunArgs, virtual_time: bool) -> SamplingMode {
    let wants_sampler = if args.sampler {
        true
    } else if args.direct {
        false
    } else {
        cfg.runner.mode == RunMode::Sampler
    };
    if wants_sampler && virtual_time {
        tracing::warn!("virtual clock in use; falling back to direct sampling");
        return SamplingMode::Direct;
    }
    if wants_sampler {
        SamplingMode::Paced(gripper_core::util::hz_for_tick_ms(cfg.timing.tick_ms))
    } else {
        SamplingMode::Direct
    }
}

fn print_status(json: bool, action: &Action, state: HandState) {
    let (trigger, ok) = match action {
        Action::Grasped { trigger } | Action::Released { trigger } => (Some(*trigger), true),
        Action::GraspFailed { trigger, .. } | Action::ReleaseFailed { trigger, .. } => {
            (Some(*trigger), false)
        }
        Action::Rebased => (None, true),
        Action::RebaseFailed { .. } => (None, false),
    };
    let event = match action {
        Action::Grasped { .. } | Action::GraspFailed { .. } => "grasp",
        Action::Released { .. } | Action::ReleaseFailed { .. } => "release",
        Action::Rebased | Action::RebaseFailed { .. } => "rebase",
    };
    if json {
        println!(
            "{}",
            serde_json::json!({
                "event": "status",
                "action": event,
                "ok": ok,
                "trigger": trigger.map(|t| t.as_str()),
                "state": state.as_str(),
            })
        );
    } else if !ok {
        println!("status: {} {event} failed", state.as_str());
    } else if let Some(t) = trigger {
        println!("status: {} trigger={}", state.as_str(), t.as_str());
    } else {
        println!("status: {} {event}", state.as_str());
    }
}

fn print_summary(json: bool, summary: &RunSummary, duration_ms: u128) {
    let s = &summary.stats;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "timestamp": unix_ms(),
                "reason": reason_str(summary.reason),
                "final_state": summary.final_state.as_str(),
                "ticks": s.ticks,
                "grasps": s.grasps,
                "grasp_failures": s.grasp_failures,
                "releases": s.releases,
                "release_failures": s.release_failures,
                "rebases": s.rebases,
                "duration_ms": duration_ms,
            })
        );
    } else {
        println!(
            "stopped ({}): state={} ticks={} grasps={} releases={} rebases={} failures={} duration_ms={duration_ms}",
            reason_str(summary.reason),
            summary.final_state.as_str(),
            s.ticks,
            s.grasps,
            s.releases,
            s.rebases,
            s.grasp_failures + s.release_failures,
        );
    }
}

/// Run the controller until Ctrl-C, the stop button, or `--max-ticks`.
pub fn run_controller(
    cfg: &gripper_config::Config,
    backend: Backend,
    args: RunArgs,
    shutdown: Arc<AtomicBool>,
    json: bool,
) -> eyre::Result<()> {
    setup_rt_once(
        args.rt,
        args.rt_prio,
        args.rt_lock.unwrap_or(RtLock::os_default()),
    );

    let mode = sampling_mode(cfg, &args, backend.virtual_time);
    let gripper_cfg = GripperCfg::from(cfg);
    let opts = RunOptions {
        mode,
        timeouts: Timeouts::from(&cfg.timeouts),
        max_ticks: args.max_ticks,
    };

    let button = stop_button(cfg);
    let stop = move || shutdown.load(Ordering::Relaxed) || button.as_ref().is_some_and(|b| b());

    tracing::info!(?mode, max_ticks = ?args.max_ticks, "starting controller");
    if json {
        println!(
            "{}",
            serde_json::json!({ "event": "status", "action": "start", "state": HandState::Open.as_str() })
        );
    } else {
        println!("status: {}", HandState::Open.as_str());
    }

    let started = Instant::now();
    let summary = gripper_core::runner::run(
        backend.actuator,
        backend.sensors,
        gripper_cfg,
        Some(Box::new(stop)),
        backend.clock,
        opts,
        |action, state| print_status(json, action, state),
    )?;
    print_summary(json, &summary, started.elapsed().as_millis());
    Ok(())
}

/// Read every sensor once and stop every motor.
pub fn self_check(cfg: &gripper_config::Config, mut backend: Backend, json: bool) -> eyre::Result<()> {
    let clock: Box<dyn Clock + Send + Sync> = backend
        .clock
        .take()
        .unwrap_or_else(|| Box::new(MonotonicClock::new()));
    let sample = SensorSample::read(&mut backend.sensors, &*clock).wrap_err("self-check")?;

    let mut hand = gripper_core::actuation::Hand::new(
        backend.actuator,
        (&cfg.grasp).into(),
        (&cfg.release).into(),
    );
    hand.stop_all().wrap_err("self-check")?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "event": "self_check",
                "distance_cm": sample.distance_cm,
                "palm": sample.palm_pressed,
                "side": sample.side_pressed,
                "orientation_deg": sample.orientation_deg,
                "ok": true,
            })
        );
    } else {
        println!(
            "distance_cm={:.1} palm={} side={} orientation_deg={:.1}",
            sample.distance_cm, sample.palm_pressed, sample.side_pressed, sample.orientation_deg
        );
        println!("self-check ok");
    }
    Ok(())
}

/// Declare the current motor positions to be the zero references.
pub fn rebase(cfg: &gripper_config::Config, backend: Backend, json: bool) -> eyre::Result<()> {
    let mut hand = gripper_core::actuation::Hand::new(
        backend.actuator,
        (&cfg.grasp).into(),
        (&cfg.release).into(),
    );
    let rebased = hand.reset_reference().map_err(eyre::Report::new);
    // Leave the motors stopped even when the rebase failed.
    let stopped = hand.stop_all();
    rebased.wrap_err("rebasing motors")?;
    stopped?;
    tracing::info!("motor references rebased");
    if json {
        println!("{}", serde_json::json!({ "event": "rebase", "ok": true }));
    } else {
        println!("rebased");
    }
    Ok(())
}
