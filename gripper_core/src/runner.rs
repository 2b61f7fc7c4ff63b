use crate::builder::build_gripper;
use crate::config::{GripperCfg, Timeouts};
use crate::core::GripperCore;
use crate::error::{GripperError, Result as CoreResult};
use crate::sampler::{SampledSensors, Sampler};
use crate::status::{Action, ControlStatus, HandState, Stats};
use gripper_traits::{Actuator, Clock, MonotonicClock, Sensors, StopSignal};
use std::time::Instant;

/// How sampling should be orchestrated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Read every sensor inside the control loop
    Direct,
    /// Background thread samples at the given Hz; the loop takes the latest snapshot
    Paced(u32),
}

/// Knobs for one controller run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: SamplingMode,
    pub timeouts: Timeouts,
    /// End the run after this many loop iterations (`None` runs until stopped).
    pub max_ticks: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Direct,
            timeouts: Timeouts::default(),
            max_ticks: None,
        }
    }
}

/// Why a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop signal was raised.
    Requested,
    /// `max_ticks` was reached.
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,
    pub final_state: HandState,
    pub stats: Stats,
}

/// Stall threshold in milliseconds: the configured window, but never less
/// than two sampling periods so a single missed sample cannot trip it.
#[inline]
fn compute_stall_threshold_ms(sensor_stall_ms: u64, period_ms: u64) -> u64 {
    sensor_stall_ms.max(period_ms.saturating_mul(2))
}

#[inline]
fn stalled_now(elapsed_ms: u64, stalled_ms: u64, threshold_ms: u64) -> bool {
    elapsed_ms >= threshold_ms && stalled_ms > threshold_ms
}

/// Run the controller until stopped, the tick limit, or a fatal sensor error.
///
/// Every motor is told to stop on every exit path. `on_action` sees each
/// actuator action as it happens, together with the hand state after it.
///
/// `SamplingMode::Paced` stamps samples with a real `MonotonicClock` on the
/// sampler thread, so it refuses an injected `clock`; use `Direct` for
/// virtual time.
pub fn run<A, S>(
    actuator: A,
    sensors: S,
    cfg: GripperCfg,
    stop_signal: Option<Box<dyn StopSignal>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    opts: RunOptions,
    on_action: impl FnMut(&Action, HandState),
) -> CoreResult<RunSummary>
where
    A: Actuator + 'static,
    S: Sensors + Send + 'static,
{
    match opts.mode {
        SamplingMode::Direct => run_direct(actuator, sensors, cfg, stop_signal, clock, opts, on_action),
        SamplingMode::Paced(_) if clock.is_some() => Err(eyre::Report::new(GripperError::Config(
            "paced sampling runs on the monotonic clock; a custom clock needs direct mode".into(),
        ))),
        SamplingMode::Paced(hz) => {
            run_with_sampler(actuator, sensors, cfg, stop_signal, clock, opts, hz, on_action)
        }
    }
}

fn report<A: Actuator, S: Sensors>(
    core: &GripperCore<A, S>,
    status: &ControlStatus,
    on_action: &mut impl FnMut(&Action, HandState),
) {
    if let ControlStatus::Running(actions) = status {
        for action in actions {
            on_action(action, core.state());
        }
    }
}

/// Stop the motors whatever `outcome` was, and fold a stop failure into it.
fn finish<A: Actuator, S: Sensors>(
    core: &mut GripperCore<A, S>,
    outcome: CoreResult<StopReason>,
) -> CoreResult<RunSummary> {
    let stopped = core.shutdown();
    let reason = match outcome {
        Ok(reason) => reason,
        Err(e) => {
            if let Err(stop_err) = stopped {
                tracing::warn!(error = %stop_err, "stop_all failed after run error");
            }
            tracing::error!(error = %e, "control loop aborted");
            return Err(e);
        }
    };
    stopped?;
    let summary = RunSummary {
        reason,
        final_state: core.state(),
        stats: core.stats(),
    };
    tracing::info!(
        reason = ?summary.reason,
        state = summary.final_state.as_str(),
        grasps = summary.stats.grasps,
        releases = summary.stats.releases,
        rebases = summary.stats.rebases,
        "run finished"
    );
    Ok(summary)
}

fn run_direct<A, S>(
    actuator: A,
    sensors: S,
    cfg: GripperCfg,
    stop_signal: Option<Box<dyn StopSignal>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    opts: RunOptions,
    mut on_action: impl FnMut(&Action, HandState),
) -> CoreResult<RunSummary>
where
    A: Actuator + 'static,
    S: Sensors + 'static,
{
    let mut core = build_gripper(actuator, sensors, cfg, stop_signal, clock)?;
    tracing::info!(mode = "direct", "control loop start");

    let outcome = (|| -> CoreResult<StopReason> {
        core.begin()?;
        let mut ticks = 0u64;
        loop {
            if opts.max_ticks.is_some_and(|max| ticks >= max) {
                return Ok(StopReason::TickLimit);
            }
            let status = core.step()?;
            ticks += 1;
            report(&core, &status, &mut on_action);
            if status == ControlStatus::Stopped {
                return Ok(StopReason::Requested);
            }
        }
    })();

    finish(&mut core, outcome)
}

#[allow(clippy::too_many_arguments)]
fn run_with_sampler<A, S>(
    actuator: A,
    sensors: S,
    cfg: GripperCfg,
    stop_signal: Option<Box<dyn StopSignal>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    opts: RunOptions,
    hz: u32,
    mut on_action: impl FnMut(&Action, HandState),
) -> CoreResult<RunSummary>
where
    A: Actuator + 'static,
    S: Sensors + Send + 'static,
{
    let period_ms = crate::util::period_ms(hz);
    let stall_threshold_ms = compute_stall_threshold_ms(opts.timeouts.sensor_stall_ms, period_ms);
    let tick = cfg.timing.tick();

    let (sampler, proxy) = Sampler::spawn(sensors, hz, MonotonicClock::new());
    let mut core: GripperCore<A, SampledSensors> =
        build_gripper(actuator, proxy, cfg, stop_signal, clock)?;
    tracing::info!(mode = "sampler", hz, stall_threshold_ms, "control loop start");

    let outcome = (|| -> CoreResult<StopReason> {
        core.begin()?;
        let start = Instant::now();
        let mut ticks = 0u64;
        loop {
            if opts.max_ticks.is_some_and(|max| ticks >= max) {
                return Ok(StopReason::TickLimit);
            }

            let elapsed_ms = start.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
            if opts.timeouts.sensor_stall_ms > 0
                && stalled_now(elapsed_ms, sampler.stalled_for_now(), stall_threshold_ms)
            {
                return Err(
                    eyre::Report::new(GripperError::SensorTimeout).wrap_err("sensor sampler stalled")
                );
            }

            let status = match core.sensors_mut().take_fresh() {
                Some(sample) => core.step_from_sample(sample)?,
                None if core.stop_requested() => {
                    if let Err(e) = core.shutdown() {
                        tracing::warn!(error = %e, "stop_all failed on stop request");
                    }
                    ControlStatus::Stopped
                }
                None => ControlStatus::Running(Vec::new()),
            };
            ticks += 1;
            report(&core, &status, &mut on_action);
            if status == ControlStatus::Stopped {
                return Ok(StopReason::Requested);
            }
            core.clock.sleep(tick);
        }
    })();

    let summary = finish(&mut core, outcome);
    drop(core);
    drop(sampler);
    summary
}
