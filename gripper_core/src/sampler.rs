//! Background sensor sampling.
//!
//! Spawns a thread that owns the `Sensors`, publishes whole [`SensorSample`]
//! snapshots over a bounded channel (newest wins), and tracks the last-ok
//! timestamp for watchdog logic. The controller talks to the thread through
//! [`SampledSensors`], which implements `Sensors` from the latest snapshot and
//! forwards orientation calibration as a command, so the thread stays the
//! only writer to the hardware.
//!
//! Each `Sampler` spawns exactly one thread that is shut down and joined when
//! the `Sampler` is dropped.
use crossbeam_channel as xch;
use gripper_traits::{BoxError, Clock, ContactId, Sensors};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::GripperError;
use crate::sample::SensorSample;

/// How long `SampledSensors` waits on the thread for a calibration or a
/// first snapshot.
const PROXY_TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    CalibrateOrientation(xch::Sender<Result<(), String>>),
}

pub struct Sampler {
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Start sampling `sensors` at `hz`. Returns the thread handle and the
    /// proxy to hand to the controller.
    pub fn spawn<S, C>(mut sensors: S, hz: u32, clock: C) -> (Self, SampledSensors)
    where
        S: Sensors + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded::<SensorSample>(1);
        let (cmd_tx, cmd_rx) = xch::unbounded::<Command>();
        // The thread drains a stale snapshot itself before publishing, so it
        // notices a dropped proxy through the command channel instead.
        let stale_rx = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            'run: loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("Sampler thread received shutdown signal");
                    break;
                }

                loop {
                    match cmd_rx.try_recv() {
                        Ok(Command::CalibrateOrientation(reply)) => {
                            let res = sensors
                                .calibrate_orientation_zero()
                                .map_err(|e| e.to_string());
                            let _ = reply.send(res);
                        }
                        Err(xch::TryRecvError::Empty) => break,
                        Err(xch::TryRecvError::Disconnected) => {
                            tracing::debug!("Sampler consumer disconnected, exiting thread");
                            break 'run;
                        }
                    }
                }

                match SensorSample::read(&mut sensors, &clock) {
                    Ok(sample) => {
                        // Newest wins: drop the unread snapshot, if any.
                        let _ = stale_rx.try_recv();
                        let _ = tx.try_send(sample);
                        last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                    }
                    Err(e) => {
                        // No snapshot this round; the runner's stall watchdog decides.
                        tracing::debug!(error = %e, "sensor sample failed");
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("Sampler thread exiting cleanly");
        });

        let sampler = Self {
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        };
        let proxy = SampledSensors {
            rx,
            commands: cmd_tx,
            latest: None,
        };
        (sampler, proxy)
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Stall duration using this sampler's epoch and a real monotonic clock.
    pub fn stalled_for_now(&self) -> u64 {
        let ms = Instant::now()
            .saturating_duration_since(self.epoch)
            .as_millis();
        self.stalled_for(ms.min(u128::from(u64::MAX)) as u64)
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Exits between reads, or after the sensor read in flight completes.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("Sampler thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "Sampler thread panicked during shutdown");
                }
            }
        }
    }
}

/// Controller-side view of a [`Sampler`].
///
/// Reads answer from the newest snapshot seen so far, so every value used in
/// one tick comes from the same sample once [`SampledSensors::take_fresh`]
/// has been called for that tick.
pub struct SampledSensors {
    rx: xch::Receiver<SensorSample>,
    commands: xch::Sender<Command>,
    latest: Option<SensorSample>,
}

impl SampledSensors {
    /// The snapshot published since the last call, if any.
    pub fn take_fresh(&mut self) -> Option<SensorSample> {
        let fresh = self.rx.try_iter().last();
        if fresh.is_some() {
            self.latest = fresh;
        }
        fresh
    }

    fn current(&mut self) -> Result<SensorSample, BoxError> {
        self.take_fresh();
        if self.latest.is_none() {
            self.latest = self.rx.recv_timeout(PROXY_TIMEOUT).ok();
        }
        self.latest
            .ok_or_else(|| Box::new(GripperError::SensorTimeout) as BoxError)
    }
}

impl Sensors for SampledSensors {
    fn read_distance_cm(&mut self) -> Result<f64, BoxError> {
        Ok(self.current()?.distance_cm)
    }

    fn read_contact(&mut self, id: ContactId) -> Result<bool, BoxError> {
        let s = self.current()?;
        Ok(match id {
            ContactId::Palm => s.palm_pressed,
            ContactId::Side => s.side_pressed,
        })
    }

    fn read_orientation_deg(&mut self) -> Result<f64, BoxError> {
        Ok(self.current()?.orientation_deg)
    }

    fn calibrate_orientation_zero(&mut self) -> Result<(), BoxError> {
        let (reply_tx, reply_rx) = xch::bounded(1);
        self.commands
            .send(Command::CalibrateOrientation(reply_tx))
            .map_err(|_| GripperError::State("sampler thread is gone".into()))?;
        match reply_rx.recv_timeout(PROXY_TIMEOUT) {
            Ok(res) => res.map_err(|s| Box::new(GripperError::Sensor(s)) as BoxError)?,
            Err(_) => return Err(Box::new(GripperError::SensorTimeout)),
        }
        // Snapshots taken before the re-zero are stale now.
        self.latest = None;
        while self.rx.try_recv().is_ok() {}
        Ok(())
    }
}
