//! Sampler thread lifecycle: clean shutdown on drop, calibration forwarding,
//! and stall tracking when the sensors stop answering.

use std::error::Error;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::{Duration, Instant};

use gripper_core::GripperError;
use gripper_core::sampler::Sampler;
use gripper_traits::{ContactId, MonotonicClock, Sensors};

/// Constant readings; every read fails while `dead` is set.
#[derive(Clone, Default)]
struct FixedSensors {
    dead: Arc<AtomicBool>,
    calibrations: Arc<AtomicUsize>,
}

impl FixedSensors {
    fn check(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.dead.load(Ordering::Relaxed) {
            return Err(Box::new(GripperError::Sensor("no response".into())));
        }
        Ok(())
    }
}

impl Sensors for FixedSensors {
    fn read_distance_cm(&mut self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        self.check()?;
        Ok(12.5)
    }
    fn read_contact(&mut self, id: ContactId) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.check()?;
        Ok(id == ContactId::Palm)
    }
    fn read_orientation_deg(&mut self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        self.check()?;
        Ok(-3.0)
    }
    fn calibrate_orientation_zero(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calibrations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[test]
fn proxy_reads_come_from_one_snapshot() {
    let (sampler, mut proxy) = Sampler::spawn(FixedSensors::default(), 200, MonotonicClock::new());
    assert_eq!(proxy.read_distance_cm().unwrap(), 12.5);
    assert!(proxy.read_contact(ContactId::Palm).unwrap());
    assert!(!proxy.read_contact(ContactId::Side).unwrap());
    assert_eq!(proxy.read_orientation_deg().unwrap(), -3.0);
    drop(sampler);
}

#[test]
fn sampler_thread_exits_on_drop() {
    let (sampler, _proxy) = Sampler::spawn(FixedSensors::default(), 100, MonotonicClock::new());
    std::thread::sleep(Duration::from_millis(30));
    // Drop joins the thread; a leak would hang here.
    drop(sampler);
}

#[test]
fn multiple_samplers_dont_leak_threads() {
    for _ in 0..10 {
        let (sampler, mut proxy) =
            Sampler::spawn(FixedSensors::default(), 500, MonotonicClock::new());
        let _ = proxy.read_distance_cm();
        drop(sampler);
    }
}

#[test]
fn sampler_exits_when_proxy_is_dropped() {
    let (sampler, proxy) = Sampler::spawn(FixedSensors::default(), 500, MonotonicClock::new());
    drop(proxy);
    std::thread::sleep(Duration::from_millis(20));
    drop(sampler);
}

#[test]
fn calibration_is_forwarded_to_the_thread() {
    let sensors = FixedSensors::default();
    let calibrations = sensors.calibrations.clone();
    let (_sampler, mut proxy) = Sampler::spawn(sensors, 200, MonotonicClock::new());
    proxy.calibrate_orientation_zero().unwrap();
    proxy.calibrate_orientation_zero().unwrap();
    assert_eq!(calibrations.load(Ordering::Relaxed), 2);
    // A fresh snapshot follows the calibration.
    assert_eq!(proxy.read_orientation_deg().unwrap(), -3.0);
}

#[test]
fn take_fresh_yields_each_snapshot_once() {
    let (_sampler, mut proxy) = Sampler::spawn(FixedSensors::default(), 10, MonotonicClock::new());
    let deadline = Instant::now() + Duration::from_secs(2);
    let first = loop {
        if let Some(s) = proxy.take_fresh() {
            break s;
        }
        assert!(Instant::now() < deadline, "no snapshot within 2 s");
        std::thread::sleep(Duration::from_millis(1));
    };
    // 10 Hz: the next snapshot is ~100 ms away.
    assert!(proxy.take_fresh().is_none());
    assert_eq!(first.distance_cm, 12.5);
}

#[test]
fn stall_grows_while_reads_fail() {
    let sensors = FixedSensors::default();
    let dead = sensors.dead.clone();
    let (sampler, mut proxy) = Sampler::spawn(sensors, 200, MonotonicClock::new());
    proxy.read_distance_cm().unwrap();

    dead.store(true, Ordering::Relaxed);
    std::thread::sleep(Duration::from_millis(100));
    assert!(sampler.stalled_for_now() >= 50);

    dead.store(false, Ordering::Relaxed);
    std::thread::sleep(Duration::from_millis(50));
    assert!(sampler.stalled_for_now() < 50);
}

#[test]
fn reads_fail_once_the_thread_is_gone() {
    let sensors = FixedSensors::default();
    sensors.dead.store(true, Ordering::Relaxed);
    let (sampler, mut proxy) = Sampler::spawn(sensors, 200, MonotonicClock::new());
    drop(sampler);

    let err = proxy.read_distance_cm().expect_err("no snapshot was ever taken");
    assert_eq!(
        err.downcast_ref::<GripperError>(),
        Some(&GripperError::SensorTimeout)
    );
    assert!(proxy.calibrate_orientation_zero().is_err());
}
