use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use gripper_core::swing::{self, SwingStrategy};
use gripper_core::{GripperCfg, SensorSample, SwingCfg, SwingKind, build_gripper};
use gripper_hardware::{Scenario, SimulatedActuator, SimulatedSensors};
use gripper_traits::ManualClock;

const TICK: Duration = Duration::from_millis(50);

// Wrist angle trace: slow ±100° swing with jitter
fn synth_angles(n: usize, seed: u32) -> Vec<f64> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let t = i as f64 / 40.0;
            100.0 * t.sin() + (next_f64() * 2.0 - 1.0) * 5.0
        })
        .collect()
}

// Samples that walk the hand through presence, grasp, swing release, and clicks
fn synth_samples(n: usize, t0: Instant) -> Vec<SensorSample> {
    let angles = synth_angles(n, 0xC0FFEE);
    (0..n)
        .map(|i| SensorSample {
            distance_cm: if (i / 80) % 2 == 0 { 3.0 } else { 40.0 },
            palm_pressed: false,
            side_pressed: (i % 200) < 6,
            orientation_deg: angles[i],
            timestamp: t0 + TICK * i as u32,
        })
        .collect()
}

fn read_sample_size(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p gripper_core --bench tick
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }
}

pub fn bench_swing(c: &mut Criterion) {
    let mut g = c.benchmark_group("swing");
    read_sample_size(&mut g);

    let angles = synth_angles(10_000, 0xBEEF);
    let t0 = Instant::now();
    for kind in [SwingKind::Threshold, SwingKind::Periodic] {
        let cfg = SwingCfg {
            kind,
            ..SwingCfg::default()
        };
        g.bench_function(kind.as_str(), |b| {
            b.iter_batched(
                || swing::from_cfg(&cfg, 0.0, t0),
                |mut s: Box<dyn SwingStrategy>| {
                    let mut fired = 0u32;
                    for (i, &a) in angles.iter().enumerate() {
                        fired += u32::from(s.observe(black_box(a), t0 + TICK * i as u32));
                    }
                    black_box(fired);
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

pub fn bench_step_from_sample(c: &mut Criterion) {
    let mut g = c.benchmark_group("tick");
    read_sample_size(&mut g);

    let clock = ManualClock::new();
    let samples = synth_samples(4_000, clock.now());
    g.bench_function("step_from_sample", |b| {
        b.iter_batched(
            || {
                let sensors = SimulatedSensors::new(Scenario::Idle, Arc::new(clock.clone()));
                build_gripper(
                    SimulatedActuator::new(),
                    sensors,
                    GripperCfg::default(),
                    None,
                    Some(Box::new(clock.clone())),
                )
                .expect("build")
            },
            |mut core| {
                for s in &samples {
                    black_box(core.step_from_sample(*s).expect("step"));
                }
                core
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

criterion_group!(benches, bench_swing, bench_step_from_sample);
criterion_main!(benches);
