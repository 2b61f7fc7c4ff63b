//! Real-time scheduling helpers (Linux mlockall + SCHED_FIFO; macOS mlockall).

use crate::cli::RtLock;

#[cfg(unix)]
fn lock_memory(lock: RtLock) -> std::io::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    // SAFETY: mlockall only takes flags and touches no Rust-managed memory.
    let rc = unsafe { mlockall(flags) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn set_fifo_priority(prio: Option<i32>) -> std::io::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    // SAFETY: plain queries of the scheduler's priority range.
    let (min, max) = unsafe {
        (
            sched_get_priority_min(SCHED_FIFO),
            sched_get_priority_max(SCHED_FIFO),
        )
    };
    let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
    let param = sched_param {
        sched_priority: prio.unwrap_or(max).clamp(min, max),
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling process.
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(param.sched_priority)
}

/// Apply real-time settings once per process. Failures are logged, never fatal.
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();
    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        #[cfg(unix)]
        {
            match lock_memory(lock) {
                Ok(()) => tracing::info!(lock = ?lock, "rt: memory locked"),
                Err(e) => tracing::warn!(
                    lock = ?lock,
                    error = %e,
                    "rt: mlockall failed; needs CAP_IPC_LOCK (or root) and a sufficient 'ulimit -l'"
                ),
            }
        }

        #[cfg(target_os = "linux")]
        {
            match set_fifo_priority(prio) {
                Ok(p) => tracing::info!(prio = p, "rt: SCHED_FIFO enabled"),
                Err(e) => tracing::warn!(
                    error = %e,
                    "rt: sched_setscheduler failed; needs CAP_SYS_NICE or root"
                ),
            }
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = prio;
            tracing::warn!("rt: SCHED_FIFO is only available on Linux");
        }
        #[cfg(not(unix))]
        {
            let _ = lock;
        }
        tracing::debug!("rt: setup done");
    });
}
