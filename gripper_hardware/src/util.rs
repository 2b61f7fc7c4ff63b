use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `is_busy` until it reports false or `timeout` expires.
/// Sleeps `poll_interval` between polls to avoid CPU spinning; errors from the
/// probe are returned immediately.
pub fn wait_until_idle_with_timeout(
    mut is_busy: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while is_busy()? {
        if Instant::now() >= deadline {
            return Err(HwError::MoveTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}
