//! GPIO stop button (Raspberry Pi header via `rppal`).

use std::sync::Mutex;

use rppal::gpio::Gpio;
use tracing::warn;

use crate::error::{HwError, Result};

/// Build a stop-button checker for `pin`.
///
/// With `active_low` the pin uses the internal pull-up and reads pressed when
/// pulled to ground. A poisoned pin lock reads as pressed.
pub fn make_stop_checker(pin: u8, active_low: bool) -> Result<Box<dyn Fn() -> bool + Send + Sync>> {
    let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    let pin = gpio.get(pin).map_err(|e| HwError::Gpio(e.to_string()))?;
    let input = if active_low {
        pin.into_input_pullup()
    } else {
        pin.into_input_pulldown()
    };
    let input = Mutex::new(input);
    Ok(Box::new(move || match input.lock() {
        Ok(p) => p.is_low() == active_low,
        Err(_) => {
            warn!("stop button lock poisoned; treating as pressed");
            true
        }
    }))
}
