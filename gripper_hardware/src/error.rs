use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("no device found on port {0}")]
    PortNotFound(String),
    #[error("unexpected value {value:?} in {}", path.display())]
    Attribute { path: PathBuf, value: String },
    #[error("motor move timeout")]
    MoveTimeout,
    #[error("simulated fault: {0}")]
    Simulated(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
