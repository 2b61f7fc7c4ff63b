use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GripperError {
    #[error("actuator error: {0}")]
    Actuator(String),
    #[error("timeout waiting for actuator")]
    ActuatorTimeout,
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("timeout waiting for sensor")]
    SensorTimeout,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing sensors")]
    MissingSensors,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
