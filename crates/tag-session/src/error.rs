use gatt_transport::TransportError;
use sensor_decode::{DecodeError, SensorKind};
use thiserror::Error;

pub type Result<T, E = SessionError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("sink: {0}")]
    Sink(#[from] SinkError),
    #[error("cannot {op} while {state}")]
    InvalidState { op: &'static str, state: String },
    #[error("sensor {0} is not described by the profile")]
    SensorNotInProfile(SensorKind),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("timestamp formatting: {0}")]
    Timestamp(String),
}
