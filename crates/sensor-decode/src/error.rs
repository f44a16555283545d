use crate::SensorKind;
use thiserror::Error;

pub type Result<T, E = DecodeError> = core::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid {kind} buffer length: expected {expected} bytes, got {actual}")]
    InvalidBufferLength {
        kind: SensorKind,
        expected: usize,
        actual: usize,
    },
}
