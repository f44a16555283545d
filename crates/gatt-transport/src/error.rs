use crate::Handle;
use thiserror::Error;

pub type Result<T, E = TransportError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid device address: {0}")]
    InvalidAddress(String),
    #[error("device not connected")]
    NotConnected,
    #[error("no attribute at handle {0}")]
    UnknownHandle(Handle),
    #[error("I/O error: {0}")]
    Io(String),
}
