//! gatt-transport: register-level access to BLE sensor tags
//!
//! This crate provides the trait and types a sensor session needs to talk to a
//! peripheral by GATT handle. The radio stack itself lives outside the workspace;
//! the default build enables a `mock` backend so that binaries and tests run on
//! any host without a Bluetooth adapter.

mod types;
pub use types::{DeviceAddress, Handle};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::GattDevice;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockTag;
