use crate::{DeviceAddress, Handle, Result};

/// A minimal blocking GATT peripheral interface.
pub trait GattDevice {
    /// Bind to a peripheral by address. Does not connect.
    fn open(address: &DeviceAddress) -> Result<Self>
    where
        Self: Sized;

    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Write raw bytes to the attribute at `handle`.
    fn write_register(&mut self, handle: Handle, data: &[u8]) -> Result<()>;

    /// Read the current value of the attribute at `handle`.
    fn read_register(&mut self, handle: Handle) -> Result<Vec<u8>>;
}
