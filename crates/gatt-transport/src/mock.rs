use crate::{DeviceAddress, GattDevice, Handle, Result, TransportError};
use std::collections::HashMap;
use tracing::debug;

/// A simple in-process mock tag. Each instance holds its own attribute table.
///
/// Writes overwrite the stored value at a handle and are also kept in an
/// ordered log so tests can assert on what a session sent.
pub struct MockTag {
    address: DeviceAddress,
    connected: bool,
    registers: HashMap<Handle, Vec<u8>>,
    writes: Vec<(Handle, Vec<u8>)>,
    fail_disconnect: bool,
}

impl MockTag {
    /// Seed (or replace) the value returned for `handle`.
    pub fn with_register(mut self, handle: Handle, data: &[u8]) -> Self {
        self.set_register(handle, data);
        self
    }

    pub fn set_register(&mut self, handle: Handle, data: &[u8]) {
        self.registers.insert(handle, data.to_vec());
    }

    /// Make `disconnect` fail with an I/O error and keep the link up.
    pub fn with_disconnect_failure(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    /// All writes in the order they were issued.
    pub fn writes(&self) -> &[(Handle, Vec<u8>)] {
        &self.writes
    }
}

impl GattDevice for MockTag {
    fn open(address: &DeviceAddress) -> Result<Self> {
        Ok(Self {
            address: *address,
            connected: false,
            registers: HashMap::new(),
            writes: Vec::new(),
            fail_disconnect: false,
        })
    }

    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        debug!(address = %self.address, "mock tag connected");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if self.fail_disconnect {
            return Err(TransportError::Io(format!(
                "{}: link did not close",
                self.address
            )));
        }
        self.connected = false;
        debug!(address = %self.address, "mock tag disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn write_register(&mut self, handle: Handle, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.registers.insert(handle, data.to_vec());
        self.writes.push((handle, data.to_vec()));
        Ok(())
    }

    fn read_register(&mut self, handle: Handle) -> Result<Vec<u8>> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.registers
            .get(&handle)
            .cloned()
            .ok_or(TransportError::UnknownHandle(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> DeviceAddress {
        DeviceAddress::new([0xB0, 0xB4, 0x48, 0xC9, 0x4A, 0x05])
    }

    #[test]
    fn test_requires_connection() {
        let mut tag = MockTag::open(&addr()).unwrap();
        assert!(!tag.is_connected());
        assert!(matches!(
            tag.read_register(Handle::new(0x2C)),
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            tag.write_register(Handle::new(0x2F), &[0x01]),
            Err(TransportError::NotConnected)
        ));
    }

    #[test]
    fn test_read_seeded_and_written() {
        let mut tag = MockTag::open(&addr())
            .unwrap()
            .with_register(Handle::new(0x2C), &[0x10, 0x20, 0x30, 0x40]);
        tag.connect().unwrap();
        assert_eq!(
            tag.read_register(Handle::new(0x2C)).unwrap(),
            vec![0x10, 0x20, 0x30, 0x40]
        );

        tag.write_register(Handle::new(0x2F), &[0x01]).unwrap();
        assert_eq!(tag.read_register(Handle::new(0x2F)).unwrap(), vec![0x01]);
        assert_eq!(tag.writes(), &[(Handle::new(0x2F), vec![0x01])]);

        assert!(matches!(
            tag.read_register(Handle::new(0x99)),
            Err(TransportError::UnknownHandle(h)) if h == Handle::new(0x99)
        ));

        tag.disconnect().unwrap();
        assert!(!tag.is_connected());
    }

    #[test]
    fn test_disconnect_failure_keeps_link() {
        let mut tag = MockTag::open(&addr()).unwrap().with_disconnect_failure();
        tag.connect().unwrap();
        let err = tag.disconnect().unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: B0:B4:48:C9:4A:05: link did not close");
        assert!(tag.is_connected());
    }
}
