use core::fmt;
use core::str::FromStr;

use crate::TransportError;

/// 16-bit ATT attribute handle
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle(u16);

impl Handle {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Parse `0x2c` style hex or plain decimal. Handle 0 is reserved by ATT.
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        let val = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            u16::from_str_radix(hex, 16).ok()?
        } else {
            t.parse::<u16>().ok()?
        };
        if val == 0 {
            None
        } else {
            Some(Self(val))
        }
    }

    pub fn raw(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{raw:04X}", raw = self.0)
    }
}

/// 48-bit Bluetooth device address, most significant byte first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for DeviceAddress {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let mut out = [0u8; 6];
        let mut parts = t.split([':', '-']);
        for slot in out.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| TransportError::InvalidAddress(t.to_string()))?;
            if part.len() != 2 {
                return Err(TransportError::InvalidAddress(t.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| TransportError::InvalidAddress(t.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(TransportError::InvalidAddress(t.to_string()));
        }
        Ok(Self(out))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}
