//! sensor-decode: raw register buffers of a multi-sensor BLE tag to physical units
//!
//! Every function here is pure. Buffers must have exactly the length of the
//! sensor's register layout; anything else is an [`DecodeError::InvalidBufferLength`].

mod types;
pub use types::*;

mod error;
pub use error::{DecodeError, Result};

mod decode;
pub use decode::{
    decode, decode_barometer, decode_humidity, decode_ir_temperature, decode_nine_axis,
    decode_optical, ACCEL_SCALE, GYRO_SCALE,
};
