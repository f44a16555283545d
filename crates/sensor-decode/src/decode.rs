use crate::{
    Axes, BarometerReading, DecodeError, HumidityReading, IrTemperatureReading, NineAxisReading,
    OpticalReading, Result, SensorKind, SensorReading,
};

/// Gyro counts per deg/s. Integer division, as the tag utility computed it.
pub const GYRO_SCALE: f64 = (65536 / 500) as f64;

/// Accelerometer counts per g at the ±8 g range.
pub const ACCEL_SCALE: f64 = 32768.0 / 8.0;

/// Decode any kind; the variant of the result always matches `kind`.
pub fn decode(kind: SensorKind, buf: &[u8]) -> Result<SensorReading> {
    Ok(match kind {
        SensorKind::Humidity => SensorReading::Humidity(decode_humidity(buf)?),
        SensorKind::IrTemperature => SensorReading::IrTemperature(decode_ir_temperature(buf)?),
        SensorKind::Barometer => SensorReading::Barometer(decode_barometer(buf)?),
        SensorKind::NineAxis => SensorReading::NineAxis(decode_nine_axis(buf)?),
        SensorKind::Optical => SensorReading::Optical(decode_optical(buf)?),
    })
}

// Humidity: temp u16 LE [0..2], humidity u16 LE [2..4]
pub fn decode_humidity(buf: &[u8]) -> Result<HumidityReading> {
    let raw: [u8; 4] = fixed(SensorKind::Humidity, buf)?;
    let raw_temp = u16::from_le_bytes([raw[0], raw[1]]);
    let raw_humi = u16::from_le_bytes([raw[2], raw[3]]);
    Ok(HumidityReading {
        temperature_c: round_to(f64::from(raw_temp) / 65536.0 * 165.0 - 40.0, 1),
        relative_humidity_pct: round_to(f64::from(raw_humi) / 65536.0 * 100.0, 1),
    })
}

// Thermopile: two u16 LE channels, 0.03125 C per LSB after dropping 2 bits
pub fn decode_ir_temperature(buf: &[u8]) -> Result<IrTemperatureReading> {
    let raw: [u8; 4] = fixed(SensorKind::IrTemperature, buf)?;
    let raw_obj = u16::from_le_bytes([raw[0], raw[1]]);
    let raw_amb = u16::from_le_bytes([raw[2], raw[3]]);
    Ok(IrTemperatureReading {
        object_temperature_c: thermopile_c(raw_obj),
        ambient_temperature_c: thermopile_c(raw_amb),
    })
}

// Barometer: temp u24 LE [0..3], pressure u24 LE [3..6], both in 1/100 units
pub fn decode_barometer(buf: &[u8]) -> Result<BarometerReading> {
    let raw: [u8; 6] = fixed(SensorKind::Barometer, buf)?;
    let raw_temp = u32::from_le_bytes([raw[0], raw[1], raw[2], 0]);
    let raw_baro = u32::from_le_bytes([raw[3], raw[4], raw[5], 0]);
    Ok(BarometerReading {
        temperature_c: round_to(f64::from(raw_temp) / 100.0, 1),
        pressure_hpa: round_to(f64::from(raw_baro) / 100.0, 1),
    })
}

/// Motion sensor: nine i16 LE words, gyro at 0/2/4, accel at 6/8/10, mag at
/// 12/14/16.
///
/// All three accelerometer axes are read as plain little-endian words at
/// their own offsets. The magnetometer is returned in raw counts.
pub fn decode_nine_axis(buf: &[u8]) -> Result<NineAxisReading> {
    let raw: [u8; 18] = fixed(SensorKind::NineAxis, buf)?;
    let word = |off: usize| f64::from(i16::from_le_bytes([raw[off], raw[off + 1]]));

    let gyro = Axes {
        x: round_to(word(0) / GYRO_SCALE, 2),
        y: round_to(word(2) / GYRO_SCALE, 2),
        z: round_to(word(4) / GYRO_SCALE, 2),
    };
    let accel = Axes {
        x: word(6) / ACCEL_SCALE,
        y: word(8) / ACCEL_SCALE,
        z: word(10) / ACCEL_SCALE,
    };
    let mag = Axes {
        x: word(12),
        y: word(14),
        z: word(16),
    };
    Ok(NineAxisReading { gyro, accel, mag })
}

// Light: 4-bit exponent, 12-bit mantissa, lux = m * 0.01 * 2^e
pub fn decode_optical(buf: &[u8]) -> Result<OpticalReading> {
    let raw: [u8; 2] = fixed(SensorKind::Optical, buf)?;
    let raw_lux = u16::from_le_bytes(raw);
    let mantissa = raw_lux & 0x0FFF;
    let exponent = (raw_lux >> 12) & 0x000F;
    Ok(OpticalReading {
        illuminance_lux: f64::from(mantissa) * (0.01 * 2f64.powi(i32::from(exponent))),
    })
}

fn thermopile_c(raw: u16) -> f64 {
    round_to(f64::from(raw) / 4.0 * 0.03125, 1)
}

fn fixed<const N: usize>(kind: SensorKind, buf: &[u8]) -> Result<[u8; N]> {
    <[u8; N]>::try_from(buf).map_err(|_| DecodeError::InvalidBufferLength {
        kind,
        expected: kind.buffer_len(),
        actual: buf.len(),
    })
}

// Round half away from zero to `digits` decimals. Ties are decided on the
// exact binary value of `x`; scaling by 10^digits first can round a value
// just below a tie up onto it.
fn round_to(x: f64, digits: u32) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7FF) as i32;
    let frac = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased == 0 {
        (frac, -1074)
    } else {
        (frac | (1u64 << 52), biased - 1075)
    };
    if exp >= 0 {
        return x;
    }

    // |x| * 10^digits == scaled / 2^shift, exactly
    let scale = 10u64.pow(digits);
    let scaled = u128::from(mantissa) * u128::from(scale);
    let shift = exp.unsigned_abs();
    let units = if shift >= 127 {
        0
    } else {
        let whole = scaled >> shift;
        let rem = scaled - (whole << shift);
        if rem >= 1u128 << (shift - 1) {
            whole + 1
        } else {
            whole
        }
    };
    let magnitude = units as f64 / scale as f64;
    if x.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}
