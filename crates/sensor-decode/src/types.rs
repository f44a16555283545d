use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Sensor subsystems of the tag, one register layout each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Humidity,
    IrTemperature,
    Barometer,
    NineAxis,
    Optical,
}

impl SensorKind {
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Humidity,
        SensorKind::IrTemperature,
        SensorKind::Barometer,
        SensorKind::NineAxis,
        SensorKind::Optical,
    ];

    /// Exact size of the data register for this kind.
    pub const fn buffer_len(self) -> usize {
        match self {
            SensorKind::Humidity => 4,
            SensorKind::IrTemperature => 4,
            SensorKind::Barometer => 6,
            SensorKind::NineAxis => 18,
            SensorKind::Optical => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SensorKind::Humidity => "humidity",
            SensorKind::IrTemperature => "ir_temperature",
            SensorKind::Barometer => "barometer",
            SensorKind::NineAxis => "nine_axis",
            SensorKind::Optical => "optical",
        }
    }

    /// Field names accepted by [`SensorReading::field`] for this kind.
    pub const fn field_names(self) -> &'static [&'static str] {
        match self {
            SensorKind::Humidity => &["temperature_c", "relative_humidity_pct"],
            SensorKind::IrTemperature => &["object_temperature_c", "ambient_temperature_c"],
            SensorKind::Barometer => &["temperature_c", "pressure_hpa"],
            SensorKind::NineAxis => &[
                "gyro.x", "gyro.y", "gyro.z", "accel.x", "accel.y", "accel.z", "mag.x", "mag.y",
                "mag.z",
            ],
            SensorKind::Optical => &["illuminance_lux"],
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('-', "_");
        match norm.as_str() {
            "humidity" => Ok(SensorKind::Humidity),
            "ir_temperature" | "irtemperature" | "ir" => Ok(SensorKind::IrTemperature),
            "barometer" | "pressure" => Ok(SensorKind::Barometer),
            "nine_axis" | "9axis" | "motion" => Ok(SensorKind::NineAxis),
            "optical" | "light" => Ok(SensorKind::Optical),
            _ => Err(format!("unknown sensor kind: {s}")),
        }
    }
}

/// Three-axis sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    fn get(&self, axis: &str) -> Option<f64> {
        match axis {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct HumidityReading {
    pub temperature_c: f64,
    pub relative_humidity_pct: f64,
}

/// Thermopile reading.
///
/// Field assignment follows the tag utility this decoder was built against:
/// the object temperature comes from register bytes 0..2 and the ambient
/// temperature from bytes 2..4. Whether that matches the firmware's intent is
/// unconfirmed, so [`channel0`](Self::channel0) and [`channel1`](Self::channel1)
/// expose the same values by register position for callers that want to
/// assign meaning themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct IrTemperatureReading {
    pub object_temperature_c: f64,
    pub ambient_temperature_c: f64,
}

impl IrTemperatureReading {
    /// Value decoded from bytes 0..2.
    pub fn channel0(&self) -> f64 {
        self.object_temperature_c
    }

    /// Value decoded from bytes 2..4.
    pub fn channel1(&self) -> f64 {
        self.ambient_temperature_c
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct BarometerReading {
    pub temperature_c: f64,
    pub pressure_hpa: f64,
}

/// Gyro in deg/s, accelerometer in g, magnetometer as raw counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct NineAxisReading {
    pub gyro: Axes,
    pub accel: Axes,
    /// Uncalibrated; no scale factor applied.
    pub mag: Axes,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct OpticalReading {
    pub illuminance_lux: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorReading {
    Humidity(HumidityReading),
    IrTemperature(IrTemperatureReading),
    Barometer(BarometerReading),
    NineAxis(NineAxisReading),
    Optical(OpticalReading),
}

impl SensorReading {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::Humidity(_) => SensorKind::Humidity,
            SensorReading::IrTemperature(_) => SensorKind::IrTemperature,
            SensorReading::Barometer(_) => SensorKind::Barometer,
            SensorReading::NineAxis(_) => SensorKind::NineAxis,
            SensorReading::Optical(_) => SensorKind::Optical,
        }
    }

    /// Look up one scalar by name, e.g. `"pressure_hpa"` or `"accel.z"`.
    pub fn field(&self, name: &str) -> Option<f64> {
        match self {
            SensorReading::Humidity(r) => match name {
                "temperature_c" => Some(r.temperature_c),
                "relative_humidity_pct" => Some(r.relative_humidity_pct),
                _ => None,
            },
            SensorReading::IrTemperature(r) => match name {
                "object_temperature_c" => Some(r.object_temperature_c),
                "ambient_temperature_c" => Some(r.ambient_temperature_c),
                _ => None,
            },
            SensorReading::Barometer(r) => match name {
                "temperature_c" => Some(r.temperature_c),
                "pressure_hpa" => Some(r.pressure_hpa),
                _ => None,
            },
            SensorReading::NineAxis(r) => {
                let (group, axis) = name.split_once('.')?;
                match group {
                    "gyro" => r.gyro.get(axis),
                    "accel" => r.accel.get(axis),
                    "mag" => r.mag.get(axis),
                    _ => None,
                }
            }
            SensorReading::Optical(r) => match name {
                "illuminance_lux" => Some(r.illuminance_lux),
                _ => None,
            },
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorReading::Humidity(r) => write!(
                f,
                "{} % {} C",
                r.relative_humidity_pct, r.temperature_c
            ),
            SensorReading::IrTemperature(r) => write!(
                f,
                "{} C (object) {} C (ambient)",
                r.object_temperature_c, r.ambient_temperature_c
            ),
            SensorReading::Barometer(r) => {
                write!(f, "{} hPa {} C", r.pressure_hpa, r.temperature_c)
            }
            SensorReading::NineAxis(r) => write!(
                f,
                "gyro {} {} {} deg/s, accel {} {} {} G, mag {} {} {} uT",
                r.gyro.x, r.gyro.y, r.gyro.z, r.accel.x, r.accel.y, r.accel.z, r.mag.x, r.mag.y,
                r.mag.z
            ),
            SensorReading::Optical(r) => write!(f, "{} lx", r.illuminance_lux),
        }
    }
}
