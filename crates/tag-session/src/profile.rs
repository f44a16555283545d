use anyhow::{bail, Context};
use gatt_transport::Handle;
use sensor_decode::SensorKind;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Register map of one tag model: which handles enable and hold each sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagProfile {
    pub name: String,
    #[serde(default)]
    pub sensors: Vec<SensorRegisters>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRegisters {
    pub kind: SensorKind,
    #[serde(with = "handle_text")]
    pub enable: Handle,
    #[serde(with = "handle_text")]
    pub data: Handle,
    pub enable_payload: Vec<u8>,
    pub disable_payload: Vec<u8>,
    /// Settle time between enabling and the first valid sample.
    #[serde(default)]
    pub ready_delay_ms: u64,
}

impl SensorRegisters {
    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }
}

impl Default for TagProfile {
    /// TI CC2650 SensorTag handle layout.
    fn default() -> Self {
        let reg = |kind, enable, data, on: &[u8], off: &[u8], delay| SensorRegisters {
            kind,
            enable: Handle::new(enable),
            data: Handle::new(data),
            enable_payload: on.to_vec(),
            disable_payload: off.to_vec(),
            ready_delay_ms: delay,
        };
        Self {
            name: "cc2650".to_string(),
            sensors: vec![
                reg(SensorKind::Humidity, 0x2F, 0x2C, &[0x01], &[0x00], 3000),
                reg(SensorKind::IrTemperature, 0x27, 0x24, &[0x01], &[0x00], 3000),
                reg(SensorKind::Barometer, 0x37, 0x34, &[0x01], &[0x00], 3000),
                reg(SensorKind::NineAxis, 0x3F, 0x3C, &[0x7F, 0x00], &[0x00, 0x00], 3000),
                reg(SensorKind::Optical, 0x47, 0x44, &[0x01], &[0x00], 0),
            ],
        }
    }
}

impl TagProfile {
    pub fn get(&self, kind: SensorKind) -> Option<&SensorRegisters> {
        self.sensors.iter().find(|s| s.kind == kind)
    }

    /// Same layout with every ready delay set to `delay_ms`.
    pub fn with_ready_delay_ms(mut self, delay_ms: u64) -> Self {
        for s in &mut self.sensors {
            s.ready_delay_ms = delay_ms;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for s in &self.sensors {
            if !seen.insert(s.kind) {
                bail!("{}: sensor {} listed more than once", self.name, s.kind);
            }
            if s.enable.raw() == 0 || s.data.raw() == 0 {
                bail!("{}: sensor {} uses reserved handle 0x0000", self.name, s.kind);
            }
            if s.enable == s.data {
                bail!(
                    "{}: sensor {} uses {} for both enable and data",
                    self.name,
                    s.kind,
                    s.data
                );
            }
            if s.enable_payload.is_empty() || s.disable_payload.is_empty() {
                bail!("{}: sensor {} has an empty payload", self.name, s.kind);
            }
        }
        Ok(())
    }
}

pub fn load_profile_file(path: impl AsRef<Path>) -> anyhow::Result<TagProfile> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading profile: {}", path.display()))?;
    let val: Value =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing yaml: {}", path.display()))?;
    let profile: TagProfile = serde_yaml::from_value(val)
        .with_context(|| format!("decoding profile: {}", path.display()))?;
    profile
        .validate()
        .with_context(|| format!("validating profile: {}", path.display()))?;
    Ok(profile)
}

mod handle_text {
    use gatt_transport::Handle;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(h: &Handle, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&h.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Handle, D::Error> {
        let s = String::deserialize(d)?;
        Handle::parse(&s).ok_or_else(|| de::Error::custom(format!("invalid handle: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name: bench-tag
sensors:
  - kind: optical
    enable: "0x47"
    data: "0x44"
    enable_payload: [1]
    disable_payload: [0]
  - kind: nine_axis
    enable: "63"
    data: "0x3c"
    enable_payload: [127, 0]
    disable_payload: [0, 0]
    ready_delay_ms: 250
"#;

    #[test]
    fn test_default_profile_is_valid() {
        let p = TagProfile::default();
        p.validate().unwrap();
        assert_eq!(p.sensors.len(), SensorKind::ALL.len());
        let hum = p.get(SensorKind::Humidity).unwrap();
        assert_eq!(hum.enable, Handle::new(0x2F));
        assert_eq!(hum.data, Handle::new(0x2C));
        let motion = p.get(SensorKind::NineAxis).unwrap();
        assert_eq!(motion.enable_payload, vec![0x7F, 0x00]);
        assert_eq!(p.get(SensorKind::Optical).unwrap().ready_delay(), Duration::ZERO);
    }

    #[test]
    fn test_parse_yaml_profile() {
        let p: TagProfile = serde_yaml::from_str(SAMPLE).unwrap();
        p.validate().unwrap();
        assert_eq!(p.name, "bench-tag");
        let motion = p.get(SensorKind::NineAxis).unwrap();
        assert_eq!(motion.enable, Handle::new(0x3F));
        assert_eq!(motion.data, Handle::new(0x3C));
        assert_eq!(motion.ready_delay(), Duration::from_millis(250));
        assert_eq!(p.get(SensorKind::Optical).unwrap().ready_delay_ms, 0);
        assert!(p.get(SensorKind::Humidity).is_none());
    }

    #[test]
    fn test_bad_handle_rejected() {
        let yaml = SAMPLE.replace("\"0x47\"", "\"0x0\"");
        let err = serde_yaml::from_str::<TagProfile>(&yaml).unwrap_err();
        assert!(err.to_string().contains("invalid handle"));
    }

    #[test]
    fn test_validate_rejects_duplicates_and_collisions() {
        let mut p = TagProfile::default();
        let first = p.sensors[0].clone();
        p.sensors.push(first);
        assert!(p.validate().is_err());

        let mut p = TagProfile::default();
        p.sensors[0].enable = p.sensors[0].data;
        assert!(p.validate().is_err());

        let mut p = TagProfile::default();
        p.sensors[1].disable_payload.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_handles() {
        let mut p = TagProfile::default();
        p.sensors[2].data = Handle::new(0);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("reserved handle"));

        let mut p = TagProfile::default();
        p.sensors[4].enable = Handle::new(0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip_keeps_handles_readable() {
        let text = serde_yaml::to_string(&TagProfile::default()).unwrap();
        assert!(text.contains("0x002F"));
        let back: TagProfile = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, TagProfile::default());
    }

    #[test]
    fn test_shipped_profile_matches_default() {
        let p: TagProfile =
            serde_yaml::from_str(include_str!("../../../configs/profiles/cc2650.yaml")).unwrap();
        assert_eq!(p, TagProfile::default());
    }

    #[test]
    fn test_load_profile_file() {
        let path = std::env::temp_dir().join(format!("tag-profile-{}.yaml", std::process::id()));
        fs::write(&path, SAMPLE).unwrap();
        let p = load_profile_file(&path).unwrap();
        assert_eq!(p.name, "bench-tag");
        fs::remove_file(&path).unwrap();

        let err = load_profile_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("reading profile"));
    }
}
