use sensor_decode::SensorReading;

/// Rising-edge threshold on one named reading field.
///
/// Fires once when the field goes above `threshold`, then stays quiet until
/// the field has dropped back to or below it. Readings that lack the field
/// leave the trigger untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTrigger {
    field: String,
    threshold: f64,
    armed: bool,
}

impl ThresholdTrigger {
    pub fn new(field: impl Into<String>, threshold: f64) -> Self {
        Self {
            field: field.into(),
            threshold,
            armed: true,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn observe(&mut self, reading: &SensorReading) -> bool {
        let Some(value) = reading.field(&self.field) else {
            return false;
        };
        if value > self.threshold {
            let fire = self.armed;
            self.armed = false;
            fire
        } else {
            self.armed = true;
            false
        }
    }
}
