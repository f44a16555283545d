use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct SessionMetrics {
    pub registry: Registry,
    pub samples: IntCounter,
    pub decode_errors: IntCounter,
    pub uploads: IntCounter,
    pub sensors_enabled: IntGauge,
}

impl SessionMetrics {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let samples = IntCounter::new("tag_samples_total", "Total sensor samples decoded")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let decode_errors =
            IntCounter::new("tag_decode_errors_total", "Register reads that failed to decode")
                .map_err(|e| format!("metrics init error: {e}"))?;
        let uploads = IntCounter::new("tag_uploads_total", "Readings handed to the sink")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let sensors_enabled = IntGauge::new("tag_sensors_enabled", "Sensors currently enabled")
            .map_err(|e| format!("metrics init error: {e}"))?;
        for c in [&samples, &decode_errors, &uploads] {
            registry
                .register(Box::new(c.clone()))
                .map_err(|e| format!("metrics register error: {e}"))?;
        }
        registry
            .register(Box::new(sensors_enabled.clone()))
            .map_err(|e| format!("metrics register error: {e}"))?;
        Ok(Self {
            registry,
            samples,
            decode_errors,
            uploads,
            sensors_enabled,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
