use crate::{Result, SensorRegisters, SessionError, SessionMetrics, TagProfile};
use core::fmt;
use gatt_transport::{GattDevice, TransportError};
use sensor_decode::{SensorKind, SensorReading};
use std::thread;
use tracing::{debug, info, warn};

/// Lifecycle of a tag connection. At most one sensor is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connected,
    /// Enable payload written; the sensor has not produced a sample yet.
    SensorEnabled(SensorKind),
    /// At least one sample read since the sensor was enabled.
    Sampling(SensorKind),
}

impl SessionState {
    pub fn active_sensor(&self) -> Option<SensorKind> {
        match *self {
            SessionState::SensorEnabled(k) | SessionState::Sampling(k) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Connected => f.write_str("connected"),
            SessionState::SensorEnabled(k) => write!(f, "{k} enabled"),
            SessionState::Sampling(k) => write!(f, "sampling {k}"),
        }
    }
}

pub struct TagSession<D: GattDevice> {
    device: D,
    profile: TagProfile,
    state: SessionState,
    metrics: Option<SessionMetrics>,
}

impl<D: GattDevice> TagSession<D> {
    pub fn new(device: D, profile: TagProfile) -> Self {
        Self {
            device,
            profile,
            state: SessionState::Idle,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SessionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn metrics(&self) -> Option<&SessionMetrics> {
        self.metrics.as_ref()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn connect(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("connect"));
        }
        self.device.connect()?;
        self.state = SessionState::Connected;
        info!("tag connected");
        Ok(())
    }

    /// Make `kind` the active sensor, disabling any other one first.
    pub fn enable(&mut self, kind: SensorKind) -> Result<()> {
        match self.state.active_sensor() {
            Some(active) if active == kind => return Ok(()),
            Some(_) => self.disable()?,
            None if self.state == SessionState::Idle => return Err(self.invalid("enable")),
            None => {}
        }
        let regs = self.registers(kind)?;
        self.device.write_register(regs.enable, &regs.enable_payload)?;
        self.state = SessionState::SensorEnabled(kind);
        if let Some(m) = &self.metrics {
            m.sensors_enabled.set(1);
        }
        debug!(sensor = %kind, handle = %regs.enable, "sensor enabled");
        Ok(())
    }

    /// Read and decode one sample of the active sensor. The first sample after
    /// enabling waits for the sensor's ready delay.
    pub fn sample(&mut self) -> Result<SensorReading> {
        let kind = match self.state {
            SessionState::SensorEnabled(k) | SessionState::Sampling(k) => k,
            _ => return Err(self.invalid("sample")),
        };
        if !self.device.is_connected() {
            warn!(sensor = %kind, "tag dropped the connection");
            self.state = SessionState::Idle;
            self.set_enabled_gauge(0);
            return Err(TransportError::NotConnected.into());
        }
        let regs = self.registers(kind)?;
        if let SessionState::SensorEnabled(_) = self.state {
            let delay = regs.ready_delay();
            if !delay.is_zero() {
                debug!(sensor = %kind, ?delay, "waiting for first sample");
                thread::sleep(delay);
            }
            self.state = SessionState::Sampling(kind);
        }
        let raw = self.device.read_register(regs.data)?;
        match sensor_decode::decode(kind, &raw) {
            Ok(reading) => {
                if let Some(m) = &self.metrics {
                    m.samples.inc();
                }
                debug!(sensor = %kind, %reading, "sample decoded");
                Ok(reading)
            }
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.decode_errors.inc();
                }
                Err(e.into())
            }
        }
    }

    /// Switch the active sensor off; the session stays connected.
    pub fn disable(&mut self) -> Result<()> {
        let kind = match self.state {
            SessionState::Connected => return Ok(()),
            SessionState::Idle => return Err(self.invalid("disable")),
            SessionState::SensorEnabled(k) | SessionState::Sampling(k) => k,
        };
        let regs = self.registers(kind)?;
        self.device
            .write_register(regs.enable, &regs.disable_payload)?;
        self.state = SessionState::Connected;
        self.set_enabled_gauge(0);
        debug!(sensor = %kind, "sensor disabled");
        Ok(())
    }

    /// Best-effort disable of the active sensor, then drop the link.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.state == SessionState::Idle {
            return Ok(());
        }
        if self.state.active_sensor().is_some() {
            if let Err(e) = self.disable() {
                warn!(error = %e, "failed to disable sensor before disconnect");
            }
        }
        self.device.disconnect()?;
        self.state = SessionState::Idle;
        self.set_enabled_gauge(0);
        info!("tag disconnected");
        Ok(())
    }

    fn registers(&self, kind: SensorKind) -> Result<SensorRegisters> {
        self.profile
            .get(kind)
            .cloned()
            .ok_or(SessionError::SensorNotInProfile(kind))
    }

    fn set_enabled_gauge(&self, v: i64) {
        if let Some(m) = &self.metrics {
            m.sensors_enabled.set(v);
        }
    }

    fn invalid(&self, op: &'static str) -> SessionError {
        SessionError::InvalidState {
            op,
            state: self.state.to_string(),
        }
    }
}
