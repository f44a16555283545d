use crate::{ReadingRecord, ReadingSink, Result, SessionState, TagSession, ThresholdTrigger};
use gatt_transport::GattDevice;
use sensor_decode::{SensorKind, SensorReading};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// What to sample and which readings to keep.
#[derive(Debug, Clone)]
pub struct SamplePlan {
    pub kind: SensorKind,
    pub count: u32,
    pub interval: Duration,
    pub event_name: String,
    /// Keep only readings that fire the trigger; keep all when `None`.
    pub trigger: Option<ThresholdTrigger>,
}

impl SamplePlan {
    pub fn new(kind: SensorKind, count: u32) -> Self {
        Self {
            kind,
            count,
            interval: Duration::from_secs(1),
            event_name: kind.as_str().to_string(),
            trigger: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub readings: Vec<SensorReading>,
    pub uploads: u32,
}

/// Connect if needed, enable the plan's sensor, take `count` samples and
/// disable it again. The session is left connected.
///
/// The sensor is disabled and the sink flushed even when a sample fails; the
/// sample failure is returned in preference to a flush failure.
pub fn run_plan<D: GattDevice>(
    session: &mut TagSession<D>,
    plan: &mut SamplePlan,
    mut sink: Option<&mut dyn ReadingSink>,
) -> Result<RunSummary> {
    if session.state() == SessionState::Idle {
        session.connect()?;
    }
    session.enable(plan.kind)?;

    let result = run_samples(session, plan, &mut sink);

    if let Err(e) = session.disable() {
        warn!(error = %e, sensor = %plan.kind, "failed to disable sensor after run");
    }
    if let Some(s) = sink.as_deref_mut() {
        if let Err(e) = s.flush() {
            if result.is_err() {
                warn!(error = %e, sensor = %plan.kind, "failed to flush sink after failed run");
            } else {
                return Err(e.into());
            }
        }
    }
    result
}

fn run_samples<D: GattDevice>(
    session: &mut TagSession<D>,
    plan: &mut SamplePlan,
    sink: &mut Option<&mut dyn ReadingSink>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for i in 0..plan.count {
        if i > 0 && !plan.interval.is_zero() {
            thread::sleep(plan.interval);
        }
        let reading = session.sample()?;
        let keep = match plan.trigger.as_mut() {
            Some(t) => t.observe(&reading),
            None => true,
        };
        if keep {
            if let Some(s) = sink.as_deref_mut() {
                let record = ReadingRecord::now(plan.event_name.as_str(), reading)?;
                s.put(&record)?;
                summary.uploads += 1;
                if let Some(m) = session.metrics() {
                    m.uploads.inc();
                }
                info!(event = %plan.event_name, date = %record.date, "reading stored");
            }
        }
        summary.readings.push(reading);
    }
    Ok(summary)
}

/// Mock tag answering every data register of `profile` with zeroes of the
/// right length, overridden per kind by `seeds`.
#[cfg(feature = "mock")]
pub fn mock_tag_for(
    address: &gatt_transport::DeviceAddress,
    profile: &crate::TagProfile,
    seeds: &[(SensorKind, Vec<u8>)],
) -> gatt_transport::Result<gatt_transport::MockTag> {
    let mut tag = gatt_transport::MockTag::open(address)?;
    for regs in &profile.sensors {
        tag.set_register(regs.data, &vec![0u8; regs.kind.buffer_len()]);
    }
    for (kind, data) in seeds {
        if let Some(regs) = profile.get(*kind) {
            tag.set_register(regs.data, data);
        }
    }
    Ok(tag)
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{MemorySink, SessionError, SessionMetrics, SinkError, TagProfile};
    use gatt_transport::{DeviceAddress, Handle, MockTag};

    fn addr() -> DeviceAddress {
        DeviceAddress::new([0xB0, 0xB4, 0x48, 0xC9, 0x4A, 0x05])
    }

    fn motion_words(z: i16) -> Vec<u8> {
        let words: [i16; 9] = [0, 0, 0, 0, 0, z, 0, 0, 0];
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// Accepts every record but never manages to flush.
    #[derive(Default)]
    struct StuckSink {
        puts: usize,
    }

    impl ReadingSink for StuckSink {
        fn put(&mut self, _record: &ReadingRecord) -> std::result::Result<(), SinkError> {
            self.puts += 1;
            Ok(())
        }

        fn flush(&mut self) -> std::result::Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk full")))
        }
    }

    fn session(seeds: &[(SensorKind, Vec<u8>)]) -> TagSession<MockTag> {
        let profile = TagProfile::default().with_ready_delay_ms(0);
        let tag = mock_tag_for(&addr(), &profile, seeds).unwrap();
        TagSession::new(tag, profile)
    }

    #[test]
    fn test_mock_tag_seeds_every_sensor() {
        let profile = TagProfile::default();
        let mut tag =
            mock_tag_for(&addr(), &profile, &[(SensorKind::Optical, vec![0xFF, 0x0F])]).unwrap();
        tag.connect().unwrap();
        assert_eq!(tag.read_register(Handle::new(0x3C)).unwrap().len(), 18);
        assert_eq!(tag.read_register(Handle::new(0x44)).unwrap(), vec![0xFF, 0x0F]);
    }

    #[test]
    fn test_run_keeps_all_without_trigger() {
        let metrics = SessionMetrics::new().unwrap();
        let mut s = session(&[(SensorKind::Optical, vec![0xFF, 0x0F])]).with_metrics(metrics.clone());
        let mut plan = SamplePlan::new(SensorKind::Optical, 3);
        plan.interval = Duration::ZERO;
        let mut sink = MemorySink::default();

        let summary = run_plan(&mut s, &mut plan, Some(&mut sink)).unwrap();
        assert_eq!(summary.readings.len(), 3);
        assert_eq!(summary.uploads, 3);
        assert_eq!(sink.records.len(), 3);
        assert_eq!(sink.records[0].event_name, "optical");
        assert_eq!(s.state(), SessionState::Connected);
        assert_eq!(metrics.samples.get(), 3);
        assert_eq!(metrics.uploads.get(), 3);
    }

    #[test]
    fn test_run_with_trigger_keeps_edges() {
        let mut s = session(&[(SensorKind::NineAxis, motion_words(4096))]);
        let mut plan = SamplePlan::new(SensorKind::NineAxis, 4);
        plan.interval = Duration::ZERO;
        plan.event_name = "pushed".into();
        plan.trigger = Some(ThresholdTrigger::new("accel.z", 0.0));
        let mut sink = MemorySink::default();

        let summary = run_plan(&mut s, &mut plan, Some(&mut sink)).unwrap();
        assert_eq!(summary.readings.len(), 4);
        // steady 1 g: only the first sample is an edge
        assert_eq!(summary.uploads, 1);
        assert_eq!(sink.records[0].data.field("accel.z"), Some(1.0));
        assert_eq!(sink.records[0].event_name, "pushed");
    }

    #[test]
    fn test_run_without_sink_still_samples() {
        let mut s = session(&[]);
        let mut plan = SamplePlan::new(SensorKind::Humidity, 2);
        plan.interval = Duration::ZERO;
        let summary = run_plan(&mut s, &mut plan, None).unwrap();
        assert_eq!(summary.uploads, 0);
        assert_eq!(summary.readings[0].field("temperature_c"), Some(-40.0));
    }

    #[test]
    fn test_failed_sample_still_disables() {
        let mut s = session(&[(SensorKind::Barometer, vec![0x00, 0x01])]);
        let mut plan = SamplePlan::new(SensorKind::Barometer, 1);
        let err = run_plan(&mut s, &mut plan, None).unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
        assert_eq!(s.state(), SessionState::Connected);
        assert_eq!(
            s.device().writes().last(),
            Some(&(Handle::new(0x37), vec![0x00]))
        );
    }

    #[test]
    fn test_sample_error_wins_over_flush_error() {
        let mut s = session(&[(SensorKind::Barometer, vec![0x00, 0x01])]);
        let mut plan = SamplePlan::new(SensorKind::Barometer, 1);
        let mut sink = StuckSink::default();
        let err = run_plan(&mut s, &mut plan, Some(&mut sink)).unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn test_flush_error_fails_clean_run() {
        let mut s = session(&[(SensorKind::Optical, vec![0xFF, 0x0F])]);
        let mut plan = SamplePlan::new(SensorKind::Optical, 2);
        plan.interval = Duration::ZERO;
        let mut sink = StuckSink::default();
        let err = run_plan(&mut s, &mut plan, Some(&mut sink)).unwrap_err();
        assert!(matches!(err, SessionError::Sink(SinkError::Io(_))));
        assert_eq!(sink.puts, 2);
        assert_eq!(s.state(), SessionState::Connected);
    }
}
