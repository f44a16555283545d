use crate::SinkError;
use sensor_decode::SensorReading;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use time::macros::format_description;
use time::OffsetDateTime;

/// One stored reading, keyed by event name and a `YYYYMMDDHHMMSS.ffffff` date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRecord {
    pub event_name: String,
    pub date: String,
    pub data: SensorReading,
}

impl ReadingRecord {
    pub fn new(
        event_name: impl Into<String>,
        data: SensorReading,
        at: OffsetDateTime,
    ) -> Result<Self, SinkError> {
        let fmt = format_description!(
            "[year][month][day][hour][minute][second].[subsecond digits:6]"
        );
        let date = at
            .format(&fmt)
            .map_err(|e| SinkError::Timestamp(e.to_string()))?;
        Ok(Self {
            event_name: event_name.into(),
            date,
            data,
        })
    }

    pub fn now(event_name: impl Into<String>, data: SensorReading) -> Result<Self, SinkError> {
        Self::new(event_name, data, OffsetDateTime::now_utc())
    }
}

/// Destination for readings that should be kept.
pub trait ReadingSink {
    fn put(&mut self, record: &ReadingRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Newline-delimited JSON, one record per line.
pub struct JsonlSink<W: Write> {
    out: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonlSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReadingSink for JsonlSink<W> {
    fn put(&mut self, record: &ReadingRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ReadingRecord>,
}

impl ReadingSink for MemorySink {
    fn put(&mut self, record: &ReadingRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_decode::OpticalReading;
    use time::macros::datetime;

    fn light() -> SensorReading {
        SensorReading::Optical(OpticalReading {
            illuminance_lux: 40.95,
        })
    }

    #[test]
    fn test_record_date_format() {
        let at = datetime!(2016-07-04 09:05:03.000123 UTC);
        let rec = ReadingRecord::new("doorOpened", light(), at).unwrap();
        assert_eq!(rec.date, "20160704090503.000123");
        assert_eq!(rec.event_name, "doorOpened");

        let now = ReadingRecord::now("x", light()).unwrap();
        assert_eq!(now.date.len(), "YYYYMMDDHHMMSS.ffffff".len());
        assert_eq!(now.date.as_bytes()[14], b'.');
    }

    #[test]
    fn test_jsonl_lines() {
        let at = datetime!(2016-07-04 09:05:03 UTC);
        let mut sink = JsonlSink::new(Vec::new());
        let rec = ReadingRecord::new("door", light(), at).unwrap();
        sink.put(&rec).unwrap();
        sink.put(&rec).unwrap();
        sink.flush().unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(v["eventName"], "door");
        assert_eq!(v["date"], "20160704090503.000000");
        assert_eq!(v["data"]["kind"], "optical");
        let back: ReadingRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::default();
        sink.put(&ReadingRecord::now("a", light()).unwrap()).unwrap();
        assert_eq!(sink.records.len(), 1);
    }
}
