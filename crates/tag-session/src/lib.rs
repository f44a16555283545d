//! tag-session: drive a sensor tag through enable/sample/disable and hand the
//! decoded readings to a sink

mod error;
pub use error::{Result, SessionError, SinkError};

mod profile;
pub use profile::{load_profile_file, SensorRegisters, TagProfile};

mod metrics;
pub use metrics::SessionMetrics;

mod session;
pub use session::{SessionState, TagSession};

mod trigger;
pub use trigger::ThresholdTrigger;

mod sink;
pub use sink::{JsonlSink, MemorySink, ReadingRecord, ReadingSink};

mod pipeline;
pub use pipeline::{run_plan, RunSummary, SamplePlan};

#[cfg(feature = "mock")]
pub use pipeline::mock_tag_for;
