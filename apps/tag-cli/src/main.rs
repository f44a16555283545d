use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tracing::info;

use gatt_transport::DeviceAddress;
use sensor_decode::{SensorKind, SensorReading};
use tag_session::{self as session, JsonlSink, ReadingSink, SamplePlan, TagProfile, TagSession};

#[derive(Parser, Debug)]
#[command(
    name = "tag",
    version,
    about = "Sensor tag register decoder",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Kind {
    Humidity,
    #[value(name = "ir-temperature")]
    IrTemperature,
    Barometer,
    #[value(name = "nine-axis")]
    NineAxis,
    Optical,
}

impl Kind {
    fn into_sensor(self) -> SensorKind {
        match self {
            Kind::Humidity => SensorKind::Humidity,
            Kind::IrTemperature => SensorKind::IrTemperature,
            Kind::Barometer => SensorKind::Barometer,
            Kind::NineAxis => SensorKind::NineAxis,
            Kind::Optical => SensorKind::Optical,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List sensor kinds with register sizes and handles
    Kinds {
        /// YAML profile (defaults to the CC2650 layout)
        #[arg(long)]
        profile: Option<String>,
    },
    /// Decode one raw register buffer
    Decode {
        #[arg(long, value_enum)]
        kind: Kind,
        /// Data bytes as hex, space-separated (e.g., "ff 0f")
        #[arg(long, value_delimiter = ' ')]
        data: Vec<String>,
        /// Print the reading as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Sample a sensor on a mock tag and optionally store readings
    Sample {
        /// Tag address
        #[arg(long, default_value = "B0:B4:48:C9:4A:05")]
        address: String,
        #[arg(long, value_enum)]
        kind: Kind,
        /// YAML profile (defaults to the CC2650 layout)
        #[arg(long)]
        profile: Option<String>,
        /// Number of samples
        #[arg(long, default_value_t = 1u32)]
        count: u32,
        /// Milliseconds between samples
        #[arg(long, default_value_t = 1000u64)]
        interval_ms: u64,
        /// Override the profile's ready delay (milliseconds)
        #[arg(long)]
        ready_delay_ms: Option<u64>,
        /// Register contents served by the mock tag, hex space-separated
        #[arg(long, value_delimiter = ' ')]
        data: Vec<String>,
        /// Write stored readings to a JSONL file
        #[arg(long)]
        to: Option<String>,
        /// Event name of stored readings (defaults to the sensor kind)
        #[arg(long)]
        event_name: Option<String>,
        /// Store only when this field rises above --trigger-above (e.g., accel.z)
        #[arg(long, requires = "trigger_above")]
        trigger_field: Option<String>,
        #[arg(long, requires = "trigger_field", allow_negative_numbers = true)]
        trigger_above: Option<f64>,
        /// Print readings as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
        /// Print prometheus metrics after the run
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
    /// Validate a profile file
    ProfileValidate {
        #[arg(long)]
        file: String,
        /// Print JSON after validation
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Print the default profile as YAML
    ProfileShow,
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Kinds { profile } => kinds(profile.as_deref()),
        Commands::Decode { kind, data, json } => decode(kind.into_sensor(), &data, json),
        Commands::Sample {
            address,
            kind,
            profile,
            count,
            interval_ms,
            ready_delay_ms,
            data,
            to,
            event_name,
            trigger_field,
            trigger_above,
            json,
            metrics,
        } => {
            let kind = kind.into_sensor();
            let mut plan = SamplePlan::new(kind, count);
            plan.interval = Duration::from_millis(interval_ms);
            if let Some(name) = event_name {
                plan.event_name = name;
            }
            if let (Some(field), Some(above)) = (trigger_field, trigger_above) {
                check_field(kind, &field)?;
                plan.trigger = Some(session::ThresholdTrigger::new(field, above));
            }
            sample(
                &address,
                profile.as_deref(),
                ready_delay_ms,
                &data,
                plan,
                to.as_deref(),
                json,
                metrics,
            )
        }
        Commands::ProfileValidate { file, json } => profile_validate(&file, json),
        Commands::ProfileShow => {
            print!("{}", serde_yaml::to_string(&TagProfile::default())?);
            Ok(())
        }
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_profile(path: Option<&str>) -> Result<TagProfile> {
    match path {
        Some(p) => session::load_profile_file(p),
        None => Ok(TagProfile::default()),
    }
}

fn kinds(profile: Option<&str>) -> Result<()> {
    let profile = load_profile(profile)?;
    for kind in SensorKind::ALL {
        match profile.get(kind) {
            Some(r) => println!(
                "{kind}\t{} bytes\tenable={}\tdata={}\tdelay={}ms",
                kind.buffer_len(),
                r.enable,
                r.data,
                r.ready_delay_ms
            ),
            None => println!("{kind}\t{} bytes\t(not in profile)", kind.buffer_len()),
        }
    }
    Ok(())
}

fn decode(kind: SensorKind, data_hex: &[String], json: bool) -> Result<()> {
    let bytes = parse_hex_bytes(data_hex)?;
    let reading = sensor_decode::decode(kind, &bytes)?;
    print_reading(&reading, json)
}

#[allow(clippy::too_many_arguments)]
fn sample(
    address: &str,
    profile: Option<&str>,
    ready_delay_ms: Option<u64>,
    data_hex: &[String],
    mut plan: SamplePlan,
    to: Option<&str>,
    json: bool,
    metrics: bool,
) -> Result<()> {
    let address: DeviceAddress = address.parse()?;
    let mut profile = load_profile(profile)?;
    if let Some(ms) = ready_delay_ms {
        profile = profile.with_ready_delay_ms(ms);
    }
    let seeds = if data_hex.is_empty() {
        Vec::new()
    } else {
        vec![(plan.kind, parse_hex_bytes(data_hex)?)]
    };
    let tag = session::mock_tag_for(&address, &profile, &seeds)?;

    let hub = if metrics {
        Some(session::SessionMetrics::new().map_err(|e| anyhow::anyhow!(e))?)
    } else {
        None
    };
    let mut sess = TagSession::new(tag, profile);
    if let Some(m) = &hub {
        sess = sess.with_metrics(m.clone());
    }

    let mut file_sink = match to {
        Some(path) => Some(JsonlSink::create(path)?),
        None => None,
    };
    let sink = file_sink.as_mut().map(|s| s as &mut dyn ReadingSink);

    info!(%address, sensor = %plan.kind, count = plan.count, "sampling");
    let run = session::run_plan(&mut sess, &mut plan, sink);
    let disconnected = sess.disconnect();
    let summary = run?;
    disconnected?;

    for reading in &summary.readings {
        print_reading(reading, json)?;
    }
    if to.is_some() {
        eprintln!("stored {} of {} readings", summary.uploads, summary.readings.len());
    }
    if let Some(m) = &hub {
        print!("{}", m.encode_text());
    }
    Ok(())
}

fn profile_validate(file: &str, json: bool) -> Result<()> {
    let profile = session::load_profile_file(file)?;
    println!("ok: {} ({} sensors)", profile.name, profile.sensors.len());
    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    }
    Ok(())
}

fn check_field(kind: SensorKind, field: &str) -> Result<()> {
    if kind.field_names().contains(&field) {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{kind} has no field '{field}' (expected one of: {})",
            kind.field_names().join(", ")
        ))
    }
}

fn print_reading(reading: &SensorReading, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(reading)?);
    } else {
        println!("{}\t{reading}", reading.kind());
    }
    Ok(())
}

fn parse_hex_bytes(items: &[String]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(items.len());
    for s in items {
        let t = s.trim();
        if t.is_empty() {
            continue;
        }
        let no_prefix = t.strip_prefix("0x").unwrap_or(t);
        let b = u8::from_str_radix(no_prefix, 16)
            .map_err(|e| anyhow::anyhow!("invalid hex byte '{t}': {e}"))?;
        out.push(b);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_bytes() {
        let items: Vec<String> = ["ff", "0x0F", " 10 ", ""].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_hex_bytes(&items).unwrap(), vec![0xFF, 0x0F, 0x10]);
        assert!(parse_hex_bytes(&["zz".to_string()]).is_err());
    }

    #[test]
    fn test_trigger_args_must_pair() {
        let ok = Cli::try_parse_from([
            "tag",
            "sample",
            "--kind",
            "nine-axis",
            "--trigger-field",
            "accel.z",
            "--trigger-above",
            "-0.5",
        ]);
        assert!(ok.is_ok());
        let missing = Cli::try_parse_from([
            "tag",
            "sample",
            "--kind",
            "nine-axis",
            "--trigger-field",
            "accel.z",
        ]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_check_field() {
        assert!(check_field(SensorKind::NineAxis, "accel.z").is_ok());
        assert!(check_field(SensorKind::Optical, "accel.z").is_err());
    }

    #[test]
    fn test_kind_mapping_is_total() {
        for k in Kind::value_variants() {
            let s = k.into_sensor();
            assert!(SensorKind::ALL.contains(&s));
        }
    }
}
