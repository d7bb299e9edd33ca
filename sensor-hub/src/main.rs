use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use common::traits::SampleSource;
use common::types::{SensorKind, StreamKind};
use sensor_hub::{FileExporter, HubConfig, SensorHub, StartOutcome};
use sources_rs::{MockSource, PhyphoxSource, SyntheticConfig};

#[derive(Parser, Debug)]
#[command(name = "tilt-monitor")]
#[command(about = "Streams heart rate, rotation and elevation angle from a strap and a phone", long_about = None)]
struct Args {
    /// JSON config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stream to run: heart-rate, gyroscope, external-elevation or internal-elevation
    #[arg(long, default_value = "external-elevation")]
    stream: String,

    /// Identifier of the strap to pair with
    #[arg(long, default_value = "A0:9E:1A:00:00:01")]
    device: String,

    /// Base URL of the Phyphox REST API; a synthetic phone is used when omitted
    #[arg(long)]
    phyphox_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HubConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HubConfig::default(),
    };
    let kind = StreamKind::try_from(args.stream.as_str()).map_err(|e| anyhow!(e))?;
    let token = CancellationToken::new();

    let strap = Arc::new(
        MockSource::new("strap", &[SensorKind::Accelerometer, SensorKind::HeartRate])
            .with_known_devices(&[args.device.as_str()]),
    );
    strap.spawn_synthetic(SyntheticConfig::default(), token.clone())?;

    let phone: Arc<dyn SampleSource> = match &args.phyphox_url {
        Some(url) => Arc::new(PhyphoxSource::new(url, "phyphox")?),
        None => {
            let phone = Arc::new(MockSource::builtin(
                "phone",
                &[SensorKind::Accelerometer, SensorKind::Gyroscope],
            ));
            let synthetic = SyntheticConfig {
                sensor_epoch: false,
                ..SyntheticConfig::default()
            };
            phone.spawn_synthetic(synthetic, token.clone())?;
            phone
        }
    };

    let exporter = Arc::new(FileExporter::new(&config.export_directory));
    let hub = SensorHub::new(config, strap, phone, exporter).await?;

    if kind.is_external() {
        hub.choose_sensor(&args.device);
        hub.connect_to_sensor().await?;
    }
    if hub.start_stream(kind).await? == StartOutcome::AlreadyStreaming {
        warn!("{} was already streaming", kind);
    }

    let mut feed = hub.combined_feed();
    let mut streaming = hub.streaming(kind);
    let mut measuring = hub.subscribe_measuring();
    loop {
        tokio::select! {
            observation = feed.next() => match observation {
                Some(observation) => println!("{}", observation),
                None => break,
            },
            changed = streaming.changed() => {
                if changed.is_ok() && !*streaming.borrow_and_update() {
                    // Ended by the source or the countdown.
                    hub.stop_stream(kind).await;
                }
            }
            changed = measuring.changed() => {
                if changed.is_err() || !*measuring.borrow_and_update() {
                    info!("{} stopped", kind);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                hub.stop_data_stream().await;
                break;
            }
        }
    }

    if kind.is_external() {
        hub.disconnect_from_sensor().await?;
    }
    token.cancel();
    Ok(())
}
