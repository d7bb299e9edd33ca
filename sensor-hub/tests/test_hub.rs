use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use common::{HeartRateSample, Readings, Sample3D, SensorKind, StreamEvent, StreamKind};
use sensor_hub::{CombinedObservation, FileExporter, HubConfig, SensorHub, StartOutcome};
use sources_rs::MockSource;
use test_utils::csv_loader::{load_csv_columns, test_data_path, CsvColumnMapper, TILT_TRACE};
use test_utils::RecordingExporter;

const STRAP: &str = "A0:9E:1A:00:00:01";
const WAIT: Duration = Duration::from_secs(2);

static TRACE: Lazy<Vec<Sample3D>> = Lazy::new(|| {
    let mut mapper = CsvColumnMapper::new();
    mapper.add_timestamp().add_accel();
    load_csv_columns::<Sample3D, _>(test_data_path(TILT_TRACE), &mapper.columns()).unwrap()
});

struct Rig {
    hub: Arc<SensorHub>,
    strap: Arc<MockSource>,
    phone: Arc<MockSource>,
}

fn fast_config() -> HubConfig {
    HubConfig {
        accelerometer_interval_ms: 10,
        gyroscope_interval_ms: 10,
        ..HubConfig::default()
    }
}

async fn rig(config: HubConfig, exporter: Arc<dyn common::Exporter>) -> Rig {
    let strap = Arc::new(
        MockSource::new("Strap", &[SensorKind::Accelerometer, SensorKind::HeartRate])
            .with_known_devices(&[STRAP]),
    );
    let phone = Arc::new(MockSource::builtin(
        "Phone",
        &[SensorKind::Accelerometer, SensorKind::Gyroscope],
    ));
    let hub = SensorHub::new(config, strap.clone(), phone.clone(), exporter)
        .await
        .unwrap();
    Rig { hub, strap, phone }
}

async fn connected_rig(config: HubConfig, exporter: Arc<dyn common::Exporter>) -> Rig {
    let rig = rig(config, exporter).await;
    rig.hub.choose_sensor(STRAP);
    rig.hub.connect_to_sensor().await.unwrap();
    rig
}

async fn wait_until_false(rx: &mut watch::Receiver<bool>) {
    tokio::time::timeout(WAIT, rx.wait_for(|value| !*value))
        .await
        .expect("timed out")
        .unwrap();
}

async fn emit_trace(strap: &MockSource) {
    for chunk in TRACE.chunks(10) {
        strap
            .emit(
                SensorKind::Accelerometer,
                StreamEvent::Readings(Readings::Vectors(chunk.to_vec())),
            )
            .await;
    }
}

#[tokio::test]
async fn test_external_elevation_follows_trace() {
    let exporter = RecordingExporter::new();
    let rig = connected_rig(HubConfig::default(), Arc::new(exporter.clone())).await;

    assert!(matches!(
        rig.hub.start_external_elevation().await.unwrap(),
        StartOutcome::Started(_)
    ));
    assert!(rig.hub.measuring());
    emit_trace(&rig.strap).await;

    let view = rig.hub.external_elevation_view();
    let history = view.history();
    assert_eq!(history.len(), TRACE.len());
    assert_eq!(history[0].timestamp(), "00:00:00.000");
    assert!((view.current().unwrap().angle_degrees() - 60.0).abs() < 1.0);

    assert!(rig.hub.stop_data_stream().await);
    assert!(!rig.hub.measuring());
    let exported = exporter.exports_to("external_elevation_data.txt").await;
    assert_eq!(exported, vec![history]);
}

#[tokio::test]
async fn test_double_start_is_a_no_op() {
    let rig = connected_rig(HubConfig::default(), Arc::new(RecordingExporter::new())).await;

    let first = rig.hub.start_external_elevation().await.unwrap();
    let second = rig.hub.start_external_elevation().await.unwrap();

    assert!(matches!(first, StartOutcome::Started(_)));
    assert_eq!(second, StartOutcome::AlreadyStreaming);
    assert_eq!(rig.strap.listener_count(SensorKind::Accelerometer), 1);
    rig.hub.stop_data_stream().await;
    assert_eq!(rig.strap.listener_count(SensorKind::Accelerometer), 0);
}

#[tokio::test]
async fn test_countdown_stops_and_exports() {
    let directory = tempfile::tempdir().unwrap();
    let config = HubConfig {
        countdown_start: 5,
        countdown_tick_ms: 20,
        export_directory: directory.path().to_string_lossy().to_string(),
        ..HubConfig::default()
    };
    let exporter = Arc::new(FileExporter::new(directory.path()));
    let rig = connected_rig(config, exporter).await;
    let mut measuring = rig.hub.subscribe_measuring();

    rig.hub.start_external_elevation().await.unwrap();
    emit_trace(&rig.strap).await;
    wait_until_false(&mut measuring).await;

    assert!(!rig.hub.is_streaming(StreamKind::ExternalElevation));
    assert_eq!(rig.hub.active_stream().await, None);
    assert_eq!(rig.hub.countdown(), 0);

    let content =
        std::fs::read_to_string(directory.path().join("external_elevation_data.txt")).unwrap();
    let lines: Vec<&str> = content.split('\n').collect();
    assert_eq!(lines.len(), TRACE.len());
    assert_eq!(lines[0], "0; 00:00:00.000");
    assert!(!content.ends_with('\n'));
}

#[tokio::test]
async fn test_heart_rate_cancels_countdown() {
    let config = HubConfig {
        countdown_start: 1,
        countdown_tick_ms: 20,
        ..HubConfig::default()
    };
    let rig = connected_rig(config, Arc::new(RecordingExporter::new())).await;

    rig.hub.start_external_elevation().await.unwrap();
    rig.hub.start_heart_rate().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(rig.hub.is_streaming(StreamKind::HeartRate));
    assert!(rig.hub.is_streaming(StreamKind::ExternalElevation));
    assert!(rig.hub.measuring());
    assert_eq!(rig.hub.active_stream().await, Some(StreamKind::HeartRate));

    rig.hub.stop_stream(StreamKind::ExternalElevation).await;
    rig.hub.stop_data_stream().await;
}

#[tokio::test]
async fn test_disconnect_stops_active_stream() {
    let rig = connected_rig(HubConfig::default(), Arc::new(RecordingExporter::new())).await;
    assert!(rig.hub.connected());

    rig.hub.start_heart_rate().await.unwrap();
    rig.strap
        .emit(
            SensorKind::HeartRate,
            StreamEvent::Readings(Readings::HeartRate(vec![HeartRateSample::new(71, 1)])),
        )
        .await;
    assert_eq!(rig.hub.heart_rate_view().current().map(|s| s.bpm()), Some(71));

    rig.hub.disconnect_from_sensor().await.unwrap();

    let view = rig.hub.heart_rate_view();
    assert!(!view.is_streaming());
    assert_eq!(view.current(), None);
    assert_eq!(view.history().len(), 1);
    assert!(!rig.hub.connected());
    assert!(!rig.hub.measuring());
}

#[tokio::test]
async fn test_source_failure_keeps_partial_series() {
    let exporter = RecordingExporter::new();
    let rig = connected_rig(HubConfig::default(), Arc::new(exporter.clone())).await;

    rig.hub.start_external_elevation().await.unwrap();
    rig.strap
        .emit(
            SensorKind::Accelerometer,
            StreamEvent::Readings(Readings::Vectors(TRACE[..5].to_vec())),
        )
        .await;
    rig.strap
        .emit(
            SensorKind::Accelerometer,
            StreamEvent::Failed("link lost".to_string()),
        )
        .await;

    let view = rig.hub.external_elevation_view();
    assert!(!view.is_streaming());
    assert_eq!(view.history().len(), 5);
    assert_eq!(rig.strap.listener_count(SensorKind::Accelerometer), 0);
    assert_eq!(exporter.export_count().await, 0);

    assert!(!rig.hub.stop_data_stream().await);
    assert!(!rig.hub.measuring());
    assert_eq!(exporter.export_count().await, 0);
}

#[tokio::test]
async fn test_internal_elevation_is_resampled() {
    let exporter = RecordingExporter::new();
    let rig = rig(fast_config(), Arc::new(exporter.clone())).await;

    rig.hub.start_internal_elevation().await.unwrap();
    rig.phone
        .emit(
            SensorKind::Accelerometer,
            StreamEvent::Readings(Readings::Vectors(vec![Sample3D::new(1, [0.0, 0.0, 9.81])])),
        )
        .await;

    let mut history = rig.hub.internal_elevation_view().history;
    tokio::time::timeout(WAIT, history.wait_for(|series| series.len() >= 3))
        .await
        .expect("timed out")
        .unwrap();
    drop(history);

    assert!(rig.hub.stop_stream(StreamKind::InternalElevation).await);
    let series = rig.hub.internal_elevation_view().history();
    assert!(series
        .windows(2)
        .all(|pair| pair[0].angle_degrees() < pair[1].angle_degrees()));
    assert!(series.iter().all(|s| s.timestamp().parse::<u64>().is_ok()));
    assert_eq!(
        exporter.exports_to("internal_elevation_data.txt").await,
        vec![series]
    );
}

#[tokio::test]
async fn test_combined_feed_prefers_heart_rate() {
    let rig = connected_rig(fast_config(), Arc::new(RecordingExporter::new())).await;
    let mut feed = rig.hub.combined_feed();

    rig.hub.start_heart_rate().await.unwrap();
    rig.hub.start_gyroscope().await.unwrap();
    rig.phone
        .emit(
            SensorKind::Gyroscope,
            StreamEvent::Readings(Readings::Vectors(vec![Sample3D::new(1, [0.1, 0.2, 0.3])])),
        )
        .await;
    let mut gyroscope = rig.hub.gyroscope_view().current;
    tokio::time::timeout(WAIT, gyroscope.wait_for(Option::is_some))
        .await
        .expect("timed out")
        .unwrap();
    rig.strap
        .emit(
            SensorKind::HeartRate,
            StreamEvent::Readings(Readings::HeartRate(vec![HeartRateSample::new(80, 2)])),
        )
        .await;

    assert_eq!(
        feed.next().await,
        Some(CombinedObservation::HeartRate(HeartRateSample::new(80, 2)))
    );
    assert_eq!(
        feed.next().await.map(|o| o.kind()),
        Some(StreamKind::Gyroscope)
    );
    assert_eq!(
        rig.hub.latest_combined().map(|o| o.kind()),
        Some(StreamKind::HeartRate)
    );

    rig.hub.stop_stream(StreamKind::HeartRate).await;
    rig.hub.stop_data_stream().await;
}

#[tokio::test]
async fn test_snapshot() {
    let rig = connected_rig(HubConfig::default(), Arc::new(RecordingExporter::new())).await;
    rig.hub.start_external_elevation().await.unwrap();
    emit_trace(&rig.strap).await;

    let state = rig.hub.snapshot().await;
    assert!(state.connected);
    assert!(state.measuring);
    assert_eq!(state.device_id.as_deref(), Some(STRAP));
    assert_eq!(state.active_stream, Some(StreamKind::ExternalElevation));
    assert_eq!(state.external_elevation_list.len(), TRACE.len());
    assert!(state.hr_list.is_empty());
    assert!(state.internal_elevation_list.is_empty());
    assert!(state.timer <= 15);

    rig.hub.stop_data_stream().await;
}

#[tokio::test]
async fn test_countdown_expiry_leaves_next_stream_intact() {
    let config = HubConfig {
        countdown_start: 2,
        countdown_tick_ms: 10,
        ..HubConfig::default()
    };
    let exporter = RecordingExporter::new();
    let rig = connected_rig(config, Arc::new(exporter.clone())).await;
    let mut measuring = rig.hub.subscribe_measuring();

    rig.hub.start_external_elevation().await.unwrap();
    emit_trace(&rig.strap).await;
    wait_until_false(&mut measuring).await;
    let series = rig.hub.external_elevation_view().history();
    assert_eq!(series.len(), TRACE.len());

    rig.hub.start_heart_rate().await.unwrap();
    assert!(!rig.hub.stop_stream(StreamKind::ExternalElevation).await);
    emit_trace(&rig.strap).await;

    assert!(rig.hub.is_streaming(StreamKind::HeartRate));
    assert!(rig.hub.measuring());
    assert_eq!(rig.hub.active_stream().await, Some(StreamKind::HeartRate));
    assert_eq!(rig.hub.external_elevation_view().history(), series);
    assert_eq!(
        exporter.exports_to("external_elevation_data.txt").await,
        vec![series]
    );

    rig.hub.stop_data_stream().await;
}

#[tokio::test]
async fn test_combined_feed_ends_when_hub_is_dropped() {
    let rig = connected_rig(HubConfig::default(), Arc::new(RecordingExporter::new())).await;
    let mut feed = rig.hub.combined_feed();

    rig.hub.start_heart_rate().await.unwrap();
    rig.strap
        .emit(
            SensorKind::HeartRate,
            StreamEvent::Readings(Readings::HeartRate(vec![HeartRateSample::new(75, 3)])),
        )
        .await;
    assert_eq!(
        tokio::time::timeout(WAIT, feed.next()).await.unwrap(),
        Some(CombinedObservation::HeartRate(HeartRateSample::new(75, 3)))
    );

    drop(rig.hub);

    rig.strap
        .emit(
            SensorKind::HeartRate,
            StreamEvent::Readings(Readings::HeartRate(vec![HeartRateSample::new(76, 4)])),
        )
        .await;
    assert_eq!(tokio::time::timeout(WAIT, feed.next()).await.unwrap(), None);
}
