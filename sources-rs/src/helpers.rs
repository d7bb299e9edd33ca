use serde_json::Value;

use common::constants::{NANOS_PER_SECOND, N_XYZ_COORDINATES};
use common::errors::SourceError;
use common::types::{Sample3D, SensorKind, XYZ};

const ACC_VARIABLES: [&str; N_XYZ_COORDINATES] = ["accX", "accY", "accZ"];
const ACC_TIME: &str = "acc_time";
const GYRO_VARIABLES: [&str; N_XYZ_COORDINATES] = ["gyroX", "gyroY", "gyroZ"];
const GYRO_TIME: &str = "gyro_time";

const STATUS: &str = "status";
const MEASURING: &str = "measuring";
const BUFFER: &str = "buffer";
const EXPORT: &str = "export";
const SET: &str = "set";

const EPS_MEASUREMENT_TIME: f64 = 10e-5;

/// Phyphox buffer names of the time axis and the x/y/z axes of `sensor`.
pub(crate) fn control_str(
    sensor: SensorKind,
) -> Result<(&'static str, [&'static str; N_XYZ_COORDINATES]), SourceError> {
    match sensor {
        SensorKind::Accelerometer => Ok((ACC_TIME, ACC_VARIABLES)),
        SensorKind::Gyroscope => Ok((GYRO_TIME, GYRO_VARIABLES)),
        SensorKind::HeartRate => Err(SourceError::SensorUnavailable(sensor)),
    }
}

/// Moves `timestamp` (seconds) just past the last received sample, so the next
/// query only returns newer data.
pub(crate) fn update_measurement_time(data: &[Sample3D], timestamp: &mut f64) {
    if let Some(last_row) = data.last() {
        *timestamp = last_row.get_timestamp() as f64 / NANOS_PER_SECOND as f64 + EPS_MEASUREMENT_TIME;
    }
}

pub(crate) fn get_status_from_json(data: &Value) -> Result<bool, SourceError> {
    data[STATUS][MEASURING]
        .as_bool()
        .ok_or(SourceError::IncorrectDataFormat(
            "Missing status.measuring".to_string(),
        ))
}

/// Sensors listed in the `export` section of a `/config?` response.
pub(crate) fn parse_available_sensors(config: &Value) -> Vec<SensorKind> {
    let mut sensors: Vec<SensorKind> = config
        .get(EXPORT)
        .and_then(|e| e.as_array())
        .map(|exports| {
            exports
                .iter()
                .filter_map(|entry| {
                    entry
                        .get(SET)
                        .and_then(|s| s.as_str())
                        .and_then(|s| SensorKind::try_from(s).ok())
                })
                .filter(|sensor| *sensor != SensorKind::HeartRate)
                .collect()
        })
        .unwrap_or_default();
    sensors.sort();
    sensors.dedup();
    sensors
}

/// Extracts the time buffer followed by each variable buffer.
pub(crate) fn parse_results(
    data: &Value,
    variables: &[&str],
    time_var: &str,
) -> Result<Vec<Vec<f64>>, SourceError> {
    let buffers = data.get(BUFFER).ok_or(SourceError::IncorrectDataFormat(
        "Missing buffer".to_string(),
    ))?;
    let mut results: Vec<Vec<f64>> = Vec::with_capacity(variables.len() + 1);
    for var in std::iter::once(time_var).chain(variables.iter().copied()) {
        let buffer = buffers.get(var).and_then(|v| v.get(BUFFER)).ok_or(
            SourceError::IncorrectDataFormat(format!("Missing buffer for {}", var)),
        )?;
        let values: Vec<f64> = buffer
            .as_array()
            .ok_or(SourceError::IncorrectDataFormat(format!(
                "Invalid buffer format for {}",
                var
            )))?
            .iter()
            .filter_map(|v| v.as_f64())
            .collect();
        results.push(values);
    }
    Ok(results)
}

/// Transposes column buffers into samples. Input is structured as
/// results[0] : time
/// results[1] : x component
/// results[2] : y component
/// results[3] : z component
///
/// Only rows present in every column are kept, so a partially filled response
/// yields the complete prefix.
pub(crate) fn combine_results(results: &[Vec<f64>]) -> (Vec<f64>, Vec<XYZ>) {
    let n_samples = results.iter().map(Vec::len).min().unwrap_or(0);
    let mut untimed_data = Vec::with_capacity(n_samples);
    let mut timestamp = Vec::with_capacity(n_samples);

    for row in 0..n_samples {
        let values: Vec<f64> = results.iter().skip(1).map(|col| col[row]).collect();
        if let Ok(xyz) = XYZ::try_from(values) {
            untimed_data.push(xyz);
            timestamp.push(results[0][row]);
        }
    }
    (timestamp, untimed_data)
}

/// Pairs measurement-relative timestamps (seconds) with their vectors.
pub(crate) fn to_samples(timestamps: &[f64], data: &[XYZ]) -> Vec<Sample3D> {
    timestamps
        .iter()
        .zip(data.iter())
        .filter(|(t, _)| t.is_finite() && **t >= 0.0)
        .map(|(t, xyz)| Sample3D::from_measurement((t * NANOS_PER_SECOND as f64) as u64, *xyz))
        .collect()
}

pub(crate) fn build_query(variables: &[&str], time_var: &str, since: Option<f64>) -> String {
    let mut query = match since {
        Some(since_val) => format!("{}={:.4}", time_var, since_val),
        None => time_var.to_string(),
    };

    for var in variables {
        match since {
            Some(since_val) => query.push_str(&format!("&{}={:.4}|{}", var, since_val, time_var)),
            None => query.push_str(&format!("&{}", var)),
        }
    }
    query
}
