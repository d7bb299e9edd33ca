use std::error::Error;
use std::path::{Path, PathBuf};

use csv::Reader;
use num_enum::TryFromPrimitive;

/// Recorded trace shipped with this crate: accelerometer slowly tilting up to 60°.
pub const TILT_TRACE: &str = "tilt_trace.csv";

/// Column layout of the recorded traces under `test_data/`.
#[repr(usize)]
#[derive(Debug, Clone, Copy, TryFromPrimitive)]
pub enum CsvFileColum {
    Timestamp,
    XAccel,
    YAccel,
    ZAccel,
    XGyro,
    YGyro,
    ZGyro,
    HeartRate,
}

impl From<CsvFileColum> for usize {
    fn from(value: CsvFileColum) -> Self {
        value as usize
    }
}

#[derive(Clone, Debug, Default)]
pub struct CsvColumnMapper {
    columns: Vec<usize>,
}

impl CsvColumnMapper {
    pub fn new() -> Self {
        Self { columns: vec![] }
    }

    pub fn columns(&self) -> Vec<usize> {
        self.columns.clone()
    }

    pub fn add_timestamp(&mut self) -> &mut Self {
        self.columns.push(CsvFileColum::Timestamp.into());
        self
    }

    pub fn add_accel(&mut self) -> &mut Self {
        self.columns.push(CsvFileColum::XAccel.into());
        self.columns.push(CsvFileColum::YAccel.into());
        self.columns.push(CsvFileColum::ZAccel.into());
        self
    }

    pub fn add_gyro(&mut self) -> &mut Self {
        self.columns.push(CsvFileColum::XGyro.into());
        self.columns.push(CsvFileColum::YGyro.into());
        self.columns.push(CsvFileColum::ZGyro.into());
        self
    }

    pub fn add_heart_rate(&mut self) -> &mut Self {
        self.columns.push(CsvFileColum::HeartRate.into());
        self
    }
}

/// Absolute path of a file in this crate's `test_data/` directory, so traces can be
/// loaded from any crate's tests regardless of the working directory.
pub fn test_data_path(file_name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(file_name)
}

pub fn load_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<Vec<f64>>, Box<dyn Error>> {
    let mut rdr = Reader::from_path(file_path)?;
    let mut data = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let row: Vec<f64> = record
            .iter()
            .filter_map(|s| s.trim().parse::<f64>().ok())
            .collect();
        data.push(row);
    }

    Ok(data)
}

pub fn load_csv_columns<T: TryFrom<Vec<f64>>, P: AsRef<Path>>(
    file_path: P,
    columns: &[usize],
) -> Result<Vec<T>, Box<dyn Error>> {
    if columns.is_empty() {
        return Err("No columns provided".into());
    }

    let data = load_csv(file_path)?;

    data.into_iter()
        .map(|row| {
            let values = columns
                .iter()
                .map(|&i| {
                    row.get(i)
                        .copied()
                        .ok_or_else(|| format!("Column index {} out of bounds", i).into())
                })
                .collect::<Result<Vec<f64>, Box<dyn Error>>>()?;
            T::try_from(values).map_err(|_| "Failed to convert to T".into())
        })
        .collect()
}
