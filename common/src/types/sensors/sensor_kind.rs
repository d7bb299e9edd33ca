use std::fmt;

/// Raw sensors a sample source can stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    HeartRate,
}

impl From<&SensorKind> for usize {
    fn from(value: &SensorKind) -> Self {
        match value {
            SensorKind::Accelerometer => 0,
            SensorKind::Gyroscope => 1,
            SensorKind::HeartRate => 2,
        }
    }
}

impl From<SensorKind> for usize {
    fn from(value: SensorKind) -> Self {
        usize::from(&value)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::HeartRate => "heart rate",
        };
        f.write_str(name)
    }
}

impl TryFrom<&str> for SensorKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower_case_value = value.to_lowercase();
        if lower_case_value.contains("acc") {
            Ok(Self::Accelerometer)
        } else if lower_case_value.contains("gyr") {
            Ok(Self::Gyroscope)
        } else if lower_case_value.contains("hr") || lower_case_value.contains("heart") {
            Ok(Self::HeartRate)
        } else {
            Err(format!("Unknown sensor `{}`", value))
        }
    }
}
