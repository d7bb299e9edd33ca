/// A filtered elevation angle with its rendered timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationSample {
    angle_degrees: f64,
    timestamp: String,
}

impl ElevationSample {
    pub fn new(angle_degrees: f64, timestamp: impl Into<String>) -> Self {
        Self {
            angle_degrees,
            timestamp: timestamp.into(),
        }
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle_degrees
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Export form of the sample: the angle truncated towards zero, then the timestamp.
    pub fn to_line(&self) -> String {
        format!("{}; {}", self.angle_degrees.trunc() as i64, self.timestamp)
    }
}
