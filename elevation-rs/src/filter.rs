use common::XYZ;

use crate::errors::ElevationError;

/// Weight given to the newest angle by the elevation filter.
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Elevation of `vector` above the x-y plane, in degrees.
///
/// Degenerate vectors (zero or non-finite magnitude) have no direction and
/// yield `0.0`. The result always lies in `[-90, 90]`.
pub fn angle_from_vector(vector: &XYZ) -> f64 {
    let magnitude = vector.magnitude();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return 0.0;
    }
    let ratio = (vector.z() / magnitude).clamp(-1.0, 1.0);
    ratio.asin().to_degrees()
}

/// One step of an exponentially weighted moving average.
pub fn smooth(current: f64, previous: f64, alpha: f64) -> f64 {
    alpha * current + (1.0 - alpha) * previous
}

/// Exponentially weighted moving average starting from `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ewma {
    alpha: f64,
    previous: f64,
}

impl Ewma {
    pub fn new(alpha: f64) -> Result<Self, ElevationError> {
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(ElevationError::InvalidAlpha(alpha));
        }
        Ok(Self {
            alpha,
            previous: 0.0,
        })
    }

    /// Feeds `current` into the filter and returns the smoothed value.
    pub fn update(&mut self, current: f64) -> f64 {
        self.previous = smooth(current, self.previous, self.alpha);
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = 0.0;
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for Ewma {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            previous: 0.0,
        }
    }
}
