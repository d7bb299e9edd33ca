//! Constants shared across crates.

pub const N_XYZ_COORDINATES: usize = 3;

/// Device identifier used for the phone's built-in sensors, which need no pairing.
pub const INTERNAL_DEVICE_ID: &str = "internal";

/// Default export destination for the external elevation series.
pub const EXTERNAL_ELEVATION_FILE: &str = "external_elevation_data.txt";
/// Default export destination for the internal elevation series.
pub const INTERNAL_ELEVATION_FILE: &str = "internal_elevation_data.txt";

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;
pub const NANOS_PER_MILLI: u64 = 1_000_000;
