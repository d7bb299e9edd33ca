use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElevationError {
    /// Smoothing factor outside `[0, 1]` or not a number.
    #[error("invalid smoothing factor {0}, expected a value in [0, 1]")]
    InvalidAlpha(f64),
}
