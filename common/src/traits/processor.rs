use crate::types::Readings;

/// Extraction of typed samples out of a batch of readings.
pub trait FromReadings: Sized {
    /// Returns the samples of `Self`'s type in arrival order, or an empty vector if
    /// the batch carries a different kind of sample.
    fn from_readings(readings: &Readings) -> Vec<Self>;
}

/// Per-sample transformation applied by a stream session.
///
/// Implementations may keep state across samples (a smoothing filter, for
/// instance). That state belongs to one session and is reset when it starts.
pub trait SampleProcessor: Send + 'static {
    type Input: FromReadings + Send + Sync;
    type Output: Clone + Send + Sync + 'static;

    /// Restores the initial state.
    fn reset(&mut self);
    /// Transforms one raw sample. Samples are passed in strict arrival order.
    fn process(&mut self, input: &Self::Input) -> Self::Output;
}
