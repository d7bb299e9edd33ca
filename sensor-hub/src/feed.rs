use std::fmt;
use tokio::sync::watch;

use common::types::{ElevationSample, HeartRateSample, Sample3D, StreamKind};

/// Most recent value of one stream kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CombinedObservation {
    HeartRate(HeartRateSample),
    Gyroscope(Sample3D),
    ExternalElevation(ElevationSample),
    InternalElevation(ElevationSample),
}

impl CombinedObservation {
    pub fn kind(&self) -> StreamKind {
        match self {
            CombinedObservation::HeartRate(_) => StreamKind::HeartRate,
            CombinedObservation::Gyroscope(_) => StreamKind::Gyroscope,
            CombinedObservation::ExternalElevation(_) => StreamKind::ExternalElevation,
            CombinedObservation::InternalElevation(_) => StreamKind::InternalElevation,
        }
    }
}

impl fmt::Display for CombinedObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinedObservation::HeartRate(sample) => {
                write!(f, "{}: {} bpm", self.kind(), sample.bpm())
            }
            CombinedObservation::Gyroscope(sample) => {
                let w = sample.get_measurement();
                write!(
                    f,
                    "{}: [{:.3}, {:.3}, {:.3}] rad/s",
                    self.kind(),
                    w.x(),
                    w.y(),
                    w.z()
                )
            }
            CombinedObservation::ExternalElevation(sample)
            | CombinedObservation::InternalElevation(sample) => write!(
                f,
                "{}: {:.1}° at {}",
                self.kind(),
                sample.angle_degrees(),
                sample.timestamp()
            ),
        }
    }
}

/// Single stream of changes across all kinds.
///
/// When several kinds changed since the last call, they are yielded in priority
/// order: heart rate, gyroscope, external elevation, internal elevation. Changes
/// to an empty value are skipped.
pub struct CombinedFeed {
    heart_rate: Option<watch::Receiver<Option<HeartRateSample>>>,
    gyroscope: Option<watch::Receiver<Option<Sample3D>>>,
    external_elevation: Option<watch::Receiver<Option<ElevationSample>>>,
    internal_elevation: Option<watch::Receiver<Option<ElevationSample>>>,
}

impl CombinedFeed {
    pub(crate) fn new(
        heart_rate: watch::Receiver<Option<HeartRateSample>>,
        gyroscope: watch::Receiver<Option<Sample3D>>,
        external_elevation: watch::Receiver<Option<ElevationSample>>,
        internal_elevation: watch::Receiver<Option<ElevationSample>>,
    ) -> Self {
        Self {
            heart_rate: Some(heart_rate),
            gyroscope: Some(gyroscope),
            external_elevation: Some(external_elevation),
            internal_elevation: Some(internal_elevation),
        }
    }

    /// Waits for the next change. Returns `None` once every producer is gone.
    pub async fn next(&mut self) -> Option<CombinedObservation> {
        loop {
            tokio::select! {
                biased;

                Some(value) = changed(&mut self.heart_rate) => {
                    if let Some(sample) = value {
                        return Some(CombinedObservation::HeartRate(sample));
                    }
                }
                Some(value) = changed(&mut self.gyroscope) => {
                    if let Some(sample) = value {
                        return Some(CombinedObservation::Gyroscope(sample));
                    }
                }
                Some(value) = changed(&mut self.external_elevation) => {
                    if let Some(sample) = value {
                        return Some(CombinedObservation::ExternalElevation(sample));
                    }
                }
                Some(value) = changed(&mut self.internal_elevation) => {
                    if let Some(sample) = value {
                        return Some(CombinedObservation::InternalElevation(sample));
                    }
                }
                else => return None,
            }
        }
    }
}

/// Next value of `receiver`, or `None` (dropping the receiver) once its sender is
/// gone. A dropped receiver yields `None` at once, which disables its branch.
async fn changed<T: Clone>(receiver: &mut Option<watch::Receiver<T>>) -> Option<T> {
    let rx = receiver.as_mut()?;
    match rx.changed().await {
        Ok(()) => Some(rx.borrow_and_update().clone()),
        Err(_) => {
            *receiver = None;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use publisher::Observable;

    struct Cells {
        heart_rate: Observable<Option<HeartRateSample>>,
        gyroscope: Observable<Option<Sample3D>>,
        external: Observable<Option<ElevationSample>>,
        internal: Observable<Option<ElevationSample>>,
    }

    impl Cells {
        fn new() -> Self {
            Self {
                heart_rate: Observable::new(None),
                gyroscope: Observable::new(None),
                external: Observable::new(None),
                internal: Observable::new(None),
            }
        }

        fn feed(&self) -> CombinedFeed {
            CombinedFeed::new(
                self.heart_rate.subscribe(),
                self.gyroscope.subscribe(),
                self.external.subscribe(),
                self.internal.subscribe(),
            )
        }
    }

    #[tokio::test]
    async fn test_heart_rate_has_priority() {
        let cells = Cells::new();
        let mut feed = cells.feed();

        cells.internal.set(Some(ElevationSample::new(1.0, "t")));
        cells.gyroscope.set(Some(Sample3D::new(1, [0.1, 0.2, 0.3])));
        cells.heart_rate.set(Some(HeartRateSample::new(70, 1)));

        let order: Vec<StreamKind> = vec![
            feed.next().await.unwrap().kind(),
            feed.next().await.unwrap().kind(),
            feed.next().await.unwrap().kind(),
        ];
        assert_eq!(
            order,
            vec![
                StreamKind::HeartRate,
                StreamKind::Gyroscope,
                StreamKind::InternalElevation
            ]
        );
    }

    #[tokio::test]
    async fn test_latest_value_per_kind() {
        let cells = Cells::new();
        let mut feed = cells.feed();

        cells.external.set(Some(ElevationSample::new(10.0, "a")));
        cells.external.set(Some(ElevationSample::new(20.0, "b")));

        assert_eq!(
            feed.next().await,
            Some(CombinedObservation::ExternalElevation(ElevationSample::new(
                20.0, "b"
            )))
        );
    }

    #[tokio::test]
    async fn test_cleared_values_are_skipped() {
        let cells = Cells::new();
        let mut feed = cells.feed();

        cells.heart_rate.set(None);
        cells.gyroscope.set(Some(Sample3D::new(2, [0.0; 3])));

        assert_eq!(feed.next().await.map(|o| o.kind()), Some(StreamKind::Gyroscope));
    }

    #[tokio::test]
    async fn test_ends_when_producers_are_dropped() {
        let cells = Cells::new();
        let mut feed = cells.feed();
        cells.heart_rate.set(Some(HeartRateSample::new(60, 0)));
        drop(cells);

        assert_eq!(feed.next().await.map(|o| o.kind()), Some(StreamKind::HeartRate));
        assert_eq!(feed.next().await, None);
    }

    #[tokio::test]
    async fn test_ends_when_producers_drop_one_by_one() {
        let cells = Cells::new();
        let mut feed = cells.feed();
        let Cells {
            heart_rate,
            gyroscope,
            external,
            internal,
        } = cells;

        drop(heart_rate);
        gyroscope.set(None);
        internal.set(Some(ElevationSample::new(3.0, "t")));
        assert_eq!(
            feed.next().await.map(|o| o.kind()),
            Some(StreamKind::InternalElevation)
        );

        drop(gyroscope);
        drop(external);
        drop(internal);
        assert_eq!(feed.next().await, None);
        assert_eq!(feed.next().await, None);
    }

    #[test]
    fn test_display() {
        let observation = CombinedObservation::ExternalElevation(ElevationSample::new(
            12.34,
            "00:00:01.000",
        ));
        assert_eq!(
            observation.to_string(),
            "external-elevation: 12.3° at 00:00:01.000"
        );
    }
}
