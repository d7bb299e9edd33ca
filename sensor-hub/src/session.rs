//! Start/stop state machine of a single stream kind.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use common::errors::SourceError;
use common::traits::{Exporter, FromReadings, SampleProcessor, SampleSource};
use common::types::{ElevationSample, Generation, SensorKind, StreamEvent, StreamKind};
use publisher::{Listener, Observable};

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(Generation),
    /// The session was streaming already; nothing changed.
    AlreadyStreaming,
}

/// Receives the series of a session when it is stopped.
#[async_trait]
pub trait SeriesSink<T>: Send + Sync {
    async fn complete(&self, kind: StreamKind, series: Vec<T>);
}

/// Exports completed elevation series to a fixed destination.
#[derive(Clone)]
pub struct ExportTarget {
    exporter: Arc<dyn Exporter>,
    destination: String,
}

impl ExportTarget {
    pub fn new(exporter: Arc<dyn Exporter>, destination: &str) -> Self {
        Self {
            exporter,
            destination: destination.to_string(),
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

#[async_trait]
impl SeriesSink<ElevationSample> for ExportTarget {
    async fn complete(&self, kind: StreamKind, series: Vec<ElevationSample>) {
        match self.exporter.export(&series, &self.destination).await {
            Ok(path) => info!("{}: {} samples exported to {:?}", kind, series.len(), path),
            Err(e) => error!("{}: export to {} failed: {}", kind, self.destination, e),
        }
    }
}

/// Behaviour of a session beyond its processor.
pub struct SessionSettings<T> {
    pub sink: Option<Arc<dyn SeriesSink<T>>>,
    /// Drop the current value on stop instead of keeping the last one.
    pub clear_current_on_stop: bool,
}

impl<T> Default for SessionSettings<T> {
    fn default() -> Self {
        Self {
            sink: None,
            clear_current_on_stop: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Streaming {
        generation: Generation,
        listener_id: Uuid,
    },
}

struct SessionControl<P> {
    state: SessionState,
    processor: P,
    generation: Generation,
}

struct SessionInner<P: SampleProcessor> {
    kind: StreamKind,
    sensor: SensorKind,
    source: Arc<dyn SampleSource>,
    sink: Option<Arc<dyn SeriesSink<P::Output>>>,
    clear_current_on_stop: bool,
    control: Mutex<SessionControl<P>>,
    current: Observable<Option<P::Output>>,
    history: Observable<Vec<P::Output>>,
    streaming: Observable<bool>,
}

/// One stream kind: subscribes to a source, runs every sample through its
/// processor and publishes the results.
///
/// Each start opens a new [`Generation`]. Events are tagged with the generation
/// they were subscribed under and dropped unless it is still the active one, so a
/// late callback of a stopped session never reaches the next one. Events and
/// `stop` serialise on the same lock: once `stop` returns no further sample is
/// recorded.
pub struct StreamSession<P: SampleProcessor> {
    inner: Arc<SessionInner<P>>,
}

impl<P: SampleProcessor> Clone for StreamSession<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: SampleProcessor> StreamSession<P> {
    pub fn new(
        kind: StreamKind,
        source: Arc<dyn SampleSource>,
        processor: P,
        settings: SessionSettings<P::Output>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                kind,
                sensor: kind.sensor(),
                source,
                sink: settings.sink,
                clear_current_on_stop: settings.clear_current_on_stop,
                control: Mutex::new(SessionControl {
                    state: SessionState::Idle,
                    processor,
                    generation: Generation::default(),
                }),
                current: Observable::new(None),
                history: Observable::new(Vec::new()),
                streaming: Observable::new(false),
            }),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.inner.kind
    }

    /// Subscribes to the source and starts recording a fresh series.
    ///
    /// A registration error leaves the session idle, with the previous series and
    /// generation untouched, and is returned.
    pub async fn start(&self, device_id: &str) -> Result<StartOutcome, SourceError> {
        let inner = &self.inner;
        let mut control = inner.control.lock().await;
        if let SessionState::Streaming { generation, .. } = control.state {
            warn!(
                "{}: already streaming ({}), ignoring start",
                inner.kind, generation
            );
            return Ok(StartOutcome::AlreadyStreaming);
        }

        // Events of the new generation wait on the held lock, so resetting after
        // registration still happens before the first sample.
        let generation = control.generation.next();
        let mut listener = self.listener(generation);
        let listener_id = match inner
            .source
            .register_listener(&mut listener, device_id, inner.sensor)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!("{}: could not subscribe to {}: {}", inner.kind, device_id, e);
                return Err(e);
            }
        };

        control.generation = generation;
        control.processor.reset();
        inner.history.set(Vec::new());
        control.state = SessionState::Streaming {
            generation,
            listener_id,
        };
        inner.streaming.set(true);
        info!(
            "{}: streaming {} from {} on {} ({})",
            inner.kind,
            inner.sensor,
            inner.source.get_tag(),
            device_id,
            generation
        );
        Ok(StartOutcome::Started(generation))
    }

    /// Ends the active stream and hands the series to the sink, if any.
    /// Returns `false` if the session was idle.
    pub async fn stop(&self) -> bool {
        self.stop_if(None).await
    }

    /// Like [`stop`](Self::stop), but only while `generation` is the one streaming.
    pub async fn stop_generation(&self, generation: Generation) -> bool {
        self.stop_if(Some(generation)).await
    }

    async fn stop_if(&self, expected: Option<Generation>) -> bool {
        let inner = &self.inner;
        let series = {
            let mut control = inner.control.lock().await;
            let SessionState::Streaming {
                generation,
                listener_id,
            } = control.state
            else {
                debug!("{}: not streaming, ignoring stop", inner.kind);
                return false;
            };
            if expected.is_some_and(|expected| expected != generation) {
                debug!(
                    "{}: {} is streaming, ignoring stop of {:?}",
                    inner.kind, generation, expected
                );
                return false;
            }

            inner.source.unregister_listener(listener_id).await;
            control.state = SessionState::Idle;
            inner.streaming.set(false);
            if inner.clear_current_on_stop {
                inner.current.set(None);
            }
            info!(
                "{}: stopped ({}) with {} samples",
                inner.kind,
                generation,
                inner.history.with(Vec::len)
            );
            inner.sink.as_ref().map(|_| inner.history.get())
        };

        if let (Some(sink), Some(series)) = (inner.sink.as_ref(), series) {
            sink.complete(inner.kind, series).await;
        }
        true
    }

    pub fn current(&self) -> Option<P::Output> {
        self.inner.current.get()
    }

    pub fn history(&self) -> Vec<P::Output> {
        self.inner.history.get()
    }

    pub fn is_streaming(&self) -> bool {
        self.inner.streaming.get()
    }

    /// Generation of the latest start, active or not.
    pub async fn generation(&self) -> Generation {
        self.inner.control.lock().await.generation
    }

    pub fn view(&self) -> StreamView<P::Output> {
        StreamView {
            current: self.inner.current.subscribe(),
            history: self.inner.history.subscribe(),
            streaming: self.inner.streaming.subscribe(),
        }
    }

    /// Feeds `event` as if delivered under `generation`.
    pub async fn on_event(&self, generation: Generation, event: &StreamEvent) {
        self.inner.on_event(generation, event).await;
    }

    fn listener(&self, generation: Generation) -> Listener<StreamEvent> {
        let session: Weak<SessionInner<P>> = Arc::downgrade(&self.inner);
        Listener::new(move |_id, event: Arc<StreamEvent>| {
            let session = session.clone();
            async move {
                if let Some(session) = session.upgrade() {
                    session.on_event(generation, &event).await;
                }
            }
        })
    }
}

impl<P: SampleProcessor> SessionInner<P> {
    async fn on_event(&self, generation: Generation, event: &StreamEvent) {
        let mut control = self.control.lock().await;
        let listener_id = match control.state {
            SessionState::Streaming {
                generation: active,
                listener_id,
            } if active == generation => listener_id,
            _ => {
                debug!("{}: dropping event of stale {}", self.kind, generation);
                return;
            }
        };

        match event {
            StreamEvent::Readings(readings) => {
                for input in <P::Input as FromReadings>::from_readings(readings) {
                    let output = control.processor.process(&input);
                    self.history.update(|history| history.push(output.clone()));
                    self.current.set(Some(output));
                }
            }
            StreamEvent::Failed(reason) => {
                error!("{}: stream failed: {}", self.kind, reason);
                self.end(&mut control, listener_id).await;
            }
            StreamEvent::Completed => {
                info!("{}: stream completed by source", self.kind);
                self.end(&mut control, listener_id).await;
            }
        }
    }

    /// Source-side termination. The partial series stays available but is not
    /// handed to the sink.
    async fn end(&self, control: &mut SessionControl<P>, listener_id: Uuid) {
        self.source.unregister_listener(listener_id).await;
        control.state = SessionState::Idle;
        self.streaming.set(false);
    }
}

/// Read-only handles on a session's published state.
#[derive(Debug, Clone)]
pub struct StreamView<T> {
    pub current: watch::Receiver<Option<T>>,
    pub history: watch::Receiver<Vec<T>>,
    pub streaming: watch::Receiver<bool>,
}

impl<T: Clone> StreamView<T> {
    pub fn current(&self) -> Option<T> {
        self.current.borrow().clone()
    }

    pub fn history(&self) -> Vec<T> {
        self.history.borrow().clone()
    }

    pub fn is_streaming(&self) -> bool {
        *self.streaming.borrow()
    }
}
