//! Session: the single task that owns the canvas [`Engine`].
//!
//! DESIGN
//! ======
//! Every mutation is a [`Command`] on one bounded queue, applied in arrival
//! order by one task. Work that must not block that task (image decode,
//! the prediction round-trip) runs elsewhere and re-enters the queue as a
//! completion command, so a finished decode can never interleave with a
//! half-applied pointer gesture.
//!
//! Uploads carry a generation number. A decode that completes after a newer
//! upload or a clear is dropped.
//!
//! Prediction export is guarded by an in-flight id: while a request is
//! outstanding, further prediction requests are rejected and the sink is
//! not invoked for them.

use std::sync::Arc;

use canvas::{Action, CanvasError, Engine, Key, Pixmap, Point, Rgb, Tool, WheelDelta, decode_image};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, trace, warn};
use uuid::Uuid;

use crate::predict::{Classifier, PredictionSignal, PredictionSink, predict};

const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session task has stopped.
    #[error("session closed")]
    Closed,

    /// A prediction request is already outstanding.
    #[error("export already in flight")]
    ExportInFlight,

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// A unit of work for the session task.
#[derive(Debug)]
pub enum Command {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    PointerLeave(Point),
    Wheel { at: Point, delta: WheelDelta },
    KeyDown(Key),
    SetTool(Tool),
    SetColor(Rgb),
    SetLineWidth(f64),
    ArmCrop,
    DisarmCrop,
    ZoomIn,
    ZoomOut,
    Clear,
    Resize { width: u32, height: u32 },
    /// Encoded image bytes to decode off-task and show once ready.
    UploadImage(Vec<u8>),
    /// Decode completion, posted by the session itself.
    ImageDecoded { generation: u64, result: Result<Pixmap, CanvasError> },
    ExportPng(oneshot::Sender<Result<Vec<u8>, SessionError>>),
    /// Start a prediction; replies with the request id once submitted.
    Predict(oneshot::Sender<Result<Uuid, SessionError>>),
    /// Prediction completion, posted by the session itself.
    PredictionSettled { request_id: Uuid, signal: PredictionSignal },
    /// Reply with a copy of the engine.
    Inspect(oneshot::Sender<Engine>),
}

/// Notifications from the session task to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Actions(Vec<Action>),
    ImageLoaded { width: u32, height: u32 },
    DecodeFailed { error: String },
    PredictionSettled(PredictionSignal),
}

/// Cloneable sender side of a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session task has stopped.
    pub async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    /// Encode the canvas as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] or the encode failure.
    pub async fn export_png(&self) -> Result<Vec<u8>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ExportPng(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Submit the canvas for prediction. The outcome arrives through the
    /// prediction sink and as [`SessionEvent::PredictionSettled`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ExportInFlight`] while a previous request is
    /// outstanding.
    pub async fn predict(&self) -> Result<Uuid, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Predict(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// A copy of the engine as of every command sent before this call.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session task has stopped.
    pub async fn engine(&self) -> Result<Engine, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Inspect(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// Spawn the session task. It runs until every [`SessionHandle`] is dropped
/// and no decode or prediction is pending.
pub fn spawn(
    engine: Engine,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn PredictionSink>,
    jpeg_quality: u8,
) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    let (events, events_rx) = mpsc::unbounded_channel();
    let session = Session {
        engine,
        classifier,
        sink,
        jpeg_quality,
        queue: tx.downgrade(),
        events,
        decode_generation: 0,
        in_flight: None,
    };
    let task = tokio::spawn(session.run(rx));
    (SessionHandle { tx }, events_rx, task)
}

/// Discard every event already queued on `events` without waiting.
///
/// Hosts that only care about some events call this between commands so the
/// unbounded channel does not grow with render notifications. Returns how
/// many events were dropped.
pub fn drain_pending(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> usize {
    let mut dropped = 0;
    while let Ok(event) = events.try_recv() {
        trace!(?event, "session event drained");
        dropped += 1;
    }
    dropped
}

struct Session {
    engine: Engine,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn PredictionSink>,
    jpeg_quality: u8,
    /// Weak, so the session stops once all external handles are gone.
    queue: mpsc::WeakSender<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    decode_generation: u64,
    in_flight: Option<Uuid>,
}

impl Session {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!(width = self.engine.buffer().width(), height = self.engine.buffer().height(), "session started");
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        info!("session stopped");
    }

    fn handle(&mut self, command: Command) {
        let actions = match command {
            Command::PointerDown(pt) => self.engine.on_pointer_down(pt),
            Command::PointerMove(pt) => self.engine.on_pointer_move(pt),
            Command::PointerUp(pt) => self.engine.on_pointer_up(pt),
            Command::PointerLeave(pt) => self.engine.on_pointer_leave(pt),
            Command::Wheel { at, delta } => self.engine.on_wheel(at, delta),
            Command::KeyDown(key) => self.engine.on_key_down(&key),
            Command::SetTool(tool) => {
                self.engine.set_tool(tool);
                Vec::new()
            }
            Command::SetColor(color) => {
                self.engine.set_color(color);
                Vec::new()
            }
            Command::SetLineWidth(width) => {
                self.engine.set_line_width(width);
                Vec::new()
            }
            Command::ArmCrop => {
                self.engine.arm_crop();
                Vec::new()
            }
            Command::DisarmCrop => {
                self.engine.disarm_crop();
                Vec::new()
            }
            Command::ZoomIn => self.engine.zoom_image_in(),
            Command::ZoomOut => self.engine.zoom_image_out(),
            Command::Clear => {
                // Pending decodes belong to the wiped canvas.
                self.decode_generation += 1;
                self.engine.clear()
            }
            Command::Resize { width, height } => match self.engine.resize(width, height) {
                Ok(actions) => actions,
                Err(e) => {
                    warn!(error = %e, width, height, "resize rejected");
                    Vec::new()
                }
            },
            Command::UploadImage(bytes) => {
                self.start_decode(bytes);
                Vec::new()
            }
            Command::ImageDecoded { generation, result } => self.finish_decode(generation, result),
            Command::ExportPng(reply) => {
                let png = self.engine.export_png().map_err(SessionError::from);
                if reply.send(png).is_err() {
                    debug!("png export requester went away");
                }
                Vec::new()
            }
            Command::Predict(reply) => {
                let started = self.start_prediction();
                if reply.send(started).is_err() {
                    debug!("prediction requester went away");
                }
                Vec::new()
            }
            Command::PredictionSettled { request_id, signal } => {
                if self.in_flight == Some(request_id) {
                    self.in_flight = None;
                }
                self.emit(SessionEvent::PredictionSettled(signal));
                Vec::new()
            }
            Command::Inspect(reply) => {
                if reply.send(self.engine.clone()).is_err() {
                    debug!("inspect requester went away");
                }
                Vec::new()
            }
        };
        if !actions.is_empty() {
            self.emit(SessionEvent::Actions(actions));
        }
    }

    fn start_decode(&mut self, bytes: Vec<u8>) {
        self.decode_generation += 1;
        let generation = self.decode_generation;
        let Some(queue) = self.queue.upgrade() else {
            return;
        };
        debug!(generation, bytes = bytes.len(), "decoding upload");
        tokio::spawn(async move {
            let result = match tokio::task::spawn_blocking(move || decode_image(&bytes)).await {
                Ok(result) => result,
                Err(e) => Err(CanvasError::Decode(e.to_string())),
            };
            if queue.send(Command::ImageDecoded { generation, result }).await.is_err() {
                debug!(generation, "session closed before decode completed");
            }
        });
    }

    fn finish_decode(&mut self, generation: u64, result: Result<Pixmap, CanvasError>) -> Vec<Action> {
        if generation != self.decode_generation {
            debug!(generation, current = self.decode_generation, "stale decode dropped");
            return Vec::new();
        }
        match result {
            Ok(bitmap) => {
                let (width, height) = (bitmap.width(), bitmap.height());
                info!(width, height, "image uploaded");
                self.emit(SessionEvent::ImageLoaded { width, height });
                self.engine.upload_image(bitmap)
            }
            Err(e) => {
                warn!(error = %e, "image decode failed");
                self.emit(SessionEvent::DecodeFailed { error: e.to_string() });
                Vec::new()
            }
        }
    }

    fn start_prediction(&mut self) -> Result<Uuid, SessionError> {
        if let Some(request_id) = self.in_flight {
            warn!(%request_id, "prediction already in flight; request rejected");
            return Err(SessionError::ExportInFlight);
        }
        let payload = self.engine.export_jpeg(self.jpeg_quality)?;
        let queue = self.queue.upgrade().ok_or(SessionError::Closed)?;
        let request_id = Uuid::new_v4();
        self.in_flight = Some(request_id);
        info!(%request_id, bytes = payload.len(), "prediction export started");

        let classifier = Arc::clone(&self.classifier);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(
            async move {
                let signal = predict(classifier.as_ref(), payload, sink.as_ref()).await;
                if queue.send(Command::PredictionSettled { request_id, signal }).await.is_err() {
                    debug!("session closed before prediction settled");
                }
            }
            .instrument(info_span!("predict", %request_id)),
        );
        Ok(request_id)
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("no session event listener");
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
