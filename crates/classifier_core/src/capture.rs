//! Camera session lifecycle and one-shot frame capture.

use crate::camera::{CameraDevice, CameraProvider, Frame};
use crate::error::CameraError;
use crate::presenter::CameraRearm;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// A frame frozen for classification.
#[derive(Debug, Clone)]
pub struct StillImage {
    pub image: Frame,
    /// Generation of the session that produced the frame.
    pub session: u64,
}

/// Messages sent from the capture thread to the UI thread.
#[derive(Debug)]
pub enum CaptureEvent {
    Still(StillImage),
    Failed(CameraError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Captured,
    Discarded,
}

/// Per-session frame callback shared with the capture thread.
pub struct FrameHandler {
    session: u64,
    capture_requested: Arc<AtomicBool>,
    armed: AtomicBool,
    preview: Arc<Mutex<Option<Frame>>>,
    events: Sender<CaptureEvent>,
}

impl FrameHandler {
    pub fn new(
        session: u64,
        capture_requested: Arc<AtomicBool>,
        preview: Arc<Mutex<Option<Frame>>>,
        events: Sender<CaptureEvent>,
    ) -> Self {
        Self {
            session,
            capture_requested,
            armed: AtomicBool::new(true),
            preview,
            events,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Called once per streamed frame. Captures at most one frame per session.
    pub fn on_frame_available(&self, frame: Frame) -> FrameOutcome {
        if self.is_armed() && self.capture_requested.swap(false, Ordering::AcqRel) {
            self.armed.store(false, Ordering::Release);
            tracing::info!(
                session = self.session,
                "Captured still {}x{}",
                frame.width(),
                frame.height()
            );
            let still = StillImage {
                image: frame,
                session: self.session,
            };
            if self.events.send(CaptureEvent::Still(still)).is_err() {
                tracing::warn!("Capture receiver dropped; still discarded");
            }
            return FrameOutcome::Captured;
        }

        if let Ok(mut slot) = self.preview.lock() {
            *slot = Some(frame);
        }
        FrameOutcome::Discarded
    }

    fn fail(&self, err: CameraError) {
        if self.events.send(CaptureEvent::Failed(err)).is_err() {
            tracing::warn!("Capture receiver dropped; camera error discarded");
        }
    }
}

struct Session {
    running: Arc<AtomicBool>,
    handler: Arc<FrameHandler>,
    worker: JoinHandle<()>,
}

/// Owns the camera session and hands captured stills to the UI thread.
pub struct CaptureController<P> {
    provider: P,
    events: Sender<CaptureEvent>,
    capture_requested: Arc<AtomicBool>,
    preview: Arc<Mutex<Option<Frame>>>,
    generation: u64,
    session: Option<Session>,
}

impl<P: CameraProvider> CaptureController<P> {
    pub fn new(provider: P, events: Sender<CaptureEvent>) -> Self {
        Self {
            provider,
            events,
            capture_requested: Arc::new(AtomicBool::new(false)),
            preview: Arc::new(Mutex::new(None)),
            generation: 0,
            session: None,
        }
    }

    /// Acquire the default camera and start streaming on a fresh session.
    pub fn start_session(&mut self) -> Result<(), CameraError> {
        self.stop_session();
        let device = self.provider.open_default()?;
        self.capture_requested.store(false, Ordering::Release);
        if let Ok(mut slot) = self.preview.lock() {
            *slot = None;
        }
        self.generation += 1;

        let handler = Arc::new(FrameHandler::new(
            self.generation,
            Arc::clone(&self.capture_requested),
            Arc::clone(&self.preview),
            self.events.clone(),
        ));
        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let handler = Arc::clone(&handler);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name(format!("capture-session-{}", self.generation))
                .spawn(move || stream_frames(device, &handler, &running))
                .map_err(CameraError::Spawn)?
        };
        tracing::info!(session = self.generation, "Camera session started");
        self.session = Some(Session {
            running,
            handler,
            worker,
        });
        Ok(())
    }

    /// Ask the next streamed frame to be captured.
    ///
    /// Returns false when no armed session would observe the request.
    pub fn request_capture(&self) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.capture_requested.store(true, Ordering::Release);
        true
    }
}

impl<P> CaptureController<P> {
    /// Halt streaming and release the camera device.
    pub fn stop_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.running.store(false, Ordering::Release);
        if session.worker.join().is_err() {
            tracing::warn!("Capture thread panicked");
        }
        tracing::info!(session = self.generation, "Camera session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.handler.is_armed())
    }

    /// Number of sessions started so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `still` came from the session started last.
    pub fn is_current(&self, still: &StillImage) -> bool {
        still.session == self.generation
    }

    /// Take the most recent frame that was not captured.
    pub fn latest_preview(&self) -> Option<Frame> {
        self.preview.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl<P: CameraProvider> CameraRearm for CaptureController<P> {
    fn rearm_camera(&mut self) -> Result<(), CameraError> {
        self.stop_session();
        self.start_session()
    }
}

impl<P> Drop for CaptureController<P> {
    fn drop(&mut self) {
        self.stop_session();
    }
}

fn stream_frames(mut device: Box<dyn CameraDevice>, handler: &FrameHandler, running: &AtomicBool) {
    let mut discarded: u64 = 0;
    while running.load(Ordering::Acquire) {
        match device.next_frame() {
            Ok(frame) => {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                if handler.on_frame_available(frame) == FrameOutcome::Discarded {
                    discarded += 1;
                }
            }
            Err(err) => {
                tracing::error!("Camera {} failed: {}", device.name(), err);
                handler.fail(err);
                break;
            }
        }
    }
    tracing::debug!(discarded, "Released camera {}", device.name());
}
