use serde::Serialize;
use uuid::Uuid;

use super::{
    frame::{CapturedFrame, FrameInfo},
    overlay::OverlayParameters,
};
use crate::{camera::ActiveStream, error::CaptureError, models::Product, settings::OverlayBounds};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CapturePhase {
    #[default]
    Idle,
    Acquiring,
    Countdown(u32),
    Captured,
}

impl CapturePhase {
    pub fn is_camera_phase(&self) -> bool {
        matches!(self, CapturePhase::Acquiring | CapturePhase::Countdown(_))
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    Remaining(u32),
    Captured,
    Failed(CaptureError),
    /// The countdown this tick belonged to was cancelled or replaced.
    Stale,
}

/// Mutable state of one try-on session.
pub struct TryOnState {
    pub session_id: String,
    pub phase: CapturePhase,
    pub captured_frame: Option<CapturedFrame>,
    pub selected_product: Option<Product>,
    pub overlay: OverlayParameters,
    pub analysis: Option<String>,
    pub analyzing: bool,
    pub last_error: Option<String>,
    /// Bumped whenever in-flight camera or analysis work must be discarded.
    pub epoch: u64,
    stream: Option<ActiveStream>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnSnapshot {
    pub session_id: String,
    pub phase: CapturePhase,
    pub countdown_remaining: Option<u32>,
    pub camera_active: bool,
    pub frame: Option<FrameInfo>,
    pub selected_product: Option<Product>,
    pub overlay: OverlayParameters,
    pub analysis: Option<String>,
    pub analyzing: bool,
    pub can_analyze: bool,
    pub last_error: Option<String>,
}

impl TryOnState {
    pub fn new(bounds: OverlayBounds) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            phase: CapturePhase::Idle,
            captured_frame: None,
            selected_product: None,
            overlay: OverlayParameters::new(bounds),
            analysis: None,
            analyzing: false,
            last_error: None,
            epoch: 0,
            stream: None,
        }
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        match self.phase {
            CapturePhase::Countdown(n) => Some(n),
            _ => None,
        }
    }

    pub fn camera_active(&self) -> bool {
        self.stream.as_ref().is_some_and(ActiveStream::is_live)
    }

    pub fn can_analyze(&self) -> bool {
        self.captured_frame.is_some() && self.selected_product.is_some() && !self.analyzing
    }

    /// Enters `Acquiring`, dropping any previous still and verdict.
    pub fn begin_acquire(&mut self) -> Result<u64, CaptureError> {
        if self.phase.is_camera_phase() {
            return Err(CaptureError::AlreadyActive);
        }
        self.clear_results();
        self.epoch += 1;
        self.phase = CapturePhase::Acquiring;
        Ok(self.epoch)
    }

    /// Takes ownership of a granted stream and starts counting down from `ticks`.
    pub fn attach_stream(&mut self, stream: ActiveStream, ticks: u32) {
        self.release_stream();
        self.stream = Some(stream);
        self.phase = CapturePhase::Countdown(ticks);
    }

    pub fn fail_acquire(&mut self, err: &CaptureError) {
        self.release_stream();
        self.phase = CapturePhase::Idle;
        self.last_error = Some(err.user_message());
    }

    pub fn tick(&mut self, epoch: u64) -> TickOutcome {
        if epoch != self.epoch {
            return TickOutcome::Stale;
        }
        match self.phase {
            CapturePhase::Countdown(n) if n > 1 => {
                self.phase = CapturePhase::Countdown(n - 1);
                TickOutcome::Remaining(n - 1)
            }
            CapturePhase::Countdown(_) => {
                self.phase = CapturePhase::Countdown(0);
                match self.capture_frame() {
                    Ok(()) => TickOutcome::Captured,
                    Err(err) => TickOutcome::Failed(err),
                }
            }
            _ => TickOutcome::Stale,
        }
    }

    /// Reads one frame, releases the camera, then encodes and stores the still.
    /// The camera is released whether or not reading or encoding succeeds.
    pub fn capture_frame(&mut self) -> Result<(), CaptureError> {
        let raw = match self.stream.as_mut() {
            Some(stream) => stream.read_frame(),
            None => Err(CaptureError::EncodingFailure("no active camera stream".into())),
        };
        self.release_stream();

        match raw.and_then(|frame| CapturedFrame::encode_camera_frame(&frame)) {
            Ok(frame) => {
                self.captured_frame = Some(frame);
                self.phase = CapturePhase::Captured;
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.phase = CapturePhase::Idle;
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Aborts any camera work. Returns whether there was anything to abort.
    pub fn cancel_camera(&mut self) -> bool {
        if !self.phase.is_camera_phase() {
            return false;
        }
        self.release_stream();
        self.epoch += 1;
        self.phase = CapturePhase::Idle;
        true
    }

    /// Leaving the try-on view. The still and selection stay, but camera work
    /// stops and any verdict in flight becomes stale.
    pub fn leave(&mut self) {
        self.release_stream();
        self.epoch += 1;
        self.analyzing = false;
        if self.phase.is_camera_phase() {
            self.phase = CapturePhase::Idle;
        }
    }

    pub fn retake(&mut self) {
        self.release_stream();
        self.clear_results();
        self.epoch += 1;
        self.phase = CapturePhase::Idle;
    }

    pub fn store_upload(&mut self, frame: CapturedFrame) -> Result<(), CaptureError> {
        if self.phase.is_camera_phase() {
            return Err(CaptureError::AlreadyActive);
        }
        self.clear_results();
        self.epoch += 1;
        self.captured_frame = Some(frame);
        self.phase = CapturePhase::Captured;
        Ok(())
    }

    pub fn snapshot(&self) -> TryOnSnapshot {
        TryOnSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            countdown_remaining: self.countdown_remaining(),
            camera_active: self.camera_active(),
            frame: self.captured_frame.as_ref().map(CapturedFrame::info),
            selected_product: self.selected_product.clone(),
            overlay: self.overlay,
            analysis: self.analysis.clone(),
            analyzing: self.analyzing,
            can_analyze: self.can_analyze(),
            last_error: self.last_error.clone(),
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }

    fn clear_results(&mut self) {
        self.captured_frame = None;
        self.analysis = None;
        self.analyzing = false;
        self.last_error = None;
    }
}

/// Splits a verdict into display paragraphs, one per line.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}
