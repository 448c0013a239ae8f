use std::{path::Path, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{
    frame::CapturedFrame,
    overlay::OverlayScene,
    state::{TryOnSnapshot, TryOnState},
    ticker::run_countdown,
};
use crate::{
    camera::{ActiveStream, CameraDevice},
    catalog::Catalog,
    error::CaptureError,
    models::Product,
    settings::Settings,
    stylist::Stylist,
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "stylesync::tryon";

use crate::{log_debug, log_error, log_info, log_warn};

/// A running countdown and the session epoch it counts for.
struct CountdownTask {
    epoch: u64,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl CountdownTask {
    fn stop(self) {
        self.cancel_token.cancel();
        self.handle.abort();
    }
}

/// Owns one try-on session: camera capture, upload, overlay parameters and
/// the fit verdict. Cloning shares the session.
///
/// Lock order is `state` then `countdown`. The countdown slot is only
/// touched while `state` is held, so a stop can never hit a newer countdown.
#[derive(Clone)]
pub struct TryOnController {
    state: Arc<Mutex<TryOnState>>,
    camera: Arc<dyn CameraDevice>,
    stylist: Stylist,
    catalog: Arc<Catalog>,
    countdown: Arc<Mutex<Option<CountdownTask>>>,
    countdown_secs: u32,
    tick_interval: Duration,
}

impl TryOnController {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        stylist: Stylist,
        catalog: Arc<Catalog>,
        settings: &Settings,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TryOnState::new(settings.overlay))),
            camera,
            stylist,
            catalog,
            countdown: Arc::new(Mutex::new(None)),
            countdown_secs: settings.capture.countdown_secs,
            tick_interval: Duration::from_millis(settings.capture.tick_ms),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stylist(&self) -> &Stylist {
        &self.stylist
    }

    pub async fn snapshot(&self) -> TryOnSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Opens the camera and starts the auto-capture countdown.
    pub async fn start_capture(&self) -> Result<TryOnSnapshot, CaptureError> {
        let epoch = {
            let mut state = self.state.lock().await;
            let epoch = state.begin_acquire()?;
            self.stop_countdown().await;
            epoch
        };

        // Acquisition settles in its own task, so a caller that gives up
        // cannot leave the session stuck in `Acquiring`.
        let this = self.clone();
        match tokio::spawn(async move { this.finish_acquire(epoch).await }).await {
            Ok(result) => result,
            Err(err) => {
                log_error!("camera acquisition task failed: {err}");
                let failure = CaptureError::DeviceUnavailable(err.to_string());
                let mut state = self.state.lock().await;
                if state.epoch == epoch {
                    state.fail_acquire(&failure);
                }
                Err(failure)
            }
        }
    }

    async fn finish_acquire(&self, epoch: u64) -> Result<TryOnSnapshot, CaptureError> {
        let granted = self.camera.acquire().await;

        let mut state = self.state.lock().await;
        let stream = match granted {
            Ok(stream) => ActiveStream::new(stream),
            Err(err) => {
                if state.epoch == epoch {
                    state.fail_acquire(&err);
                }
                log_warn!("camera acquisition failed: {err}");
                return Err(err);
            }
        };

        if state.epoch != epoch {
            // Cancelled while the device was being opened; dropping releases it.
            drop(stream);
            log_info!("capture {epoch} cancelled during acquisition");
            return Err(CaptureError::Cancelled);
        }

        state.attach_stream(stream, self.countdown_secs);
        if self.countdown_secs == 0 {
            state.capture_frame()?;
            log_info!("frame captured without countdown");
            return Ok(state.snapshot());
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_countdown(
            Arc::clone(&self.state),
            epoch,
            self.tick_interval,
            cancel_token.clone(),
        ));
        let task = CountdownTask {
            epoch,
            cancel_token,
            handle,
        };
        if let Some(previous) = self.countdown.lock().await.replace(task) {
            previous.stop();
        }

        log_info!(
            "countdown {epoch} started: {} ticks of {:?}",
            self.countdown_secs,
            self.tick_interval
        );
        Ok(state.snapshot())
    }

    /// Aborts an acquisition or countdown. No-op otherwise.
    pub async fn cancel(&self) -> TryOnSnapshot {
        let mut state = self.state.lock().await;
        if state.cancel_camera() {
            log_info!("capture cancelled");
        }
        self.stop_countdown().await;
        state.snapshot()
    }

    /// Called when the try-on view goes away. Camera work stops and a
    /// verdict still in flight is discarded when it arrives.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.leave();
        self.stop_countdown().await;
        log_info!("session {} left", state.session_id);
    }

    pub async fn retake(&self) -> TryOnSnapshot {
        let mut state = self.state.lock().await;
        state.retake();
        self.stop_countdown().await;
        state.snapshot()
    }

    pub async fn upload_frame(&self, bytes: Vec<u8>) -> Result<TryOnSnapshot, CaptureError> {
        let frame = CapturedFrame::from_upload(bytes)?;
        let mut state = self.state.lock().await;
        state.store_upload(frame)?;
        Ok(state.snapshot())
    }

    pub async fn upload_file(&self, path: &Path) -> Result<TryOnSnapshot, CaptureError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| CaptureError::Io {
                path: path.display().to_string(),
                source,
            })?;
        self.upload_frame(bytes).await
    }

    pub async fn select_product(&self, id: &str) -> Result<Product, CaptureError> {
        let product = self
            .catalog
            .find(id)
            .cloned()
            .ok_or_else(|| CaptureError::UnknownProduct(id.to_string()))?;
        self.state.lock().await.selected_product = Some(product.clone());
        Ok(product)
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selected_product = None;
    }

    pub async fn set_overlay_scale(&self, scale: f32) -> f32 {
        self.state.lock().await.overlay.set_scale(scale)
    }

    pub async fn set_overlay_position(&self, position: f32) -> f32 {
        self.state.lock().await.overlay.set_vertical_position(position)
    }

    /// Everything needed to draw the try-on view, once both a frame and a
    /// product are present.
    pub async fn overlay_scene(&self) -> Option<OverlayScene> {
        let state = self.state.lock().await;
        Some(OverlayScene {
            frame: state.captured_frame.clone()?,
            product: state.selected_product.clone()?,
            params: state.overlay,
        })
    }

    /// Requests a fit verdict for the current frame and product. Returns
    /// `None` without a frame or product, while another analysis is running,
    /// or when the session moved on before the verdict arrived.
    pub async fn analyze(&self) -> Option<String> {
        let (epoch, image_base64, mime_type, product_name) = {
            let mut state = self.state.lock().await;
            if !state.can_analyze() {
                return None;
            }
            let frame = state.captured_frame.as_ref()?;
            let request = (
                state.epoch,
                frame.to_base64(),
                frame.mime_type().to_string(),
                state.selected_product.as_ref()?.name.clone(),
            );
            state.analyzing = true;
            state.analysis = None;
            request
        };

        // Runs detached so the flag is settled even if the caller goes away.
        let stylist = self.stylist.clone();
        let shared = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let verdict = stylist
                .analyze_try_on(&image_base64, &mime_type, &product_name)
                .await;
            let mut state = shared.lock().await;
            if state.epoch != epoch {
                log_info!("discarding verdict for superseded session epoch {epoch}");
                return None;
            }
            state.analyzing = false;
            state.analysis = Some(verdict.clone());
            Some(verdict)
        });

        match task.await {
            Ok(verdict) => verdict,
            Err(err) => {
                log_error!("analysis task failed: {err}");
                let mut state = self.state.lock().await;
                if state.epoch == epoch {
                    state.analyzing = false;
                }
                None
            }
        }
    }

    /// Must be called with `state` held.
    async fn stop_countdown(&self) {
        if let Some(task) = self.countdown.lock().await.take() {
            log_debug!("stopping countdown {}", task.epoch);
            task.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        camera::{TestPatternCamera, UnavailableCamera},
        stylist::OfflineStylist,
        tryon::{frame::png_bytes, CapturePhase},
    };

    fn controller(camera: Arc<dyn CameraDevice>, countdown_secs: u32) -> TryOnController {
        let mut settings = Settings::default();
        settings.capture.countdown_secs = countdown_secs;
        TryOnController::new(
            camera,
            Stylist::new(Arc::new(OfflineStylist)),
            Arc::new(Catalog::demo()),
            &settings,
        )
    }

    #[tokio::test]
    async fn unavailable_camera_returns_to_idle() {
        let ctl = controller(Arc::new(UnavailableCamera::default()), 3);
        let err = ctl.start_capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));

        let snap = ctl.snapshot().await;
        assert_eq!(snap.phase, CapturePhase::Idle);
        assert!(!snap.camera_active);
        assert_eq!(
            snap.last_error.as_deref(),
            Some("Could not access camera. Please allow permissions.")
        );
    }

    #[tokio::test]
    async fn zero_countdown_captures_immediately() {
        let camera = TestPatternCamera::new(32, 24);
        let ctl = controller(Arc::new(camera.clone()), 0);

        let snap = ctl.start_capture().await.expect("capture");
        assert_eq!(snap.phase, CapturePhase::Captured);
        let frame = snap.frame.expect("frame");
        assert_eq!(frame.mime_type, "image/jpeg");
        assert_eq!((frame.width, frame.height), (32, 24));
        assert_eq!(camera.open_streams(), 0);
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_counting() {
        let ctl = controller(Arc::new(TestPatternCamera::default()), 5);
        ctl.start_capture().await.expect("first");
        assert!(matches!(
            ctl.start_capture().await,
            Err(CaptureError::AlreadyActive)
        ));
        ctl.cancel().await;
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let ctl = controller(Arc::new(TestPatternCamera::default()), 3);
        assert!(matches!(
            ctl.select_product("missing").await,
            Err(CaptureError::UnknownProduct(id)) if id == "missing"
        ));
        let product = ctl.select_product("2").await.expect("product");
        assert_eq!(product.name, "Slim Fit Chinos");
        ctl.clear_selection().await;
        assert!(ctl.snapshot().await.selected_product.is_none());
    }

    #[tokio::test]
    async fn overlay_scene_needs_frame_and_product() {
        let ctl = controller(Arc::new(TestPatternCamera::default()), 3);
        assert!(ctl.overlay_scene().await.is_none());

        ctl.upload_frame(png_bytes(8, 8)).await.expect("upload");
        assert!(ctl.overlay_scene().await.is_none());

        ctl.select_product("1").await.expect("product");
        assert_eq!(ctl.set_overlay_scale(9.0).await, 2.0);
        let scene = ctl.overlay_scene().await.expect("scene");
        assert_eq!(scene.product.id, "1");
        assert_eq!(scene.params.scale(), 2.0);
    }
}
