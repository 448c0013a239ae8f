use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use log::debug;

use super::{CameraDevice, VideoStream};
use crate::error::CaptureError;

/// Camera that renders a gradient test pattern. It keeps count of the
/// streams it has open so callers can verify release.
#[derive(Clone)]
pub struct TestPatternCamera {
    width: u32,
    height: u32,
    open_streams: Arc<AtomicUsize>,
    grants: Arc<AtomicUsize>,
    fail_reads: bool,
}

impl TestPatternCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            open_streams: Arc::new(AtomicUsize::new(0)),
            grants: Arc::new(AtomicUsize::new(0)),
            fail_reads: false,
        }
    }

    /// A camera whose frames can never be read, for exercising capture failure.
    pub fn with_failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    /// Total number of streams ever granted.
    pub fn grants(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }
}

impl Default for TestPatternCamera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

#[async_trait]
impl CameraDevice for TestPatternCamera {
    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        self.grants.fetch_add(1, Ordering::SeqCst);
        debug!("test pattern camera granted {}x{} stream", self.width, self.height);
        Ok(Box::new(TestPatternStream {
            width: self.width,
            height: self.height,
            open_streams: Arc::clone(&self.open_streams),
            stopped: false,
            fail_reads: self.fail_reads,
        }))
    }
}

struct TestPatternStream {
    width: u32,
    height: u32,
    open_streams: Arc<AtomicUsize>,
    stopped: bool,
    fail_reads: bool,
}

impl VideoStream for TestPatternStream {
    fn read_frame(&mut self) -> Result<RgbaImage, CaptureError> {
        if self.stopped {
            return Err(CaptureError::EncodingFailure("stream is stopped".into()));
        }
        if self.fail_reads || self.width == 0 || self.height == 0 {
            return Err(CaptureError::EncodingFailure("no video frame available".into()));
        }
        let (w, h) = (self.width, self.height);
        Ok(RgbaImage::from_fn(w, h, |x, y| {
            let r = (x * 255 / w.max(1)) as u8;
            let g = (y * 255 / h.max(1)) as u8;
            Rgba([r, g, 128, 255])
        }))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for TestPatternStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A device that always denies access.
#[derive(Debug, Clone, Default)]
pub struct UnavailableCamera {
    reason: Option<String>,
}

impl UnavailableCamera {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
impl CameraDevice for UnavailableCamera {
    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        Err(CaptureError::DeviceUnavailable(
            self.reason
                .clone()
                .unwrap_or_else(|| "no video input device".into()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ActiveStream;

    #[tokio::test]
    async fn active_stream_releases_on_drop() {
        let camera = TestPatternCamera::new(8, 4);
        {
            let stream = ActiveStream::new(camera.acquire().await.expect("stream"));
            assert!(stream.is_live());
            assert_eq!(camera.open_streams(), 1);
        }
        assert_eq!(camera.open_streams(), 0);
        assert_eq!(camera.grants(), 1);
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let camera = TestPatternCamera::new(8, 4);
        let mut stream = ActiveStream::new(camera.acquire().await.expect("stream"));
        let frame = stream.read_frame().expect("frame");
        assert_eq!(frame.dimensions(), (8, 4));

        stream.release();
        stream.release();
        assert!(!stream.is_live());
        assert_eq!(camera.open_streams(), 0);
        assert!(stream.read_frame().is_err());
    }

    #[tokio::test]
    async fn unavailable_camera_denies() {
        let err = UnavailableCamera::new("permission denied")
            .acquire()
            .await
            .err()
            .expect("denied");
        assert!(matches!(err, CaptureError::DeviceUnavailable(reason) if reason == "permission denied"));
    }
}
