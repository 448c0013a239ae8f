//! Camera seam for the capture flow.
//!
//! A [`CameraDevice`] hands out at most one [`VideoStream`] per grant. The
//! controller wraps every granted stream in an [`ActiveStream`], which stops
//! the underlying device when released or dropped.

pub mod synthetic;

pub use synthetic::{TestPatternCamera, UnavailableCamera};

use async_trait::async_trait;
use image::RgbaImage;

use crate::error::CaptureError;

#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Requests exclusive access to a video input. Permission denial or a
    /// missing device is reported as [`CaptureError::DeviceUnavailable`].
    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CaptureError>;
}

pub trait VideoStream: Send {
    /// Reads the frame currently shown by the stream.
    fn read_frame(&mut self) -> Result<RgbaImage, CaptureError>;

    /// Stops all tracks. Must be safe to call more than once.
    fn stop(&mut self);
}

/// Owning handle around a live stream.
pub struct ActiveStream {
    inner: Option<Box<dyn VideoStream>>,
}

impl ActiveStream {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self {
            inner: Some(stream),
        }
    }

    pub fn read_frame(&mut self) -> Result<RgbaImage, CaptureError> {
        match self.inner.as_mut() {
            Some(stream) => stream.read_frame(),
            None => Err(CaptureError::EncodingFailure(
                "camera stream already released".into(),
            )),
        }
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.inner.take() {
            stream.stop();
        }
    }

    pub fn is_live(&self) -> bool {
        self.inner.is_some()
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.release();
    }
}
