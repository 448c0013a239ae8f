use std::{io::Cursor, sync::Arc};

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Serialize;

use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FrameSource {
    Camera,
    Upload,
}

/// An encoded still image held by the session after capture or upload.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    bytes: Arc<[u8]>,
    mime_type: &'static str,
    width: u32,
    height: u32,
    source: FrameSource,
    captured_at: DateTime<Utc>,
}

/// Serializable description of a [`CapturedFrame`], without the pixels.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
    pub source: FrameSource,
    pub captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    /// Encodes a raw camera frame as JPEG. Alpha is dropped.
    pub fn encode_camera_frame(frame: &RgbaImage) -> Result<Self, CaptureError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::EncodingFailure("empty video frame".into()));
        }
        let rgb = DynamicImage::ImageRgba8(frame.clone()).to_rgb8();
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .map_err(|err| CaptureError::EncodingFailure(err.to_string()))?;

        Ok(Self {
            bytes: bytes.into(),
            mime_type: ImageFormat::Jpeg.to_mime_type(),
            width,
            height,
            source: FrameSource::Camera,
            captured_at: Utc::now(),
        })
    }

    /// Accepts already-encoded image bytes as they are, after checking they decode.
    pub fn from_upload(bytes: Vec<u8>) -> Result<Self, CaptureError> {
        if bytes.is_empty() {
            return Err(CaptureError::InvalidImage("file is empty".into()));
        }
        let format = image::guess_format(&bytes)
            .map_err(|err| CaptureError::InvalidImage(err.to_string()))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|err| CaptureError::InvalidImage(err.to_string()))?;

        Ok(Self {
            bytes: bytes.into(),
            mime_type: format.to_mime_type(),
            width: decoded.width(),
            height: decoded.height(),
            source: FrameSource::Upload,
            captured_at: Utc::now(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn source(&self) -> FrameSource {
        self.source
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn decode(&self) -> Result<DynamicImage, CaptureError> {
        image::load_from_memory(&self.bytes).map_err(|err| CaptureError::InvalidImage(err.to_string()))
    }

    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            mime_type: self.mime_type.to_string(),
            width: self.width,
            height: self.height,
            byte_len: self.bytes.len(),
            source: self.source,
            captured_at: self.captured_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 60, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}
