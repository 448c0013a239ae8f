//! Product overlay compositing.
//!
//! The garment is drawn `300 × scale` pixels wide, centred horizontally, with
//! its top edge at `vertical_position`% of the frame height minus a fixed
//! 150 px offset, at 90% opacity. Composition is a pure function of its inputs.

use image::{imageops, DynamicImage, RgbaImage};
use serde::Serialize;

use super::frame::CapturedFrame;
use crate::{error::CaptureError, models::Product, settings::OverlayBounds};

pub const GARMENT_BASE_WIDTH_PX: f32 = 300.0;
pub const GARMENT_TOP_OFFSET_PX: f32 = 150.0;
pub const GARMENT_OPACITY: f32 = 0.9;

/// Values only change through the clamping setters.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayParameters {
    scale: f32,
    vertical_position: f32,
    #[serde(skip)]
    bounds: OverlayBounds,
}

impl Default for OverlayParameters {
    fn default() -> Self {
        Self::new(OverlayBounds::default())
    }
}

impl OverlayParameters {
    pub fn new(bounds: OverlayBounds) -> Self {
        let mut params = Self {
            scale: bounds.min_scale,
            vertical_position: bounds.min_position,
            bounds,
        };
        params.set_scale(bounds.default_scale);
        params.set_vertical_position(bounds.default_position);
        params
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn vertical_position(&self) -> f32 {
        self.vertical_position
    }

    pub fn bounds(&self) -> &OverlayBounds {
        &self.bounds
    }

    /// Clamps into `[min_scale, max_scale]`. NaN is ignored.
    pub fn set_scale(&mut self, value: f32) -> f32 {
        if !value.is_nan() {
            self.scale = value.max(self.bounds.min_scale).min(self.bounds.max_scale);
        }
        self.scale
    }

    /// Clamps into `[min_position, max_position]`. NaN is ignored.
    pub fn set_vertical_position(&mut self, value: f32) -> f32 {
        if !value.is_nan() {
            self.vertical_position = value
                .max(self.bounds.min_position)
                .min(self.bounds.max_position);
        }
        self.vertical_position
    }
}

/// Where the scaled garment lands on the base frame. Offsets may be negative
/// or run past the frame edge; drawing clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub fn placement(
    base: (u32, u32),
    garment: (u32, u32),
    params: &OverlayParameters,
) -> Option<Placement> {
    let (base_w, base_h) = base;
    let (garment_w, garment_h) = garment;
    if garment_w == 0 || garment_h == 0 {
        return None;
    }
    let width = (GARMENT_BASE_WIDTH_PX * params.scale()).round().max(1.0) as u32;
    let height = ((garment_h as f64 * width as f64 / garment_w as f64).round() as u32).max(1);
    let x = (base_w as i64 - width as i64) / 2;
    let y = (base_h as f32 * params.vertical_position() / 100.0 - GARMENT_TOP_OFFSET_PX).round() as i64;
    Some(Placement {
        x,
        y,
        width,
        height,
    })
}

pub fn compose(base: &RgbaImage, garment: &RgbaImage, params: &OverlayParameters) -> RgbaImage {
    let mut out = base.clone();
    let Some(spot) = placement(base.dimensions(), garment.dimensions(), params) else {
        return out;
    };
    let mut scaled = imageops::resize(garment, spot.width, spot.height, imageops::FilterType::Triangle);
    for pixel in scaled.pixels_mut() {
        pixel.0[3] = (pixel.0[3] as f32 * GARMENT_OPACITY).round() as u8;
    }
    imageops::overlay(&mut out, &scaled, spot.x, spot.y);
    out
}

/// What the try-on view composites: the still, the product and the live parameters.
#[derive(Debug, Clone)]
pub struct OverlayScene {
    pub frame: CapturedFrame,
    pub product: Product,
    pub params: OverlayParameters,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRenderer;

impl OverlayRenderer {
    pub fn render(
        &self,
        frame: &CapturedFrame,
        garment: &DynamicImage,
        params: &OverlayParameters,
    ) -> Result<RgbaImage, CaptureError> {
        let base = frame.decode()?.to_rgba8();
        Ok(compose(&base, &garment.to_rgba8(), params))
    }

    pub fn render_scene(&self, scene: &OverlayScene, garment: &DynamicImage) -> Result<RgbaImage, CaptureError> {
        self.render(&scene.frame, garment, &scene.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn parameters_clamp_to_bounds() {
        let mut params = OverlayParameters::default();
        assert_eq!(params.scale(), 1.0);
        assert_eq!(params.vertical_position(), 50.0);

        assert_eq!(params.set_scale(0.1), 0.5);
        assert_eq!(params.set_scale(7.5), 2.0);
        assert_eq!(params.set_scale(f32::INFINITY), 2.0);
        assert_eq!(params.set_scale(f32::NAN), 2.0);
        assert_eq!(params.set_scale(1.3), 1.3);

        assert_eq!(params.set_vertical_position(-40.0), 10.0);
        assert_eq!(params.set_vertical_position(120.0), 90.0);
        assert_eq!(params.set_vertical_position(f32::NAN), 90.0);
        assert_eq!(params.set_vertical_position(33.0), 33.0);
    }

    #[test]
    fn serializes_only_the_live_values() {
        let mut params = OverlayParameters::default();
        params.set_scale(1.25);
        let json = serde_json::to_value(params).expect("json");
        assert_eq!(json, serde_json::json!({ "scale": 1.25, "verticalPosition": 50.0 }));
    }

    #[test]
    fn out_of_range_defaults_are_clamped() {
        let bounds = OverlayBounds {
            default_scale: 5.0,
            default_position: 0.0,
            ..OverlayBounds::default()
        };
        let params = OverlayParameters::new(bounds);
        assert_eq!(params.scale(), 2.0);
        assert_eq!(params.vertical_position(), 10.0);
    }

    #[test]
    fn placement_centres_and_offsets() {
        let params = OverlayParameters::default();
        let spot = placement((1000, 800), (600, 300), &params).expect("placement");
        assert_eq!(spot, Placement { x: 350, y: 250, width: 300, height: 150 });

        let mut small = params;
        small.set_scale(0.5);
        small.set_vertical_position(10.0);
        let spot = placement((1000, 800), (600, 300), &small).expect("placement");
        assert_eq!(spot, Placement { x: 425, y: -70, width: 150, height: 75 });

        assert!(placement((1000, 800), (0, 10), &params).is_none());
    }

    #[test]
    fn compose_blends_garment_over_frame() {
        let base = RgbaImage::from_pixel(400, 400, Rgba([0, 0, 0, 255]));
        let garment = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let params = OverlayParameters::default();

        let out = compose(&base, &garment, &params);
        // Garment is 300x300 at (50, 50).
        let inside = out.get_pixel(200, 200);
        assert!(inside.0[0] > 200 && inside.0[0] < 255, "90% opacity blend, got {inside:?}");
        assert_eq!(out.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.dimensions(), base.dimensions());
    }

    #[test]
    fn compose_is_idempotent() {
        let base = RgbaImage::from_fn(120, 90, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        let garment = RgbaImage::from_fn(40, 60, |x, _| Rgba([255, x as u8, 0, 200]));
        let mut params = OverlayParameters::default();
        params.set_scale(0.5);
        params.set_vertical_position(80.0);

        let first = compose(&base, &garment, &params);
        let second = compose(&base, &garment, &params);
        assert_eq!(first, second);
        assert_ne!(first, base);
    }
}
