//! The try-on session: camera capture with an auto-capture countdown, photo
//! upload, the product overlay and the fit verdict.

pub mod controller;
pub mod frame;
pub mod overlay;
pub mod state;
mod ticker;

pub use controller::TryOnController;
pub use frame::{CapturedFrame, FrameInfo, FrameSource};
pub use overlay::{compose, placement, OverlayParameters, OverlayRenderer, OverlayScene, Placement};
pub use state::{paragraphs, CapturePhase, TryOnSnapshot};
