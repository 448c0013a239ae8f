//! Boundary to the generative-AI stylist.
//!
//! [`StylistService`] is the raw request/response surface and reports every
//! failure. [`Stylist`] wraps a service for the UI-facing flows and turns
//! those failures into fixed fallback values.

pub mod dispatcher;
pub mod gemini;
pub mod prompts;

pub use dispatcher::{
    Stylist, FALLBACK_IMAGE_URL, TREND_EMPTY_TEXT, TREND_FALLBACK_TEXT, TRY_ON_EMPTY_TEXT,
    TRY_ON_FALLBACK_TEXT,
};
pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::StylistError,
    models::{OutfitSuggestion, SizeMap},
};

/// An image returned by the service, still base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[async_trait]
pub trait StylistService: Send + Sync {
    /// Free-text fit verdict for a photo of the user and a product description.
    async fn analyze_try_on(
        &self,
        image_base64: &str,
        mime_type: &str,
        product_description: &str,
    ) -> Result<String, StylistError>;

    async fn recommend_outfit(
        &self,
        item_description: &str,
        style_context: &str,
    ) -> Result<Vec<OutfitSuggestion>, StylistError>;

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, StylistError>;

    async fn normalize_size(
        &self,
        source_brand: &str,
        source_size: &str,
        target_brand: &str,
    ) -> Result<SizeMap, StylistError>;

    async fn location_trends(&self, location: &str) -> Result<String, StylistError>;
}

/// Stand-in used when no API credential is configured. Every call fails with
/// [`StylistError::MissingCredential`], so callers land on their fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStylist;

#[async_trait]
impl StylistService for OfflineStylist {
    async fn analyze_try_on(&self, _: &str, _: &str, _: &str) -> Result<String, StylistError> {
        Err(StylistError::MissingCredential)
    }

    async fn recommend_outfit(&self, _: &str, _: &str) -> Result<Vec<OutfitSuggestion>, StylistError> {
        Err(StylistError::MissingCredential)
    }

    async fn generate_image(&self, _: &str) -> Result<GeneratedImage, StylistError> {
        Err(StylistError::MissingCredential)
    }

    async fn normalize_size(&self, _: &str, _: &str, _: &str) -> Result<SizeMap, StylistError> {
        Err(StylistError::MissingCredential)
    }

    async fn location_trends(&self, _: &str) -> Result<String, StylistError> {
        Err(StylistError::MissingCredential)
    }
}
