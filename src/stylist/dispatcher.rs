use std::sync::Arc;

use super::StylistService;
use crate::models::{OutfitSuggestion, SizeMap};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "stylesync::stylist";

use crate::{log_error, log_warn};

pub const TRY_ON_FALLBACK_TEXT: &str = "Could not analyze image. Please try again.";
pub const TRY_ON_EMPTY_TEXT: &str = "Analysis complete.";
pub const TREND_FALLBACK_TEXT: &str = "Check out our latest collection!";
pub const TREND_EMPTY_TEXT: &str = "Unable to fetch trends.";
pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1523381235312-d083162383c3?auto=format&fit=crop&q=80&w=800";

/// UI-facing view of the stylist service. Every method resolves to something
/// displayable and logs the failure it papered over.
#[derive(Clone)]
pub struct Stylist {
    service: Arc<dyn StylistService>,
}

impl Stylist {
    pub fn new(service: Arc<dyn StylistService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> Arc<dyn StylistService> {
        Arc::clone(&self.service)
    }

    pub async fn analyze_try_on(
        &self,
        image_base64: &str,
        mime_type: &str,
        product_description: &str,
    ) -> String {
        match self
            .service
            .analyze_try_on(image_base64, mime_type, product_description)
            .await
        {
            Ok(text) if text.trim().is_empty() => TRY_ON_EMPTY_TEXT.to_string(),
            Ok(text) => text,
            Err(err) => {
                log_error!("try-on analysis failed for '{product_description}': {err}");
                TRY_ON_FALLBACK_TEXT.to_string()
            }
        }
    }

    pub async fn recommend_outfit(
        &self,
        item_description: &str,
        style_context: &str,
    ) -> Vec<OutfitSuggestion> {
        match self
            .service
            .recommend_outfit(item_description, style_context)
            .await
        {
            Ok(suggestions) => suggestions,
            Err(err) => {
                log_error!("outfit recommendation failed: {err}");
                Vec::new()
            }
        }
    }

    pub async fn normalize_size(
        &self,
        source_brand: &str,
        source_size: &str,
        target_brand: &str,
    ) -> SizeMap {
        match self
            .service
            .normalize_size(source_brand, source_size, target_brand)
            .await
        {
            Ok(map) => map,
            Err(err) => {
                log_warn!("size normalization {source_brand} {source_size} -> {target_brand} failed: {err}");
                SizeMap::unknown(target_brand)
            }
        }
    }

    pub async fn location_trends(&self, location: &str) -> String {
        match self.service.location_trends(location).await {
            Ok(text) if text.trim().is_empty() => TREND_EMPTY_TEXT.to_string(),
            Ok(text) => text,
            Err(err) => {
                log_warn!("trend lookup for {location} failed: {err}");
                TREND_FALLBACK_TEXT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::StylistError,
        stylist::{GeneratedImage, OfflineStylist},
    };
    use async_trait::async_trait;

    struct Canned {
        text: &'static str,
    }

    #[async_trait]
    impl StylistService for Canned {
        async fn analyze_try_on(&self, _: &str, _: &str, _: &str) -> Result<String, StylistError> {
            Ok(self.text.to_string())
        }

        async fn recommend_outfit(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<OutfitSuggestion>, StylistError> {
            Err(StylistError::MalformedResponse("not a list".into()))
        }

        async fn generate_image(&self, _: &str) -> Result<GeneratedImage, StylistError> {
            Err(StylistError::ServiceUnavailable("down".into()))
        }

        async fn normalize_size(&self, _: &str, _: &str, t: &str) -> Result<SizeMap, StylistError> {
            Ok(SizeMap {
                target_brand: t.to_string(),
                recommended_size: "L".into(),
                confidence: 0.9,
                reasoning: "runs small".into(),
            })
        }

        async fn location_trends(&self, _: &str) -> Result<String, StylistError> {
            Ok(self.text.to_string())
        }
    }

    #[tokio::test]
    async fn offline_service_lands_on_fallbacks() {
        let stylist = Stylist::new(Arc::new(OfflineStylist));
        assert_eq!(stylist.analyze_try_on("AAAA", "image/jpeg", "Denim Jacket").await, TRY_ON_FALLBACK_TEXT);
        assert!(stylist.recommend_outfit("Navy Blue Suit", "formal").await.is_empty());
        assert_eq!(stylist.location_trends("Mumbai").await, TREND_FALLBACK_TEXT);

        let size = stylist.normalize_size("Uniqlo", "M", "Zara").await;
        assert_eq!(size, SizeMap::unknown("Zara"));
        assert_eq!(size.confidence, 0.0);
        assert_eq!(size.reasoning, "Could not retrieve sizing data.");
    }

    #[tokio::test]
    async fn empty_text_gets_placeholder() {
        let stylist = Stylist::new(Arc::new(Canned { text: "   " }));
        assert_eq!(stylist.analyze_try_on("AAAA", "image/jpeg", "Shirt").await, TRY_ON_EMPTY_TEXT);
        assert_eq!(stylist.location_trends("Delhi").await, TREND_EMPTY_TEXT);
    }

    #[tokio::test]
    async fn successful_responses_pass_through() {
        let stylist = Stylist::new(Arc::new(Canned { text: "Great Match" }));
        assert_eq!(stylist.analyze_try_on("AAAA", "image/jpeg", "Shirt").await, "Great Match");
        assert_eq!(stylist.normalize_size("H&M", "S", "Gap").await.recommended_size, "L");
        assert!(stylist.recommend_outfit("Beige Chinos", "casual").await.is_empty());
    }
}
