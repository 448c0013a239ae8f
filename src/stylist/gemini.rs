use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{prompts, GeneratedImage, StylistService};
use crate::{
    error::StylistError,
    models::{OutfitSuggestion, SizeMap},
    settings::StylistSettings,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const ERROR_SNIPPET_LEN: usize = 200;

/// Gemini `generateContent` client. Built once at startup from settings and
/// shared as `Arc<dyn StylistService>`.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    text_model: String,
    image_model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: &StylistSettings) -> Result<Self, StylistError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(StylistError::MissingCredential)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()
            .map_err(|err| StylistError::ServiceUnavailable(format!("http client: {err}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, StylistError> {
        let response = self
            .http
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StylistError::ServiceUnavailable(format!(
                "{model} returned {status}: {}",
                snippet(&body)
            )));
        }
        debug!("{model} responded with {} bytes", body.len());
        parse_response(&body)
    }
}

#[async_trait]
impl StylistService for GeminiClient {
    async fn analyze_try_on(
        &self,
        image_base64: &str,
        mime_type: &str,
        product_description: &str,
    ) -> Result<String, StylistError> {
        let request = GenerateContentRequest::new(vec![
            Part::inline(mime_type, image_base64),
            Part::text(prompts::try_on(product_description)),
        ]);
        Ok(self.generate(&self.text_model, &request).await?.text())
    }

    async fn recommend_outfit(
        &self,
        item_description: &str,
        style_context: &str,
    ) -> Result<Vec<OutfitSuggestion>, StylistError> {
        let request = GenerateContentRequest::new(vec![Part::text(prompts::outfit(
            item_description,
            style_context,
        ))])
        .with_system_instruction(prompts::STYLIST_SYSTEM_INSTRUCTION)
        .with_config(GenerationConfig::json(prompts::outfit_schema()));
        let text = self.generate(&self.text_model, &request).await?.text();
        parse_suggestions(&text)
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, StylistError> {
        let request = GenerateContentRequest::new(vec![Part::text(prompts::product_photo(prompt))])
            .with_config(GenerationConfig::square_image());
        self.generate(&self.image_model, &request)
            .await?
            .first_image()
            .ok_or_else(|| StylistError::MalformedResponse("No image data returned from model".into()))
    }

    async fn normalize_size(
        &self,
        source_brand: &str,
        source_size: &str,
        target_brand: &str,
    ) -> Result<SizeMap, StylistError> {
        let request = GenerateContentRequest::new(vec![Part::text(prompts::size(
            source_brand,
            source_size,
            target_brand,
        ))])
        .with_config(GenerationConfig::json(prompts::size_schema()));
        let text = self.generate(&self.text_model, &request).await?.text();
        parse_size_map(&text)
    }

    async fn location_trends(&self, location: &str) -> Result<String, StylistError> {
        let request = GenerateContentRequest::new(vec![Part::text(prompts::trends(location))]);
        Ok(self.generate(&self.text_model, &request).await?.text())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn new(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            system_instruction: None,
            generation_config: None,
        }
    }

    fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.system_instruction = Some(Content {
            parts: vec![Part::text(instruction)],
        });
        self
    }

    fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(default, skip_serializing)]
    thought: bool,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    fn inline(mime_type: &str, data: &str) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

impl GenerationConfig {
    fn json(schema: Value) -> Self {
        Self {
            response_mime_type: Some("application/json".into()),
            response_schema: Some(schema),
            ..Self::default()
        }
    }

    fn square_image() -> Self {
        Self {
            response_modalities: Some(vec!["TEXT".into(), "IMAGE".into()]),
            image_config: Some(ImageConfig {
                aspect_ratio: "1:1".into(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter())
            .into_iter()
            .flatten()
    }

    /// Concatenated non-thought text of the first candidate.
    fn text(&self) -> String {
        self.parts()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    fn first_image(&self) -> Option<GeneratedImage> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|data| !data.data.is_empty())
            .map(|data| GeneratedImage {
                mime_type: if data.mime_type.is_empty() {
                    "image/png".into()
                } else {
                    data.mime_type.clone()
                },
                data: data.data.clone(),
            })
    }
}

fn parse_response(body: &str) -> Result<GenerateContentResponse, StylistError> {
    serde_json::from_str(body)
        .map_err(|err| StylistError::MalformedResponse(format!("{err}: {}", snippet(body))))
}

fn parse_suggestions(text: &str) -> Result<Vec<OutfitSuggestion>, StylistError> {
    let text = if text.trim().is_empty() { "[]" } else { text };
    let mut suggestions: Vec<OutfitSuggestion> = serde_json::from_str(text)
        .map_err(|err| StylistError::MalformedResponse(format!("outfit suggestions: {err}")))?;
    for suggestion in &mut suggestions {
        suggestion.image_url.clear();
    }
    Ok(suggestions)
}

fn parse_size_map(text: &str) -> Result<SizeMap, StylistError> {
    serde_json::from_str(text)
        .map_err(|err| StylistError::MalformedResponse(format!("size map: {err}")))
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(ERROR_SNIPPET_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_skips_thoughts_and_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"thinking...","thought":true},
            {"text":"Great Match.\n"},
            {"text":"Colour suits you."}
        ]}}]}"#;
        let response = parse_response(body).expect("response");
        assert_eq!(response.text(), "Great Match.\nColour suits you.");
    }

    #[test]
    fn missing_candidates_yield_empty_text() {
        let response = parse_response("{}").expect("response");
        assert_eq!(response.text(), "");
        assert!(response.first_image().is_none());
    }

    #[test]
    fn finds_inline_image_after_text() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"Here is your shirt"},
            {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}
        ]}}]}"#;
        let image = parse_response(body).expect("response").first_image().expect("image");
        assert_eq!(image.data_url(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = parse_response("<html>bad gateway</html>").err().expect("error");
        assert!(matches!(err, StylistError::MalformedResponse(_)));
    }

    #[test]
    fn parses_suggestions_and_clears_image_urls() {
        let text = r#"[{"itemName":"Slim-Fit Charcoal Chinos","category":"Bottomwear","color":"Charcoal",
            "reason":"Neutral base","price":2199,"imageUrl":"https://example.com/ignored.png"}]"#;
        let suggestions = parse_suggestions(text).expect("suggestions");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].item_name, "Slim-Fit Charcoal Chinos");
        assert_eq!(suggestions[0].price, 2199);
        assert!(suggestions[0].image_url.is_empty());
        assert_eq!(suggestions[0].image_prompt(), "Charcoal Slim-Fit Charcoal Chinos for Bottomwear");
    }

    #[test]
    fn empty_suggestion_text_is_an_empty_list() {
        assert!(parse_suggestions("  ").expect("suggestions").is_empty());
        assert!(parse_suggestions("{\"oops\":1}").is_err());
    }

    #[test]
    fn size_map_requires_all_fields() {
        let map = parse_size_map(
            r#"{"targetBrand":"Zara","recommendedSize":"L","confidence":0.82,"reasoning":"Zara runs small"}"#,
        )
        .expect("size map");
        assert_eq!(map.recommended_size, "L");
        assert!(parse_size_map("{}").is_err());
    }

    #[test]
    fn request_serializes_gemini_shape() {
        let request = GenerateContentRequest::new(vec![
            Part::inline("image/jpeg", "AAAA"),
            Part::text("hello"),
        ])
        .with_system_instruction("be nice")
        .with_config(GenerationConfig::json(prompts::size_schema()));
        let value = serde_json::to_value(&request).expect("json");

        assert_eq!(value["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(value["contents"][0]["parts"][1]["text"], "hello");
        assert!(value["contents"][0]["parts"][1].get("thought").is_none());
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be nice");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn client_requires_credential() {
        let settings = StylistSettings::default();
        assert!(matches!(
            GeminiClient::new(&settings).err(),
            Some(StylistError::MissingCredential)
        ));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let body = "é".repeat(ERROR_SNIPPET_LEN + 10);
        assert_eq!(snippet(&body).chars().count(), ERROR_SNIPPET_LEN);
    }
}
