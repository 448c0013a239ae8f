use serde::{Deserialize, Serialize};

/// One stylist recommendation. `image_url` starts empty and is filled in by
/// the per-slot image fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitSuggestion {
    pub item_name: String,
    pub category: String,
    pub color: String,
    pub reason: String,
    pub price: u32,
    #[serde(default)]
    pub image_url: String,
}

impl OutfitSuggestion {
    /// Prompt used to render a product shot for this suggestion.
    pub fn image_prompt(&self) -> String {
        format!("{} {} for {}", self.color, self.item_name, self.category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SizeMap {
    pub target_brand: String,
    pub recommended_size: String,
    pub confidence: f64,
    pub reasoning: String,
}

impl SizeMap {
    pub fn unknown(target_brand: &str) -> Self {
        Self {
            target_brand: target_brand.to_string(),
            recommended_size: "Unknown".into(),
            confidence: 0.0,
            reasoning: "Could not retrieve sizing data.".into(),
        }
    }
}
