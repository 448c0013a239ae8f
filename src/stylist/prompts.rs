use serde_json::{json, Value};

pub const STYLIST_SYSTEM_INSTRUCTION: &str =
    "You are a luxury fashion stylist specializing in modern aesthetics.";

pub fn try_on(product_description: &str) -> String {
    format!(
        "I have uploaded a photo of myself and I want to try on this item: {product_description}.\n\
         Analyze my skin tone, body shape, and current lighting from the photo.\n\
         1. Does this item's color suit my skin tone?\n\
         2. How would this style fit my body type based on the photo?\n\
         3. Give a honest verdict: \"Great Match\", \"Okay\", or \"Try something else\".\n\
         Keep it concise (max 3 bullet points)."
    )
}

pub fn outfit(item_description: &str, style_context: &str) -> String {
    format!(
        "You are a world-class AI fashion stylist.\n\
         The user is wearing: \"{item_description}\".\n\
         Style Context: \"{style_context}\".\n\n\
         Recommend 3 items (clothing and accessories) that would look incredible with this item.\n\n\
         For each item:\n\
         1. Provide a specific name (e.g., \"Slim-Fit Charcoal Chinos\").\n\
         2. Suggest a category (Topwear, Bottomwear, Shoes, Accessories).\n\
         3. Suggest a color that matches well.\n\
         4. Provide a style reason.\n\
         5. Provide a realistic price in INR.\n\n\
         Do NOT provide image URLs. The system will generate them separately."
    )
}

pub fn product_photo(subject: &str) -> String {
    format!(
        "A high-quality, professional commercial fashion product photograph of {subject}. \
         The item should be centered on a clean, minimalist studio background with soft lighting. \
         4k resolution, highly detailed fabric texture."
    )
}

pub fn size(source_brand: &str, source_size: &str, target_brand: &str) -> String {
    format!(
        "I wear size {source_size} in {source_brand}.\n\
         What size should I buy in {target_brand}?\n\
         Analyze the general sizing charts of these brands.\n\
         Return a single JSON object."
    )
}

pub fn trends(location: &str) -> String {
    format!(
        "What are the current fashion trends in {location}? \
         Keep it brief (max 2 sentences). Focus on seasonal wear."
    )
}

pub fn outfit_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "itemName": { "type": "STRING" },
                "category": { "type": "STRING" },
                "color": { "type": "STRING" },
                "reason": {
                    "type": "STRING",
                    "description": "Why this matches based on color theory and style."
                },
                "price": {
                    "type": "INTEGER",
                    "description": "Estimated price in Indian Rupees (INR)."
                }
            },
            "required": ["itemName", "category", "color", "reason", "price"]
        }
    })
}

pub fn size_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "targetBrand": { "type": "STRING" },
            "recommendedSize": { "type": "STRING" },
            "confidence": { "type": "NUMBER" },
            "reasoning": { "type": "STRING" }
        },
        "required": ["targetBrand", "recommendedSize", "confidence", "reasoning"]
    })
}
