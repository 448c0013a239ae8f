//! Outfit maker: one text request for suggestions, then one image request per
//! suggestion. Each image task owns exactly one slot of the board and reports
//! its own completion; there is no board-wide barrier and no retry.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::{
    error::{OutfitError, StylistError},
    models::OutfitSuggestion,
    stylist::{Stylist, StylistService, FALLBACK_IMAGE_URL},
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "stylesync::outfit";

use crate::{log_debug, log_error, log_info, log_warn};

pub const DEFAULT_STYLE_CONTEXT: &str = "Casual summer vibes, high-end street style";

/// Quick-pick core garments.
pub const OUTFIT_PRESETS: [&str; 5] = [
    "White Linen Shirt",
    "Navy Blue Suit",
    "Black Leather Jacket",
    "Vintage Denim",
    "Beige Chinos",
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status", content = "imageUrl")]
pub enum SlotState {
    Loading,
    Ready(String),
    /// The image request failed. The slot keeps its placeholder.
    Unavailable,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitSlot {
    pub suggestion: OutfitSuggestion,
    pub state: SlotState,
}

impl OutfitSlot {
    pub fn shows_placeholder(&self) -> bool {
        !matches!(self.state, SlotState::Ready(_))
    }
}

/// Suggestions in the order the service returned them, with images arriving
/// independently.
pub struct OutfitBoard {
    slots: Arc<Mutex<Vec<OutfitSlot>>>,
    settled: Vec<watch::Receiver<bool>>,
}

impl OutfitBoard {
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<OutfitSlot> {
        self.slots.lock().await.clone()
    }

    pub fn is_slot_settled(&self, index: usize) -> bool {
        self.settled.get(index).is_some_and(|rx| *rx.borrow())
    }

    /// Waits for one slot's image request to finish and returns the slot.
    pub async fn wait_slot(&self, index: usize) -> Option<OutfitSlot> {
        let mut rx = self.settled.get(index)?.clone();
        // A dropped sender means the task is gone; the slot is final either way.
        let _ = rx.wait_for(|done| *done).await;
        self.slots.lock().await.get(index).cloned()
    }
}

#[derive(Clone)]
pub struct OutfitMaker {
    stylist: Stylist,
}

impl OutfitMaker {
    pub fn new(stylist: Stylist) -> Self {
        Self { stylist }
    }

    pub async fn generate(
        &self,
        item_description: &str,
        style_context: &str,
    ) -> Result<OutfitBoard, OutfitError> {
        let item = item_description.trim();
        if item.is_empty() {
            return Err(OutfitError::EmptyDescription);
        }

        let suggestions = self.stylist.recommend_outfit(item, style_context).await;
        if suggestions.is_empty() {
            log_warn!("no suggestions for '{item}'");
            return Err(OutfitError::NoRecommendations);
        }
        log_info!("{} suggestions for '{item}', requesting images", suggestions.len());

        let prompts: Vec<String> = suggestions.iter().map(OutfitSuggestion::image_prompt).collect();
        let slots = Arc::new(Mutex::new(
            suggestions
                .into_iter()
                .map(|suggestion| OutfitSlot {
                    suggestion,
                    state: SlotState::Loading,
                })
                .collect::<Vec<_>>(),
        ));

        let service = self.stylist.service();
        let mut settled = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.into_iter().enumerate() {
            let (done_tx, done_rx) = watch::channel(false);
            settled.push(done_rx);
            tokio::spawn(fill_slot(
                Arc::clone(&service),
                Arc::clone(&slots),
                index,
                prompt,
                done_tx,
            ));
        }

        Ok(OutfitBoard { slots, settled })
    }
}

async fn fill_slot(
    service: Arc<dyn StylistService>,
    slots: Arc<Mutex<Vec<OutfitSlot>>>,
    index: usize,
    prompt: String,
    done: watch::Sender<bool>,
) {
    let state = match service.generate_image(&prompt).await {
        Ok(image) => SlotState::Ready(image.data_url()),
        Err(StylistError::MalformedResponse(reason)) => {
            log_warn!("slot {index}: no image in response ({reason}), using stock photo");
            SlotState::Ready(FALLBACK_IMAGE_URL.to_string())
        }
        Err(err) => {
            log_error!("slot {index}: image generation failed: {err}");
            SlotState::Unavailable
        }
    };

    {
        let mut slots = slots.lock().await;
        if let Some(slot) = slots.get_mut(index) {
            if let SlotState::Ready(url) = &state {
                slot.suggestion.image_url = url.clone();
            }
            slot.state = state;
        }
    }
    log_debug!("slot {index} settled");
    let _ = done.send(true);
}
