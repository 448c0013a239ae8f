pub mod outfit;
pub mod product;

pub use outfit::{OutfitSuggestion, SizeMap};
pub use product::{OfflineStore, PriceComparison, Product};
