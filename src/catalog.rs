use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::models::{OfflineStore, PriceComparison, Product};

pub const BRANDS: [&str; 8] = [
    "Uniqlo", "H&M", "Zara", "Nike", "Adidas", "Levis", "Gucci", "Gap",
];
pub const SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];

/// Demo stock flag: the denim jacket is always out of stock online.
const OUT_OF_STOCK_PRODUCT_ID: &str = "3";

/// Read-only product catalog plus the storefront's comparison data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    products: Vec<Product>,
    #[serde(default)]
    price_comparisons: Vec<PriceComparison>,
    #[serde(default)]
    offline_stores: Vec<OfflineStore>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::demo()
    }
}

impl Catalog {
    pub fn demo() -> Self {
        Self {
            products: vec![
                product(
                    "1",
                    "Classic Oxford Shirt",
                    "Topwear",
                    2499,
                    "Uniqlo",
                    "https://images.unsplash.com/photo-1598033129183-c4f50c736f10?auto=format&fit=crop&q=80&w=800",
                    "A crisp, light blue oxford shirt suitable for casual and semi-formal occasions.",
                ),
                product(
                    "2",
                    "Slim Fit Chinos",
                    "Bottomwear",
                    1999,
                    "H&M",
                    "https://images.unsplash.com/photo-1624378439575-d8705ad7ae80?auto=format&fit=crop&q=80&w=800",
                    "Beige slim fit chinos made from stretch cotton.",
                ),
                product(
                    "3",
                    "Denim Jacket",
                    "Outerwear",
                    3499,
                    "Levis",
                    "https://images.unsplash.com/photo-1611312449408-fcece27cdbb7?auto=format&fit=crop&q=80&w=800",
                    "Classic rugged denim jacket.",
                ),
                product(
                    "4",
                    "Floral Summer Dress",
                    "Dresses",
                    2999,
                    "Zara",
                    "https://images.unsplash.com/photo-1572804013309-59a88b7e92f1?auto=format&fit=crop&q=80&w=800",
                    "Lightweight floral dress perfect for summer outings.",
                ),
            ],
            price_comparisons: vec![
                offer("StyleSync", 2499, 2, true, "✨"),
                offer("Amazon", 2350, 5, true, "📦"),
                offer("Myntra", 2600, 1, true, "Ⓜ️"),
                offer("Ajio", 2450, 3, false, "🅰️"),
            ],
            offline_stores: vec![
                OfflineStore {
                    name: "Fashion Hub Mall".into(),
                    distance: "1.2 km".into(),
                    address: "123 Market St, Downtown".into(),
                    phone: "+91 98765 43210".into(),
                },
                OfflineStore {
                    name: "City Center Outlet".into(),
                    distance: "3.5 km".into(),
                    address: "45 Avenue Block B".into(),
                    phone: "+91 98765 12345".into(),
                },
            ],
        }
    }

    /// Loads a catalog from a JSON file. The file must list at least one product.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
        let catalog: Catalog = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
        if catalog.products.is_empty() {
            bail!("catalog {} has no products", path.display());
        }
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Unknown ids fall back to the first product, the way the detail page does.
    pub fn product_or_default(&self, id: &str) -> Option<&Product> {
        self.find(id).or_else(|| self.products.first())
    }

    pub fn price_comparisons(&self) -> &[PriceComparison] {
        &self.price_comparisons
    }

    pub fn offline_stores(&self) -> &[OfflineStore] {
        &self.offline_stores
    }

    pub fn is_out_of_stock(&self, product: &Product) -> bool {
        product.id == OUT_OF_STOCK_PRODUCT_ID
    }
}

/// Everything the product detail view shows besides the size checker result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub product: Product,
    pub offers: Vec<PriceComparison>,
    pub best_offer: Option<PriceComparison>,
    pub out_of_stock: bool,
    pub offline_stores: Vec<OfflineStore>,
    pub default_brand: String,
    pub default_size: String,
}

impl ProductDetail {
    pub fn for_product(catalog: &Catalog, id: &str) -> Option<Self> {
        let product = catalog.product_or_default(id)?.clone();
        let out_of_stock = catalog.is_out_of_stock(&product);
        let offers = catalog.price_comparisons().to_vec();
        // The highlighted offer is the lowest price listed, in stock or not.
        let best_offer = offers
            .iter()
            .min_by_key(|o| (o.price, o.delivery_days))
            .cloned();
        let offline_stores = if out_of_stock {
            catalog.offline_stores().to_vec()
        } else {
            Vec::new()
        };

        Some(Self {
            product,
            offers,
            best_offer,
            out_of_stock,
            offline_stores,
            default_brand: BRANDS[0].to_string(),
            default_size: SIZES[2].to_string(),
        })
    }
}

/// Downloads a product image for use as an overlay garment.
pub async fn fetch_product_image(client: &reqwest::Client, url: &str) -> Result<DynamicImage> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch product image {url}"))?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "product image {url} returned status {}",
            response.status()
        ));
    }
    let bytes = response
        .bytes()
        .await
        .context("failed to read product image body")?;
    image::load_from_memory(&bytes).with_context(|| format!("failed to decode product image {url}"))
}

fn product(
    id: &str,
    name: &str,
    category: &str,
    price: u32,
    brand: &str,
    image: &str,
    description: &str,
) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        price,
        image: image.into(),
        description: description.into(),
        brand: brand.into(),
    }
}

fn offer(platform: &str, price: u32, delivery_days: u32, in_stock: bool, logo: &str) -> PriceComparison {
    PriceComparison {
        platform: platform.into(),
        price,
        delivery_days,
        in_stock,
        logo: logo.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unknown_id_falls_back_to_first_product() {
        let catalog = Catalog::demo();
        assert_eq!(catalog.product_or_default("2").map(|p| p.name.as_str()), Some("Slim Fit Chinos"));
        assert_eq!(catalog.product_or_default("nope").map(|p| p.id.as_str()), Some("1"));
        assert!(catalog.find("nope").is_none());
    }

    #[test]
    fn detail_picks_cheapest_offer() {
        let detail = ProductDetail::for_product(&Catalog::demo(), "1").expect("detail");
        let best = detail.best_offer.expect("best offer");
        assert_eq!(best.platform, "Amazon");
        assert_eq!(detail.offers.len(), 4);
        assert!(!detail.out_of_stock);
        assert!(detail.offline_stores.is_empty());
        assert_eq!(detail.default_brand, "Uniqlo");
        assert_eq!(detail.default_size, "M");
    }

    #[test]
    fn cheapest_offer_wins_even_when_out_of_stock() {
        let mut catalog = Catalog::demo();
        catalog.price_comparisons = vec![
            offer("StyleSync", 2499, 2, true, "✨"),
            offer("Ajio", 1999, 3, false, "🅰️"),
            offer("Myntra", 1999, 1, false, "Ⓜ️"),
        ];
        let detail = ProductDetail::for_product(&catalog, "1").expect("detail");
        let best = detail.best_offer.expect("best offer");
        assert_eq!(best.platform, "Myntra");
        assert!(!best.in_stock);
    }

    #[test]
    fn out_of_stock_product_lists_offline_stores() {
        let detail = ProductDetail::for_product(&Catalog::demo(), "3").expect("detail");
        assert!(detail.out_of_stock);
        assert_eq!(detail.offline_stores.len(), 2);
        assert_eq!(detail.offline_stores[0].name, "Fashion Hub Mall");
    }

    #[test]
    fn loads_catalog_from_json() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"products":[{{"id":"x","name":"Linen Shirt","category":"Topwear","price":1500,
               "image":"https://example.com/x.jpg","description":"White linen","brand":"Gap"}}]}}"#
        )
        .expect("write");

        let catalog = Catalog::load(file.path()).expect("catalog");
        assert_eq!(catalog.products().len(), 1);
        assert!(catalog.price_comparisons().is_empty());
        assert_eq!(catalog.find("x").map(|p| p.brand.as_str()), Some("Gap"));
    }

    #[test]
    fn rejects_empty_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"products":[]}}"#).expect("write");
        assert!(Catalog::load(file.path()).is_err());
    }
}
