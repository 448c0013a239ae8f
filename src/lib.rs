pub mod camera;
pub mod catalog;
pub mod error;
pub mod models;
pub mod outfit;
pub mod settings;
pub mod stylist;
pub mod tryon;
#[macro_use]
pub mod utils;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};

use camera::{CameraDevice, UnavailableCamera};
use catalog::{fetch_product_image, Catalog, ProductDetail};
use error::StylistError;
use outfit::OutfitMaker;
use settings::Settings;
use stylist::{GeminiClient, OfflineStylist, Stylist};
use tryon::{paragraphs, OverlayRenderer, TryOnController};

/// Everything a front end needs, wired from one [`Settings`].
pub struct AppState {
    pub settings: Settings,
    pub catalog: Arc<Catalog>,
    pub stylist: Stylist,
    pub try_on: TryOnController,
    pub outfits: OutfitMaker,
}

impl AppState {
    pub fn new(settings: Settings, camera: Arc<dyn CameraDevice>) -> Result<Self> {
        let catalog = match &settings.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::demo(),
        };
        let catalog = Arc::new(catalog);
        let stylist = build_stylist(&settings)?;
        let try_on = TryOnController::new(camera, stylist.clone(), Arc::clone(&catalog), &settings);
        let outfits = OutfitMaker::new(stylist.clone());

        Ok(Self {
            settings,
            catalog,
            stylist,
            try_on,
            outfits,
        })
    }
}

fn build_stylist(settings: &Settings) -> Result<Stylist> {
    match GeminiClient::new(&settings.stylist) {
        Ok(client) => Ok(Stylist::new(Arc::new(client))),
        Err(StylistError::MissingCredential) => {
            warn!(
                "No API key configured ({}); stylist features will use fallbacks",
                settings::API_KEY_ENV
            );
            Ok(Stylist::new(Arc::new(OfflineStylist)))
        }
        Err(err) => Err(err).context("Failed to build stylist client"),
    }
}

/// Headless entry point: `stylesync [photo] [product-id] [overlay-out]`.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("StyleSync starting up...");

    let settings = Settings::load_default()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let state = AppState::new(settings, Arc::new(UnavailableCamera::default()))?;
        match args.first() {
            None => print_catalog(&state),
            Some(photo) => {
                let overlay_out = args.get(2).map(PathBuf::from);
                try_on_photo(&state, photo, args.get(1).map(String::as_str), overlay_out).await?
            }
        }
        Ok(())
    })
}

fn print_catalog(state: &AppState) {
    for product in state.catalog.products() {
        let stock = if state.catalog.is_out_of_stock(product) {
            " (out of stock online)"
        } else {
            ""
        };
        println!(
            "{:>3}  {:<24} {:<10} {}{}",
            product.id,
            product.name,
            product.brand,
            product.display_price(),
            stock
        );
    }
}

async fn try_on_photo(
    state: &AppState,
    photo: &str,
    product_id: Option<&str>,
    overlay_out: Option<PathBuf>,
) -> Result<()> {
    let snapshot = state
        .try_on
        .upload_file(photo.as_ref())
        .await
        .with_context(|| format!("Failed to load photo {photo}"))?;
    info!("Session {} loaded {photo}", snapshot.session_id);

    let requested = product_id.unwrap_or_default();
    let product = state
        .catalog
        .product_or_default(requested)
        .context("Catalog has no products")?
        .clone();
    state.try_on.select_product(&product.id).await?;

    if let Some(detail) = ProductDetail::for_product(&state.catalog, &product.id) {
        if let Some(best) = &detail.best_offer {
            println!("{} - best price {} on {}", product.name, best.price, best.platform);
        }
    }

    if let Some(out) = overlay_out {
        render_overlay(state, &product.image, &out).await?;
    }

    if let Some(verdict) = state.try_on.analyze().await {
        for paragraph in paragraphs(&verdict) {
            println!("{paragraph}");
        }
    }
    Ok(())
}

async fn render_overlay(state: &AppState, image_url: &str, out: &std::path::Path) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(state.settings.stylist.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let garment = fetch_product_image(&client, image_url).await?;
    let scene = state
        .try_on
        .overlay_scene()
        .await
        .context("Nothing to overlay yet")?;
    let composed = OverlayRenderer.render_scene(&scene, &garment)?;
    composed
        .save(out)
        .with_context(|| format!("Failed to write overlay to {}", out.display()))?;
    info!("Overlay written to {}", out.display());
    Ok(())
}
