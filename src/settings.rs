use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

pub const CONFIG_PATH_ENV: &str = "STYLESYNC_CONFIG";
pub const API_KEY_ENV: &str = "STYLESYNC_API_KEY";
const LEGACY_API_KEY_ENV: &str = "API_KEY";
const DEFAULT_CONFIG_FILE: &str = "stylesync.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylistSettings {
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for StylistSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            text_model: "gemini-3-flash-preview".into(),
            image_model: "gemini-2.5-flash-image".into(),
            request_timeout_secs: 30,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Auto-capture countdown length, in ticks.
    pub countdown_secs: u32,
    pub tick_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            countdown_secs: 8,
            tick_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayBounds {
    pub min_scale: f32,
    pub max_scale: f32,
    pub default_scale: f32,
    /// Vertical position bounds, in percent of the frame height.
    pub min_position: f32,
    pub max_position: f32,
    pub default_position: f32,
}

impl Default for OverlayBounds {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 2.0,
            default_scale: 1.0,
            min_position: 10.0,
            max_position: 90.0,
            default_position: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stylist: StylistSettings,
    pub capture: CaptureSettings,
    pub overlay: OverlayBounds,
    pub catalog_path: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from `STYLESYNC_CONFIG` (or `stylesync.json`) and applies
    /// environment overrides.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut settings = Self::from_file(&path)?;
        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Reads a settings file. A missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings {}", path.display()))
    }

    pub fn apply_env(&mut self) {
        let key = std::env::var(API_KEY_ENV)
            .or_else(|_| std::env::var(LEGACY_API_KEY_ENV))
            .ok()
            .filter(|value| !value.trim().is_empty());
        if key.is_some() {
            self.stylist.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let o = &self.overlay;
        if !(o.min_scale > 0.0 && o.min_scale <= o.max_scale) {
            bail!(
                "overlay scale bounds must satisfy 0 < min <= max (got {}..{})",
                o.min_scale,
                o.max_scale
            );
        }
        if !(o.min_position <= o.max_position) {
            bail!(
                "overlay position bounds must satisfy min <= max (got {}..{})",
                o.min_position,
                o.max_position
            );
        }
        if self.capture.tick_ms == 0 {
            bail!("capture.tick_ms must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::from_file(&dir.path().join("absent.json")).expect("settings");
        assert_eq!(settings.capture.countdown_secs, 8);
        assert_eq!(settings.overlay, OverlayBounds::default());
        assert_eq!(settings.stylist.text_model, "gemini-3-flash-preview");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"capture":{{"countdown_secs":3}},"stylist":{{"api_key":"k"}}}}"#)
            .expect("write");

        let settings = Settings::from_file(file.path()).expect("settings");
        assert_eq!(settings.capture.countdown_secs, 3);
        assert_eq!(settings.capture.tick_ms, 1000);
        assert_eq!(settings.stylist.api_key.as_deref(), Some("k"));
        assert_eq!(settings.stylist.image_model, "gemini-2.5-flash-image");
    }

    #[test]
    fn api_key_is_never_serialized() {
        let mut settings = Settings::default();
        settings.stylist.api_key = Some("secret".into());
        let json = serde_json::to_string(&settings).expect("json");
        assert!(!json.contains("secret"));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut settings = Settings::default();
        settings.overlay.min_scale = 3.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.overlay.min_position = 95.0;
        assert!(settings.validate().is_err());
    }
}
