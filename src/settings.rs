//! Application settings, layered from an optional `recipebox.toml` and
//! `RECIPEBOX__*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level settings.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub scraper: ScraperSettings,
}

/// Remote record store (Firebase Realtime Database REST endpoint).
#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    /// Database root, e.g. `https://my-project.firebaseio.com`
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Database secret or ID token, sent as the `auth` query parameter
    pub auth: Option<String>,
    /// Path under which recipes live
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            auth: None,
            path: default_store_path(),
            timeout_secs: default_timeout(),
        }
    }
}

/// The single administrator credential.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminSettings {
    #[serde(default = "default_admin")]
    pub username: String,
    #[serde(default = "default_admin")]
    pub password: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            username: default_admin(),
            password: default_admin(),
        }
    }
}

/// PDF export knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct ExportSettings {
    /// Maximum instruction characters per recipe card
    #[serde(default = "default_card_max_chars")]
    pub card_max_chars: usize,
    /// TrueType font tried first; missing or unreadable files fall back
    #[serde(default = "default_font_path")]
    pub font_path: String,
    /// Builtin PDF font family used when `font_path` cannot be loaded
    #[serde(default = "default_fallback_font")]
    pub fallback_font: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            card_max_chars: default_card_max_chars(),
            font_path: default_font_path(),
            fallback_font: default_fallback_font(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScraperSettings {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_store_path() -> String {
    "recipes".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_card_max_chars() -> usize {
    700
}

fn default_font_path() -> String {
    "baskerville.ttf".to_string()
}

fn default_fallback_font() -> String {
    "Times-Roman".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; RecipeBox/1.0)".to_string()
}

impl Settings {
    /// Load settings with the following priority (highest to lowest):
    /// 1. Environment variables with the `RECIPEBOX__` prefix
    /// 2. `recipebox.toml` in the current directory
    /// 3. Default values
    ///
    /// Environment variable format: `RECIPEBOX__STORE__URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("recipebox")
    }

    /// Same as [`Settings::load`] with an explicit file stem.
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(file_stem).required(false))
            .add_source(
                Environment::with_prefix("RECIPEBOX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
