use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use url::Url;

use crate::catalog::SelectorCatalog;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub browser: BrowserConfig,
    pub journey: JourneyConfig,
    pub extraction: ExtractionConfig,
    pub screenshots: ScreenshotConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub sandbox: bool,
    pub user_agent: String,
    pub chrome_path: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub navigation_timeout_ms: u64,
    pub element_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyConfig {
    pub landing_url: String,
    pub country: String,
    pub search_term: String,
    pub search_box_label: String,
    pub search_button_label: String,
    /// CSS path to the "new items" condition filter.
    pub new_item_filter: String,
    pub sort_button_label: String,
    pub sort_option: String,
    /// Buttons that may cover the page after picking a country.
    pub popup_buttons: Vec<String>,
    pub popup_timeout_ms: u64,
    /// Pause after clicks that re-render the results list.
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub max_products: usize,
    pub price_fallback: String,
    pub selectors: SelectorCatalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    pub enabled: bool,
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

impl AppConfig {
    /// Embedded defaults only.
    pub fn defaults() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Start with the compiled-in defaults
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            // Add environment variables with prefix "MELI_"
            .add_source(Environment::with_prefix("MELI").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.journey.landing_url).is_err() {
            return Err(ConfigError::Message("Invalid landing URL format".into()));
        }

        if self.journey.search_term.trim().is_empty() {
            return Err(ConfigError::Message("Journey search_term must not be empty".into()));
        }

        if self.browser.navigation_timeout_ms == 0 || self.browser.element_timeout_ms == 0 {
            return Err(ConfigError::Message("Browser timeouts must be greater than 0".into()));
        }

        if self.extraction.max_products == 0 {
            return Err(ConfigError::Message("Extraction max_products must be greater than 0".into()));
        }

        if self.extraction.selectors.titles.is_empty() || self.extraction.selectors.prices.is_empty() {
            return Err(ConfigError::Message("Selector lists must contain at least one selector".into()));
        }

        if let Some(selector) = self.extraction.selectors.first_invalid() {
            return Err(ConfigError::Message(format!("Invalid CSS selector in catalog: {}", selector)));
        }

        if self.screenshots.enabled && self.screenshots.directory.trim().is_empty() {
            return Err(ConfigError::Message("Screenshot directory must be set when screenshots are enabled".into()));
        }

        Ok(())
    }
}
