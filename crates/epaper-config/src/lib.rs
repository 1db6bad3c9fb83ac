//! Epaper viewer configuration
//!
//! Settings are loaded from `epaper.toml`, with environment variables taking
//! precedence for quick overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EpaperConfig {
    /// Document stack and remote session settings
    pub session: SessionConfig,
    /// Scene renderer settings
    pub render: RenderConfig,
    /// Viewer (zoom, page size fallbacks)
    pub viewer: ViewerConfig,
}

/// Document stack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of stacked documents (root plus drill-downs)
    pub max_depth: usize,
    /// Locale given to chapters that do not specify one
    pub default_locale: String,
    /// Keep-alive period of the document channel, in seconds (0 disables)
    pub keep_alive_secs: u64,
    /// Ask the server to keep document state when a session is closed
    pub close_keeps_server_state: bool,
}

/// Scene renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Font family the running text style starts from on every page
    pub default_font: String,
    /// Font size the running text style starts from on every page
    pub default_font_size: f64,
    /// Draw the page margins in the band layer
    pub debug_margins: bool,
    /// Prefix applied to relative image sources
    pub asset_base_url: String,
}

/// Viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Page size used until the server reports one (A4 portrait in points)
    pub default_page_width: f64,
    pub default_page_height: f64,
    /// Height used when the server reports an unbounded page
    pub fallback_page_height: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            default_locale: "pt_PT".to_string(),
            keep_alive_secs: 30,
            close_keeps_server_state: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_font: "DejaVu Sans Condensed".to_string(),
            default_font_size: 10.0,
            debug_margins: false,
            asset_base_url: String::new(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 3.0,
            default_page_width: 595.0,
            default_page_height: 842.0,
            fallback_page_height: 4000.0,
        }
    }
}

impl EpaperConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Load `epaper.toml` from the current directory, or defaults if missing
    pub fn load_or_default() -> Self {
        Self::load_from_file("epaper.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("EPAPER_MAX_DEPTH") {
            if let Ok(depth) = val.parse::<usize>() {
                self.session.max_depth = depth.max(1);
            }
        }
        if let Ok(locale) = std::env::var("EPAPER_LOCALE") {
            self.session.default_locale = locale;
        }
        if let Ok(val) = std::env::var("EPAPER_KEEP_ALIVE_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                self.session.keep_alive_secs = secs;
            }
        }

        if let Ok(url) = std::env::var("EPAPER_ASSET_BASE_URL") {
            self.render.asset_base_url = url;
        }
        if let Ok(val) = std::env::var("EPAPER_DEBUG_MARGINS") {
            self.render.debug_margins = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Ok(font) = std::env::var("EPAPER_FONT") {
            self.render.default_font = font;
        }
    }

    /// Load from `epaper.toml` (or defaults), then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
