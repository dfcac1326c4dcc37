use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

pub const CONFIG_PATH: &str = "config.toml";

static SHARED_CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct GridConfig {
    /// Rows and columns of the square grid
    #[serde(default = "default_grid_size")]
    pub size: usize,
    /// Side length in pixels of the square drawing area
    #[serde(default = "default_grid_area")]
    pub area: f32,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct WindowConfig {
    #[serde(default = "default_window_title")]
    pub title: String,
    #[serde(default = "default_window_width")]
    pub width: f32,
    #[serde(default = "default_window_height")]
    pub height: f32,
    #[serde(default = "default_options_width")]
    pub options_width: f32,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default)]
    pub background_r: u8,
    #[serde(default)]
    pub background_g: u8,
    #[serde(default)]
    pub background_b: u8,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Frontier pops performed between two repaints
    #[serde(default = "default_steps_per_frame")]
    pub steps_per_frame: usize,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_enable_action_log")]
    pub enable_action_log: bool,
    #[serde(default = "default_action_log_path")]
    pub action_log_path: String,
}

// Default values
fn default_grid_size() -> usize { 30 }
fn default_grid_area() -> f32 { 600.0 }
fn default_window_title() -> String { "A* Path Finding Algorithm".to_string() }
fn default_window_width() -> f32 { 1000.0 }
fn default_window_height() -> f32 { 800.0 }
fn default_options_width() -> f32 { 200.0 }
fn default_padding() -> f32 { 20.0 }
fn default_steps_per_frame() -> usize { 1 }
fn default_enable_action_log() -> bool { false }
fn default_action_log_path() -> String { "action_log.json".to_string() }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
            area: default_grid_area(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_window_title(),
            width: default_window_width(),
            height: default_window_height(),
            options_width: default_options_width(),
            padding: default_padding(),
            background_r: 0,
            background_g: 0,
            background_b: 0,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            steps_per_frame: default_steps_per_frame(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_action_log: default_enable_action_log(),
            action_log_path: default_action_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            window: WindowConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `config.toml`, or use defaults if it is missing or invalid
    pub fn load() -> Self {
        Self::load_from(CONFIG_PATH)
    }

    /// Process-wide configuration, read from `config.toml` on first use only
    pub fn shared() -> &'static Config {
        SHARED_CONFIG.get_or_init(Self::load)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Config::default()
                }
            },
            Err(_) => {
                info!("No {} found, using default configuration", path.display());
                Config::default()
            }
        }
    }

    /// Parse and sanitise a TOML document
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(contents)?;
        config.sanitize();
        Ok(config)
    }

    fn sanitize(&mut self) {
        if self.grid.size < 2 {
            warn!("grid.size {} is too small for a search, using 2", self.grid.size);
            self.grid.size = 2;
        }
        if self.search.steps_per_frame == 0 {
            warn!("search.steps_per_frame must be positive, using 1");
            self.search.steps_per_frame = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [grid]
            size = 20

            [search]
            steps_per_frame = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.grid.size, 20);
        assert_eq!(config.grid.area, 600.0);
        assert_eq!(config.search.steps_per_frame, 5);
        assert_eq!(config.window.title, "A* Path Finding Algorithm");
        assert!(!config.logging.enable_action_log);
    }

    #[test]
    fn test_sanitize_clamps_values() {
        let config = Config::parse("[grid]\nsize = 1\n[search]\nsteps_per_frame = 0\n").unwrap();
        assert_eq!(config.grid.size, 2);
        assert_eq!(config.search.steps_per_frame, 1);
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        assert!(Config::parse("[grid]\nsize = \"big\"\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_from("definitely/not/here/config.toml");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_shared_config_is_read_once() {
        let first = Config::shared();
        let second = Config::shared();
        assert!(std::ptr::eq(first, second));
        assert!(first.grid.size >= 2);
    }
}
