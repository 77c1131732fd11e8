use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use bgs_common::{
    error::ConfigError, parse_filter, BgsError, FillColor, FilterType, LayoutMode, RenderSettings,
    Result, RunMode,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_mode")]
    pub mode: LayoutMode,
    #[serde(default = "default_rotate")]
    pub rotate: bool,
    #[serde(default = "default_persistent")]
    pub persistent: bool,
    #[serde(default = "default_fill_color")]
    pub fill_color: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub images: Vec<PathBuf>,
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub mode: Option<LayoutMode>,
    pub rotate: Option<bool>,
    pub persistent: Option<bool>,
    pub fill_color: Option<String>,
    pub images: Vec<PathBuf>,
}

/// Configuration after command-line overrides. The fill colour stays a
/// string until a display is available to resolve colour names.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: LayoutMode,
    pub rotate: bool,
    pub run_mode: RunMode,
    pub fill_color: String,
    pub filter: FilterType,
    pub images: Vec<PathBuf>,
}

impl Settings {
    pub fn render_settings(&self, fill: FillColor) -> RenderSettings {
        RenderSettings {
            mode: self.mode,
            rotate: self.rotate,
            fill,
            filter: self.filter,
        }
    }
}

// Default values
fn default_mode() -> LayoutMode {
    LayoutMode::Scale
}

fn default_rotate() -> bool {
    true
}

fn default_persistent() -> bool {
    false
}

fn default_fill_color() -> String {
    "#000000".to_string()
}

fn default_filter() -> String {
    "Triangle".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            rotate: default_rotate(),
            persistent: default_persistent(),
            fill_color: default_fill_color(),
            filter: default_filter(),
            images: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `explicit` if given, otherwise the per-user config file.
    ///
    /// A missing per-user file means defaults; a missing explicit file is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            log::debug!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BgsError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| BgsError::Config(ConfigError::from(e)))?;

        config.validate()?;
        log::info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BgsError::Config(ConfigError::NoConfigDir))?
            .join("bgs");

        Ok(config_dir.join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if parse_filter(&self.filter).is_none() {
            return Err(BgsError::Config(ConfigError::InvalidValue {
                field: "filter".to_string(),
                value: self.filter.clone(),
            }));
        }

        if self.fill_color.trim().is_empty() {
            return Err(BgsError::Config(ConfigError::InvalidValue {
                field: "fill_color".to_string(),
                value: self.fill_color.clone(),
            }));
        }

        Ok(())
    }

    /// Applies command-line overrides on top of the file values.
    pub fn apply(&self, overrides: Overrides) -> Settings {
        let persistent = overrides.persistent.unwrap_or(self.persistent);
        let images = if overrides.images.is_empty() {
            self.images.clone()
        } else {
            overrides.images
        };

        Settings {
            mode: overrides.mode.unwrap_or(self.mode),
            rotate: overrides.rotate.unwrap_or(self.rotate),
            run_mode: if persistent { RunMode::Persistent } else { RunMode::Once },
            fill_color: overrides.fill_color.unwrap_or_else(|| self.fill_color.clone()),
            // validate() already accepted the name
            filter: parse_filter(&self.filter).unwrap_or(FilterType::Triangle),
            images,
        }
    }
}
