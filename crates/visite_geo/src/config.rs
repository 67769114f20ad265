use std::{fs::File, io::BufReader, path::Path, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    bounds::Viewport,
    placement::{DEFAULT_MAX_ZOOM, PlacementOptions},
    session::{LinkMode, SessionOptions},
};

pub const MAX_ZOOM_ENV_VAR: &str = "VISITE_MAX_ZOOM";
pub const LINK_MODE_ENV_VAR: &str = "VISITE_LINK_MODE";
pub const EXCLUDE_ZERO_ENV_VAR: &str = "VISITE_EXCLUDE_ZERO_COORDINATE";
pub const API_URL_ENV_VAR: &str = "VISITE_API_URL";
pub const API_TOKEN_ENV_VAR: &str = "VISITE_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_zoom: f64,
    pub link_mode: LinkMode,
    pub exclude_zero_coordinate: bool,
    pub geolocation_timeout_ms: u64,
    pub viewport: Viewport,
    pub api_url: Option<String>,
    pub api_token: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_zoom: DEFAULT_MAX_ZOOM,
            link_mode: LinkMode::NearestMarker,
            exclude_zero_coordinate: true,
            geolocation_timeout_ms: 10_000,
            viewport: Viewport::default(),
            api_url: None,
            api_token: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Overrides fields with the `VISITE_*` variables that are set.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    pub fn with_vars<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var(MAX_ZOOM_ENV_VAR) {
            self.max_zoom = parse_var(MAX_ZOOM_ENV_VAR, value)?;
        }

        if let Some(value) = var(EXCLUDE_ZERO_ENV_VAR) {
            self.exclude_zero_coordinate = parse_var(EXCLUDE_ZERO_ENV_VAR, value)?;
        }

        if let Some(value) = var(LINK_MODE_ENV_VAR) {
            self.link_mode = match value.trim() {
                "nearest_marker" => LinkMode::NearestMarker,
                "reference_point" => LinkMode::ReferencePoint,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: LINK_MODE_ENV_VAR,
                        value,
                    });
                }
            };
        }

        if let Some(value) = var(API_URL_ENV_VAR) {
            self.api_url = Some(value);
        }

        if let Some(value) = var(API_TOKEN_ENV_VAR) {
            self.api_token = Some(value);
        }

        Ok(self)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            placement: PlacementOptions {
                exclude_zero_coordinate: self.exclude_zero_coordinate,
                max_zoom: self.max_zoom,
            },
            link_mode: self.link_mode,
        }
    }
}
